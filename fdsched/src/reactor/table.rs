use crate::reactor::operation::Operation;
use crate::reactor::poller::common::Interest;

use std::cell::RefCell;
use std::os::fd::RawFd;
use std::rc::{Rc, Weak};

/// Default number of descriptor slots, covering descriptors `0..MAX_FD`.
pub const MAX_FD: usize = 32;

/// Fixed-size map from descriptor to its single pending operation.
///
/// Slots only hold weak references: the table never resumes or drops an
/// operation, it just reports which ones are waiting.
pub(crate) struct DescriptorTable {
    slots: Vec<Option<Weak<RefCell<Operation>>>>,
}

impl DescriptorTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Number of slots; valid descriptors are `0..capacity`.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Checks that `fd` has a slot.
    ///
    /// # Panics
    ///
    /// Panics if `fd` is negative or not below the table capacity.
    pub(crate) fn check_bound(&self, fd: RawFd) -> usize {
        let capacity = self.slots.len();

        assert!(
            fd >= 0 && (fd as usize) < capacity,
            "descriptor {fd} is outside the table bound [0, {capacity})"
        );

        fd as usize
    }

    /// Records `operation` as the pending operation on `fd`.
    ///
    /// # Panics
    ///
    /// Panics if `fd` is out of bound or already has a pending operation.
    pub(crate) fn register(&mut self, fd: RawFd, operation: &Rc<RefCell<Operation>>) {
        let index = self.check_bound(fd);
        let slot = &mut self.slots[index];

        assert!(
            slot.as_ref().is_none_or(|w| w.strong_count() == 0),
            "descriptor {fd} already has a pending operation"
        );

        *slot = Some(Rc::downgrade(operation));
    }

    /// Clears the slot of `fd`, returning whether it was occupied.
    pub(crate) fn remove(&mut self, fd: RawFd) -> bool {
        self.check_bound(fd);
        self.slots[fd as usize].take().is_some()
    }

    /// Clears the slot of `fd` only if it still refers to `operation`.
    pub(crate) fn remove_if(&mut self, fd: RawFd, operation: &Rc<RefCell<Operation>>) -> bool {
        let index = self.check_bound(fd);
        let slot = &mut self.slots[index];

        match slot {
            Some(weak) if std::ptr::eq(weak.as_ptr(), Rc::as_ptr(operation)) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// The live operation pending on `fd`, if any.
    pub(crate) fn get(&self, fd: RawFd) -> Option<Rc<RefCell<Operation>>> {
        self.slots
            .get(usize::try_from(fd).ok()?)?
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn contains(&self, fd: RawFd) -> bool {
        self.get(fd).is_some()
    }

    /// Descriptors with a live pending operation, ascending.
    pub(crate) fn pending(&self) -> Vec<RawFd> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|w| w.strong_count() > 0))
            .map(|(fd, _)| fd as RawFd)
            .collect()
    }

    /// Builds the readiness query for every pending operation, ascending by
    /// descriptor. Slots whose operation has been dropped are cleared.
    pub(crate) fn interests(&mut self) -> Vec<(RawFd, Interest)> {
        let mut interests = Vec::new();

        for (fd, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                continue;
            }

            match slot.as_ref().and_then(Weak::upgrade) {
                Some(operation) => {
                    interests.push((fd as RawFd, operation.borrow().readiness_event()));
                }
                None => *slot = None,
            }
        }

        interests
    }
}
