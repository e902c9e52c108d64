/// A simple slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and hands out
/// small indices that are reused after removal.
pub(crate) struct Slab<T> {
    /// Storage; `None` marks a free slot.
    items: Vec<Option<T>>,
    /// Stack of free indices that can be reused.
    free: Vec<usize>,
}

impl<T> Slab<T> {
    /// Creates an empty `Slab` with room for `size` items.
    pub(crate) fn new(size: usize) -> Self {
        Self {
            items: Vec::with_capacity(size),
            free: Vec::new(),
        }
    }

    /// The index the next [`insert`](Self::insert) will use.
    pub(crate) fn vacant_key(&self) -> usize {
        self.free.last().copied().unwrap_or(self.items.len())
    }

    /// Inserts a value into the slab and returns its index.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut slab = Slab::new(1);
    /// let idx = slab.insert(42);
    /// ```
    pub(crate) fn insert(&mut self, item: T) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.items[index] = Some(item);
                index
            }
            None => {
                self.items.push(Some(item));
                self.items.len() - 1
            }
        }
    }

    /// Removes and returns the value stored at `index`, if any.
    ///
    /// The slot becomes free and may be reused by future insertions.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;
        self.free.push(index);
        Some(item)
    }

    /// Returns a mutable reference to the value at `index`, if any.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)?.as_mut()
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.items.len() - self.free.len()
    }

    /// Removes every value, leaving the slab empty.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        self.free.clear();
        self.items.drain(..).flatten().collect()
    }
}
