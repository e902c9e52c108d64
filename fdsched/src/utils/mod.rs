//! Internal data structures.
//!
//! [`Slab`] stores the scheduler's tasks under small reusable ids.

mod slab;

pub(crate) use slab::Slab;
