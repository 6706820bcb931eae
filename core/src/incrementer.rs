//! Monotonic id allocation.
//!
//! An Incrementer hands out `start, start + 1, ...` and never checks an
//! upper bound. Callers composing several builders into one exchange are
//! responsible for choosing offsets whose ranges do not collide; see
//! `exchange::Exchange::absorb`, which checks it after the fact.

use crate::types::Id;
use std::cell::Cell;
use std::ops::Range;

#[derive(Debug)]
pub struct Incrementer {
    start: Id,
    next:  Cell<Id>,
}

impl Incrementer {
    pub fn new(start: Id) -> Self {
        Self {
            start,
            next: Cell::new(start),
        }
    }

    /// Returns the next id. Usable through a shared reference so every
    /// step filling one id range can hold the same allocator.
    pub fn next_id(&self) -> Id {
        let id = self.next.get();
        self.next.set(id + 1);
        id
    }

    /// Ids handed out so far, as a half-open range.
    pub fn consumed(&self) -> Range<Id> {
        self.start..self.next.get()
    }
}

impl Default for Incrementer {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_by_default() {
        let ids = Incrementer::default();
        assert_eq!(ids.next_id(), 0);
    }

    #[test]
    fn counts_up_from_offset() {
        let ids = Incrementer::new(5);
        assert_eq!(ids.next_id(), 5);
        assert_eq!(ids.next_id(), 6);
        assert_eq!(ids.next_id(), 7);
        assert_eq!(ids.consumed(), 5..8);
    }

    #[test]
    fn shared_reference_allocates_one_sequence() {
        let ids = Incrementer::new(10);
        let a = &ids;
        let b = &ids;
        assert_eq!(a.next_id(), 10);
        assert_eq!(b.next_id(), 11);
        assert_eq!(a.next_id(), 12);
    }

    #[test]
    fn untouched_range_is_empty() {
        let ids = Incrementer::new(42);
        assert!(ids.consumed().is_empty());
    }
}
