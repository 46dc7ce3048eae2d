//! Fixed-capacity sliding window over the most recent states.

use crate::types::State2;

/// Circular buffer holding at most `capacity` states; pushing into a full
/// buffer evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    slots: Vec<State2>,
    head: usize,
    len: usize,
    capacity: usize,
}

impl TrailBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn push(&mut self, state: State2) {
        if self.capacity == 0 {
            return;
        }
        if self.slots.len() < self.capacity {
            self.slots.push(state);
            self.len += 1;
            return;
        }
        // Full: head points at the oldest entry.
        self.slots[self.head] = state;
        self.head = (self.head + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
        self.len = 0;
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &State2> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    pub fn to_vec(&self) -> Vec<State2> {
        self.iter().copied().collect()
    }
}
