//! Bounded lookback window over the most recent indicator bars.
//!
//! Rules see history through this window: an ordered slice of the last N
//! bars, oldest first, with the current bar as the newest element. Rule
//! evaluation does not begin until the window is full.

use std::collections::VecDeque;

/// Ring of the most recent `capacity` items.
#[derive(Debug, Clone)]
pub struct LookbackWindow<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> LookbackWindow<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "lookback capacity must be at least 1");
        Self {
            buf: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append an item, evicting the oldest once the window is full.
    pub fn push(&mut self, item: T) {
        self.buf.push_back(item);
        if self.buf.len() > self.capacity {
            self.buf.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Ordered snapshot, oldest → newest.
    pub fn as_slice(&mut self) -> &[T] {
        self.buf.make_contiguous()
    }
}
