use std::collections::VecDeque;

use chrono::{DateTime, Utc};

pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Fixed-capacity, insertion-ordered buffer. Pushing at capacity evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: Timestamped> BoundedBuffer<T> {
    /// Drops every entry recorded at or before `cutoff`, returning how many
    /// were removed.
    pub fn retain_newer_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.timestamp() > cutoff);
        before - self.entries.len()
    }
}
