//! Fixed-capacity FIFO of recent car snapshots

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Position + rotation snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pr {
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Ring buffer that silently drops the oldest entry on overflow
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting from the front until within capacity.
    /// Returns the new length.
    pub fn push(&mut self, item: T) -> usize {
        self.buffer.push_back(item);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.len()
    }

    /// Oldest entry, without removing it
    pub fn peek(&self) -> Option<&T> {
        self.buffer.front()
    }

    /// Remove and return the oldest entry
    pub fn first(&mut self) -> Option<T> {
        self.buffer.pop_front()
    }

    /// Remove and return the newest entry
    pub fn last(&mut self) -> Option<T> {
        self.buffer.pop_back()
    }

    pub fn flush(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }
}
