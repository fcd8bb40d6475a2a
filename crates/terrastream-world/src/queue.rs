//! FIFO queue of pending cell loads.
//!
//! Written by the window tracker on the caller's thread and drained by the
//! loader. Requests are not deduplicated here; the loader filters stale and
//! duplicate origins when it dequeues them.

use std::collections::VecDeque;

use glam::Vec2;
use parking_lot::Mutex;

/// Unbounded, strictly ordered queue of cell origins.
#[derive(Debug, Default)]
pub struct LoadQueue {
    pending: Mutex<VecDeque<Vec2>>,
}

impl LoadQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one request.
    pub fn push(&self, origin: Vec2) {
        self.pending.lock().push_back(origin);
    }

    /// Appends requests in order under a single lock.
    pub fn extend(&self, origins: impl IntoIterator<Item = Vec2>) {
        self.pending.lock().extend(origins);
    }

    /// Removes and returns the oldest request.
    pub fn pop(&self) -> Option<Vec2> {
        self.pending.lock().pop_front()
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Copies the pending requests, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Vec2> {
        self.pending.lock().iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = LoadQueue::new();
        queue.push(Vec2::new(1.0, 0.0));
        queue.extend([Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)]);
        queue.push(Vec2::new(1.0, 0.0));

        assert_eq!(queue.len(), 4);
        let drained: Vec<f32> = std::iter::from_fn(|| queue.pop()).map(|v| v.x).collect();
        assert_eq!(drained, vec![1.0, 2.0, 3.0, 1.0]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshot_does_not_drain() {
        let queue = LoadQueue::new();
        queue.extend([Vec2::ZERO, Vec2::ONE]);
        assert_eq!(queue.snapshot(), vec![Vec2::ZERO, Vec2::ONE]);
        assert_eq!(queue.len(), 2);
    }
}
