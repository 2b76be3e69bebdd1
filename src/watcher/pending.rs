//! FIFO queue of distinct directory keys awaiting a test run.

use std::collections::{HashSet, VecDeque};

use super::source::DirKey;

/// Distinct keys in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    order: VecDeque<DirKey>,
    pending: HashSet<DirKey>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key unless it is already waiting.
    ///
    /// Returns `true` if the key was added.
    pub fn push(&mut self, key: DirKey) -> bool {
        if self.pending.contains(&key) {
            return false;
        }
        self.pending.insert(key.clone());
        self.order.push_back(key);
        true
    }

    /// Remove the oldest key and clear its pending mark.
    pub fn pop(&mut self) -> Option<DirKey> {
        let key = self.order.pop_front()?;
        self.pending.remove(&key);
        Some(key)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop everything still waiting, returning how many keys were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.order.len();
        self.order.clear();
        self.pending.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut PendingQueue) -> Vec<String> {
        std::iter::from_fn(|| queue.pop())
            .map(|k| k.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_duplicates_are_rejected_while_pending() {
        let mut queue = PendingQueue::new();

        assert!(queue.push("a".into()));
        assert!(!queue.push("a".into()));
        assert!(queue.push("b".into()));
        assert!(!queue.push("a".into()));

        assert_eq!(drain(&mut queue), vec!["a", "b"]);
    }

    #[test]
    fn test_first_occurrence_order() {
        let mut queue = PendingQueue::new();
        for key in ["a", "b", "c", "b"] {
            queue.push(key.into());
        }

        assert_eq!(drain(&mut queue), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_popped_key_can_be_queued_again() {
        let mut queue = PendingQueue::new();
        queue.push("a".into());
        queue.push("b".into());

        assert_eq!(queue.pop(), Some(DirKey::from("a")));

        // Re-queued behind b even though it just ran
        assert!(queue.push("a".into()));
        assert_eq!(drain(&mut queue), vec!["b", "a"]);
    }

    #[test]
    fn test_clear() {
        let mut queue = PendingQueue::new();
        queue.push("a".into());
        queue.push("b".into());

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(queue.push("a".into()));
    }
}
