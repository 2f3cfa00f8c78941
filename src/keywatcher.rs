use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// What a blocked client receives: the key that produced data and the value.
pub type Delivery = (String, Vec<u8>);

/// A suspended BLPOP client as seen from the keyspace: a single-slot channel
/// registered under every key the client waits on. All clones share the slot,
/// so the first successful send wins and later attempts see a full channel.
#[derive(Debug)]
struct Waiter {
    id: u64,
    slot: mpsc::Sender<Delivery>,
}

/// Per-key FIFO queues of blocked clients.
///
/// The table lives inside the keyspace and is only touched while the caller
/// holds the keyspace lock; that makes push-side delivery and the would-be
/// list insert a single critical section.
#[derive(Debug, Default)]
pub struct WaiterTable {
    queues: HashMap<String, VecDeque<Waiter>>,
    next_id: u64,
}

impl WaiterTable {
    pub fn new() -> Self {
        WaiterTable {
            queues: HashMap::new(),
            next_id: 0,
        }
    }

    /// Open a fresh single-slot endpoint and enqueue it at the tail of every
    /// requested key's queue, in the order given. Returns the registration id
    /// (for cleanup) and the receiving half.
    pub fn register(&mut self, keys: &[String]) -> (u64, mpsc::Receiver<Delivery>) {
        let (tx, rx) = mpsc::channel(1);
        self.next_id += 1;
        let id = self.next_id;
        for key in keys {
            self.queues.entry(key.clone()).or_default().push_back(Waiter {
                id,
                slot: tx.clone(),
            });
        }
        (id, rx)
    }

    /// Remove one registration from every queue it appears in. Idempotent —
    /// delivery may already have dropped it from some queues.
    pub fn unregister(&mut self, keys: &[String], id: u64) {
        for key in keys {
            if let Some(queue) = self.queues.get_mut(key) {
                queue.retain(|w| w.id != id);
                if queue.is_empty() {
                    self.queues.remove(key);
                }
            }
        }
    }

    /// Hand `value` to the oldest live waiter on `key`. Returns the value
    /// back if nobody took it. Dead slots (client gone, or already served
    /// through another key) are discarded on contact.
    pub fn deliver(&mut self, key: &str, value: Vec<u8>) -> Option<Vec<u8>> {
        let Some(queue) = self.queues.get_mut(key) else {
            return Some(value);
        };

        let mut value = value;
        while let Some(waiter) = queue.pop_front() {
            match waiter.slot.try_send((key.to_string(), value)) {
                Ok(()) => {
                    if queue.is_empty() {
                        self.queues.remove(key);
                    }
                    return None;
                }
                Err(TrySendError::Full((_, v))) | Err(TrySendError::Closed((_, v))) => {
                    value = v;
                }
            }
        }

        self.queues.remove(key);
        Some(value)
    }

    /// Whether any client is currently blocked on `key`. Stale entries may be
    /// counted; `deliver` is the authority.
    pub fn has_waiters(&self, key: &str) -> bool {
        self.queues.get(key).is_some_and(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_delivery_order() {
        let mut table = WaiterTable::new();
        let keys = vec!["q".to_string()];
        let (_id_a, mut rx_a) = table.register(&keys);
        let (_id_b, mut rx_b) = table.register(&keys);

        assert!(table.deliver("q", b"first".to_vec()).is_none());
        assert!(table.deliver("q", b"second".to_vec()).is_none());

        assert_eq!(rx_a.try_recv().unwrap(), ("q".to_string(), b"first".to_vec()));
        assert_eq!(rx_b.try_recv().unwrap(), ("q".to_string(), b"second".to_vec()));
    }

    #[test]
    fn test_no_waiters_returns_value() {
        let mut table = WaiterTable::new();
        assert_eq!(table.deliver("q", b"x".to_vec()), Some(b"x".to_vec()));
    }

    #[test]
    fn test_dead_slot_is_skipped() {
        let mut table = WaiterTable::new();
        let keys = vec!["q".to_string()];
        let (_id_a, rx_a) = table.register(&keys);
        let (_id_b, mut rx_b) = table.register(&keys);
        drop(rx_a);

        assert!(table.deliver("q", b"x".to_vec()).is_none());
        assert_eq!(rx_b.try_recv().unwrap(), ("q".to_string(), b"x".to_vec()));
    }

    #[test]
    fn test_multi_key_waiter_served_once() {
        let mut table = WaiterTable::new();
        let keys = vec!["a".to_string(), "b".to_string()];
        let (id, mut rx) = table.register(&keys);

        assert!(table.deliver("b", b"vb".to_vec()).is_none());
        // The slot is full now; a push on the other key must not be swallowed.
        assert_eq!(table.deliver("a", b"va".to_vec()), Some(b"va".to_vec()));

        assert_eq!(rx.try_recv().unwrap(), ("b".to_string(), b"vb".to_vec()));
        table.unregister(&keys, id);
        assert!(!table.has_waiters("a"));
        assert!(!table.has_waiters("b"));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut table = WaiterTable::new();
        let keys = vec!["q".to_string()];
        let (id, _rx) = table.register(&keys);
        table.unregister(&keys, id);
        table.unregister(&keys, id);
        assert!(!table.has_waiters("q"));
    }
}
