pub mod entry;

use crate::error::{RillError, RillResult};
use crate::keywatcher::WaiterTable;
use crate::types::Value;
use crate::types::list::List;
use entry::{Entry, now_millis};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The shared keyspace: the primary map plus the table of blocked list
/// consumers. Both sit behind one lock so a push can consult and mutate the
/// waiter table in the same critical section as the would-be insert.
///
/// Methods assume the caller holds the surrounding `RwLock` — they take
/// `&self`/`&mut self` and never lock anything themselves.
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<String, Entry>,
    pub waiters: WaiterTable,
}

impl Store {
    pub fn new() -> Self {
        Store {
            data: HashMap::new(),
            waiters: WaiterTable::new(),
        }
    }

    /// Get an entry, lazily deleting it if expired.
    pub fn get(&mut self, key: &str) -> Option<&Entry> {
        if self.is_expired(key) {
            self.data.remove(key);
            return None;
        }
        self.data.get(key)
    }

    /// Mutable variant of `get`, with the same lazy expiration.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        if self.is_expired(key) {
            self.data.remove(key);
            return None;
        }
        self.data.get_mut(key)
    }

    /// Read-only lookup for paths that hold only the read lock. An expired
    /// entry is reported as absent but left in place for the sweep.
    pub fn peek(&self, key: &str) -> Option<&Entry> {
        let entry = self.data.get(key)?;
        if entry.is_expired() { None } else { Some(entry) }
    }

    pub fn set(&mut self, key: String, entry: Entry) {
        self.data.insert(key, entry);
    }

    /// Delete a key. Returns true if it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Push values onto a list, delivering to blocked consumers first.
    ///
    /// Values are consumed left to right: each one goes to the oldest live
    /// waiter on the key if there is one, otherwise into the list at the
    /// chosen end. The reply is the nominal post-push length — existing
    /// length plus everything pushed — regardless of how many values waiters
    /// consumed. A fully-consumed push leaves no empty list behind.
    pub fn list_push(
        &mut self,
        key: &str,
        values: Vec<Vec<u8>>,
        at_head: bool,
    ) -> RillResult<i64> {
        if self.is_expired(key) {
            self.data.remove(key);
        }

        let existing_len = match self.data.get(key) {
            Some(entry) => match entry.value.as_list() {
                Some(list) => list.len(),
                None => return Err(RillError::WrongType),
            },
            None => 0,
        };
        let nominal_len = (existing_len + values.len()) as i64;

        for value in values {
            let value = match self.waiters.deliver(key, value) {
                None => continue,
                Some(v) => v,
            };
            let entry = self
                .data
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::List(List::new())));
            if let Some(list) = entry.value.as_list_mut() {
                if at_head {
                    list.push_front(value);
                } else {
                    list.push_back(value);
                }
            }
        }

        // Zero-element lists must not be observable.
        if self
            .data
            .get(key)
            .and_then(|e| e.value.as_list())
            .is_some_and(|l| l.is_empty())
        {
            self.data.remove(key);
        }

        Ok(nominal_len)
    }

    /// BLPOP's immediate pass: scan keys left to right and pop the head of
    /// the first non-empty list, deleting the key when that drains it.
    pub fn blocked_pop_scan(
        &mut self,
        keys: &[String],
    ) -> RillResult<Option<(String, Vec<u8>)>> {
        for key in keys {
            if self.is_expired(key) {
                self.data.remove(key);
                continue;
            }
            let (popped, drained) = match self.data.get_mut(key) {
                Some(entry) => {
                    let list = entry.value.as_list_mut().ok_or(RillError::WrongType)?;
                    let popped = list.pop_front();
                    (popped, list.is_empty())
                }
                None => continue,
            };
            match popped {
                Some(value) => {
                    if drained {
                        self.data.remove(key);
                    }
                    return Ok(Some((key.clone(), value)));
                }
                // A zero-element list should not exist; reclaim and move on.
                None => {
                    self.data.remove(key);
                }
            }
        }
        Ok(None)
    }

    /// Bounded expiry sweep: visit at most `limit` entries in map order and
    /// delete the expired ones among them. Returns how many were removed.
    pub fn active_expire(&mut self, limit: usize) -> usize {
        let now = now_millis();
        let expired: Vec<String> = self
            .data
            .iter()
            .take(limit)
            .filter(|(_, e)| e.expires_at.is_some_and(|exp| exp <= now))
            .map(|(k, _)| k.clone())
            .collect();
        let count = expired.len();
        for key in expired {
            self.data.remove(&key);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn is_expired(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(|entry| entry.is_expired())
    }
}

pub type SharedStore = Arc<RwLock<Store>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::stream::{Stream, StreamId};

    fn string_entry(data: &[u8]) -> Entry {
        Entry::new(Value::String(data.to_vec()))
    }

    #[test]
    fn test_get_lazily_deletes_expired() {
        let mut store = Store::new();
        store.set(
            "k".to_string(),
            Entry::with_expiry(Value::String(b"v".to_vec()), now_millis() - 10),
        );
        assert!(store.get("k").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_peek_reports_absent_but_keeps_entry() {
        let mut store = Store::new();
        store.set(
            "k".to_string(),
            Entry::with_expiry(Value::String(b"v".to_vec()), now_millis() - 10),
        );
        assert!(store.peek("k").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_active_expire_is_bounded() {
        let mut store = Store::new();
        for i in 0..30 {
            store.set(
                format!("k{i}"),
                Entry::with_expiry(Value::String(b"v".to_vec()), now_millis() - 10),
            );
        }
        let removed = store.active_expire(10);
        assert_eq!(removed, 10);
        assert_eq!(store.len(), 20);
    }

    #[test]
    fn test_list_push_reports_nominal_length() {
        let mut store = Store::new();
        let n = store
            .list_push("l", vec![b"a".to_vec(), b"b".to_vec()], false)
            .unwrap();
        assert_eq!(n, 2);
        let n = store.list_push("l", vec![b"c".to_vec()], false).unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn test_list_push_wrong_kind() {
        let mut store = Store::new();
        store.set("s".to_string(), string_entry(b"x"));
        assert!(matches!(
            store.list_push("s", vec![b"a".to_vec()], false),
            Err(RillError::WrongType)
        ));
    }

    #[test]
    fn test_lpush_prepends_left_to_right() {
        let mut store = Store::new();
        store
            .list_push("l", vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()], true)
            .unwrap();
        let entry = store.get("l").unwrap();
        let list = entry.value.as_list().unwrap();
        assert_eq!(list.slice(0, 3), vec![b"c", b"b", b"a"]);
    }

    #[test]
    fn test_push_delivers_to_waiter_without_creating_key() {
        let mut store = Store::new();
        let keys = vec!["q".to_string()];
        let (_id, mut rx) = store.waiters.register(&keys);

        let n = store.list_push("q", vec![b"x".to_vec()], true).unwrap();
        assert_eq!(n, 1);
        assert_eq!(rx.try_recv().unwrap(), ("q".to_string(), b"x".to_vec()));
        assert!(store.get("q").is_none());
    }

    #[test]
    fn test_push_through_leaves_remainder_in_list() {
        let mut store = Store::new();
        let keys = vec!["q".to_string()];
        let (_id, mut rx) = store.waiters.register(&keys);

        let n = store
            .list_push("q", vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()], false)
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(rx.try_recv().unwrap(), ("q".to_string(), b"a".to_vec()));

        let entry = store.get("q").unwrap();
        let list = entry.value.as_list().unwrap();
        assert_eq!(list.slice(0, 2), vec![b"b", b"c"]);
    }

    #[test]
    fn test_blocked_pop_scan_takes_first_nonempty() {
        let mut store = Store::new();
        store.list_push("b", vec![b"vb".to_vec()], false).unwrap();
        let keys = vec!["a".to_string(), "b".to_string()];
        let got = store.blocked_pop_scan(&keys).unwrap();
        assert_eq!(got, Some(("b".to_string(), b"vb".to_vec())));
        // Drained list is gone.
        assert!(store.get("b").is_none());
    }

    #[test]
    fn test_blocked_pop_scan_wrong_kind() {
        let mut store = Store::new();
        store.set("s".to_string(), string_entry(b"x"));
        let keys = vec!["s".to_string()];
        assert!(matches!(
            store.blocked_pop_scan(&keys),
            Err(RillError::WrongType)
        ));
    }

    #[test]
    fn test_kind_is_stable_until_replaced() {
        let mut store = Store::new();
        let mut stream = Stream::new();
        stream.validate_and_commit_id(StreamId::new(1, 1)).unwrap();
        stream.append(StreamId::new(1, 1), vec![b"f".to_vec(), b"v".to_vec()]);
        store.set("s".to_string(), Entry::new(Value::Stream(stream)));

        assert_eq!(store.get("s").unwrap().value.type_name(), "stream");
        // A SET overwrite replaces the entity wholesale.
        store.set("s".to_string(), string_entry(b"x"));
        assert_eq!(store.get("s").unwrap().value.type_name(), "string");
    }
}
