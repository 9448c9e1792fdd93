//! Single-slot typed mailbox over a [`KeyValueStore`].

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use super::{ClientError, KeyValueStore};

/// One value under one fixed key, read at most once.
pub struct Mailbox<T, S> {
    store: S,
    key: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T, S> Mailbox<T, S>
where
    T: Serialize + DeserializeOwned,
    S: KeyValueStore,
{
    pub fn new(store: S, key: &'static str) -> Self {
        Self {
            store,
            key,
            _value: PhantomData,
        }
    }

    /// Replace whatever is in the slot with `value`.
    pub fn put(&self, value: &T) -> Result<(), ClientError> {
        let raw = serde_json::to_string(value).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.store.set(self.key, &raw)
    }

    /// Take the value out of the slot, leaving it empty.
    ///
    /// A payload that fails to decode is removed and reported as absent.
    pub fn take_once(&self) -> Result<Option<T>, ClientError> {
        let Some(raw) = self.store.get(self.key)? else {
            return Ok(None);
        };
        self.store.remove(self.key)?;

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Dropping malformed {} payload: {}", self.key, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_take_once_empties_the_slot() {
        let mailbox: Mailbox<Vec<i64>, _> = Mailbox::new(MemoryStore::new(), "slot");

        assert_eq!(mailbox.take_once().unwrap(), None);
        mailbox.put(&vec![1, 2]).unwrap();
        assert_eq!(mailbox.take_once().unwrap(), Some(vec![1, 2]));
        assert_eq!(mailbox.take_once().unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let mailbox: Mailbox<String, _> = Mailbox::new(MemoryStore::new(), "slot");
        mailbox.put(&"first".to_string()).unwrap();
        mailbox.put(&"second".to_string()).unwrap();
        assert_eq!(mailbox.take_once().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_malformed_payload_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        store.set("slot", "{not json").unwrap();

        let mailbox: Mailbox<Vec<i64>, _> = Mailbox::new(store.clone(), "slot");
        assert_eq!(mailbox.take_once().unwrap(), None);
        assert_eq!(store.get("slot").unwrap(), None);
    }
}
