use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use futures::{StreamExt, stream::BoxStream};
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store backend failure: {0}")]
    Backend(String),
}

/// Keyed local storage whose records can be observed continuously.
pub trait RecordStore<V>: Send + Sync {
    fn put(&self, key: &str, value: V) -> Result<(), RecordStoreError>;

    fn get(&self, key: &str) -> Result<V, RecordStoreError>;

    fn remove(&self, key: &str) -> Result<(), RecordStoreError>;

    /// Current record under `key`, then the record again after every change.
    fn observe(&self, key: &str) -> BoxStream<'static, Option<V>>;

    /// Like [`RecordStore::observe`] for several keys, in the given order.
    fn observe_many(&self, keys: &[String]) -> BoxStream<'static, Vec<Option<V>>>;
}

#[derive(Debug)]
pub struct InMemoryRecordStore<V> {
    data: Arc<RwLock<HashMap<String, V>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl<V> Clone for InMemoryRecordStore<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<V> Default for InMemoryRecordStore<V> {
    fn default() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            revision: Arc::new(revision),
        }
    }
}

impl<V> InMemoryRecordStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn watch<T, F>(&self, snapshot: F) -> BoxStream<'static, T>
    where
        T: Send + 'static,
        F: Fn(&HashMap<String, V>) -> T + Send + Sync + 'static,
    {
        let rx = self.revision.subscribe();
        let data = Arc::clone(&self.data);
        futures::stream::unfold(
            (rx, data, snapshot, true),
            |(mut rx, data, snapshot, first)| async move {
                if !first {
                    rx.changed().await.ok()?;
                }
                rx.borrow_and_update();
                let item = match data.read() {
                    Ok(records) => snapshot(&records),
                    Err(_) => {
                        warn!("record store lock poisoned; ending observation");
                        return None;
                    }
                };
                Some((item, (rx, data, snapshot, false)))
            },
        )
        .boxed()
    }
}

impl<V> RecordStore<V> for InMemoryRecordStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn put(&self, key: &str, value: V) -> Result<(), RecordStoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| RecordStoreError::Backend("poisoned lock".to_owned()))?;
        data.insert(key.to_owned(), value);
        drop(data);
        self.bump();
        Ok(())
    }

    fn get(&self, key: &str) -> Result<V, RecordStoreError> {
        let data = self
            .data
            .read()
            .map_err(|_| RecordStoreError::Backend("poisoned lock".to_owned()))?;
        data.get(key).cloned().ok_or(RecordStoreError::NotFound)
    }

    fn remove(&self, key: &str) -> Result<(), RecordStoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| RecordStoreError::Backend("poisoned lock".to_owned()))?;
        if data.remove(key).is_none() {
            return Err(RecordStoreError::NotFound);
        }
        drop(data);
        self.bump();
        Ok(())
    }

    fn observe(&self, key: &str) -> BoxStream<'static, Option<V>> {
        let key = key.to_owned();
        self.watch(move |records| records.get(&key).cloned())
    }

    fn observe_many(&self, keys: &[String]) -> BoxStream<'static, Vec<Option<V>>> {
        let keys = keys.to_vec();
        self.watch(move |records| keys.iter().map(|key| records.get(key).cloned()).collect())
    }
}

/// Prefixes every key with a scope so several owners can share one store.
#[derive(Debug, Clone)]
pub struct ScopedRecordStore<S> {
    inner: S,
    scope: String,
}

impl<S> ScopedRecordStore<S> {
    pub fn new(inner: S, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
        }
    }

    fn scoped_key(&self, key: &str) -> String {
        format!("{}:{key}", self.scope)
    }
}

impl<V, S: RecordStore<V>> RecordStore<V> for ScopedRecordStore<S> {
    fn put(&self, key: &str, value: V) -> Result<(), RecordStoreError> {
        self.inner.put(&self.scoped_key(key), value)
    }

    fn get(&self, key: &str) -> Result<V, RecordStoreError> {
        self.inner.get(&self.scoped_key(key))
    }

    fn remove(&self, key: &str) -> Result<(), RecordStoreError> {
        self.inner.remove(&self.scoped_key(key))
    }

    fn observe(&self, key: &str) -> BoxStream<'static, Option<V>> {
        self.inner.observe(&self.scoped_key(key))
    }

    fn observe_many(&self, keys: &[String]) -> BoxStream<'static, Vec<Option<V>>> {
        let keys: Vec<String> = keys.iter().map(|key| self.scoped_key(key)).collect();
        self.inner.observe_many(&keys)
    }
}
