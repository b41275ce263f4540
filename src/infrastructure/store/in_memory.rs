use crate::constants::limits::MAX_TRANSACTION_RETRIES;
use crate::core::errors::AkahidegnError;
use crate::infrastructure::store::{RealtimeStore, TransactionOutcome, TransactionStep};
use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// JSON tree kept in memory. Transactions are optimistic: the update function
/// runs against a snapshot and the result is only written if the path is
/// still unchanged, otherwise it runs again.
#[derive(Clone)]
pub struct InMemoryStore {
    root: Arc<RwLock<Value>>,
    denied_writes: Arc<RwLock<Vec<String>>>,
    offline: Arc<AtomicBool>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            root: Arc::new(RwLock::new(Value::Object(Map::new()))),
            denied_writes: Arc::new(RwLock::new(Vec::new())),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Rejects writes touching `path` (it, its ancestors or descendants) with
    /// a permission error, the way a security rule would.
    pub async fn deny_writes(&self, path: &str) {
        self.denied_writes.write().await.push(path.trim_matches('/').to_string());
    }

    pub async fn allow_all_writes(&self) {
        self.denied_writes.write().await.clear();
    }

    /// While offline every operation fails with a store error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), AkahidegnError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AkahidegnError::StoreError("network unavailable".to_string()));
        }
        Ok(())
    }

    async fn ensure_writable(&self, path: &str) -> Result<(), AkahidegnError> {
        let target = segments(path);
        let denied = self.denied_writes.read().await;
        if denied.iter().any(|rule| overlaps(&segments(rule), &target)) {
            return Err(AkahidegnError::PermissionDenied(format!("write to {} denied", path)));
        }
        Ok(())
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn overlaps(a: &[&str], b: &[&str]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for segment in path {
        node = node.as_object()?.get(*segment)?;
    }
    (!node.is_null()).then_some(node)
}

// Null removes; emptied parent objects are pruned.
fn write_at(node: &mut Value, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        if value.is_null() {
            map.remove(*head);
        } else {
            map.insert(head.to_string(), value);
        }
        return;
    }
    let child = map.entry(head.to_string()).or_insert(Value::Null);
    write_at(child, rest, value);
    let prune = child.is_null() || child.as_object().is_some_and(|m| m.is_empty());
    if prune {
        map.remove(*head);
    }
}

#[async_trait]
impl RealtimeStore for InMemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, AkahidegnError> {
        self.ensure_online()?;
        let root = self.root.read().await;
        Ok(value_at(&root, &segments(path)).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), AkahidegnError> {
        self.ensure_online()?;
        self.ensure_writable(path).await?;
        let mut root = self.root.write().await;
        write_at(&mut root, &segments(path), value);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), AkahidegnError> {
        self.set(path, Value::Null).await
    }

    async fn push_key(&self, _path: &str) -> Result<String, AkahidegnError> {
        self.ensure_online()?;
        Ok(format!("-{}", Uuid::new_v4().simple()))
    }

    async fn transaction<F>(&self, path: &str, update: F) -> Result<TransactionOutcome, AkahidegnError>
    where
        F: Fn(Option<Value>) -> TransactionStep + Send + Sync,
    {
        self.ensure_online()?;
        let target = segments(path);
        for attempt in 1..=MAX_TRANSACTION_RETRIES {
            let current = {
                let root = self.root.read().await;
                value_at(&root, &target).cloned()
            };
            let next = match update(current.clone()) {
                TransactionStep::Abort => {
                    return Ok(TransactionOutcome {
                        committed: false,
                        snapshot: current,
                    });
                }
                TransactionStep::Commit(next) => next,
            };
            self.ensure_writable(path).await?;
            let mut root = self.root.write().await;
            if value_at(&root, &target) != current.as_ref() {
                debug!("Transaction on {} conflicted on attempt {}, retrying", path, attempt);
                continue;
            }
            write_at(&mut root, &target, next.clone());
            return Ok(TransactionOutcome {
                committed: true,
                snapshot: (!next.is_null()).then_some(next),
            });
        }
        Err(AkahidegnError::TransactionConflict(path.to_string()))
    }
}
