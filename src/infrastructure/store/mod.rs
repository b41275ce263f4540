pub mod in_memory;
pub mod paths;

use crate::core::errors::AkahidegnError;
use async_trait::async_trait;
use serde_json::Value;

/// What a transaction update function decides for the value it was shown.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStep {
    Commit(Value),
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub committed: bool,
    /// The committed value, or the last value the update function saw when it
    /// aborted. `None` when nothing is stored at the path.
    pub snapshot: Option<Value>,
}

/// A hierarchical JSON document store addressed by `/`-separated paths.
///
/// Writing `Value::Null` at a path removes it.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, AkahidegnError>;
    async fn set(&self, path: &str, value: Value) -> Result<(), AkahidegnError>;
    async fn remove(&self, path: &str) -> Result<(), AkahidegnError>;
    /// Allocates a fresh child key under `path` without writing anything.
    async fn push_key(&self, path: &str) -> Result<String, AkahidegnError>;
    /// Atomic read-modify-write of `path`. `update` may run several times if
    /// other writers touch the path in between; it must not have side effects.
    async fn transaction<F>(&self, path: &str, update: F) -> Result<TransactionOutcome, AkahidegnError>
    where
        F: Fn(Option<Value>) -> TransactionStep + Send + Sync;
}
