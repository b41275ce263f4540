pub mod in_memory;
pub mod preference_keys;

use crate::core::errors::AkahidegnError;
use async_trait::async_trait;

/// Small per-device key-value persistence.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_string(&self, key: &str) -> Result<Option<String>, AkahidegnError>;
    async fn put_string(&self, key: &str, value: &str) -> Result<(), AkahidegnError>;
    async fn get_list(&self, key: &str) -> Result<Vec<String>, AkahidegnError>;
    async fn put_list(&self, key: &str, values: Vec<String>) -> Result<(), AkahidegnError>;
}
