use crate::core::errors::AkahidegnError;
use crate::infrastructure::preferences::PreferenceStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryPreferences {
    strings: Arc<RwLock<HashMap<String, String>>>,
    lists: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        InMemoryPreferences {
            strings: Arc::new(RwLock::new(HashMap::new())),
            lists: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferences {
    async fn get_string(&self, key: &str) -> Result<Option<String>, AkahidegnError> {
        let strings = self.strings.read().await;
        Ok(strings.get(key).cloned())
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<(), AkahidegnError> {
        let mut strings = self.strings.write().await;
        strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_list(&self, key: &str) -> Result<Vec<String>, AkahidegnError> {
        let lists = self.lists.read().await;
        Ok(lists.get(key).cloned().unwrap_or_default())
    }

    async fn put_list(&self, key: &str, values: Vec<String>) -> Result<(), AkahidegnError> {
        let mut lists = self.lists.write().await;
        lists.insert(key.to_string(), values);
        Ok(())
    }
}
