use crate::core::errors::AkahidegnError;
use crate::core::models::audit::AppLog;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        InMemoryLogging {
            logs: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<(), AkahidegnError> {
        if !details.is_object() {
            return Err(AkahidegnError::LoggingError(format!(
                "details for {} must be a JSON object",
                action
            )));
        }
        let mut logs = self.logs.write().await;
        logs.push(AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            group_id: group_id.map(String::from),
            details,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, AkahidegnError> {
        let logs = self.logs.read().await;
        Ok(logs.clone())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<AppLog>, AkahidegnError> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .filter(|log| log.group_id.as_deref() == Some(group_id))
            .cloned()
            .collect())
    }
}
