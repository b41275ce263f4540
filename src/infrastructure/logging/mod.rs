pub mod in_memory;

use crate::core::errors::AkahidegnError;
use crate::core::models::audit::AppLog;
use async_trait::async_trait;

#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<(), AkahidegnError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, AkahidegnError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<AppLog>, AkahidegnError>;
}
