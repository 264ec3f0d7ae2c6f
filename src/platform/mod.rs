pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch every open Dependabot alert for the repository, as raw JSON.
    async fn list_open_alerts(&self) -> Result<Vec<serde_json::Value>>;
}
