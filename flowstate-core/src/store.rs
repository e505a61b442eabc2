use crate::types::{WorkflowDefinition, WorkflowInstance};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence trait for the two durable collections.
///
/// The service operates exclusively through this trait, enabling pluggable
/// backends (MemoryStore for tests and POC, JsonFileStore for the server).
/// Save calls replace the full collection; loads return everything
/// previously stored, or an empty collection when nothing has been stored
/// yet.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn load_definitions(&self) -> Result<Vec<WorkflowDefinition>>;
    async fn save_definitions(&self, definitions: &[WorkflowDefinition]) -> Result<()>;

    async fn load_instances(&self) -> Result<Vec<WorkflowInstance>>;
    async fn save_instances(&self, instances: &[WorkflowInstance]) -> Result<()>;
}
