use crate::store::CollectionStore;
use crate::types::{WorkflowDefinition, WorkflowInstance};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory CollectionStore for testing and POC wiring.
pub struct MemoryStore {
    definitions: RwLock<Vec<WorkflowDefinition>>,
    instances: RwLock<Vec<WorkflowInstance>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(Vec::new()),
            instances: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load_definitions(&self) -> Result<Vec<WorkflowDefinition>> {
        let definitions = self.definitions.read().map_err(|e| anyhow!("Lock: {e}"))?;
        Ok(definitions.clone())
    }

    async fn save_definitions(&self, definitions: &[WorkflowDefinition]) -> Result<()> {
        let mut slot = self.definitions.write().map_err(|e| anyhow!("Lock: {e}"))?;
        *slot = definitions.to_vec();
        Ok(())
    }

    async fn load_instances(&self) -> Result<Vec<WorkflowInstance>> {
        let instances = self.instances.read().map_err(|e| anyhow!("Lock: {e}"))?;
        Ok(instances.clone())
    }

    async fn save_instances(&self, instances: &[WorkflowInstance]) -> Result<()> {
        let mut slot = self.instances.write().map_err(|e| anyhow!("Lock: {e}"))?;
        *slot = instances.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::State;

    #[tokio::test]
    async fn save_load_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_definitions().await.unwrap().is_empty());

        let def = WorkflowDefinition {
            id: "wf1".to_string(),
            states: vec![State {
                id: "only".to_string(),
                is_initial: true,
                is_final: false,
                enabled: true,
            }],
            actions: vec![],
        };
        store.save_definitions(&[def.clone()]).await.unwrap();

        let loaded = store.load_definitions().await.unwrap();
        assert_eq!(loaded, vec![def]);
    }

    #[tokio::test]
    async fn save_replaces_prior_contents() {
        let store = MemoryStore::new();
        let instance = WorkflowInstance::new("wf1", "new");
        store.save_instances(&[instance.clone()]).await.unwrap();
        store.save_instances(&[]).await.unwrap();
        assert!(store.load_instances().await.unwrap().is_empty());
    }
}
