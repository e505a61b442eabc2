use crate::store::CollectionStore;
use crate::types::{WorkflowDefinition, WorkflowInstance};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const WORKFLOWS_FILE: &str = "workflows.json";
const INSTANCES_FILE: &str = "instances.json";

/// JSON-file CollectionStore: one pretty-printed file per collection
/// under a data directory.
///
/// A missing file reads as an empty collection (first boot). A file that
/// exists but cannot be read or parsed is an error — silently treating it
/// as empty would wipe prior data on the next save.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn load_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    async fn save_list<T: Serialize>(&self, file: &str, data: &[T]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(data).context("serializing collection")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), count = data.len(), "collection persisted");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load_definitions(&self) -> Result<Vec<WorkflowDefinition>> {
        self.load_list(WORKFLOWS_FILE).await
    }

    async fn save_definitions(&self, definitions: &[WorkflowDefinition]) -> Result<()> {
        self.save_list(WORKFLOWS_FILE, definitions).await
    }

    async fn load_instances(&self) -> Result<Vec<WorkflowInstance>> {
        self.load_list(INSTANCES_FILE).await
    }

    async fn save_instances(&self, instances: &[WorkflowInstance]) -> Result<()> {
        self.save_list(INSTANCES_FILE, instances).await
    }
}
