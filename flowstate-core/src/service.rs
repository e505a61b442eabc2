//! The operation surface a transport layer invokes.
//!
//! `WorkflowService` owns both collections for the process lifetime and
//! serializes access to them: every mutating operation holds the relevant
//! write lock across both the in-memory mutation and the persistence
//! write, so a racing operation can never clobber a newer save with a
//! stale snapshot. Reads take the read lock and observe a consistent
//! snapshot. Mutations are staged on a copy and committed only after the
//! durable write succeeds — a persistence failure surfaces as
//! `StoreFailed` and leaves the in-memory state untouched.

use crate::engine;
use crate::error::EngineError;
use crate::store::CollectionStore;
use crate::types::{TransitionOutcome, WorkflowDefinition, WorkflowInstance};
use crate::validate::validate_definition;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub struct WorkflowService {
    store: Arc<dyn CollectionStore>,
    // Lock order: definitions before instances, everywhere.
    definitions: RwLock<Vec<WorkflowDefinition>>,
    instances: RwLock<Vec<WorkflowInstance>>,
}

impl WorkflowService {
    /// Load both collections from the store once at startup.
    pub async fn load(store: Arc<dyn CollectionStore>) -> Result<Self> {
        let definitions = store.load_definitions().await?;
        let instances = store.load_instances().await?;
        info!(
            definitions = definitions.len(),
            instances = instances.len(),
            "workflow service loaded"
        );
        Ok(Self {
            store,
            definitions: RwLock::new(definitions),
            instances: RwLock::new(instances),
        })
    }

    // ── Definitions ──

    /// Validate and register a new workflow definition. The candidate is
    /// stored unchanged; rejection carries the complete diagnostic.
    pub async fn create_workflow(&self, definition: WorkflowDefinition) -> Result<(), EngineError> {
        let mut definitions = self.definitions.write().await;

        let issues = validate_definition(&definition, &definitions);
        if !issues.is_empty() {
            return Err(EngineError::Rejected { issues });
        }

        let mut next = definitions.clone();
        next.push(definition.clone());
        self.store
            .save_definitions(&next)
            .await
            .map_err(EngineError::store_failed)?;
        *definitions = next;

        info!(workflow_id = %definition.id, "workflow definition created");
        Ok(())
    }

    pub async fn list_workflows(&self) -> Vec<WorkflowDefinition> {
        self.definitions.read().await.clone()
    }

    pub async fn get_workflow(&self, id: &str) -> Result<WorkflowDefinition, EngineError> {
        self.definitions
            .read()
            .await
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| EngineError::WorkflowNotFound {
                workflow_id: id.to_string(),
            })
    }

    // ── Instances ──

    /// Start a new instance of the identified definition. Returns the
    /// generated instance id.
    pub async fn start_instance(&self, workflow_id: &str) -> Result<String, EngineError> {
        let definitions = self.definitions.read().await;
        let mut instances = self.instances.write().await;

        let definition = definitions
            .iter()
            .find(|w| w.id == workflow_id)
            .ok_or_else(|| EngineError::WorkflowNotFound {
                workflow_id: workflow_id.to_string(),
            })?;

        let instance = engine::start(definition)?;
        let instance_id = instance.id.clone();

        let mut next = instances.clone();
        next.push(instance);
        self.store
            .save_instances(&next)
            .await
            .map_err(EngineError::store_failed)?;
        *instances = next;

        info!(%workflow_id, %instance_id, "instance started");
        Ok(instance_id)
    }

    /// Advance an instance by triggering an action against its live
    /// definition.
    pub async fn trigger_action(
        &self,
        instance_id: &str,
        action_id: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        let definitions = self.definitions.read().await;
        let mut instances = self.instances.write().await;

        let mut next = instances.clone();
        let instance = next
            .iter_mut()
            .find(|i| i.id == instance_id)
            .ok_or_else(|| EngineError::InstanceNotFound {
                instance_id: instance_id.to_string(),
            })?;

        // Orphaned reference defense: the instance's definition must still
        // resolve.
        let definition = definitions
            .iter()
            .find(|w| w.id == instance.workflow_id)
            .ok_or_else(|| EngineError::WorkflowNotFound {
                workflow_id: instance.workflow_id.clone(),
            })?;

        let outcome = engine::trigger(instance, definition, action_id)?;

        self.store
            .save_instances(&next)
            .await
            .map_err(EngineError::store_failed)?;
        *instances = next;

        info!(
            %instance_id,
            action = %outcome.action,
            from = %outcome.from,
            to = %outcome.to,
            "instance transitioned"
        );
        Ok(outcome)
    }

    pub async fn get_instance(&self, id: &str) -> Result<WorkflowInstance, EngineError> {
        self.instances
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| EngineError::InstanceNotFound {
                instance_id: id.to_string(),
            })
    }

    pub async fn list_instances(&self) -> Vec<WorkflowInstance> {
        self.instances.read().await.clone()
    }

    pub async fn list_instances_by_workflow(&self, workflow_id: &str) -> Vec<WorkflowInstance> {
        self.instances
            .read()
            .await
            .iter()
            .filter(|i| i.workflow_id == workflow_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;
    use crate::types::{ActionTransition, State};
    use crate::validate::ValidationIssue;
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn state(id: &str, is_initial: bool, is_final: bool) -> State {
        State {
            id: id.to_string(),
            is_initial,
            is_final,
            enabled: true,
        }
    }

    fn action(id: &str, from: &[&str], to: &str) -> ActionTransition {
        ActionTransition {
            id: id.to_string(),
            from_states: from.iter().map(|s| s.to_string()).collect(),
            to_state: to.to_string(),
            enabled: true,
        }
    }

    fn order_definition() -> WorkflowDefinition {
        WorkflowDefinition {
            id: "order".to_string(),
            states: vec![
                state("new", true, false),
                state("shipped", false, false),
                state("done", false, true),
            ],
            actions: vec![
                action("ship", &["new"], "shipped"),
                action("close", &["shipped"], "done"),
            ],
        }
    }

    async fn service_with_order() -> WorkflowService {
        let service = WorkflowService::load(Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        service.create_workflow(order_definition()).await.unwrap();
        service
    }

    #[tokio::test]
    async fn create_and_get_workflow() {
        let service = service_with_order().await;
        let fetched = service.get_workflow("order").await.unwrap();
        assert_eq!(fetched, order_definition());
        assert_eq!(service.list_workflows().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_workflow_id_rejected() {
        let service = service_with_order().await;
        let err = service
            .create_workflow(order_definition())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Rejected {
                issues: vec![ValidationIssue::DuplicateWorkflowId {
                    workflow_id: "order".to_string()
                }]
            }
        );
        // Rejection persisted nothing.
        assert_eq!(service.list_workflows().await.len(), 1);
    }

    #[tokio::test]
    async fn two_initial_states_rejected() {
        let service = service_with_order().await;
        let mut bad = order_definition();
        bad.id = "order2".to_string();
        bad.states[1].is_initial = true;
        let err = service.create_workflow(bad).await.unwrap_err();
        match err {
            EngineError::Rejected { issues } => {
                assert!(issues.contains(&ValidationIssue::InvalidInitialStateCount { count: 2 }));
            }
            other => panic!("Expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_creates_instance_at_initial_state() {
        let service = service_with_order().await;
        let instance_id = service.start_instance("order").await.unwrap();

        let instance = service.get_instance(&instance_id).await.unwrap();
        assert_eq!(instance.workflow_id, "order");
        assert_eq!(instance.current_state, "new");
        assert!(instance.history.is_empty());
    }

    #[tokio::test]
    async fn start_unknown_workflow_fails() {
        let service = service_with_order().await;
        assert_eq!(
            service.start_instance("missing").await.unwrap_err(),
            EngineError::WorkflowNotFound {
                workflow_id: "missing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn trigger_round_trip_reflects_new_state_and_history() {
        let service = service_with_order().await;
        let instance_id = service.start_instance("order").await.unwrap();

        let outcome = service.trigger_action(&instance_id, "ship").await.unwrap();
        assert_eq!(outcome.from, "new");
        assert_eq!(outcome.to, "shipped");

        let instance = service.get_instance(&instance_id).await.unwrap();
        assert_eq!(instance.current_state, "shipped");
        assert_eq!(instance.history.len(), 1);
        assert_eq!(instance.history[0].action, "ship");
    }

    #[tokio::test]
    async fn repeated_action_fails_after_state_moved_on() {
        let service = service_with_order().await;
        let instance_id = service.start_instance("order").await.unwrap();
        service.trigger_action(&instance_id, "ship").await.unwrap();
        service.trigger_action(&instance_id, "close").await.unwrap();

        // Current state is now "done", not "shipped".
        assert_eq!(
            service
                .trigger_action(&instance_id, "close")
                .await
                .unwrap_err(),
            EngineError::ActionNotApplicable {
                action_id: "close".to_string(),
                current_state: "done".to_string(),
            }
        );
        // And "done" is final, so even a listed action is locked out.
        assert_eq!(
            service
                .trigger_action(&instance_id, "ship")
                .await
                .unwrap_err(),
            EngineError::ActionNotApplicable {
                action_id: "ship".to_string(),
                current_state: "done".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn trigger_on_unknown_instance_fails() {
        let service = service_with_order().await;
        assert_eq!(
            service.trigger_action("nope", "ship").await.unwrap_err(),
            EngineError::InstanceNotFound {
                instance_id: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn list_instances_by_workflow_filters() {
        let service = service_with_order().await;
        let mut second = order_definition();
        second.id = "returns".to_string();
        service.create_workflow(second).await.unwrap();

        service.start_instance("order").await.unwrap();
        service.start_instance("order").await.unwrap();
        service.start_instance("returns").await.unwrap();

        assert_eq!(service.list_instances().await.len(), 3);
        assert_eq!(service.list_instances_by_workflow("order").await.len(), 2);
        assert_eq!(service.list_instances_by_workflow("returns").await.len(), 1);
        assert!(service.list_instances_by_workflow("ghost").await.is_empty());
    }

    #[tokio::test]
    async fn collections_survive_reload_from_same_store() {
        let store = Arc::new(MemoryStore::new());
        let instance_id = {
            let service = WorkflowService::load(store.clone()).await.unwrap();
            service.create_workflow(order_definition()).await.unwrap();
            let id = service.start_instance("order").await.unwrap();
            service.trigger_action(&id, "ship").await.unwrap();
            id
        };

        let reloaded = WorkflowService::load(store).await.unwrap();
        let instance = reloaded.get_instance(&instance_id).await.unwrap();
        assert_eq!(instance.current_state, "shipped");
        assert_eq!(instance.history.len(), 1);
    }

    // ── Persistence failure surfacing ──

    /// Store whose saves always fail; loads succeed empty.
    struct FailingStore;

    #[async_trait]
    impl CollectionStore for FailingStore {
        async fn load_definitions(&self) -> Result<Vec<WorkflowDefinition>> {
            Ok(Vec::new())
        }
        async fn save_definitions(&self, _: &[WorkflowDefinition]) -> Result<()> {
            Err(anyhow!("disk full"))
        }
        async fn load_instances(&self) -> Result<Vec<WorkflowInstance>> {
            Ok(Vec::new())
        }
        async fn save_instances(&self, _: &[WorkflowInstance]) -> Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    #[tokio::test]
    async fn failed_save_surfaces_and_leaves_memory_unchanged() {
        let service = WorkflowService::load(Arc::new(FailingStore)).await.unwrap();
        let err = service
            .create_workflow(order_definition())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::StoreFailed { .. }));
        // The unsaved mutation must not appear to have succeeded.
        assert!(service.list_workflows().await.is_empty());
    }
}
