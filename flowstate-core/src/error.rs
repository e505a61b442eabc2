//! Typed failure model for the engine and its operation surface.
//!
//! Every way an operation can fail maps to exactly one `EngineError`
//! variant, so transport callers branch on kind instead of parsing
//! message text. Variants are serde-tagged for the wire.

use crate::validate::ValidationIssue;
use serde::{Deserialize, Serialize};

/// All operation failure modes.
///
/// Lookup failures (`WorkflowNotFound`, `InstanceNotFound`, `ActionNotFound`)
/// name a missing entity; state failures describe a transition the current
/// configuration forbids; `Rejected` carries the full validator diagnostic;
/// `StoreFailed` surfaces a persistence failure instead of reporting an
/// unsaved mutation as success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineError {
    #[error("Workflow with id '{workflow_id}' not found.")]
    WorkflowNotFound { workflow_id: String },

    #[error("Instance with id '{instance_id}' not found.")]
    InstanceNotFound { instance_id: String },

    #[error("Action '{action_id}' not found in workflow.")]
    ActionNotFound { action_id: String },

    #[error("Action '{action_id}' is disabled.")]
    ActionDisabled { action_id: String },

    #[error("Current state '{state_id}' not found in workflow states.")]
    CurrentStateNotFound { state_id: String },

    #[error("Current state '{state_id}' is disabled.")]
    CurrentStateDisabled { state_id: String },

    #[error("Action '{action_id}' cannot be executed from current state '{current_state}'.")]
    ActionNotApplicable {
        action_id: String,
        current_state: String,
    },

    #[error("Cannot execute actions from final state '{state_id}'.")]
    CurrentStateIsFinal { state_id: String },

    #[error("Workflow '{workflow_id}' has no states defined.")]
    NoStatesDefined { workflow_id: String },

    #[error("Workflow '{workflow_id}' does not have an initial state.")]
    NoInitialState { workflow_id: String },

    #[error("Workflow definition rejected: {}", issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
    Rejected { issues: Vec<ValidationIssue> },

    #[error("Persistence failure: {reason}")]
    StoreFailed { reason: String },
}

impl EngineError {
    pub fn store_failed(err: anyhow::Error) -> Self {
        EngineError::StoreFailed {
            reason: format!("{err:#}"),
        }
    }
}
