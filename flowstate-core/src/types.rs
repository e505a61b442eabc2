use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Definition side ──────────────────────────────────────────

/// A named node in a workflow definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: String,
    /// Entry point of the workflow. Exactly one per accepted definition.
    #[serde(default)]
    pub is_initial: bool,
    /// Terminal state — permits no outgoing transition.
    #[serde(default)]
    pub is_final: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// A directed transition usable from a set of source states to one target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTransition {
    pub id: String,
    /// Legal from any of these states.
    #[serde(default)]
    pub from_states: Vec<String>,
    pub to_state: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// A reusable workflow template: the full state and action space.
///
/// Definitions are immutable once accepted — there is no update or delete
/// operation, only creation and lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub actions: Vec<ActionTransition>,
}

impl WorkflowDefinition {
    pub fn find_state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    /// First match wins: if two actions share an id, the second is
    /// unreachable through this lookup.
    pub fn find_action(&self, id: &str) -> Option<&ActionTransition> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn initial_state(&self) -> Option<&State> {
        self.states.iter().find(|s| s.is_initial)
    }
}

// ─── Instance side ────────────────────────────────────────────

/// Success descriptor returned by a trigger: which action moved the
/// instance from where to where.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub action: String,
    pub from: String,
    pub to: String,
}

/// One recorded transition in an instance's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub action: String,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
}

/// A live, independently-progressing execution of a definition.
///
/// Holds only the definition id — the definition is re-resolved on every
/// operation, never owned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: String,
    pub workflow_id: String,
    pub current_state: String,
    /// Append-only, in trigger order.
    #[serde(default)]
    pub history: Vec<TransitionRecord>,
}

impl WorkflowInstance {
    pub fn new(workflow_id: &str, initial_state: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            current_state: initial_state.to_string(),
            history: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
