//! Structural validation of candidate workflow definitions.
//!
//! Runs every check and collects every violation, so one submission
//! surfaces the complete diagnostic instead of requiring repeated
//! round-trips. Validation never mutates and never persists.

use crate::types::WorkflowDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One structural violation in a candidate definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("Workflow with id '{workflow_id}' already exists.")]
    DuplicateWorkflowId { workflow_id: String },

    #[error("Workflow must have exactly one state with isInitial = true, found {count}.")]
    InvalidInitialStateCount { count: usize },

    #[error("Duplicate state IDs found: {}", state_ids.join(", "))]
    DuplicateStateIds { state_ids: Vec<String> },

    #[error("Action '{action_id}' references unknown states: {}", state_ids.join(", "))]
    InvalidActionReference {
        action_id: String,
        state_ids: Vec<String>,
    },
}

/// Validate a candidate definition against the already-registered set.
/// Returns all issues found; empty means accepted.
pub fn validate_definition(
    candidate: &WorkflowDefinition,
    existing: &[WorkflowDefinition],
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    // Identity conflict — id collision is binary, first match wins.
    if existing.iter().any(|w| w.id == candidate.id) {
        issues.push(ValidationIssue::DuplicateWorkflowId {
            workflow_id: candidate.id.clone(),
        });
    }

    // Exactly one initial state.
    let initial_count = candidate.states.iter().filter(|s| s.is_initial).count();
    if initial_count != 1 {
        issues.push(ValidationIssue::InvalidInitialStateCount {
            count: initial_count,
        });
    }

    // State id uniqueness — one issue listing every duplicate, in order
    // of first appearance.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for state in &candidate.states {
        if !seen.insert(state.id.as_str()) && !duplicates.iter().any(|d| d == &state.id) {
            duplicates.push(state.id.clone());
        }
    }
    if !duplicates.is_empty() {
        issues.push(ValidationIssue::DuplicateStateIds {
            state_ids: duplicates,
        });
    }

    // Action reference soundness — unknown references aggregated per action.
    let known: HashSet<&str> = candidate.states.iter().map(|s| s.id.as_str()).collect();
    for action in &candidate.actions {
        let mut invalid: Vec<String> = Vec::new();
        if !known.contains(action.to_state.as_str()) {
            invalid.push(action.to_state.clone());
        }
        for from in &action.from_states {
            if !known.contains(from.as_str()) && !invalid.iter().any(|i| i == from) {
                invalid.push(from.clone());
            }
        }
        if !invalid.is_empty() {
            issues.push(ValidationIssue::InvalidActionReference {
                action_id: action.id.clone(),
                state_ids: invalid,
            });
        }
    }

    issues
}
