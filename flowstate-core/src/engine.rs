//! The instance transition engine.
//!
//! A pure transition function over (instance, action): no background
//! execution, no timers, no automatic transitions — every move is
//! caller-initiated. The validator establishes definition invariants at
//! acceptance time; the engine still guards against corrupted or
//! concurrently-modified data rather than assuming them.

use crate::error::EngineError;
use crate::types::{TransitionOutcome, TransitionRecord, WorkflowDefinition, WorkflowInstance};
use chrono::Utc;

/// Create a fresh instance of `definition`, positioned at its initial state.
///
/// `NoStatesDefined` and `NoInitialState` should be unreachable for a
/// definition the validator accepted, but the engine must not crash on
/// stored data that violates them.
pub fn start(definition: &WorkflowDefinition) -> Result<WorkflowInstance, EngineError> {
    if definition.states.is_empty() {
        return Err(EngineError::NoStatesDefined {
            workflow_id: definition.id.clone(),
        });
    }
    let initial = definition
        .initial_state()
        .ok_or_else(|| EngineError::NoInitialState {
            workflow_id: definition.id.clone(),
        })?;
    Ok(WorkflowInstance::new(&definition.id, &initial.id))
}

/// Advance `instance` by applying `action_id` under `definition`.
///
/// Guards are evaluated in a fixed order, each short-circuiting with a
/// distinct error:
/// 1. the action must exist,
/// 2. the action must be enabled,
/// 3. the current state must resolve within the definition,
/// 4. the current state must be enabled,
/// 5. the action's `from_states` must contain the current state,
/// 6. the current state must not be final.
///
/// Final states permit no outgoing transition even if an action's
/// `from_states` erroneously lists them — this holds regardless of how the
/// definition was authored or whether validation was bypassed.
///
/// On success the current state moves to `action.to_state` and a record is
/// appended to the instance's history.
pub fn trigger(
    instance: &mut WorkflowInstance,
    definition: &WorkflowDefinition,
    action_id: &str,
) -> Result<TransitionOutcome, EngineError> {
    let action = definition
        .find_action(action_id)
        .ok_or_else(|| EngineError::ActionNotFound {
            action_id: action_id.to_string(),
        })?;

    if !action.enabled {
        return Err(EngineError::ActionDisabled {
            action_id: action.id.clone(),
        });
    }

    let current =
        definition
            .find_state(&instance.current_state)
            .ok_or_else(|| EngineError::CurrentStateNotFound {
                state_id: instance.current_state.clone(),
            })?;

    if !current.enabled {
        return Err(EngineError::CurrentStateDisabled {
            state_id: current.id.clone(),
        });
    }

    if !action.from_states.iter().any(|s| s == &instance.current_state) {
        return Err(EngineError::ActionNotApplicable {
            action_id: action.id.clone(),
            current_state: instance.current_state.clone(),
        });
    }

    if current.is_final {
        return Err(EngineError::CurrentStateIsFinal {
            state_id: current.id.clone(),
        });
    }

    let old_state = instance.current_state.clone();
    instance.current_state = action.to_state.clone();
    instance.history.push(TransitionRecord {
        action: action.id.clone(),
        from: old_state.clone(),
        to: action.to_state.clone(),
        timestamp: Utc::now(),
    });

    Ok(TransitionOutcome {
        action: action.id.clone(),
        from: old_state,
        to: action.to_state.clone(),
    })
}
