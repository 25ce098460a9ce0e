use std::path::PathBuf;
use thiserror::Error;

use super::types::Actor;

/// Errors raised by the governance state machine and its store
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Invalid actor identifier '{actor}'. Valid: {valid}")]
    InvalidActor { actor: String, valid: String },

    #[error("Permission denied for command '{command}': active actor is '{active}', caller is '{caller}'. Wait for a handoff or ask the active actor to hand off control.")]
    PermissionDenied {
        command: String,
        active: Actor,
        caller: Actor,
    },

    #[error("Current active actor is '{active}', not '{caller}'. Only the active actor can initiate a handoff.")]
    NotActive { active: Actor, caller: Actor },

    #[error("Cannot hand off from '{0}' to itself. Use a role change instead.")]
    SameActor(Actor),

    #[error("No handoff template for direction {from} -> {to}")]
    InvalidDirection { from: Actor, to: Actor },

    #[error("Invalid role '{role}'. Valid: {valid}")]
    InvalidRole { role: String, valid: String },

    #[error("Invalid stage '{stage}'. Valid: {valid}")]
    InvalidStage { stage: String, valid: String },

    #[error("State validation failed: {0}")]
    Validation(String),

    #[error("Malformed state file {}: {reason}", path.display())]
    MalformedState { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {reason}")]
    Lock { reason: String },
}
