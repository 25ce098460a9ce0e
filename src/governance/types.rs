use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::GovernanceError;

/// One of the two cooperating agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    ClaudeCode,
    CodexGpt,
}

impl Actor {
    pub const ALL: [Actor; 2] = [Actor::ClaudeCode, Actor::CodexGpt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::ClaudeCode => "claude_code",
            Actor::CodexGpt => "codex_gpt",
        }
    }

    /// Short name used in handoff document directions
    pub fn short_name(&self) -> &'static str {
        match self {
            Actor::ClaudeCode => "claude",
            Actor::CodexGpt => "codex",
        }
    }

    pub fn other(&self) -> Actor {
        match self {
            Actor::ClaudeCode => Actor::CodexGpt,
            Actor::CodexGpt => Actor::ClaudeCode,
        }
    }

    pub fn valid_list() -> String {
        Self::ALL.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Actor {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|actor| actor.as_str() == s)
            .ok_or_else(|| GovernanceError::InvalidActor {
                actor: s.to_string(),
                valid: Self::valid_list(),
            })
    }
}

/// Working role an actor can take without handing off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Builder,
    Reviewer,
    Planner,
    Implementer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Builder, Role::Reviewer, Role::Planner, Role::Implementer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Builder => "builder",
            Role::Reviewer => "reviewer",
            Role::Planner => "planner",
            Role::Implementer => "implementer",
        }
    }

    /// Constitutional article governing the role
    pub fn article(&self) -> &'static str {
        match self {
            Role::Builder => "Article VII – Plan Before Build",
            Role::Reviewer => "Article IX – Feedback Incorporation",
            Role::Planner => "Article IV – Specification Integrity",
            Role::Implementer => "Article VIII – Implementation Discipline",
        }
    }

    pub fn default_reason(&self) -> String {
        format!("Switching to {} ({})", self.as_str(), self.article())
    }

    pub fn valid_list() -> String {
        Self::ALL.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GovernanceError::InvalidRole {
                role: s.to_string(),
                valid: Self::valid_list(),
            })
    }
}

/// Pipeline stage currently being worked on, in pipeline order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActiveStage {
    Intent,
    Context,
    Specification,
    Plan,
    Tasks,
    #[default]
    Implementation,
    Feedback,
}

impl ActiveStage {
    pub const ALL: [ActiveStage; 7] = [
        ActiveStage::Intent,
        ActiveStage::Context,
        ActiveStage::Specification,
        ActiveStage::Plan,
        ActiveStage::Tasks,
        ActiveStage::Implementation,
        ActiveStage::Feedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveStage::Intent => "Intent",
            ActiveStage::Context => "Context",
            ActiveStage::Specification => "Specification",
            ActiveStage::Plan => "Plan",
            ActiveStage::Tasks => "Tasks",
            ActiveStage::Implementation => "Implementation",
            ActiveStage::Feedback => "Feedback",
        }
    }

    pub fn valid_list() -> String {
        Self::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ActiveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveStage {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GovernanceError::InvalidStage {
                stage: s.to_string(),
                valid: Self::valid_list(),
            })
    }
}

/// Most recent role transition, independent of actor handoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleChangeEvent {
    /// Previous role, or `unspecified` when none was recorded
    pub from: String,
    pub to: Role,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub from: Actor,
    pub to: Actor,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

/// The persisted single-writer record shared by both actors.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceState {
    pub active_actor: Actor,
    pub awaiting_handoff: bool,
    pub handoff_cycle_id: String,
    pub active_stage: ActiveStage,
    pub role_change_event: Option<RoleChangeEvent>,
    pub last_handoff: Option<HandoffRecord>,
    pub last_checked: DateTime<Utc>,
}

/// Keys a persisted record must carry
pub const REQUIRED_STATE_FIELDS: [&str; 5] = [
    "active_actor",
    "awaiting_handoff",
    "handoff_cycle_id",
    "active_stage",
    "last_checked",
];

/// Phase of the handoff state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffPhase {
    Idle,
    AwaitingHandoff,
}

impl fmt::Display for HandoffPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffPhase::Idle => f.write_str("idle"),
            HandoffPhase::AwaitingHandoff => f.write_str("awaiting handoff"),
        }
    }
}

impl GovernanceState {
    /// Fresh record: codex_gpt active, nothing pending
    pub fn bootstrap(now: DateTime<Utc>) -> Self {
        Self {
            active_actor: Actor::CodexGpt,
            awaiting_handoff: false,
            handoff_cycle_id: super::protocol::format_cycle_id(now),
            active_stage: ActiveStage::default(),
            role_change_event: None,
            last_handoff: None,
            last_checked: now,
        }
    }

    pub fn phase(&self) -> HandoffPhase {
        if self.awaiting_handoff {
            HandoffPhase::AwaitingHandoff
        } else {
            HandoffPhase::Idle
        }
    }

    pub fn current_role(&self) -> Option<Role> {
        self.role_change_event.as_ref().map(|event| event.to)
    }

    /// Check invariants that the type system does not already enforce
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.handoff_cycle_id.trim().is_empty() {
            return Err(GovernanceError::Validation(
                "handoff_cycle_id must not be empty".to_string(),
            ));
        }

        if self.awaiting_handoff {
            match &self.last_handoff {
                Some(record) if record.to == self.active_actor => {}
                Some(record) => {
                    return Err(GovernanceError::Validation(format!(
                        "awaiting_handoff is set but last handoff targeted '{}' while '{}' is active",
                        record.to, self.active_actor
                    )));
                }
                None => {
                    return Err(GovernanceError::Validation(
                        "awaiting_handoff is set without a recorded handoff".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
