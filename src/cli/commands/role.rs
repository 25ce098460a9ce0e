use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};
use crate::governance::TransitionResult;

pub struct RoleCommand {
    pub actor: String,
    pub role: String,
    pub reason: Option<String>,
}

impl RoleCommand {
    pub fn new(actor: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            role: role.into(),
            reason: None,
        }
    }

    /// Words of the reason as given on the command line; empty means default
    pub fn with_reason(mut self, words: Vec<String>) -> Self {
        let reason = words.join(" ");
        self.reason = if reason.trim().is_empty() {
            None
        } else {
            Some(reason)
        };
        self
    }
}

impl Command for RoleCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let result = ctx
            .protocol()?
            .role_change(&self.actor, &self.role, self.reason.as_deref())?;

        match result {
            TransitionResult::Applied { state, .. } => {
                if let Some(event) = &state.role_change_event {
                    println!("🎭 Role: {} → {}", event.from, event.to);
                    println!("📜 {}", event.reason);
                }
            }
            TransitionResult::NoOp { message, .. } => println!("ℹ️  {message}"),
        }
        Ok(CommandStatus::Success)
    }
}
