use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};
use crate::governance::TransitionResult;

pub struct AcknowledgeCommand {
    pub actor: String,
}

impl AcknowledgeCommand {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }
}

impl Command for AcknowledgeCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        match ctx.protocol()?.acknowledge(&self.actor)? {
            TransitionResult::Applied { state, .. } => {
                println!("📬 Handoff acknowledged by {}", state.active_actor);
                println!("🆔 Cycle: {}", state.handoff_cycle_id);
                println!("🎯 Stage: {}", state.active_stage);
            }
            TransitionResult::NoOp { message, .. } => {
                println!("ℹ️  {message}");
            }
        }
        Ok(CommandStatus::Success)
    }
}
