use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};
use crate::governance::TransitionResult;

pub struct StageCommand {
    pub actor: String,
    pub stage: String,
}

impl StageCommand {
    pub fn new(actor: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            stage: stage.into(),
        }
    }
}

impl Command for StageCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        match ctx.protocol()?.stage_change(&self.actor, &self.stage)? {
            TransitionResult::Applied { state, .. } => {
                println!("🎯 Stage set to {}", state.active_stage)
            }
            TransitionResult::NoOp { message, .. } => println!("ℹ️  {message}"),
        }
        Ok(CommandStatus::Success)
    }
}
