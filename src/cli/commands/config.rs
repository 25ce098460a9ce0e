use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};

/// Effective configuration after files and environment overrides
pub struct ConfigCommand;

impl Command for ConfigCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        println!("# Effective configuration (root: {})", ctx.root.display());
        print!("{}", ctx.config.to_toml()?);
        Ok(CommandStatus::Success)
    }
}
