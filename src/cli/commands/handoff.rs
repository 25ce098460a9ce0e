use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};

pub struct HandoffCommand {
    pub from: String,
    pub to: String,
    pub reason: String,
}

impl HandoffCommand {
    pub fn new(from: impl Into<String>, to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }
}

impl Command for HandoffCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let protocol = ctx.protocol()?;
        let receipt = protocol.handoff(&self.from, &self.to, &self.reason)?;

        println!("🔄 Handoff {} → {}", receipt.from, receipt.to);
        if receipt.superseded_pending {
            println!("⚠️  The previous handoff was never acknowledged; it has been superseded");
        }
        println!("✅ Active actor: {} (awaiting acknowledgment)", receipt.to);
        println!("🆔 Cycle: {}", receipt.cycle_id);
        println!("📄 Handoff document: {}", ctx.display_path(&receipt.document));
        println!();
        println!("Next: {} runs `idse-gov acknowledge --as {}`", receipt.to, receipt.to);
        Ok(CommandStatus::Success)
    }
}
