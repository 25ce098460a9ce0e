use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};
use crate::migration::{MigrationMode, MigrationTool};

pub struct MigrateCommand {
    pub project: String,
    pub session: String,
    pub execute: bool,
}

impl MigrateCommand {
    pub fn new(project: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            session: session.into(),
            execute: false,
        }
    }

    pub fn with_execute(mut self, execute: bool) -> Self {
        self.execute = execute;
        self
    }
}

impl Command for MigrateCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let tool = MigrationTool::new(ctx.resolver(), &ctx.config.paths.feedback_dir);
        let outcome = tool.migrate(&self.project, &self.session, self.execute)?;

        let (verb, icon) = match outcome.mode {
            MigrationMode::Execute => ("Copied", "🚚"),
            MigrationMode::DryRun => ("Would copy", "🔍"),
        };
        println!(
            "{icon} Migration ({}) {}/{}",
            outcome.mode, outcome.project, outcome.session
        );
        for entry in &outcome.copied {
            println!(
                "   {verb}: {} → {}",
                entry.legacy_path.display(),
                entry.canonical_path.display()
            );
        }
        for conflict in &outcome.conflicts {
            println!(
                "⚠️  Kept existing {} ({})",
                conflict.entry.canonical_path.display(),
                if conflict.identical { "identical" } else { "differs from legacy" }
            );
        }
        println!(
            "📊 {} {verb_lower}, {} conflicts, {} missing",
            outcome.copied.len(),
            outcome.conflicts.len(),
            outcome.missing.len(),
            verb_lower = verb.to_lowercase()
        );
        println!("📄 Audit: {}", outcome.audit_file.display());
        if outcome.mode == MigrationMode::DryRun {
            println!("💡 Re-run with --execute to copy files");
        }
        Ok(CommandStatus::Success)
    }
}
