use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};
use crate::layout::ArtifactKind;
use crate::session::project_status;

pub struct StatusCommand {
    pub project: String,
    pub json: bool,
}

impl StatusCommand {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for StatusCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let status = project_status(
            &ctx.resolver(),
            &self.project,
            &ctx.config.compliance.placeholder_marker,
        )?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(CommandStatus::Success);
        }

        println!("📁 PROJECT {}", status.project);
        println!("==================");
        match &status.current_session {
            Some(session) => println!("👉 Current session: {session}"),
            None => println!("👉 Current session: none"),
        }
        if status.sessions.is_empty() {
            println!("ℹ️  No sessions yet");
        }
        for session in &status.sessions {
            let marker = if session.is_current { "*" } else { " " };
            let kind = if session.is_blueprint { " (blueprint)" } else { "" };
            println!(
                "{marker} {}{kind}  owner: {}  artifacts: {}/{}",
                session.session_id,
                session.owner.as_deref().unwrap_or("unknown"),
                session.complete_count(),
                ArtifactKind::ALL.len()
            );
            for artifact in session.artifacts.iter().filter(|a| !a.exists || a.placeholders > 0) {
                let state = if artifact.exists {
                    format!("{} placeholder(s)", artifact.placeholders)
                } else {
                    "missing".to_string()
                };
                println!("    - {}: {state}", artifact.artifact.key());
            }
        }
        Ok(CommandStatus::Success)
    }
}
