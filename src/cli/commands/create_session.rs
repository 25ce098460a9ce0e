use anyhow::Result;

use super::{Command, CommandContext, CommandStatus};
use crate::session::{SessionScaffolder, BLUEPRINT_SESSION};

pub struct CreateSessionCommand {
    pub project: String,
    pub session: String,
    pub owner: String,
    pub json: bool,
}

impl CreateSessionCommand {
    pub fn new(project: impl Into<String>, session: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            session: session.into(),
            owner: owner.into(),
            json: false,
        }
    }

    /// The project's meta session; never moves the session pointers
    pub fn blueprint(project: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::new(project, BLUEPRINT_SESSION, owner)
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for CreateSessionCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let scaffolder = SessionScaffolder::new(ctx.resolver(), &ctx.config.paths.feedback_dir);
        let record = if self.session == BLUEPRINT_SESSION {
            scaffolder.create_blueprint(&self.project, &self.owner)?
        } else {
            scaffolder.create(&self.project, &self.session, &self.owner)?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
            return Ok(CommandStatus::Success);
        }

        println!(
            "📁 Session {}/{} ready (owner: {})",
            record.project, record.session_id, record.owner
        );
        println!("📂 Root: {}", record.session_root.display());
        for (stage, path) in &record.canonical_paths {
            println!("   {:<15} {}", stage.dir_name(), path.display());
        }
        if record.is_blueprint {
            println!("ℹ️  Blueprint session: CURRENT_SESSION and stage pointers left unchanged");
        } else {
            println!("👉 CURRENT_SESSION and stage pointers now target {}", record.session_id);
        }
        println!("📝 Project README: {}", record.project_readme.display());
        println!("📄 Audit: {}", record.audit_file.display());
        Ok(CommandStatus::Success)
    }
}
