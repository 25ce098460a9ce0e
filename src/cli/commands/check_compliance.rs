use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use super::{print_report, report_status, Command, CommandContext, CommandStatus};
use crate::compliance::{ComplianceValidator, ValidationOptions};

pub struct CheckComplianceCommand {
    pub project: String,
    pub session: Option<String>,
    pub accept_projects_pointer: bool,
    pub accept_stage_root: bool,
    pub report_dir: Option<PathBuf>,
}

impl Command for CheckComplianceCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let validator =
            ComplianceValidator::new(&ctx.root, &ctx.config.compliance.placeholder_marker);
        let options = ValidationOptions {
            accept_legacy_paths: self.accept_stage_root,
            resolve_session_from_pointer: self.accept_projects_pointer,
        };
        let report = validator.validate(&self.project, self.session.as_deref(), options)?;

        let report_dir = ctx.report_dir(self.report_dir.as_deref(), &report);
        let written = vec![report.write_text(&report_dir)?, report.write_json(&report_dir)?];
        info!(
            project = %report.project,
            session = %report.session,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "Compliance check complete"
        );

        if self.accept_stage_root {
            println!("⏳ Legacy stage-rooted paths accepted for this run (grace period)");
        }
        print_report(ctx, &report, &written);
        Ok(report_status(&report))
    }
}
