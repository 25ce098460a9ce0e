use anyhow::Result;
use std::path::PathBuf;

use super::{print_report, report_status, Command, CommandContext, CommandStatus};
use crate::compliance::FeedbackAuditor;

pub struct AuditFeedbackCommand {
    pub project: String,
    pub session: Option<String>,
    pub accept_projects_pointer: bool,
    pub report_dir: Option<PathBuf>,
}

impl Command for AuditFeedbackCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let auditor = FeedbackAuditor::new(&ctx.root, &ctx.config.compliance.placeholder_marker);
        let report = auditor.audit(
            &self.project,
            self.session.as_deref(),
            self.accept_projects_pointer,
        )?;

        let report_dir = ctx.report_dir(self.report_dir.as_deref(), &report);
        let written = report.write_text(&report_dir)?;
        print_report(ctx, &report, &[written]);
        Ok(report_status(&report))
    }
}
