use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::Commands;
use crate::compliance::ComplianceReport;
use crate::config::GovernanceConfig;
use crate::governance::{GovernanceStateStore, HandoffProtocol, HandoffTemplates, StalenessMonitor};
use crate::layout::PathResolver;

pub mod acknowledge;
pub mod audit_feedback;
pub mod check_active;
pub mod check_compliance;
pub mod config;
pub mod create_session;
pub mod handoff;
pub mod migrate;
pub mod role;
pub mod stage;
pub mod status;
pub mod validate_artifacts;
pub mod view;

/// How a command finished; `main` maps this to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// A check reported a problem (e.g. caller is not the active actor)
    CheckFailed,
    /// Compliance or artifact validation found errors
    ComplianceFailed,
}

impl CommandStatus {
    pub fn exit_code(self) -> ExitCode {
        match self {
            CommandStatus::Success => ExitCode::SUCCESS,
            CommandStatus::CheckFailed => ExitCode::from(1),
            CommandStatus::ComplianceFailed => ExitCode::from(2),
        }
    }
}

pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus>;
}

/// Everything a command needs, built once per invocation
pub struct CommandContext {
    pub root: PathBuf,
    pub config: GovernanceConfig,
    pub store: GovernanceStateStore,
}

impl CommandContext {
    pub fn new(root: impl Into<PathBuf>, config: GovernanceConfig) -> Self {
        let root = root.into();
        let store = GovernanceStateStore::new(root.join(&config.paths.state_file));
        Self {
            root,
            config,
            store,
        }
    }

    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(&self.root)
    }

    pub fn feedback_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.feedback_dir)
    }

    pub fn staleness_monitor(&self) -> StalenessMonitor {
        StalenessMonitor::new(self.config.staleness_window())
    }

    pub fn protocol(&self) -> Result<HandoffProtocol<'_>> {
        let template_dir = self
            .config
            .paths
            .template_dir
            .as_ref()
            .map(|dir| self.root.join(dir));
        let templates = HandoffTemplates::load(template_dir.as_deref())?;
        Ok(HandoffProtocol::new(&self.store, templates, self.feedback_dir()))
    }

    /// Actor identity from the configured environment variable
    pub fn env_actor(&self) -> Option<String> {
        std::env::var(&self.config.governance.actor_env_var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// `--report-dir` when given, else `<reports_dir>/projects/<P>/sessions/<S>`
    pub fn report_dir(&self, explicit: Option<&Path>, report: &ComplianceReport) -> PathBuf {
        match explicit {
            Some(dir) => self.root.join(dir),
            None => crate::compliance::ComplianceValidator::default_report_dir(
                &self.root.join(&self.config.paths.reports_dir),
                report,
            ),
        }
    }

    /// Path for display, relative to the workspace root when possible
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Build the handler for a parsed subcommand
pub fn command_for(command: Commands) -> Box<dyn Command> {
    match command {
        Commands::Handoff { from, to, reason } => {
            Box::new(handoff::HandoffCommand::new(from, to, reason.join(" ")))
        }
        Commands::Acknowledge { actor } => Box::new(acknowledge::AcknowledgeCommand::new(actor)),
        Commands::Role {
            actor,
            role,
            reason,
        } => Box::new(role::RoleCommand::new(actor, role).with_reason(reason)),
        Commands::Stage { actor, stage } => Box::new(stage::StageCommand::new(actor, stage)),
        Commands::CheckActive {
            actor,
            warn_only,
            quiet,
        } => Box::new(
            check_active::CheckActiveCommand::new(actor)
                .with_warn_only(warn_only)
                .with_quiet(quiet),
        ),
        Commands::View => Box::new(view::ViewCommand),
        Commands::CreateSession {
            project,
            session,
            owner,
            json,
        } => Box::new(create_session::CreateSessionCommand::new(project, session, owner).with_json(json)),
        Commands::CreateBlueprint {
            project,
            owner,
            json,
        } => Box::new(create_session::CreateSessionCommand::blueprint(project, owner).with_json(json)),
        Commands::ValidateArtifacts {
            project,
            session,
            accept_projects_pointer,
            report_dir,
        } => Box::new(validate_artifacts::ValidateArtifactsCommand {
            project,
            session,
            accept_projects_pointer,
            report_dir,
        }),
        Commands::CheckCompliance {
            project,
            session,
            accept_projects_pointer,
            accept_stage_root,
            report_dir,
        } => Box::new(check_compliance::CheckComplianceCommand {
            project,
            session,
            accept_projects_pointer,
            accept_stage_root,
            report_dir,
        }),
        Commands::AuditFeedback {
            project,
            session,
            accept_projects_pointer,
            report_dir,
        } => Box::new(audit_feedback::AuditFeedbackCommand {
            project,
            session,
            accept_projects_pointer,
            report_dir,
        }),
        Commands::Migrate {
            project,
            session,
            execute,
        } => Box::new(migrate::MigrateCommand::new(project, session).with_execute(execute)),
        Commands::Status { project, json } => Box::new(status::StatusCommand::new(project).with_json(json)),
        Commands::Config => Box::new(config::ConfigCommand),
    }
}

/// Console summary shared by the report-producing commands
pub(crate) fn print_report(ctx: &CommandContext, report: &ComplianceReport, written: &[PathBuf]) {
    println!(
        "🔍 {}: {} / {}",
        report.check, report.project, report.session
    );
    if report.findings.is_empty() {
        println!("✅ No issues detected");
    }
    for finding in report.errors() {
        println!("❌ {finding}");
    }
    for finding in report.findings.iter().filter(|f| !f.is_error()) {
        println!("⚠️  {finding}");
    }
    println!();
    println!(
        "📊 {} ({} errors, {} warnings)",
        if report.passed() { "PASS" } else { "FAIL" },
        report.error_count(),
        report.warning_count()
    );
    for path in written {
        println!("📄 Report written: {}", ctx.display_path(path));
    }
}

/// Exit status for a finished report
pub(crate) fn report_status(report: &ComplianceReport) -> CommandStatus {
    if report.passed() {
        CommandStatus::Success
    } else {
        CommandStatus::ComplianceFailed
    }
}

/// Show quick-start guidance when no subcommand is given
pub fn show_quick_start() {
    println!("🤝 idse-gov - two-agent handoff governance");
    println!();
    println!("Handoff protocol:");
    println!("  👀 idse-gov view                                 # Who is active?");
    println!("  🔐 idse-gov check-active --as <actor>            # Am I allowed to write?");
    println!("  🔄 idse-gov handoff <from> <to> <reason...>      # Pass control");
    println!("  📬 idse-gov acknowledge --as <actor>             # Accept control");
    println!();
    println!("Sessions and compliance:");
    println!("  📁 idse-gov create-session <project> <session> <owner>");
    println!("  🔍 idse-gov check-compliance --project <P> --session <S>");
    println!("  🚚 idse-gov migrate --project <P> --session <S> [--execute]");
    println!();
    println!("💡 Run 'idse-gov --help' for every command.");
}
