use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "idse-gov")]
#[command(version)]
#[command(about = "Handoff governance and artifact compliance for two-agent IDSE pipelines")]
#[command(long_about = "idse-gov keeps two cooperating agents (claude_code and codex_gpt) taking turns \
                       on a shared document pipeline through a persisted handoff state, and checks that \
                       session artifacts follow the canonical projects/<project>/sessions/<session>/<stage> \
                       layout. Start with 'idse-gov view' to see who is active.")]
pub struct Cli {
    /// Workspace root every governance path is resolved against
    #[arg(long, global = true, default_value = ".", help = "Workspace root (default: current directory)")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hand control from the active actor to the other actor
    Handoff {
        /// Actor giving up control (must be the active actor)
        from: String,
        /// Actor receiving control
        to: String,
        /// Why control is being handed over; recorded in the handoff document
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        reason: Vec<String>,
    },
    /// Acknowledge a pending handoff as the new active actor
    Acknowledge {
        #[arg(long = "as", value_name = "ACTOR", help = "Acknowledging actor (must be active)")]
        actor: String,
    },
    /// Switch the active actor's working role
    Role {
        #[arg(long = "as", value_name = "ACTOR", help = "Acting actor (must be active)")]
        actor: String,
        /// builder, reviewer, planner or implementer
        role: String,
        /// Optional reason; defaults to the role's governing article
        reason: Vec<String>,
    },
    /// Move the pipeline to another stage
    Stage {
        #[arg(long = "as", value_name = "ACTOR", help = "Acting actor (must be active)")]
        actor: String,
        /// Intent, Context, Specification, Plan, Tasks, Implementation or Feedback
        stage: String,
    },
    /// Verify that the calling actor is the active actor
    CheckActive {
        #[arg(long = "as", value_name = "ACTOR", help = "Actor to check (defaults to the actor environment variable)")]
        actor: Option<String>,
        /// Report problems but exit successfully
        #[arg(long, help = "Downgrade failures to warnings and exit 0")]
        warn_only: bool,
        /// Suppress all output; only the exit code reports the result
        #[arg(long, short = 'q', help = "Print nothing")]
        quiet: bool,
    },
    /// Show the governance state with a staleness indicator
    View,
    /// Scaffold a new session with canonical directories and pointers
    CreateSession {
        /// Project identifier
        project: String,
        /// Session identifier
        session: String,
        /// Session owner recorded in the metadata owner marker
        owner: String,
        #[arg(long, help = "Print the session record as JSON")]
        json: bool,
    },
    /// Scaffold the project's __blueprint__ meta session
    CreateBlueprint {
        /// Project identifier
        project: String,
        /// Blueprint owner
        owner: String,
        #[arg(long, help = "Print the session record as JSON")]
        json: bool,
    },
    /// Check artifact presence and required section markers
    ValidateArtifacts {
        #[arg(long)]
        project: String,
        #[arg(long, required_unless_present = "accept_projects_pointer")]
        session: Option<String>,
        #[arg(long, help = "Use the project's CURRENT_SESSION pointer when --session is omitted")]
        accept_projects_pointer: bool,
        #[arg(long, help = "Report directory (default: <reports_dir>/projects/<P>/sessions/<S>)")]
        report_dir: Option<PathBuf>,
    },
    /// Validate a session against the canonical layout contract
    CheckCompliance {
        #[arg(long)]
        project: String,
        #[arg(long, required_unless_present = "accept_projects_pointer")]
        session: Option<String>,
        #[arg(long, help = "Use the project's CURRENT_SESSION pointer when --session is omitted")]
        accept_projects_pointer: bool,
        /// Accept artifacts from the legacy stage-rooted layout (grace period)
        #[arg(long, help = "Resolve legacy <stage>/projects/<P>/sessions/<S> artifacts and report drift")]
        accept_stage_root: bool,
        #[arg(long, help = "Report directory (default: <reports_dir>/projects/<P>/sessions/<S>)")]
        report_dir: Option<PathBuf>,
    },
    /// Check the feedback document for its required sections
    AuditFeedback {
        #[arg(long)]
        project: String,
        #[arg(long, required_unless_present = "accept_projects_pointer")]
        session: Option<String>,
        #[arg(long, help = "Use the project's CURRENT_SESSION pointer when --session is omitted")]
        accept_projects_pointer: bool,
        #[arg(long, help = "Report directory (default: <reports_dir>/projects/<P>/sessions/<S>)")]
        report_dir: Option<PathBuf>,
    },
    /// Copy legacy stage-rooted artifacts into the canonical layout
    Migrate {
        #[arg(long)]
        project: String,
        #[arg(long)]
        session: String,
        /// Copy files; without this flag the run is a dry run
        #[arg(long, help = "Copy files (otherwise dry-run)")]
        execute: bool,
    },
    /// List a project's sessions and their artifact progress
    Status {
        #[arg(long)]
        project: String,
        #[arg(long, help = "Print machine-readable JSON")]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Commands {
    /// Name used for the command span
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Handoff { .. } => "handoff",
            Commands::Acknowledge { .. } => "acknowledge",
            Commands::Role { .. } => "role",
            Commands::Stage { .. } => "stage",
            Commands::CheckActive { .. } => "check-active",
            Commands::View => "view",
            Commands::CreateSession { .. } => "create-session",
            Commands::CreateBlueprint { .. } => "create-blueprint",
            Commands::ValidateArtifacts { .. } => "validate-artifacts",
            Commands::CheckCompliance { .. } => "check-compliance",
            Commands::AuditFeedback { .. } => "audit-feedback",
            Commands::Migrate { .. } => "migrate",
            Commands::Status { .. } => "status",
            Commands::Config => "config",
        }
    }

    /// Actor named on the command line, if any
    pub fn actor(&self) -> Option<&str> {
        match self {
            Commands::Handoff { from, .. } => Some(from),
            Commands::Acknowledge { actor }
            | Commands::Role { actor, .. }
            | Commands::Stage { actor, .. } => Some(actor),
            Commands::CheckActive { actor, .. } => actor.as_deref(),
            _ => None,
        }
    }
}
