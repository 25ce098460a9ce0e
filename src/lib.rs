//! Handoff governance for two cooperating agents on a shared document
//! pipeline, plus the canonical session layout it governs: scaffolding,
//! compliance validation and migration from the legacy stage-rooted layout.

pub mod cli;
pub mod compliance;
pub mod config;
pub mod governance;
pub mod layout;
pub mod migration;
pub mod session;
pub mod telemetry;

pub use compliance::{ComplianceReport, ComplianceValidator, Finding, ValidationOptions};
pub use config::GovernanceConfig;
pub use governance::{
    ActiveActorGuard, Actor, GovernanceError, GovernanceState, GovernanceStateStore,
    HandoffProtocol, TransitionResult,
};
pub use layout::{ArtifactKind, PathResolver, PipelineStage};
pub use migration::{MigrationOutcome, MigrationTool};
pub use session::{SessionRecord, SessionScaffolder};
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
