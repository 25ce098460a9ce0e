//! Copy legacy stage-rooted artifacts into the canonical projects-rooted layout.
//!
//! Legacy originals are never moved or deleted, and canonical files that
//! already exist are never overwritten.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::layout::{validate_identifier, ArtifactKind, IdentifierError, PathResolver, PipelineStage};
use crate::session::scaffold::write_audit_document;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationMode {
    DryRun,
    Execute,
}

impl fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationMode::DryRun => f.write_str("dry-run"),
            MigrationMode::Execute => f.write_str("execute"),
        }
    }
}

/// One artifact's legacy and canonical locations, relative to the workspace root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationEntry {
    pub artifact: ArtifactKind,
    pub legacy_path: PathBuf,
    pub canonical_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationConflict {
    #[serde(flatten)]
    pub entry: MigrationEntry,
    /// Both copies have the same bytes
    pub identical: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutcome {
    pub project: String,
    pub session: String,
    pub mode: MigrationMode,
    /// Copied, or that would be copied in dry-run mode
    pub copied: Vec<MigrationEntry>,
    /// No legacy copy to migrate
    pub missing: Vec<MigrationEntry>,
    /// Canonical copy already present; left untouched
    pub conflicts: Vec<MigrationConflict>,
    pub audit_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MigrationTool {
    resolver: PathResolver,
    feedback_dir: PathBuf,
}

impl MigrationTool {
    pub fn new(resolver: PathResolver, feedback_dir: impl AsRef<Path>) -> Self {
        let feedback_dir = resolver.root().join(feedback_dir);
        Self {
            resolver,
            feedback_dir,
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.resolver.root())
            .unwrap_or(path)
            .to_path_buf()
    }

    pub fn migrate(
        &self,
        project: &str,
        session: &str,
        execute: bool,
    ) -> Result<MigrationOutcome, MigrationError> {
        validate_identifier("project", project)?;
        validate_identifier("session", session)?;

        let mode = if execute {
            MigrationMode::Execute
        } else {
            MigrationMode::DryRun
        };
        info!(project, session, mode = %mode, "Starting layout migration");

        let mut copied = Vec::new();
        let mut missing = Vec::new();
        let mut conflicts = Vec::new();

        for stage in PipelineStage::ALL {
            for artifact in stage.artifacts() {
                let legacy = self.resolver.legacy_path(project, session, artifact);
                let canonical = self.resolver.canonical_path(project, session, artifact);
                let entry = MigrationEntry {
                    artifact,
                    legacy_path: self.relative(&legacy),
                    canonical_path: self.relative(&canonical),
                };

                if !legacy.is_file() {
                    missing.push(entry);
                    continue;
                }

                fs::create_dir_all(self.resolver.canonical_stage_dir(project, session, stage))?;

                if canonical.exists() {
                    // A directory in the canonical slot is a conflict, never identical
                    let identical =
                        canonical.is_file() && fs::read(&legacy)? == fs::read(&canonical)?;
                    warn!(
                        artifact = %artifact,
                        canonical = ?entry.canonical_path,
                        identical,
                        "Canonical artifact already exists; not overwriting"
                    );
                    conflicts.push(MigrationConflict { entry, identical });
                    continue;
                }

                if execute {
                    fs::copy(&legacy, &canonical)?;
                    info!(artifact = %artifact, from = ?entry.legacy_path, to = ?entry.canonical_path, "Copied artifact");
                }
                copied.push(entry);
            }
        }

        let mut outcome = MigrationOutcome {
            project: project.to_string(),
            session: session.to_string(),
            mode,
            copied,
            missing,
            conflicts,
            audit_file: PathBuf::new(),
        };
        let audit_file = write_audit_document(
            &self.feedback_dir,
            &format!("migration_{project}_{session}"),
            Utc::now(),
            &render_audit(&outcome),
        )?;
        outcome.audit_file = self.relative(&audit_file);

        info!(
            project,
            session,
            copied = outcome.copied.len(),
            missing = outcome.missing.len(),
            conflicts = outcome.conflicts.len(),
            "Migration finished"
        );
        Ok(outcome)
    }
}

fn render_audit(outcome: &MigrationOutcome) -> String {
    let mut content = format!(
        "# Stage-root to Projects-root Migration\n\n\
         **Project:** {}\n\
         **Session:** {}\n\
         **When:** {}\n\
         **Mode:** {}\n\n",
        outcome.project,
        outcome.session,
        Utc::now().to_rfc3339(),
        outcome.mode
    );

    let copied_heading = match outcome.mode {
        MigrationMode::Execute => "## Copied\n",
        MigrationMode::DryRun => "## Would copy\n",
    };
    content.push_str(copied_heading);
    push_entries(&mut content, outcome.copied.iter());

    content.push_str("\n## Conflicts (canonical already present, not overwritten)\n");
    if outcome.conflicts.is_empty() {
        content.push_str("- None\n");
    }
    for conflict in &outcome.conflicts {
        content.push_str(&format!(
            "- {} -> {}{}\n",
            conflict.entry.legacy_path.display(),
            conflict.entry.canonical_path.display(),
            if conflict.identical { " (identical)" } else { " (differs)" }
        ));
    }

    content.push_str("\n## Missing legacy artifacts\n");
    if outcome.missing.is_empty() {
        content.push_str("- None\n");
    }
    for entry in &outcome.missing {
        content.push_str(&format!("- {}\n", entry.legacy_path.display()));
    }

    content.push_str(
        "\n## Notes\n\
         - Legacy files are left in place; remove them only after independent validation.\n\
         - Re-run `idse-gov check-compliance` without --accept-stage-root after migration.\n",
    );
    content
}

fn push_entries<'a>(content: &mut String, entries: impl Iterator<Item = &'a MigrationEntry>) {
    let mut any = false;
    for entry in entries {
        any = true;
        content.push_str(&format!(
            "- {} -> {}\n",
            entry.legacy_path.display(),
            entry.canonical_path.display()
        ));
    }
    if !any {
        content.push_str("- None\n");
    }
}
