//! Artifact compliance: layout validation, section markers and feedback audits.
//!
//! Every check collects findings into a [`ComplianceReport`] instead of
//! failing fast; only setup problems (no session, unreadable files) are errors.

pub mod artifacts;
pub mod feedback;
pub mod report;
pub mod validator;

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::layout::{validate_identifier, IdentifierError, PathResolver};
use crate::session::SessionPointer;

pub use artifacts::ArtifactValidator;
pub use feedback::FeedbackAuditor;
pub use report::{ComplianceReport, Finding, FindingKind, SessionSource, Severity};
pub use validator::{ComplianceValidator, ValidationOptions};

#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("No session given for project '{project}' and no advisory pointer to fall back on; pass --session")]
    SessionRequired { project: String },

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Pick the session to check: explicit wins, then the advisory pointer if allowed
pub(crate) fn resolve_session(
    resolver: &PathResolver,
    project: &str,
    session: Option<&str>,
    from_pointer: bool,
) -> Result<(String, SessionSource), ComplianceError> {
    validate_identifier("project", project)?;

    let (session, source) = match session {
        Some(session) => (session.to_string(), SessionSource::Explicit),
        None if from_pointer => {
            let pointer = SessionPointer::read(resolver, project)?.ok_or_else(|| {
                ComplianceError::SessionRequired {
                    project: project.to_string(),
                }
            })?;
            tracing::info!(project, session = %pointer.session_id, "Using session from advisory pointer");
            (pointer.session_id, SessionSource::Pointer)
        }
        None => {
            return Err(ComplianceError::SessionRequired {
                project: project.to_string(),
            })
        }
    };

    validate_identifier("session", &session)?;
    Ok((session, source))
}

/// Artifact text with invalid UTF-8 replaced; `Err` only when the file cannot be read
pub(crate) fn read_artifact(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Error finding for a file that exists but could not be read
pub(crate) fn unreadable(path: impl Into<std::path::PathBuf>, error: &io::Error) -> Finding {
    Finding::error(
        FindingKind::UnreadableArtifact,
        path,
        format!("Could not read file: {error}"),
    )
}

/// Occurrences of the placeholder marker; an empty marker matches nothing
pub fn placeholder_count(content: &str, marker: &str) -> usize {
    if marker.is_empty() {
        0
    } else {
        content.matches(marker).count()
    }
}
