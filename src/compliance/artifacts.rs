use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::feedback::REQUIRED_FEEDBACK_SECTIONS;
use super::report::{ComplianceReport, Finding, FindingKind};
use super::{placeholder_count, read_artifact, resolve_session, unreadable, ComplianceError};
use crate::layout::{ArtifactKind, PathResolver};

/// Markers a document must contain to count as structurally complete
pub fn section_markers(artifact: ArtifactKind) -> &'static [&'static str] {
    match artifact {
        ArtifactKind::Intent => &["# Intent", "Overview"],
        ArtifactKind::Context => &["# Context", "Technical Environment"],
        ArtifactKind::Spec => &["# Specification", "Acceptance Criteria", "Overview"],
        ArtifactKind::Plan => &["# Implementation Plan", "Phases"],
        ArtifactKind::Tasks => &["# Tasks", "Phase"],
        ArtifactKind::Feedback => &REQUIRED_FEEDBACK_SECTIONS,
        ArtifactKind::TestPlan | ArtifactKind::Implementation => &[],
    }
}

/// Canonical-only presence and section-marker checks
#[derive(Debug, Clone)]
pub struct ArtifactValidator {
    root: PathBuf,
    placeholder_marker: String,
}

impl ArtifactValidator {
    pub const CHECK_NAME: &'static str = "validate-artifacts";

    pub fn new(root: impl Into<PathBuf>, placeholder_marker: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            placeholder_marker: placeholder_marker.into(),
        }
    }

    pub fn validate(
        &self,
        project: &str,
        session: Option<&str>,
        resolve_session_from_pointer: bool,
    ) -> Result<ComplianceReport, ComplianceError> {
        let resolver = PathResolver::new(&self.root);
        let (session, source) =
            resolve_session(&resolver, project, session, resolve_session_from_pointer)?;
        let mut report = ComplianceReport::new(Self::CHECK_NAME, project, &session, source, false);

        for artifact in ArtifactKind::ALL {
            let path = resolver.canonical_path(project, &session, artifact);
            let shown = relative(&self.root, &path);

            if !path.is_file() {
                report.push(
                    Finding::error(FindingKind::MissingArtifact, &shown, "Missing artifact")
                        .for_artifact(artifact),
                );
                continue;
            }

            let content = match read_artifact(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Artifact could not be read");
                    report.push(unreadable(&shown, &e).for_artifact(artifact));
                    continue;
                }
            };
            let missing: Vec<&str> = section_markers(artifact)
                .iter()
                .copied()
                .filter(|marker| !content.contains(marker))
                .collect();
            for marker in missing {
                report.push(
                    Finding::error(
                        FindingKind::MissingSection,
                        &shown,
                        format!("Missing section marker '{marker}'"),
                    )
                    .for_artifact(artifact),
                );
            }

            if placeholder_count(&content, &self.placeholder_marker) > 0 {
                report.push(
                    Finding::warning(
                        FindingKind::Placeholder,
                        &shown,
                        format!("Still contains '{}'; fill before publishing", self.placeholder_marker),
                    )
                    .for_artifact(artifact),
                );
            }
        }

        info!(
            project,
            session = %session,
            errors = report.error_count(),
            "Artifact validation finished"
        );
        Ok(report)
    }
}

pub(crate) fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
