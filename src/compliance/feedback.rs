use std::path::PathBuf;
use tracing::info;

use super::artifacts::relative;
use super::report::{ComplianceReport, Finding, FindingKind};
use super::{placeholder_count, read_artifact, resolve_session, unreadable, ComplianceError};
use crate::layout::{ArtifactKind, PathResolver};

pub const REQUIRED_FEEDBACK_SECTIONS: [&str; 5] = [
    "External / Internal Feedback",
    "Impacted Artifacts",
    "Risks / Issues Raised",
    "Actions / Follow-ups",
    "Decision Log",
];

/// Audits a session's feedback document for the required sections
#[derive(Debug, Clone)]
pub struct FeedbackAuditor {
    root: PathBuf,
    placeholder_marker: String,
}

impl FeedbackAuditor {
    pub const CHECK_NAME: &'static str = "audit-feedback";

    pub fn new(root: impl Into<PathBuf>, placeholder_marker: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            placeholder_marker: placeholder_marker.into(),
        }
    }

    pub fn audit(
        &self,
        project: &str,
        session: Option<&str>,
        resolve_session_from_pointer: bool,
    ) -> Result<ComplianceReport, ComplianceError> {
        let resolver = PathResolver::new(&self.root);
        let (session, source) =
            resolve_session(&resolver, project, session, resolve_session_from_pointer)?;
        let mut report = ComplianceReport::new(Self::CHECK_NAME, project, &session, source, false);

        let path = resolver.canonical_path(project, &session, ArtifactKind::Feedback);
        let shown = relative(&self.root, &path);

        if !path.is_file() {
            report.push(
                Finding::error(FindingKind::MissingArtifact, &shown, "Missing feedback file")
                    .for_artifact(ArtifactKind::Feedback),
            );
            return Ok(report);
        }

        let text = match read_artifact(&path) {
            Ok(text) => text,
            Err(e) => {
                report.push(unreadable(&shown, &e).for_artifact(ArtifactKind::Feedback));
                return Ok(report);
            }
        };
        for section in REQUIRED_FEEDBACK_SECTIONS {
            if !text.contains(section) {
                report.push(
                    Finding::error(
                        FindingKind::MissingSection,
                        &shown,
                        format!("Missing section in feedback: {section}"),
                    )
                    .for_artifact(ArtifactKind::Feedback),
                );
            }
        }
        if placeholder_count(&text, &self.placeholder_marker) > 0 {
            report.push(
                Finding::warning(
                    FindingKind::Placeholder,
                    &shown,
                    format!("Feedback contains placeholder {}", self.placeholder_marker),
                )
                .for_artifact(ArtifactKind::Feedback),
            );
        }

        info!(project, session = %session, passed = report.passed(), "Feedback audit finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_feedback(temp_dir: &TempDir, content: &str) {
        let path = PathResolver::new(temp_dir.path()).canonical_path(
            "Acme",
            "launch",
            ArtifactKind::Feedback,
        );
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_complete_feedback_passes() {
        let temp_dir = TempDir::new().unwrap();
        let content = REQUIRED_FEEDBACK_SECTIONS
            .iter()
            .map(|s| format!("## {s}\n- noted\n"))
            .collect::<String>();
        write_feedback(&temp_dir, &content);

        let report = FeedbackAuditor::new(temp_dir.path(), "[REQUIRES INPUT]")
            .audit("Acme", Some("launch"), false)
            .unwrap();
        assert!(report.passed());
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_missing_sections_are_listed() {
        let temp_dir = TempDir::new().unwrap();
        write_feedback(&temp_dir, "## Decision Log\n[REQUIRES INPUT]\n");

        let report = FeedbackAuditor::new(temp_dir.path(), "[REQUIRES INPUT]")
            .audit("Acme", Some("launch"), false)
            .unwrap();
        assert_eq!(report.error_count(), 4);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_non_utf8_feedback_is_audited() {
        let temp_dir = TempDir::new().unwrap();
        let path = PathResolver::new(temp_dir.path()).canonical_path(
            "Acme",
            "launch",
            ArtifactKind::Feedback,
        );
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut content = b"# Feedback \xe9\xff\n".to_vec();
        for section in REQUIRED_FEEDBACK_SECTIONS {
            content.extend_from_slice(format!("## {section}\n- none\n").as_bytes());
        }
        fs::write(path, content).unwrap();

        let report = FeedbackAuditor::new(temp_dir.path(), "[REQUIRES INPUT]")
            .audit("Acme", Some("launch"), false)
            .unwrap();
        assert!(report.passed(), "{:?}", report.findings);
    }

    #[test]
    fn test_missing_feedback_file() {
        let temp_dir = TempDir::new().unwrap();
        let report = FeedbackAuditor::new(temp_dir.path(), "[REQUIRES INPUT]")
            .audit("Acme", Some("launch"), false)
            .unwrap();
        assert_eq!(report.error_count(), 1);
        assert_eq!(
            report.findings[0].path,
            PathBuf::from("projects/Acme/sessions/launch/feedback/feedback.md")
        );
    }
}
