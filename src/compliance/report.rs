use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::ComplianceError;
use crate::layout::ArtifactKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    MissingArtifact,
    Placeholder,
    Drift,
    LegacyPath,
    MissingMetadata,
    PointerInconsistency,
    MissingSection,
    UnreadableArtifact,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::MissingArtifact => "missing-artifact",
            FindingKind::Placeholder => "placeholder",
            FindingKind::Drift => "drift",
            FindingKind::LegacyPath => "legacy-path",
            FindingKind::MissingMetadata => "missing-metadata",
            FindingKind::PointerInconsistency => "pointer-inconsistency",
            FindingKind::MissingSection => "missing-section",
            FindingKind::UnreadableArtifact => "unreadable-artifact",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation; paths are relative to the workspace root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactKind>,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_path: Option<PathBuf>,
    pub message: String,
}

impl Finding {
    pub fn error(kind: FindingKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            artifact: None,
            path: path.into(),
            related_path: None,
            message: message.into(),
        }
    }

    pub fn warning(kind: FindingKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, path, message)
        }
    }

    pub fn for_artifact(mut self, artifact: ArtifactKind) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn with_related(mut self, related: impl Into<PathBuf>) -> Self {
        self.related_path = Some(related.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity,
            self.kind,
            self.path.display(),
            self.message
        )?;
        if let Some(related) = &self.related_path {
            write!(f, " (see {})", related.display())?;
        }
        Ok(())
    }
}

/// How the validated session was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSource {
    Explicit,
    Pointer,
}

/// Aggregated outcome of one validator run.
///
/// Always complete: individual findings never abort a run.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub check: String,
    pub project: String,
    pub session: String,
    pub session_source: SessionSource,
    pub accept_legacy: bool,
    pub generated_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
}

impl ComplianceReport {
    pub fn new(
        check: &str,
        project: &str,
        session: &str,
        session_source: SessionSource,
        accept_legacy: bool,
    ) -> Self {
        Self {
            check: check.to_string(),
            project: project.to_string(),
            session: session.to_string(),
            session_source,
            accept_legacy,
            generated_at: Utc::now(),
            findings: Vec::new(),
        }
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Pass iff there are no error findings
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings.len() - self.error_count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    pub fn render_text(&self, report_dir: &Path) -> String {
        let mut lines = vec![
            format!(
                "{}: project={} session={}",
                self.check, self.project, self.session
            ),
            format!("report_dir: {}", report_dir.display()),
            format!("timestamp: {}", self.generated_at.to_rfc3339()),
            format!("session_source: {}", match self.session_source {
                SessionSource::Explicit => "explicit",
                SessionSource::Pointer => "pointer",
            }),
            format!("accept_legacy: {}", self.accept_legacy),
            String::new(),
            "Findings:".to_string(),
        ];

        // Errors first, then warnings
        let mut findings: Vec<&Finding> = self.errors().collect();
        findings.extend(self.findings.iter().filter(|f| !f.is_error()));
        if findings.is_empty() {
            lines.push("OK: No issues detected.".to_string());
        }
        lines.extend(findings.iter().map(|f| f.to_string()));

        lines.push(String::new());
        lines.push(format!(
            "Overall: {} ({} errors, {} warnings)",
            if self.passed() { "PASS" } else { "FAIL" },
            self.error_count(),
            self.warning_count()
        ));
        lines.join("\n") + "\n"
    }

    /// `<dir>/<check>-report.txt`
    pub fn write_text(&self, report_dir: &Path) -> Result<PathBuf, ComplianceError> {
        fs::create_dir_all(report_dir)?;
        let path = report_dir.join(format!("{}-report.txt", self.check));
        fs::write(&path, self.render_text(report_dir))?;
        info!(report = ?path, passed = self.passed(), "Report written");
        Ok(path)
    }

    /// `<dir>/<check>-report.json`
    pub fn write_json(&self, report_dir: &Path) -> Result<PathBuf, ComplianceError> {
        fs::create_dir_all(report_dir)?;
        let path = report_dir.join(format!("{}-report.json", self.check));
        let mut serialized = serde_json::to_string_pretty(self)?;
        serialized.push('\n');
        fs::write(&path, serialized)?;
        Ok(path)
    }
}
