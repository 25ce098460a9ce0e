use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::report::{ComplianceReport, Finding, FindingKind};
use super::{placeholder_count, resolve_session, unreadable, ComplianceError};
use crate::layout::{ArtifactKind, PathResolver};
use crate::session::{SessionPointer, METADATA_DIR, REQUIRED_METADATA_FILES};

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Resolve artifacts from the legacy layout when no canonical copy exists
    pub accept_legacy_paths: bool,
    /// Take the session from `CURRENT_SESSION` when none is supplied
    pub resolve_session_from_pointer: bool,
}

/// Checks a session against the canonical layout contract
#[derive(Debug, Clone)]
pub struct ComplianceValidator {
    root: PathBuf,
    placeholder_marker: String,
}

impl ComplianceValidator {
    pub const CHECK_NAME: &'static str = "check-compliance";

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
        options: ValidationOptions,
    ) -> Result<ComplianceReport, ComplianceError> {
        let resolver =
            PathResolver::new(&self.root).with_accept_legacy(options.accept_legacy_paths);
        let (session, source) = resolve_session(
            &resolver,
            project,
            session,
            options.resolve_session_from_pointer,
        )?;

        info!(
            project,
            session = %session,
            accept_legacy = options.accept_legacy_paths,
            "Running compliance validation"
        );

        let mut report = ComplianceReport::new(
            Self::CHECK_NAME,
            project,
            &session,
            source,
            options.accept_legacy_paths,
        );
        // Paths already reported as errors; later checks do not repeat them
        let mut flagged: HashSet<PathBuf> = HashSet::new();

        for artifact in ArtifactKind::ALL {
            self.check_artifact(&resolver, project, &session, artifact, &mut report, &mut flagged);
        }
        self.check_metadata(&resolver, project, &session, &mut report);
        self.check_pointer(&resolver, project, &mut report, &flagged);

        if report.passed() {
            info!(project, session = %session, warnings = report.warning_count(), "Compliance passed");
        } else {
            warn!(
                project,
                session = %session,
                errors = report.error_count(),
                "Compliance failed"
            );
        }
        Ok(report)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    fn check_artifact(
        &self,
        resolver: &PathResolver,
        project: &str,
        session: &str,
        artifact: ArtifactKind,
        report: &mut ComplianceReport,
        flagged: &mut HashSet<PathBuf>,
    ) {
        let resolved = resolver.resolve(project, session, artifact);
        let canonical = self.relative(&resolved.canonical_path);
        let legacy = self.relative(&resolved.legacy_path);
        let canonical_exists = resolved.canonical_path.is_file();
        let legacy_exists = resolved.legacy_path.is_file();

        if !resolved.exists() {
            let message = if legacy_exists {
                "Missing artifact (a legacy copy exists; run `migrate --execute` or pass --accept-stage-root)"
            } else {
                "Missing artifact"
            };
            report.push(
                Finding::error(FindingKind::MissingArtifact, &canonical, message).for_artifact(artifact),
            );
            flagged.insert(resolved.canonical_path.clone());
            return;
        }

        let bytes = match fs::read(&resolved.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = ?resolved.path, error = %e, "Artifact could not be read");
                report.push(unreadable(self.relative(&resolved.path), &e).for_artifact(artifact));
                flagged.insert(resolved.canonical_path.clone());
                return;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        let placeholders = placeholder_count(&content, &self.placeholder_marker);
        if placeholders > 0 {
            report.push(
                Finding::warning(
                    FindingKind::Placeholder,
                    self.relative(&resolved.path),
                    format!(
                        "{placeholders} unresolved '{}' placeholder(s)",
                        self.placeholder_marker
                    ),
                )
                .for_artifact(artifact),
            );
        }

        if resolver.accepts_legacy() && canonical_exists && legacy_exists {
            let identical = match fs::read(&resolved.legacy_path) {
                Ok(legacy_bytes) => legacy_bytes == bytes,
                Err(e) => {
                    report.push(unreadable(&legacy, &e).for_artifact(artifact));
                    false
                }
            };
            let message = if identical {
                "Canonical and legacy copies coexist (contents identical); remove the legacy copy"
            } else {
                "Canonical and legacy copies coexist and differ; the canonical copy is authoritative"
            };
            report.push(
                Finding::error(FindingKind::Drift, &canonical, message)
                    .for_artifact(artifact)
                    .with_related(&legacy),
            );
            flagged.insert(resolved.canonical_path.clone());
        }

        if resolved.is_legacy() {
            debug!(artifact = %artifact, path = ?legacy, "Artifact only present in legacy layout");
            report.push(
                Finding::error(
                    FindingKind::LegacyPath,
                    &legacy,
                    "Resolved from the legacy layout; accepted during the grace period only, migrate it to the canonical path",
                )
                .for_artifact(artifact)
                .with_related(&canonical),
            );
            flagged.insert(resolved.canonical_path.clone());
        }
    }

    fn check_metadata(
        &self,
        resolver: &PathResolver,
        project: &str,
        session: &str,
        report: &mut ComplianceReport,
    ) {
        let metadata_dir = resolver.session_root(project, session).join(METADATA_DIR);
        if !metadata_dir.is_dir() {
            report.push(Finding::error(
                FindingKind::MissingMetadata,
                self.relative(&metadata_dir),
                "Metadata directory is missing",
            ));
            return;
        }

        for name in REQUIRED_METADATA_FILES {
            let path = metadata_dir.join(name);
            if !path.is_file() {
                report.push(Finding::error(
                    FindingKind::MissingMetadata,
                    self.relative(&path),
                    format!("Required metadata file '{name}' is missing"),
                ));
            }
        }
    }

    fn check_pointer(
        &self,
        resolver: &PathResolver,
        project: &str,
        report: &mut ComplianceReport,
        flagged: &HashSet<PathBuf>,
    ) {
        let pointer_path = SessionPointer::path(resolver, project);
        if !pointer_path.is_file() {
            return;
        }

        let pointer = match SessionPointer::read(resolver, project) {
            Ok(pointer) => pointer,
            Err(e) => {
                report.push(unreadable(self.relative(&pointer_path), &e));
                return;
            }
        };
        let Some(pointer) = pointer else {
            report.push(Finding::error(
                FindingKind::PointerInconsistency,
                self.relative(&pointer_path),
                "Advisory pointer has no session_id line",
            ));
            return;
        };

        let expected_root = resolver.session_root(project, &pointer.session_id);
        let pointed_root = pointer.session_root(resolver, project);
        if pointed_root != expected_root {
            report.push(
                Finding::error(
                    FindingKind::PointerInconsistency,
                    self.relative(&pointer_path),
                    format!(
                        "canonical_root '{}' does not match session '{}'",
                        pointer.canonical_root, pointer.session_id
                    ),
                )
                .with_related(self.relative(&expected_root)),
            );
            return;
        }

        for artifact in ArtifactKind::ALL {
            let path = resolver.canonical_path(project, &pointer.session_id, artifact);
            if !path.is_file() && !flagged.contains(&path) {
                report.push(
                    Finding::error(
                        FindingKind::PointerInconsistency,
                        self.relative(&path),
                        format!(
                            "Advisory pointer names session '{}' but this artifact is missing",
                            pointer.session_id
                        ),
                    )
                    .for_artifact(artifact)
                    .with_related(self.relative(&pointer_path)),
                );
            }
        }
    }

    /// Default report directory: `<reports_dir>/projects/<project>/sessions/<session>`
    pub fn default_report_dir(reports_dir: &Path, report: &ComplianceReport) -> PathBuf {
        reports_dir
            .join("projects")
            .join(&report.project)
            .join("sessions")
            .join(&report.session)
    }
}
