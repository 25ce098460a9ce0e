use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::pipeline::{ArtifactKind, PipelineStage};

/// Which directory scheme an artifact was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLayout {
    /// `projects/<project>/sessions/<session>/<stage>/<file>`
    Canonical,
    /// `<stage>/projects/<project>/sessions/<session>/<file>`
    Legacy,
}

impl fmt::Display for SourceLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLayout::Canonical => f.write_str("canonical"),
            SourceLayout::Legacy => f.write_str("legacy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub artifact: ArtifactKind,
    /// The path callers should read from or write to
    pub path: PathBuf,
    pub layout: SourceLayout,
    pub canonical_path: PathBuf,
    pub legacy_path: PathBuf,
}

impl ResolvedArtifact {
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_legacy(&self) -> bool {
        self.layout == SourceLayout::Legacy
    }
}

/// Single source of canonical/legacy precedence for artifact lookups
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    accept_legacy: bool,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            accept_legacy: false,
        }
    }

    pub fn with_accept_legacy(mut self, accept_legacy: bool) -> Self {
        self.accept_legacy = accept_legacy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn accepts_legacy(&self) -> bool {
        self.accept_legacy
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join("projects").join(project)
    }

    pub fn session_root(&self, project: &str, session: &str) -> PathBuf {
        self.project_dir(project).join("sessions").join(session)
    }

    pub fn canonical_stage_dir(&self, project: &str, session: &str, stage: PipelineStage) -> PathBuf {
        self.session_root(project, session).join(stage.dir_name())
    }

    pub fn legacy_stage_dir(&self, project: &str, session: &str, stage: PipelineStage) -> PathBuf {
        self.root
            .join(stage.dir_name())
            .join("projects")
            .join(project)
            .join("sessions")
            .join(session)
    }

    pub fn canonical_path(&self, project: &str, session: &str, artifact: ArtifactKind) -> PathBuf {
        self.canonical_stage_dir(project, session, artifact.stage())
            .join(artifact.file_name())
    }

    pub fn legacy_path(&self, project: &str, session: &str, artifact: ArtifactKind) -> PathBuf {
        self.legacy_stage_dir(project, session, artifact.stage())
            .join(artifact.file_name())
    }

    /// Canonical wins when present; legacy only when accepted and present;
    /// otherwise the canonical path is the write target.
    pub fn resolve(&self, project: &str, session: &str, artifact: ArtifactKind) -> ResolvedArtifact {
        let canonical_path = self.canonical_path(project, session, artifact);
        let legacy_path = self.legacy_path(project, session, artifact);

        let (path, layout) = if canonical_path.is_file() {
            (canonical_path.clone(), SourceLayout::Canonical)
        } else if self.accept_legacy && legacy_path.is_file() {
            debug!(artifact = %artifact, path = ?legacy_path, "Resolved artifact from legacy layout");
            (legacy_path.clone(), SourceLayout::Legacy)
        } else {
            (canonical_path.clone(), SourceLayout::Canonical)
        };

        ResolvedArtifact {
            artifact,
            path,
            layout,
            canonical_path,
            legacy_path,
        }
    }

    /// Path shown to operators: relative to the workspace root when possible
    pub fn display<'p>(&self, path: &'p Path) -> std::path::Display<'p> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}
