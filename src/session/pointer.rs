use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::layout::{ArtifactKind, PathResolver, PipelineStage};

/// Advisory `projects/<project>/CURRENT_SESSION` record.
///
/// Informational for humans and tools; nothing treats it as authoritative
/// except the explicit `--accept-projects-pointer` validator option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPointer {
    pub session_id: String,
    /// Session root relative to the workspace root
    pub canonical_root: String,
    pub updated: Option<DateTime<Utc>>,
}

impl SessionPointer {
    pub const FILE_NAME: &'static str = "CURRENT_SESSION";

    pub fn new(project: &str, session: &str, updated: DateTime<Utc>) -> Self {
        Self {
            session_id: session.to_string(),
            canonical_root: format!("projects/{project}/sessions/{session}"),
            updated: Some(updated),
        }
    }

    pub fn path(resolver: &PathResolver, project: &str) -> PathBuf {
        resolver.project_dir(project).join(Self::FILE_NAME)
    }

    pub fn render(&self) -> String {
        let mut content = format!(
            "session_id: {}\ncanonical_root: {}\n",
            self.session_id, self.canonical_root
        );
        if let Some(updated) = self.updated {
            content.push_str(&format!("updated: {}\n", updated.to_rfc3339()));
        }
        content.push_str("# Advisory pointer only - not authoritative; canonical artifacts live under canonical_root\n");
        content
    }

    /// `None` when no `session_id` line is present
    pub fn parse(content: &str) -> Option<Self> {
        let mut session_id = None;
        let mut canonical_root = None;
        let mut updated = None;

        for line in content.lines().map(str::trim) {
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "session_id" if !value.is_empty() => session_id = Some(value.to_string()),
                "canonical_root" if !value.is_empty() => canonical_root = Some(value.to_string()),
                "updated" => {
                    updated = DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }
                _ => {}
            }
        }

        let session_id = session_id?;
        Some(Self {
            canonical_root: canonical_root.unwrap_or_default(),
            session_id,
            updated,
        })
    }

    pub fn read(resolver: &PathResolver, project: &str) -> io::Result<Option<Self>> {
        let path = Self::path(resolver, project);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Self::parse(&String::from_utf8_lossy(&fs::read(path)?)))
    }

    pub fn write(&self, resolver: &PathResolver, project: &str) -> io::Result<PathBuf> {
        let path = Self::path(resolver, project);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.render())?;
        Ok(path)
    }

    /// Session root this pointer names, falling back to the session id
    pub fn session_root(&self, resolver: &PathResolver, project: &str) -> PathBuf {
        if self.canonical_root.is_empty() {
            resolver.session_root(project, &self.session_id)
        } else {
            resolver.root().join(&self.canonical_root)
        }
    }
}

/// `<stage>/current/<file>` indirection: a relative path to the newest
/// session's copy of the stage's primary artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePointer {
    pub stage: PipelineStage,
    /// Relative to the pointer file's directory
    pub target: String,
}

impl StagePointer {
    pub fn for_session(stage: PipelineStage, project: &str, session: &str) -> Self {
        let artifact = stage.primary_artifact();
        Self {
            stage,
            target: format!(
                "../../projects/{project}/sessions/{session}/{}/{}",
                stage.dir_name(),
                artifact.file_name()
            ),
        }
    }

    pub fn artifact(&self) -> ArtifactKind {
        self.stage.primary_artifact()
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        Self::pointer_path(root, self.stage)
    }

    pub fn pointer_path(root: &Path, stage: PipelineStage) -> PathBuf {
        root.join(stage.dir_name())
            .join("current")
            .join(stage.primary_artifact().file_name())
    }

    pub fn read(root: &Path, stage: PipelineStage) -> io::Result<Option<Self>> {
        let path = Self::pointer_path(root, stage);
        if !path.is_file() {
            return Ok(None);
        }
        let target = fs::read_to_string(path)?.trim().to_string();
        Ok(Some(Self { stage, target }))
    }

    pub fn write(&self, root: &Path) -> io::Result<PathBuf> {
        let path = self.path(root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &self.target)?;
        Ok(path)
    }

    /// Artifact path the pointer resolves to
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.stage.dir_name()).join("current").join(&self.target)
    }
}
