use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::pointer::{SessionPointer, StagePointer};
use crate::layout::{validate_identifier, IdentifierError, PathResolver, PipelineStage};
use crate::telemetry::host_name;

/// Reserved session holding project-level meta documents
pub const BLUEPRINT_SESSION: &str = "__blueprint__";
pub const METADATA_DIR: &str = "metadata";
pub const OWNER_FILE: &str = ".owner";
pub const SESSION_RECORD_FILE: &str = "session.json";

/// Files every session's metadata directory must carry
pub const REQUIRED_METADATA_FILES: [&str; 5] = [
    OWNER_FILE,
    "collaborators.md",
    "changelog.md",
    "README.md",
    "review-checklist.md",
];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session name is required")]
    EmptySessionName,

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Project '{0}' has no sessions directory")]
    ProjectNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of scaffolding a session; persisted as `metadata/session.json`.
///
/// Paths are relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub project: String,
    pub session_id: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_blueprint: bool,
    pub session_root: PathBuf,
    pub canonical_paths: BTreeMap<PipelineStage, PathBuf>,
    pub project_readme: PathBuf,
    pub audit_file: PathBuf,
}

impl SessionRecord {
    pub fn record_path(resolver: &PathResolver, project: &str, session: &str) -> PathBuf {
        resolver
            .session_root(project, session)
            .join(METADATA_DIR)
            .join(SESSION_RECORD_FILE)
    }

    pub fn read(
        resolver: &PathResolver,
        project: &str,
        session: &str,
    ) -> Result<Option<Self>, SessionError> {
        let path = Self::record_path(resolver, project, session);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?))
    }
}

/// Creates the canonical directory tree and bookkeeping files for a session.
///
/// Re-running with the same identifiers is safe: directories are reused,
/// pointers are rewritten and a fresh audit document is added.
#[derive(Debug, Clone)]
pub struct SessionScaffolder {
    resolver: PathResolver,
    feedback_dir: PathBuf,
}

impl SessionScaffolder {
    /// `feedback_dir` is relative to the resolver root unless absolute
    pub fn new(resolver: PathResolver, feedback_dir: impl AsRef<Path>) -> Self {
        let feedback_dir = resolver.root().join(feedback_dir);
        Self {
            resolver,
            feedback_dir,
        }
    }

    pub fn create(
        &self,
        project: &str,
        session_name: &str,
        owner: &str,
    ) -> Result<SessionRecord, SessionError> {
        let session = session_name.trim();
        if session.is_empty() {
            return Err(SessionError::EmptySessionName);
        }
        validate_identifier("project", project)?;
        validate_identifier("session", session)?;

        let is_blueprint = session == BLUEPRINT_SESSION;
        let owner = owner.trim();
        let now = Utc::now();

        info!(project, session, owner, is_blueprint, "Creating session");

        let canonical_paths = self.create_stage_directories(project, session)?;
        let session_root = self.resolver.session_root(project, session);
        let metadata_dir = session_root.join(METADATA_DIR);
        fs::create_dir_all(&metadata_dir)?;
        self.write_owner_marker(&metadata_dir, owner)?;
        self.write_metadata_stubs(&metadata_dir, project, session, owner, now)?;

        let project_readme = self.update_project_readme(project, session, now)?;

        // The blueprint is never "the current session"
        let mut stage_pointers = Vec::new();
        if !is_blueprint {
            SessionPointer::new(project, session, now).write(&self.resolver, project)?;
            for stage in PipelineStage::ALL {
                let pointer = StagePointer::for_session(stage, project, session);
                pointer.write(self.resolver.root())?;
                stage_pointers.push(pointer);
            }
        }

        let audit_file =
            self.write_audit(project, session, owner, now, &canonical_paths, &stage_pointers)?;

        let previous = match SessionRecord::read(&self.resolver, project, session) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(
                    project,
                    session,
                    error = %e,
                    "Ignoring unreadable session record; creation time reset"
                );
                None
            }
        };
        let record = SessionRecord {
            project: project.to_string(),
            session_id: session.to_string(),
            owner: owner.to_string(),
            created_at: previous.map(|r| r.created_at).unwrap_or(now),
            is_blueprint,
            session_root: self.relative(&session_root),
            canonical_paths: canonical_paths
                .iter()
                .map(|(stage, path)| (*stage, self.relative(path)))
                .collect(),
            project_readme: self.relative(&project_readme),
            audit_file: self.relative(&audit_file),
        };

        let mut serialized = serde_json::to_string_pretty(&record)?;
        serialized.push('\n');
        fs::write(metadata_dir.join(SESSION_RECORD_FILE), serialized)?;

        info!(project, session, audit = ?record.audit_file, "Session created");
        Ok(record)
    }

    pub fn create_blueprint(&self, project: &str, owner: &str) -> Result<SessionRecord, SessionError> {
        self.create(project, BLUEPRINT_SESSION, owner)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.resolver.root())
            .unwrap_or(path)
            .to_path_buf()
    }

    fn create_stage_directories(
        &self,
        project: &str,
        session: &str,
    ) -> Result<BTreeMap<PipelineStage, PathBuf>, SessionError> {
        let mut paths = BTreeMap::new();
        for stage in PipelineStage::ALL {
            let dir = self.resolver.canonical_stage_dir(project, session, stage);
            fs::create_dir_all(&dir)?;
            paths.insert(stage, dir);
        }
        Ok(paths)
    }

    fn write_owner_marker(&self, metadata_dir: &Path, owner: &str) -> Result<(), SessionError> {
        let owner_file = metadata_dir.join(OWNER_FILE);
        if let Ok(existing) = fs::read_to_string(&owner_file) {
            if existing.trim() != owner {
                warn!(
                    previous = existing.trim(),
                    owner,
                    "Replacing session owner marker"
                );
            }
        }
        fs::write(owner_file, owner)?;
        Ok(())
    }

    /// Seed the remaining metadata documents; existing files are kept as-is
    fn write_metadata_stubs(
        &self,
        metadata_dir: &Path,
        project: &str,
        session: &str,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let stubs = [
            (
                "collaborators.md",
                format!("# Collaborators: {project} / {session}\n\n- {owner} (owner)\n"),
            ),
            (
                "changelog.md",
                format!(
                    "# Changelog: {project} / {session}\n\n- {}: session created by {owner}\n",
                    now.format("%Y-%m-%d")
                ),
            ),
            (
                "README.md",
                format!("# {project} / {session}\n\nOwner: {owner}\n"),
            ),
            (
                "review-checklist.md",
                "# Review Checklist\n\n- [ ] Intent\n- [ ] Context\n- [ ] Specification\n- [ ] Plan\n- [ ] Tasks\n- [ ] Implementation\n- [ ] Feedback\n".to_string(),
            ),
        ];

        for (name, content) in stubs {
            let path = metadata_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => file.write_all(content.as_bytes())?,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn update_project_readme(
        &self,
        project: &str,
        session: &str,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, SessionError> {
        let project_dir = self.resolver.project_dir(project);
        fs::create_dir_all(&project_dir)?;
        let readme = project_dir.join("README.md");
        let entry = format!("`{session}`");

        if !readme.exists() {
            let content = format!(
                "# {project}\n\nProject initialized: {}\n\n## Sessions\n\n- {entry} (created {})\n",
                now.to_rfc3339(),
                now.format("%Y-%m-%d")
            );
            fs::write(&readme, content)?;
        } else if !fs::read_to_string(&readme)?.contains(&entry) {
            let mut file = OpenOptions::new().append(true).open(&readme)?;
            writeln!(file, "- {entry} (created {})", now.format("%Y-%m-%d"))?;
        }

        Ok(readme)
    }

    fn write_audit(
        &self,
        project: &str,
        session: &str,
        owner: &str,
        now: DateTime<Utc>,
        canonical_paths: &BTreeMap<PipelineStage, PathBuf>,
        stage_pointers: &[StagePointer],
    ) -> Result<PathBuf, SessionError> {
        let mut content = format!(
            "# Bootstrap Audit: {project} / {session}\n\n\
             **Created:** {}\n\
             **Owner:** {owner}\n\
             **Session ID:** {session}\n\
             **Host:** {}\n\n\
             ## Canonical Paths Created\n",
            now.to_rfc3339(),
            host_name()
        );
        for path in canonical_paths.values() {
            content.push_str(&format!("- {}/\n", self.resolver.display(path)));
        }

        content.push_str("\n## Advisory Pointer\n");
        if stage_pointers.is_empty() {
            content.push_str("- unchanged (blueprint session)\n");
        } else {
            content.push_str(&format!(
                "- projects/{project}/{} → {session}\n",
                SessionPointer::FILE_NAME
            ));
        }

        content.push_str("\n## Current Pointers Updated\n");
        if stage_pointers.is_empty() {
            content.push_str("- None\n");
        }
        for pointer in stage_pointers {
            content.push_str(&format!(
                "- {} → {}\n",
                self.resolver.display(&pointer.path(self.resolver.root())),
                pointer.target
            ));
        }

        content.push_str(&format!(
            "\n## Verification\n\
             - [ ] Owner marker: projects/{project}/sessions/{session}/{METADATA_DIR}/{OWNER_FILE}\n\
             - [ ] Compliance: `idse-gov check-compliance --project {project} --session {session}`\n"
        ));

        Ok(write_audit_document(
            &self.feedback_dir,
            &format!("bootstrap_{project}_{session}"),
            now,
            &content,
        )?)
    }
}

/// Write a new `<prefix>_<timestamp>.md` document, never replacing an existing one
pub(crate) fn write_audit_document(
    dir: &Path,
    prefix: &str,
    now: DateTime<Utc>,
    content: &str,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stamp = now.format("%Y-%m-%dT%H-%M-%S%.3fZ");

    let mut attempt = 0;
    loop {
        let name = if attempt == 0 {
            format!("{prefix}_{stamp}.md")
        } else {
            format!("{prefix}_{stamp}-{attempt}.md")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(content.as_bytes())?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scaffolder(temp_dir: &TempDir) -> SessionScaffolder {
        SessionScaffolder::new(
            PathResolver::new(temp_dir.path()),
            "idse-governance/feedback",
        )
    }

    #[test]
    fn test_create_session_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let record = scaffolder(&temp_dir).create("Acme", "launch", "alice").unwrap();

        let session_root = temp_dir.path().join("projects/Acme/sessions/launch");
        let stage_dirs: Vec<_> = fs::read_dir(&session_root)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != METADATA_DIR)
            .collect();
        assert_eq!(stage_dirs.len(), 7);
        assert_eq!(record.canonical_paths.len(), 7);

        let owner = fs::read_to_string(session_root.join("metadata/.owner")).unwrap();
        assert_eq!(owner, "alice");

        let pointer =
            fs::read_to_string(temp_dir.path().join("projects/Acme/CURRENT_SESSION")).unwrap();
        assert!(pointer.contains("session_id: launch"));

        let audit = fs::read_to_string(temp_dir.path().join(&record.audit_file)).unwrap();
        for path in record.canonical_paths.values() {
            assert!(audit.contains(&format!("- {}/", path.display())), "{path:?}");
        }
        let audits = fs::read_dir(temp_dir.path().join("idse-governance/feedback"))
            .unwrap()
            .count();
        assert_eq!(audits, 1);
    }

    #[test]
    fn test_create_updates_current_pointers_and_record() {
        let temp_dir = TempDir::new().unwrap();
        let scaffolder = scaffolder(&temp_dir);
        scaffolder.create("Acme", "launch", "alice").unwrap();

        let pointer = StagePointer::read(temp_dir.path(), PipelineStage::Specs)
            .unwrap()
            .unwrap();
        assert_eq!(pointer.target, "../../projects/Acme/sessions/launch/specs/spec.md");

        let resolver = PathResolver::new(temp_dir.path());
        let record = SessionRecord::read(&resolver, "Acme", "launch").unwrap().unwrap();
        assert_eq!(record.owner, "alice");
        assert!(!record.is_blueprint);
    }

    #[test]
    fn test_rerun_is_idempotent_and_keeps_creation_time() {
        let temp_dir = TempDir::new().unwrap();
        let scaffolder = scaffolder(&temp_dir);
        let first = scaffolder.create("Acme", "launch", "alice").unwrap();
        let second = scaffolder.create("Acme", "launch", "bob").unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_ne!(first.audit_file, second.audit_file);

        let readme = fs::read_to_string(temp_dir.path().join("projects/Acme/README.md")).unwrap();
        assert_eq!(readme.matches("`launch`").count(), 1);

        let owner =
            fs::read_to_string(temp_dir.path().join("projects/Acme/sessions/launch/metadata/.owner"))
                .unwrap();
        assert_eq!(owner, "bob");
    }

    #[test]
    fn test_corrupt_session_record_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let scaffolder = scaffolder(&temp_dir);
        scaffolder.create("Acme", "launch", "alice").unwrap();

        let record_path = temp_dir
            .path()
            .join("projects/Acme/sessions/launch/metadata")
            .join(SESSION_RECORD_FILE);
        fs::write(&record_path, "{ not json").unwrap();

        let rerun = scaffolder.create("Acme", "launch", "bob").unwrap();
        assert_eq!(rerun.owner, "bob");

        let resolver = PathResolver::new(temp_dir.path());
        let stored = SessionRecord::read(&resolver, "Acme", "launch").unwrap().unwrap();
        assert_eq!(stored.created_at, rerun.created_at);
    }

    #[test]
    fn test_new_session_moves_pointers_and_appends_readme() {
        let temp_dir = TempDir::new().unwrap();
        let scaffolder = scaffolder(&temp_dir);
        scaffolder.create("Acme", "launch", "alice").unwrap();
        scaffolder.create("Acme", "growth", "alice").unwrap();

        let resolver = PathResolver::new(temp_dir.path());
        let pointer = SessionPointer::read(&resolver, "Acme").unwrap().unwrap();
        assert_eq!(pointer.session_id, "growth");

        let readme = fs::read_to_string(temp_dir.path().join("projects/Acme/README.md")).unwrap();
        assert!(readme.contains("`launch`"));
        assert!(readme.contains("`growth`"));
    }

    #[test]
    fn test_blueprint_leaves_pointers_alone() {
        let temp_dir = TempDir::new().unwrap();
        let scaffolder = scaffolder(&temp_dir);
        scaffolder.create("Acme", "launch", "alice").unwrap();
        let record = scaffolder.create_blueprint("Acme", "alice").unwrap();

        assert!(record.is_blueprint);
        let resolver = PathResolver::new(temp_dir.path());
        let pointer = SessionPointer::read(&resolver, "Acme").unwrap().unwrap();
        assert_eq!(pointer.session_id, "launch");
    }

    #[test]
    fn test_metadata_stubs_are_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let scaffolder = scaffolder(&temp_dir);
        scaffolder.create("Acme", "launch", "alice").unwrap();

        let metadata = temp_dir.path().join("projects/Acme/sessions/launch/metadata");
        for name in REQUIRED_METADATA_FILES {
            assert!(metadata.join(name).is_file(), "{name}");
        }

        fs::write(metadata.join("changelog.md"), "curated").unwrap();
        scaffolder.create("Acme", "launch", "alice").unwrap();
        assert_eq!(fs::read_to_string(metadata.join("changelog.md")).unwrap(), "curated");
    }

    #[test]
    fn test_empty_and_invalid_names_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let scaffolder = scaffolder(&temp_dir);

        assert!(matches!(
            scaffolder.create("Acme", "  ", "alice"),
            Err(SessionError::EmptySessionName)
        ));
        assert!(matches!(
            scaffolder.create("Acme", "../escape", "alice"),
            Err(SessionError::InvalidIdentifier(_))
        ));
        assert!(!temp_dir.path().join("projects").exists());
    }
}
