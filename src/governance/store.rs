use chrono::Utc;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::GovernanceError;
use super::types::{GovernanceState, REQUIRED_STATE_FIELDS};

/// Result of a read-modify-write closure passed to [`GovernanceStateStore::update`]
#[derive(Debug)]
pub enum StateUpdate<T> {
    /// The state was changed and must be written back
    Persist(T),
    /// Nothing changed; skip the write
    Unchanged(T),
}

/// File-backed store for the single governance record.
///
/// Saves replace the file by rename so readers never observe a partial
/// record. Read-modify-write cycles go through [`update`](Self::update),
/// which serializes concurrent invocations with an advisory lock on a
/// sibling `.lock` file.
#[derive(Debug, Clone)]
pub struct GovernanceStateStore {
    state_file: PathBuf,
}

impl GovernanceStateStore {
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
        }
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    fn lock_file_path(&self) -> PathBuf {
        let mut name = self.state_file.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn temp_file_path(&self) -> PathBuf {
        let mut name = self.state_file.as_os_str().to_owned();
        name.push(format!(".{}.tmp", std::process::id()));
        PathBuf::from(name)
    }

    /// Load the record, bootstrapping and persisting defaults on first use
    pub fn load(&self) -> Result<GovernanceState, GovernanceError> {
        if let Some(state) = self.peek()? {
            return Ok(state);
        }

        let state = GovernanceState::bootstrap(Utc::now());
        self.save(&state)?;
        info!(file = ?self.state_file, "Created default governance state");
        Ok(state)
    }

    /// Read-only load; `None` when no record has been written yet
    pub fn peek(&self) -> Result<Option<GovernanceState>, GovernanceError> {
        if !self.state_file.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.state_file)?;
        self.parse(&contents).map(Some)
    }

    fn parse(&self, contents: &str) -> Result<GovernanceState, GovernanceError> {
        let malformed = |reason: String| GovernanceError::MalformedState {
            path: self.state_file.clone(),
            reason,
        };

        let value: serde_json::Value =
            serde_json::from_str(contents).map_err(|e| malformed(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| malformed("expected a JSON object".to_string()))?;

        if let Some(missing) = REQUIRED_STATE_FIELDS
            .iter()
            .find(|field| !object.contains_key(**field))
        {
            return Err(malformed(format!("missing required field: {missing}")));
        }

        let state: GovernanceState =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
        state.validate()?;

        debug!(
            active_actor = %state.active_actor,
            cycle_id = %state.handoff_cycle_id,
            "Governance state loaded"
        );
        Ok(state)
    }

    /// Validate and atomically replace the persisted record
    pub fn save(&self, state: &GovernanceState) -> Result<(), GovernanceError> {
        state.validate()?;

        if let Some(parent) = self.state_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut serialized = serde_json::to_string_pretty(state)?;
        serialized.push('\n');

        // Write to temporary file first, then rename (atomic operation)
        let temp_file = self.temp_file_path();
        {
            let mut file = File::create(&temp_file)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&temp_file, &self.state_file) {
            let _ = fs::remove_file(&temp_file);
            return Err(e.into());
        }

        info!(
            file = ?self.state_file,
            active_actor = %state.active_actor,
            awaiting_handoff = state.awaiting_handoff,
            "Governance state saved"
        );
        Ok(())
    }

    /// Run a locked load → mutate → save cycle.
    ///
    /// The closure's error aborts the cycle before anything is written.
    pub fn update<T, F>(&self, mutate: F) -> Result<T, GovernanceError>
    where
        F: FnOnce(&mut GovernanceState) -> Result<StateUpdate<T>, GovernanceError>,
    {
        if let Some(parent) = self.state_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_path = self.lock_file_path();
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock.write().map_err(|e| GovernanceError::Lock {
            reason: format!("{}: {e}", lock_path.display()),
        })?;

        let mut state = self.load()?;
        match mutate(&mut state)? {
            StateUpdate::Persist(value) => {
                self.save(&state)?;
                Ok(value)
            }
            StateUpdate::Unchanged(value) => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::types::{Actor, ActiveStage};
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> GovernanceStateStore {
        GovernanceStateStore::new(temp_dir.path().join("state").join("state.json"))
    }

    #[test]
    fn test_load_bootstraps_default_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let state = store.load().unwrap();
        assert!(store.state_file().exists());
        assert_eq!(state.active_actor, Actor::CodexGpt);
        assert!(!state.awaiting_handoff);

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, state);
    }

    #[test]
    fn test_peek_never_creates_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        assert!(store.peek().unwrap().is_none());
        assert!(!store.state_file().exists());

        let state = store.load().unwrap();
        assert_eq!(store.peek().unwrap(), Some(state));
    }

    #[test]
    fn test_save_load_round_trip_keeps_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.load().unwrap();

        let before = fs::read_to_string(store.state_file()).unwrap();
        let state = store.load().unwrap();
        store.save(&state).unwrap();
        let after = fs::read_to_string(store.state_file()).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_serialized_key_order_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.load().unwrap();

        let contents = fs::read_to_string(store.state_file()).unwrap();
        let positions: Vec<usize> = [
            "\"active_actor\"",
            "\"awaiting_handoff\"",
            "\"handoff_cycle_id\"",
            "\"active_stage\"",
            "\"role_change_event\"",
            "\"last_handoff\"",
            "\"last_checked\"",
        ]
        .iter()
        .map(|key| contents.find(key).unwrap())
        .collect();

        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_unknown_actor_is_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.load().unwrap();

        let contents = fs::read_to_string(store.state_file())
            .unwrap()
            .replace("codex_gpt", "gemini");
        fs::write(store.state_file(), contents).unwrap();

        assert!(matches!(
            store.load(),
            Err(GovernanceError::MalformedState { .. })
        ));
    }

    #[test]
    fn test_missing_required_field_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::create_dir_all(store.state_file().parent().unwrap()).unwrap();
        fs::write(
            store.state_file(),
            r#"{"active_actor": "codex_gpt", "awaiting_handoff": false}"#,
        )
        .unwrap();

        match store.load() {
            Err(GovernanceError::MalformedState { reason, .. }) => {
                assert!(reason.contains("handoff_cycle_id"));
            }
            other => panic!("expected malformed state, got {other:?}"),
        }
    }

    #[test]
    fn test_save_rejects_invalid_state_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let original = store.load().unwrap();

        let mut broken = original.clone();
        broken.handoff_cycle_id = String::new();
        assert!(matches!(store.save(&broken), Err(GovernanceError::Validation(_))));
        assert_eq!(store.load().unwrap(), original);
    }

    #[test]
    fn test_update_unchanged_skips_write() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let original = store.load().unwrap();

        let stage = store
            .update(|state| {
                state.active_stage = ActiveStage::Plan;
                Ok(StateUpdate::Unchanged(state.active_stage))
            })
            .unwrap();

        assert_eq!(stage, ActiveStage::Plan);
        assert_eq!(store.load().unwrap(), original);
    }

    #[test]
    fn test_update_error_leaves_state_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let original = store.load().unwrap();

        let result: Result<(), _> = store.update(|state| {
            state.active_stage = ActiveStage::Feedback;
            Err(GovernanceError::Validation("rejected".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.load().unwrap(), original);
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 25;

        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store
            .update(|state| {
                state.handoff_cycle_id = "#0".to_string();
                Ok(StateUpdate::Persist(()))
            })
            .unwrap();

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..ROUNDS {
                        store
                            .update(|state| {
                                let count: usize =
                                    state.handoff_cycle_id.trim_start_matches('#').parse().unwrap();
                                state.handoff_cycle_id = format!("#{}", count + 1);
                                Ok(StateUpdate::Persist(()))
                            })
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(
            store.load().unwrap().handoff_cycle_id,
            format!("#{}", THREADS * ROUNDS)
        );
    }
}
