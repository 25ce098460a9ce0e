use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::GovernanceError;
use super::guard::ActiveActorGuard;
use super::store::{GovernanceStateStore, StateUpdate};
use super::templates::{direction_name, HandoffContext, HandoffTemplates};
use super::types::{
    Actor, ActiveStage, GovernanceState, HandoffPhase, HandoffRecord, Role, RoleChangeEvent,
};

const CYCLE_ID_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3fZ";
const SECOND_CYCLE_ID_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

/// Cycle id for a UTC instant, millisecond resolution
pub fn format_cycle_id(at: DateTime<Utc>) -> String {
    at.format(CYCLE_ID_FORMAT).to_string()
}

/// Parse both millisecond and whole-second cycle ids
pub fn parse_cycle_id(cycle_id: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(cycle_id, CYCLE_ID_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(cycle_id, SECOND_CYCLE_ID_FORMAT))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Cycle id for `now`, bumped past `previous` when the clock has not advanced
pub fn next_cycle_id(previous: &str, now: DateTime<Utc>) -> String {
    let Some(prev) = parse_cycle_id(previous) else {
        return format_cycle_id(now);
    };
    let next = if now.timestamp_millis() <= prev.timestamp_millis() {
        prev + chrono::Duration::milliseconds(1)
    } else {
        now
    };

    let candidate = format_cycle_id(next);
    if candidate.as_str() > previous {
        return candidate;
    }
    // Whole-second ids sort after any id inside the same second ('Z' > '.')
    DateTime::from_timestamp(prev.timestamp() + 1, 0)
        .map(format_cycle_id)
        .unwrap_or(candidate)
}

/// Outcome of an acknowledge, role, or stage transition
#[derive(Debug, Clone)]
pub enum TransitionResult {
    Applied {
        previous_phase: HandoffPhase,
        state: GovernanceState,
    },
    NoOp {
        message: String,
        state: GovernanceState,
    },
}

impl TransitionResult {
    pub fn state(&self) -> &GovernanceState {
        match self {
            TransitionResult::Applied { state, .. } | TransitionResult::NoOp { state, .. } => {
                state
            }
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, TransitionResult::NoOp { .. })
    }
}

/// Everything a caller needs to report a completed handoff
#[derive(Debug, Clone)]
pub struct HandoffReceipt {
    pub from: Actor,
    pub to: Actor,
    pub cycle_id: String,
    pub reason: String,
    pub document: PathBuf,
    /// A previous handoff was still unacknowledged when this one started
    pub superseded_pending: bool,
    pub state: GovernanceState,
}

/// The handoff state machine.
///
/// Idle (`awaiting_handoff = false`) and AwaitingHandoff phases; `handoff`
/// moves to AwaitingHandoff and flips the active actor, `acknowledge` by the
/// new actor returns to Idle. Role and stage changes never change the phase.
pub struct HandoffProtocol<'a> {
    store: &'a GovernanceStateStore,
    templates: HandoffTemplates,
    feedback_dir: PathBuf,
}

impl<'a> HandoffProtocol<'a> {
    pub fn new(
        store: &'a GovernanceStateStore,
        templates: HandoffTemplates,
        feedback_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            templates,
            feedback_dir: feedback_dir.into(),
        }
    }

    pub fn feedback_dir(&self) -> &Path {
        &self.feedback_dir
    }

    pub fn handoff(
        &self,
        from: &str,
        to: &str,
        reason: &str,
    ) -> Result<HandoffReceipt, GovernanceError> {
        let from: Actor = from.parse()?;
        let to: Actor = to.parse()?;
        if from == to {
            return Err(GovernanceError::SameActor(from));
        }

        let mut written: Option<PathBuf> = None;
        let result = self.store.update(|state| {
            if state.active_actor != from {
                return Err(GovernanceError::NotActive {
                    active: state.active_actor,
                    caller: from,
                });
            }

            let superseded_pending = state.awaiting_handoff;
            if superseded_pending {
                warn!(
                    cycle_id = %state.handoff_cycle_id,
                    "Handing off while the previous handoff is still unacknowledged"
                );
            }

            let now = Utc::now();
            let cycle_id = next_cycle_id(&state.handoff_cycle_id, now);
            let timestamp = now.to_rfc3339();

            let content = self.templates.render(
                from,
                to,
                &HandoffContext {
                    cycle_id: &cycle_id,
                    timestamp: &timestamp,
                    active_stage: state.active_stage.as_str(),
                    reason,
                },
            )?;
            let document = self.write_handoff_document(from, to, &cycle_id, &content)?;
            written = Some(document.clone());

            state.active_actor = to;
            state.awaiting_handoff = true;
            state.handoff_cycle_id = cycle_id.clone();
            state.last_handoff = Some(HandoffRecord {
                from,
                to,
                timestamp: now,
                notes: reason.to_string(),
            });
            state.last_checked = now;

            info!(
                from = %from,
                to = %to,
                cycle_id = %cycle_id,
                document = ?document,
                "Handoff initiated"
            );

            Ok(StateUpdate::Persist(HandoffReceipt {
                from,
                to,
                cycle_id,
                reason: reason.to_string(),
                document,
                superseded_pending,
                state: state.clone(),
            }))
        });

        // A document must not outlive a cycle id that was never persisted
        if let (Err(e), Some(document)) = (&result, &written) {
            warn!(document = ?document, error = %e, "Handoff not persisted; removing its document");
            let _ = fs::remove_file(document);
        }
        result
    }

    fn write_handoff_document(
        &self,
        from: Actor,
        to: Actor,
        cycle_id: &str,
        content: &str,
    ) -> Result<PathBuf, GovernanceError> {
        fs::create_dir_all(&self.feedback_dir)?;
        let path = self.feedback_dir.join(format!(
            "handoff_{}_{}.md",
            direction_name(from, to),
            cycle_id
        ));

        // Handoff documents are write-once
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(content.as_bytes())?;
        Ok(path)
    }

    pub fn acknowledge(&self, actor: &str) -> Result<TransitionResult, GovernanceError> {
        self.store.update(|state| {
            ActiveActorGuard::verify(actor, state, "acknowledge")?;

            if !state.awaiting_handoff {
                return Ok(StateUpdate::Unchanged(TransitionResult::NoOp {
                    message: "No handoff awaiting acknowledgment; nothing to acknowledge".to_string(),
                    state: state.clone(),
                }));
            }

            let previous_phase = state.phase();
            state.awaiting_handoff = false;
            state.last_checked = Utc::now();

            info!(
                actor = %state.active_actor,
                cycle_id = %state.handoff_cycle_id,
                "Handoff acknowledged"
            );

            Ok(StateUpdate::Persist(TransitionResult::Applied {
                previous_phase,
                state: state.clone(),
            }))
        })
    }

    pub fn role_change(
        &self,
        actor: &str,
        new_role: &str,
        reason: Option<&str>,
    ) -> Result<TransitionResult, GovernanceError> {
        let new_role: Role = new_role.parse()?;

        self.store.update(|state| {
            ActiveActorGuard::verify(actor, state, "role change")?;

            let current_role = state.current_role();
            if current_role == Some(new_role) {
                return Ok(StateUpdate::Unchanged(TransitionResult::NoOp {
                    message: format!("Already in role: {new_role}"),
                    state: state.clone(),
                }));
            }

            let reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| new_role.default_reason());
            let now = Utc::now();
            let previous_phase = state.phase();

            state.role_change_event = Some(RoleChangeEvent {
                from: current_role
                    .map(|role| role.as_str().to_string())
                    .unwrap_or_else(|| "unspecified".to_string()),
                to: new_role,
                reason,
                timestamp: now,
            });
            state.last_checked = now;

            info!(
                actor = %state.active_actor,
                from = ?current_role,
                to = %new_role,
                "Role changed"
            );

            Ok(StateUpdate::Persist(TransitionResult::Applied {
                previous_phase,
                state: state.clone(),
            }))
        })
    }

    pub fn stage_change(
        &self,
        actor: &str,
        new_stage: &str,
    ) -> Result<TransitionResult, GovernanceError> {
        let new_stage: ActiveStage = new_stage.parse()?;

        self.store.update(|state| {
            ActiveActorGuard::verify(actor, state, "stage change")?;

            if state.active_stage == new_stage {
                return Ok(StateUpdate::Unchanged(TransitionResult::NoOp {
                    message: format!("Already in stage: {new_stage}"),
                    state: state.clone(),
                }));
            }

            let previous_stage = state.active_stage;
            let previous_phase = state.phase();
            state.active_stage = new_stage;
            state.last_checked = Utc::now();

            info!(
                actor = %state.active_actor,
                from = %previous_stage,
                to = %new_stage,
                "Stage changed"
            );

            Ok(StateUpdate::Persist(TransitionResult::Applied {
                previous_phase,
                state: state.clone(),
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        store: GovernanceStateStore,
        feedback_dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let store = GovernanceStateStore::new(temp_dir.path().join("state/state.json"));
            let feedback_dir = temp_dir.path().join("feedback");
            Self {
                _temp_dir: temp_dir,
                store,
                feedback_dir,
            }
        }

        fn protocol(&self) -> HandoffProtocol<'_> {
            HandoffProtocol::new(&self.store, HandoffTemplates::builtin(), &self.feedback_dir)
        }

        fn feedback_files(&self) -> usize {
            fs::read_dir(&self.feedback_dir)
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    #[test]
    fn test_handoff_flips_active_actor_and_awaits() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();

        let receipt = protocol
            .handoff("codex_gpt", "claude_code", "review complete")
            .unwrap();

        let state = fixture.store.load().unwrap();
        assert_eq!(state.active_actor, Actor::ClaudeCode);
        assert!(state.awaiting_handoff);
        assert_eq!(state.handoff_cycle_id, receipt.cycle_id);
        let record = state.last_handoff.unwrap();
        assert_eq!(record.from, Actor::CodexGpt);
        assert_eq!(record.notes, "review complete");

        assert!(receipt.document.exists());
        let name = receipt.document.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("handoff_codex_to_claude_"));
        let content = fs::read_to_string(&receipt.document).unwrap();
        assert!(content.contains("review complete"));
    }

    #[test]
    fn test_handoff_from_inactive_actor_changes_nothing() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();
        let before = fixture.store.load().unwrap();

        let err = protocol
            .handoff("claude_code", "codex_gpt", "not my turn")
            .unwrap_err();

        assert!(matches!(err, GovernanceError::NotActive { .. }));
        assert_eq!(fixture.store.load().unwrap(), before);
        assert_eq!(fixture.feedback_files(), 0);
    }

    #[test]
    fn test_failed_save_removes_handoff_document() {
        let fixture = Fixture::new();
        let before = fixture.store.load().unwrap();
        // A directory where the save's temp file goes makes the write fail
        let mut temp_path = fixture.store.state_file().as_os_str().to_owned();
        temp_path.push(format!(".{}.tmp", std::process::id()));
        fs::create_dir_all(&temp_path).unwrap();

        let result = fixture
            .protocol()
            .handoff("codex_gpt", "claude_code", "review complete");

        assert!(matches!(result, Err(GovernanceError::Io(_))));
        assert_eq!(fixture.feedback_files(), 0);
        assert_eq!(fixture.store.load().unwrap(), before);
    }

    #[test]
    fn test_handoff_to_self_is_rejected() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.protocol().handoff("codex_gpt", "codex_gpt", "loop"),
            Err(GovernanceError::SameActor(Actor::CodexGpt))
        ));
    }

    #[test]
    fn test_handoff_without_template_is_invalid_direction() {
        let fixture = Fixture::new();
        let empty_dir = fixture.feedback_dir.with_file_name("templates");
        fs::create_dir_all(&empty_dir).unwrap();
        let templates = HandoffTemplates::from_dir(&empty_dir).unwrap();
        let protocol = HandoffProtocol::new(&fixture.store, templates, &fixture.feedback_dir);
        let before = fixture.store.load().unwrap();

        assert!(matches!(
            protocol.handoff("codex_gpt", "claude_code", "x"),
            Err(GovernanceError::InvalidDirection { .. })
        ));
        assert_eq!(fixture.store.load().unwrap(), before);
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();
        protocol.handoff("codex_gpt", "claude_code", "ready").unwrap();

        let first = protocol.acknowledge("claude_code").unwrap();
        assert!(!first.is_noop());
        assert!(!first.state().awaiting_handoff);

        let second = protocol.acknowledge("claude_code").unwrap();
        match second {
            TransitionResult::NoOp { message, .. } => {
                assert!(message.contains("nothing to acknowledge"))
            }
            other => panic!("expected no-op, got {other:?}"),
        }
    }

    #[test]
    fn test_acknowledge_by_previous_actor_is_denied() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();
        protocol.handoff("codex_gpt", "claude_code", "ready").unwrap();

        assert!(matches!(
            protocol.acknowledge("codex_gpt"),
            Err(GovernanceError::PermissionDenied { .. })
        ));
        assert!(fixture.store.load().unwrap().awaiting_handoff);
    }

    #[test]
    fn test_consecutive_handoffs_have_increasing_cycle_ids() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();

        let first = protocol.handoff("codex_gpt", "claude_code", "one").unwrap();
        protocol.acknowledge("claude_code").unwrap();
        let second = protocol.handoff("claude_code", "codex_gpt", "two").unwrap();

        assert!(second.cycle_id > first.cycle_id);
        assert_ne!(first.document, second.document);
    }

    #[test]
    fn test_role_change_with_default_reason() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();

        let result = protocol.role_change("codex_gpt", "reviewer", None).unwrap();
        let event = result.state().role_change_event.clone().unwrap();
        assert_eq!(event.from, "unspecified");
        assert_eq!(event.to, Role::Reviewer);
        assert!(event.reason.contains("Article IX"));

        let again = protocol.role_change("codex_gpt", "reviewer", Some("again")).unwrap();
        assert!(again.is_noop());

        let next = protocol.role_change("codex_gpt", "builder", Some("fixing")).unwrap();
        let event = next.state().role_change_event.clone().unwrap();
        assert_eq!(event.from, "reviewer");
        assert_eq!(event.reason, "fixing");
    }

    #[test]
    fn test_invalid_role_leaves_event_unchanged() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();
        protocol.role_change("codex_gpt", "planner", None).unwrap();
        let before = fixture.store.load().unwrap().role_change_event;

        assert!(matches!(
            protocol.role_change("codex_gpt", "overlord", None),
            Err(GovernanceError::InvalidRole { .. })
        ));
        assert_eq!(fixture.store.load().unwrap().role_change_event, before);
    }

    #[test]
    fn test_stage_change() {
        let fixture = Fixture::new();
        let protocol = fixture.protocol();

        let result = protocol.stage_change("codex_gpt", "Specification").unwrap();
        assert_eq!(result.state().active_stage, ActiveStage::Specification);
        assert!(protocol.stage_change("codex_gpt", "specification").unwrap().is_noop());
        assert!(matches!(
            protocol.stage_change("codex_gpt", "Deploy"),
            Err(GovernanceError::InvalidStage { .. })
        ));
        assert!(matches!(
            protocol.stage_change("claude_code", "Plan"),
            Err(GovernanceError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_next_cycle_id_is_strictly_increasing() {
        let now = Utc::now();
        let current = format_cycle_id(now);
        let next = next_cycle_id(&current, now);
        assert!(next > current);

        let earlier = now - chrono::Duration::seconds(10);
        let after_clock_step = next_cycle_id(&current, earlier);
        assert!(after_clock_step > current);
    }

    #[test]
    fn test_next_cycle_id_after_whole_second_id_sorts_later() {
        use chrono::TimeZone;

        let previous = "2026-01-02T08-15-00Z";
        let same_second = Utc.with_ymd_and_hms(2026, 1, 2, 8, 15, 0).unwrap()
            + chrono::Duration::milliseconds(500);
        let next = next_cycle_id(previous, same_second);
        assert_eq!(next, "2026-01-02T08-15-01.000Z");
        assert!(next.as_str() > previous);

        let later = Utc.with_ymd_and_hms(2026, 1, 2, 8, 15, 3).unwrap();
        assert_eq!(next_cycle_id(previous, later), "2026-01-02T08-15-03.000Z");
    }

    #[test]
    fn test_parses_whole_second_cycle_ids() {
        let parsed = parse_cycle_id("2025-11-30T08-15-00Z").unwrap();
        assert_eq!(parsed.timestamp() % 60, 0);
        assert!(parse_cycle_id("not-a-cycle").is_none());
    }
}
