use tracing::warn;

use super::error::GovernanceError;
use super::types::{Actor, GovernanceState};

/// Gate for every state-mutating command: only the active actor may proceed.
pub struct ActiveActorGuard;

impl ActiveActorGuard {
    /// Returns the parsed caller when it is the active actor
    pub fn verify(
        calling_actor: &str,
        state: &GovernanceState,
        command: &str,
    ) -> Result<Actor, GovernanceError> {
        let caller: Actor = calling_actor.parse()?;

        if caller != state.active_actor {
            warn!(
                command = command,
                active = %state.active_actor,
                caller = %caller,
                "Rejected command from inactive actor"
            );
            return Err(GovernanceError::PermissionDenied {
                command: command.to_string(),
                active: state.active_actor,
                caller,
            });
        }

        Ok(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_active_actor_passes() {
        let state = GovernanceState::bootstrap(Utc::now());
        let actor = ActiveActorGuard::verify("codex_gpt", &state, "acknowledge").unwrap();
        assert_eq!(actor, Actor::CodexGpt);
    }

    #[test]
    fn test_inactive_actor_is_denied_with_both_names() {
        let state = GovernanceState::bootstrap(Utc::now());
        let err = ActiveActorGuard::verify("claude_code", &state, "stage change").unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, GovernanceError::PermissionDenied { .. }));
        assert!(message.contains("codex_gpt"));
        assert!(message.contains("claude_code"));
        assert!(message.contains("stage change"));
    }

    #[test]
    fn test_unknown_actor_is_invalid() {
        let state = GovernanceState::bootstrap(Utc::now());
        assert!(matches!(
            ActiveActorGuard::verify("gpt5", &state, "role change"),
            Err(GovernanceError::InvalidActor { .. })
        ));
    }
}
