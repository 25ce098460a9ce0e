use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use super::{Command, CommandContext, CommandStatus};
use crate::governance::{ActiveActorGuard, Actor, GovernanceError, StateUpdate};

pub struct CheckActiveCommand {
    pub actor: Option<String>,
    pub warn_only: bool,
    pub quiet: bool,
}

impl CheckActiveCommand {
    pub fn new(actor: Option<String>) -> Self {
        Self {
            actor,
            warn_only: false,
            quiet: false,
        }
    }

    pub fn with_warn_only(mut self, warn_only: bool) -> Self {
        self.warn_only = warn_only;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn say(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn fail(&self, message: &str) -> Result<CommandStatus> {
        warn!(warn_only = self.warn_only, "{message}");
        if self.warn_only {
            self.say(&format!("⚠️  {message}"));
            Ok(CommandStatus::Success)
        } else {
            self.say(&format!("❌ {message}"));
            Ok(CommandStatus::CheckFailed)
        }
    }
}

impl Command for CheckActiveCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let Some(identity) = self.actor.clone().or_else(|| ctx.env_actor()) else {
            return self.fail(&format!(
                "No actor identity: pass --as <actor> or set {}",
                ctx.config.governance.actor_env_var
            ));
        };

        let caller: Actor = match identity.parse() {
            Ok(actor) => actor,
            Err(e) => return self.fail(&e.to_string()),
        };

        let state = ctx.store.load()?;
        let now = Utc::now();
        let staleness = ctx.staleness_monitor().describe(&state, now);

        if caller != state.active_actor {
            return self.fail(&format!(
                "{caller} is not the active actor (active: {}); wait for a handoff before writing",
                state.active_actor
            ));
        }

        // Successful checks refresh last_checked
        let refreshed = ctx.store.update(|current| {
            ActiveActorGuard::verify(caller.as_str(), current, "check-active")?;
            current.last_checked = Utc::now();
            Ok(StateUpdate::Persist(current.clone()))
        });
        let refreshed = match refreshed {
            Ok(state) => state,
            Err(e @ GovernanceError::PermissionDenied { .. }) => return self.fail(&e.to_string()),
            Err(e) => return Err(e.into()),
        };

        self.say(&format!("✅ {caller} is the active actor"));
        if let Some(indicator) = staleness {
            self.say(&format!(
                "⏰ State {indicator}: last checked {}",
                state.last_checked.to_rfc3339()
            ));
        }
        if refreshed.awaiting_handoff {
            self.say(&format!(
                "📬 Handoff awaiting acknowledgment: run `idse-gov acknowledge --as {caller}`"
            ));
        }
        Ok(CommandStatus::Success)
    }
}
