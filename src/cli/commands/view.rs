use anyhow::Result;
use chrono::Utc;

use super::{Command, CommandContext, CommandStatus};
use crate::governance::GovernanceState;

/// Read-only: never creates or rewrites the state file
pub struct ViewCommand;

impl Command for ViewCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<CommandStatus> {
        let now = Utc::now();
        let state = match ctx.store.peek()? {
            Some(state) => state,
            None => {
                println!(
                    "ℹ️  No governance state at {} yet; showing defaults",
                    ctx.display_path(ctx.store.state_file())
                );
                GovernanceState::bootstrap(now)
            }
        };

        println!("🤝 GOVERNANCE STATE");
        println!("==================");
        println!("👤 Active actor:     {}", state.active_actor);
        println!("🔁 Phase:            {}", state.phase());
        println!("🆔 Cycle:            {}", state.handoff_cycle_id);
        println!("🎯 Stage:            {}", state.active_stage);
        match &state.role_change_event {
            Some(event) => println!(
                "🎭 Role:             {} (from {}, {}; {})",
                event.to,
                event.from,
                event.timestamp.to_rfc3339(),
                event.reason
            ),
            None => println!("🎭 Role:             unspecified"),
        }
        match &state.last_handoff {
            Some(handoff) => println!(
                "🔄 Last handoff:     {} → {} at {} ({})",
                handoff.from,
                handoff.to,
                handoff.timestamp.to_rfc3339(),
                handoff.notes
            ),
            None => println!("🔄 Last handoff:     none"),
        }

        let staleness = ctx
            .staleness_monitor()
            .describe(&state, now)
            .unwrap_or_else(|| "fresh".to_string());
        println!(
            "🕒 Last checked:     {} ({staleness})",
            state.last_checked.to_rfc3339()
        );

        let env_var = &ctx.config.governance.actor_env_var;
        match ctx.env_actor() {
            Some(actor) if actor == state.active_actor.as_str() => {
                println!("🔐 {env_var}:           {actor} (active)")
            }
            Some(actor) => println!("🔐 {env_var}:           {actor} (not active)"),
            None => println!("🔐 {env_var}:           unset"),
        }
        Ok(CommandStatus::Success)
    }
}
