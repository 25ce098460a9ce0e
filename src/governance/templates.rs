use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::error::GovernanceError;
use super::types::Actor;

const CLAUDE_TO_CODEX_TEMPLATE: &str = r#"# Handoff: {{from}} → {{to}}

**Cycle ID:** {{handoff_cycle_id}}
**Timestamp:** {{timestamp}}
**Active Stage:** {{active_stage}}

## Work Completed
- {{reason}}

## Review Requested
- Verify the stage artifacts against the specification and plan.
- Record findings in the session feedback document.

## Open Risks
- (List anything the reviewer should look at first)

## Acknowledgement
- [ ] {{to}} ran `idse-gov acknowledge --as {{to}}`
"#;

const CODEX_TO_CLAUDE_TEMPLATE: &str = r#"# Handoff: {{from}} → {{to}}

**Cycle ID:** {{handoff_cycle_id}}
**Timestamp:** {{timestamp}}
**Active Stage:** {{active_stage}}

## Review Summary
- {{reason}}

## Required Changes
- (Concrete fixes the builder must make before the next handoff)

## Follow-ups
- Update the changelog and review checklist in the session metadata.

## Acknowledgement
- [ ] {{to}} ran `idse-gov acknowledge --as {{to}}`
"#;

/// Placeholder line used by older template files for the handoff notes
const LEGACY_NOTES_LINE: &str = "- (What was reviewed; issues found)";

/// Values substituted into a handoff template
#[derive(Debug, Clone)]
pub struct HandoffContext<'a> {
    pub cycle_id: &'a str,
    pub timestamp: &'a str,
    pub active_stage: &'a str,
    pub reason: &'a str,
}

/// `<from>_to_<to>`, e.g. `claude_to_codex`
pub fn direction_name(from: Actor, to: Actor) -> String {
    format!("{}_to_{}", from.short_name(), to.short_name())
}

/// Per-direction handoff templates
#[derive(Debug, Clone)]
pub struct HandoffTemplates {
    templates: HashMap<(Actor, Actor), String>,
}

impl HandoffTemplates {
    /// Templates compiled into the binary, one per direction
    pub fn builtin() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            (Actor::ClaudeCode, Actor::CodexGpt),
            CLAUDE_TO_CODEX_TEMPLATE.to_string(),
        );
        templates.insert(
            (Actor::CodexGpt, Actor::ClaudeCode),
            CODEX_TO_CLAUDE_TEMPLATE.to_string(),
        );
        Self { templates }
    }

    /// Read `<direction>_template.md` files; directions without a file have no template
    pub fn from_dir(dir: &Path) -> Result<Self, GovernanceError> {
        let mut templates = HashMap::new();
        for from in Actor::ALL {
            let to = from.other();
            let file = dir.join(format!("{}_template.md", direction_name(from, to)));
            if file.is_file() {
                debug!(file = ?file, "Loaded handoff template");
                templates.insert((from, to), fs::read_to_string(&file)?);
            }
        }
        Ok(Self { templates })
    }

    /// Configured directory when given, built-ins otherwise
    pub fn load(template_dir: Option<&Path>) -> Result<Self, GovernanceError> {
        match template_dir {
            Some(dir) => Self::from_dir(dir),
            None => Ok(Self::builtin()),
        }
    }

    pub fn render(
        &self,
        from: Actor,
        to: Actor,
        context: &HandoffContext<'_>,
    ) -> Result<String, GovernanceError> {
        let template = self
            .templates
            .get(&(from, to))
            .ok_or(GovernanceError::InvalidDirection { from, to })?;

        Ok(template
            .replace("{{handoff_cycle_id}}", context.cycle_id)
            .replace("{{timestamp}}", context.timestamp)
            .replace("{{active_stage}}", context.active_stage)
            .replace("{{from}}", from.as_str())
            .replace("{{to}}", to.as_str())
            .replace("{{reason}}", context.reason)
            .replace(LEGACY_NOTES_LINE, &format!("- {}", context.reason)))
    }
}
