use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for IDSE governance tooling
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GovernanceConfig {
    /// Workspace-relative locations of governance files
    pub paths: PathsConfig,
    /// Handoff protocol settings
    pub governance: HandoffConfig,
    /// Artifact compliance settings
    pub compliance: ComplianceConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Persisted governance state record
    pub state_file: PathBuf,
    /// Append-only directory for handoff documents and audit trails
    pub feedback_dir: PathBuf,
    /// Optional directory of `<direction>_template.md` handoff templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    /// Default root for validator reports
    pub reports_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandoffConfig {
    /// Age of `last_checked` after which the state is reported as stale
    pub staleness_window_minutes: i64,
    /// Environment variable naming the calling actor
    pub actor_env_var: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComplianceConfig {
    /// Token marking a scaffolded section that was never filled in
    pub placeholder_marker: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                state_file: PathBuf::from("idse-governance/state/state.json"),
                feedback_dir: PathBuf::from("idse-governance/feedback"),
                template_dir: None, // Built-in templates
                reports_dir: PathBuf::from("reports"),
            },
            governance: HandoffConfig {
                staleness_window_minutes: 5,
                actor_env_var: "LLM_ID".to_string(),
            },
            compliance: ComplianceConfig {
                placeholder_marker: "[REQUIRES INPUT]".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                json_logs: false,
            },
        }
    }
}

impl GovernanceConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (idse-governance.toml, .idse-governance-rc) in `dir`
    /// 3. Environment variables (prefixed with IDSE_GOVERNANCE, `__` between sections)
    pub fn load(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let toml_file = dir.join("idse-governance.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".idse-governance-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("IDSE_GOVERNANCE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let governance_config: GovernanceConfig = config.try_deserialize()?;
        if governance_config.compliance.placeholder_marker.trim().is_empty() {
            anyhow::bail!("compliance.placeholder_marker must not be empty");
        }

        Ok(governance_config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file(dir: &Path) -> Result<()> {
        let env_file = dir.join(".env");
        if env_file.exists() {
            dotenvy::from_path(&env_file)?;
            tracing::info!(file = ?env_file, "Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// Freshness window for the governance state
    pub fn staleness_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.governance.staleness_window_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = GovernanceConfig::load(temp_dir.path()).unwrap();

        assert_eq!(config.paths.state_file, PathBuf::from("idse-governance/state/state.json"));
        assert_eq!(config.governance.staleness_window_minutes, 5);
        assert_eq!(config.compliance.placeholder_marker, "[REQUIRES INPUT]");
        assert!(config.paths.template_dir.is_none());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("idse-governance.toml"),
            "[compliance]\nplaceholder_marker = \"TODO(fill)\"\n\n[paths]\ntemplate_dir = \"templates\"\n",
        )
        .unwrap();

        let config = GovernanceConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.compliance.placeholder_marker, "TODO(fill)");
        assert_eq!(config.paths.template_dir, Some(PathBuf::from("templates")));
        assert_eq!(config.paths.reports_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_empty_placeholder_marker_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("idse-governance.toml"),
            "[compliance]\nplaceholder_marker = \"\"\n",
        )
        .unwrap();

        let error = GovernanceConfig::load(temp_dir.path()).unwrap_err();
        assert!(error.to_string().contains("placeholder_marker"));
    }

    #[test]
    fn test_renders_as_toml() {
        let rendered = GovernanceConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[paths]"));
        assert!(rendered.contains("staleness_window_minutes = 5"));
    }
}
