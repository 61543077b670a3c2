//! Layered configuration
//!
//! Built-in defaults, then the user file at
//! `$XDG_CONFIG_HOME/agentrank/config.toml`, then an explicit file. A value
//! set in a later layer overrides the earlier one; unset values fall through.
//! `AGENTRANK_STORE_PATH` replaces `store.path` last.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use agentrank_store::{ProgressError, Result, StoreConfig};
use serde::{Deserialize, Serialize};

use crate::rules::ScoringRules;

/// Environment variable overriding the store location
pub const STORE_PATH_ENV: &str = "AGENTRANK_STORE_PATH";

/// Effective configuration for the store and the scoring engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scoring: ScoringRules,
}

/// One config file as written, before defaults are applied
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProgressConfig {
    store: StoreConfig,
    scoring: RawScoringSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScoringSection {
    tool_xp: Option<f64>,
    commit_xp: Option<f64>,
    commit_grade_xp: Option<f64>,
    bug_penalty: Option<f64>,
    level_multiplier: Option<f64>,
    default_command_xp: Option<f64>,
    command_xp: BTreeMap<String, f64>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the user file, an optional explicit file and the environment
    pub fn load(explicit: Option<&Path>) -> Result<ProgressConfig> {
        let user = Self::user_config_path();
        let env_store_path = std::env::var(STORE_PATH_ENV).ok();
        Self::load_layers(Some(&user), explicit, env_store_path)
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        agentrank_paths::config_dir().join("config.toml")
    }

    /// Merge the given layers in order. Missing files are skipped.
    pub fn load_layers(
        user: Option<&Path>,
        explicit: Option<&Path>,
        env_store_path: Option<String>,
    ) -> Result<ProgressConfig> {
        let mut raw = RawProgressConfig::default();

        // Layer 1: User config
        if let Some(path) = user
            && let Some(user_config) = Self::read_raw(path)?
        {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Explicit config
        if let Some(path) = explicit {
            match Self::read_raw(path)? {
                Some(explicit_config) => raw = Self::merge_raw(raw, explicit_config),
                None => tracing::warn!(path = %path.display(), "Config file not found, skipping"),
            }
        }

        let mut config = Self::finalize(raw);

        // Layer 3: Environment
        if let Some(store_path) = env_store_path.filter(|p| !p.trim().is_empty()) {
            config.store.path = Some(store_path);
        }

        config.scoring.validate()?;
        Ok(config)
    }

    fn read_raw(path: &Path) -> Result<Option<RawProgressConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let raw = toml::from_str(&contents)
            .map_err(|e| ProgressError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Ok(Some(raw))
    }

    /// Overlay values override base only if explicitly set
    fn merge_raw(base: RawProgressConfig, overlay: RawProgressConfig) -> RawProgressConfig {
        let mut command_xp = base.scoring.command_xp;
        command_xp.extend(overlay.scoring.command_xp);

        RawProgressConfig {
            store: StoreConfig {
                path: overlay.store.path.or(base.store.path),
                max_size: overlay.store.max_size.or(base.store.max_size),
                compression: overlay.store.compression.or(base.store.compression),
            },
            scoring: RawScoringSection {
                tool_xp: overlay.scoring.tool_xp.or(base.scoring.tool_xp),
                commit_xp: overlay.scoring.commit_xp.or(base.scoring.commit_xp),
                commit_grade_xp: overlay
                    .scoring
                    .commit_grade_xp
                    .or(base.scoring.commit_grade_xp),
                bug_penalty: overlay.scoring.bug_penalty.or(base.scoring.bug_penalty),
                level_multiplier: overlay
                    .scoring
                    .level_multiplier
                    .or(base.scoring.level_multiplier),
                default_command_xp: overlay
                    .scoring
                    .default_command_xp
                    .or(base.scoring.default_command_xp),
                command_xp,
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawProgressConfig) -> ProgressConfig {
        let defaults = ScoringRules::default();
        let scoring = raw.scoring;
        ProgressConfig {
            store: raw.store,
            scoring: ScoringRules {
                tool_xp: scoring.tool_xp.unwrap_or(defaults.tool_xp),
                commit_xp: scoring.commit_xp.unwrap_or(defaults.commit_xp),
                commit_grade_xp: scoring.commit_grade_xp.unwrap_or(defaults.commit_grade_xp),
                bug_penalty: scoring.bug_penalty.unwrap_or(defaults.bug_penalty),
                level_multiplier: scoring.level_multiplier.unwrap_or(defaults.level_multiplier),
                default_command_xp: scoring
                    .default_command_xp
                    .unwrap_or(defaults.default_command_xp),
                command_xp: scoring.command_xp,
            },
        }
    }
}
