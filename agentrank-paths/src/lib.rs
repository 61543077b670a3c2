//! Directory and store path resolution for agentrank.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths. The centralized progression store lives under
//! the data directory unless configuration points somewhere else.

use std::path::{Path, PathBuf};

/// Configuration sentinel that selects the in-memory engine.
pub const IN_MEMORY: &str = ":memory:";

/// Location of the legacy per-project store, relative to a project directory.
pub const LEGACY_STORE_DIR: &str = ".agentrank/progress";

/// Where the progression store should be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Non-persistent store, used by tests.
    InMemory,
    /// On-disk store rooted at this directory.
    Disk(PathBuf),
}

impl StoreLocation {
    pub fn is_in_memory(&self) -> bool {
        matches!(self, Self::InMemory)
    }

    /// The on-disk path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::InMemory => None,
            Self::Disk(path) => Some(path),
        }
    }
}

/// Get the user's home directory, falling back to the working directory.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Get the agentrank config directory.
///
/// Returns `$XDG_CONFIG_HOME/agentrank` if set, otherwise `~/.config/agentrank`.
///
/// # Examples
///
/// ```
/// use agentrank_paths::config_dir;
///
/// let config = config_dir();
/// let file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("agentrank")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/agentrank")
    } else {
        PathBuf::from(".config/agentrank")
    }
}

/// Get the agentrank data directory.
///
/// Returns `$XDG_DATA_HOME/agentrank` if set, otherwise `~/.local/share/agentrank`.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("agentrank")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/agentrank")
    } else {
        PathBuf::from(".local/share/agentrank")
    }
}

/// Default location of the centralized store.
pub fn default_store_path() -> PathBuf {
    data_dir().join("store")
}

/// Path of the legacy store inside a project directory.
pub fn legacy_store_path(project_dir: &Path) -> PathBuf {
    project_dir.join(LEGACY_STORE_DIR)
}

/// Resolve a configured store path against the real home directory.
///
/// See [`resolve_store_location_in`] for the rules.
pub fn resolve_store_location(configured: Option<&str>) -> StoreLocation {
    resolve_store_location_in(configured, &home_dir(), &default_store_path())
}

/// Resolve a configured store path.
///
/// - unset or blank: `default`
/// - [`IN_MEMORY`]: in-memory, no resolution at all
/// - `~` or `~/rest`: expanded against `home` (the filesystem never does this)
/// - relative: joined onto `home`
/// - absolute: used as is
pub fn resolve_store_location_in(
    configured: Option<&str>,
    home: &Path,
    default: &Path,
) -> StoreLocation {
    let Some(raw) = configured.map(str::trim).filter(|s| !s.is_empty()) else {
        return StoreLocation::Disk(default.to_path_buf());
    };

    if raw == IN_MEMORY {
        return StoreLocation::InMemory;
    }

    if raw == "~" {
        return StoreLocation::Disk(home.to_path_buf());
    }

    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return StoreLocation::Disk(home.join(rest));
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        StoreLocation::Disk(path.to_path_buf())
    } else {
        StoreLocation::Disk(home.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(configured: Option<&str>) -> StoreLocation {
        resolve_store_location_in(
            configured,
            Path::new("/home/dev"),
            Path::new("/home/dev/.local/share/agentrank/store"),
        )
    }

    #[test]
    fn test_unset_path_uses_default() {
        assert_eq!(
            resolve(None),
            StoreLocation::Disk(PathBuf::from("/home/dev/.local/share/agentrank/store"))
        );
        assert_eq!(resolve(Some("   ")), resolve(None));
    }

    #[test]
    fn test_memory_sentinel_bypasses_resolution() {
        let location = resolve(Some(IN_MEMORY));
        assert!(location.is_in_memory());
        assert_eq!(location.path(), None);
    }

    #[test]
    fn test_tilde_is_expanded_explicitly() {
        assert_eq!(
            resolve(Some("~/agents/store")),
            StoreLocation::Disk(PathBuf::from("/home/dev/agents/store"))
        );
        assert_eq!(
            resolve(Some("~")),
            StoreLocation::Disk(PathBuf::from("/home/dev"))
        );
    }

    #[test]
    fn test_tilde_in_the_middle_is_data() {
        assert_eq!(
            resolve(Some("stores/~backup")),
            StoreLocation::Disk(PathBuf::from("/home/dev/stores/~backup"))
        );
    }

    #[test]
    fn test_relative_path_is_joined_onto_home() {
        assert_eq!(
            resolve(Some(".agentrank/store")),
            StoreLocation::Disk(PathBuf::from("/home/dev/.agentrank/store"))
        );
    }

    #[test]
    fn test_absolute_path_is_kept() {
        assert_eq!(
            resolve(Some("/var/lib/agentrank")),
            StoreLocation::Disk(PathBuf::from("/var/lib/agentrank"))
        );
    }

    #[test]
    fn test_legacy_store_path_is_under_project() {
        let path = legacy_store_path(Path::new("/work/project"));
        assert_eq!(path, PathBuf::from("/work/project/.agentrank/progress"));
    }

    #[test]
    fn test_data_dir_ends_with_agentrank() {
        let path = data_dir();
        assert!(
            path.ends_with("agentrank"),
            "data_dir should end with 'agentrank'"
        );
    }

    #[test]
    fn test_config_dir_respects_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        let path = config_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-config/agentrank"));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }
}
