//! Application-level configuration loading: late-join policy, catalog timeouts and seed data.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_SESSION_BACK_CONFIG_PATH";
/// Upper bound for a single catalog call when the config does not say otherwise.
const DEFAULT_CATALOG_TIMEOUT_MS: u64 = 5_000;

/// Whether players may join a session after its first question opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateJoinPolicy {
    /// Join while the session is in the lobby or running. Questions already
    /// closed stay unanswered and score nothing.
    #[default]
    Allow,
    /// Join only while the session is still in the lobby.
    LobbyOnly,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    late_join: LateJoinPolicy,
    catalog_timeout: Option<Duration>,
    catalog_seed_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        late_join = ?app_config.late_join,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Late-join policy applied by `join`.
    pub fn late_join(&self) -> LateJoinPolicy {
        self.late_join
    }

    /// Time limit for catalog calls made during a transition, `None` when disabled.
    pub fn catalog_timeout(&self) -> Option<Duration> {
        self.catalog_timeout
    }

    /// Optional JSON file holding the initial games.
    pub fn catalog_seed_path(&self) -> Option<&PathBuf> {
        self.catalog_seed_path.as_ref()
    }

    /// Copy of this configuration with a different late-join policy.
    pub fn with_late_join(mut self, policy: LateJoinPolicy) -> Self {
        self.late_join = policy;
        self
    }

    /// Copy of this configuration with a different catalog timeout.
    pub fn with_catalog_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.catalog_timeout = timeout;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            late_join: LateJoinPolicy::default(),
            catalog_timeout: Some(Duration::from_millis(DEFAULT_CATALOG_TIMEOUT_MS)),
            catalog_seed_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    late_join: LateJoinPolicy,
    #[serde(default = "default_catalog_timeout_ms")]
    catalog_timeout_ms: u64,
    #[serde(default)]
    catalog_seed_path: Option<PathBuf>,
}

fn default_catalog_timeout_ms() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_MS
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let catalog_timeout =
            (value.catalog_timeout_ms > 0).then(|| Duration::from_millis(value.catalog_timeout_ms));
        Self {
            late_join: value.late_join,
            catalog_timeout,
            catalog_seed_path: value.catalog_seed_path,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
