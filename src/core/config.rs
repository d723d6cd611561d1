//! Layered configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. user config (`<config dir>/agrilink/config.yaml`)
//! 3. workspace config (`.agrilink/config.yaml`, searched upwards from the cwd)
//! 4. environment (`AGRILINK_DATABASE`, `AGRILINK_INVITE_SECRET`, `AGRILINK_ENV`, `AGRILINK_LOG`)

use std::path::{Path, PathBuf};

use chrono::Duration;
use directories::ProjectDirs;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use thiserror::Error;

use crate::core::invite::LinkKind;
use crate::core::pagination::DEFAULT_LIMIT;

/// Name of the per-workspace directory
pub const WORKSPACE_DIR: &str = ".agrilink";
pub const CONFIG_FILE: &str = "config.yaml";
pub const DATABASE_FILE: &str = "agrilink.db";

const DEV_SECRET: &str = "agrilink-development-secret";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(agrilink::config::io))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {message}")]
    #[diagnostic(
        code(agrilink::config::parse),
        help("fix the file, or run `agrilink init --force` to rewrite the workspace config")
    )]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Write deliveries to the log only
    #[default]
    Log,
    /// Write each message as an .eml file under `mail.spool_dir`
    Spool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteSettings {
    pub secret: String,
    pub worker_ttl_days: i64,
    pub applicator_user_ttl_days: i64,
    pub grower_ttl_days: i64,
    pub accept_url: String,
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            worker_ttl_days: 3,
            applicator_user_ttl_days: 3,
            grower_ttl_days: 3,
            accept_url: "https://app.agrilink.local/invite/accept".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub transport: MailTransport,
    pub spool_dir: Option<PathBuf>,
    pub sender: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            transport: MailTransport::Log,
            spool_dir: None,
            sender: "Agrilink <no-reply@agrilink.local>".to_string(),
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub default_limit: i64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub environment: String,
    pub log_level: String,
    pub invites: InviteSettings,
    pub mail: MailSettings,
    pub pagination: PaginationSettings,

    /// Workspace root the config was discovered from
    #[serde(skip)]
    pub workspace: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            environment: "development".to_string(),
            log_level: "warn".to_string(),
            invites: InviteSettings::default(),
            mail: MailSettings::default(),
            pagination: PaginationSettings::default(),
            workspace: None,
        }
    }
}

impl Config {
    /// Load every layer with workspace discovery from the current directory
    pub fn load() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().ok();
        Self::load_from(cwd.as_deref())
    }

    /// Load with workspace discovery starting at `start`
    pub fn load_from(start: Option<&Path>) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();

        if let Some(dirs) = project_dirs() {
            let user_file = dirs.config_dir().join(CONFIG_FILE);
            if user_file.exists() {
                layers.push(checked_layer(&user_file)?);
            }
        }

        let workspace = start.and_then(find_workspace);
        if let Some(root) = &workspace {
            let ws_file = root.join(WORKSPACE_DIR).join(CONFIG_FILE);
            if ws_file.exists() {
                layers.push(checked_layer(&ws_file)?);
            }
        }

        let mut config = Self::from_layers(layers).map_err(|message| ConfigError::Parse {
            path: PathBuf::from(CONFIG_FILE),
            message,
        })?;
        config.workspace = workspace;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge YAML layers over the defaults, later layers winning
    pub fn from_layers(layers: Vec<Value>) -> Result<Self, String> {
        let mut merged = serde_yml::to_value(Self::default()).map_err(|e| e.to_string())?;
        for layer in layers {
            merge_values(&mut merged, layer);
        }
        serde_yml::from_value(merged).map_err(|e| e.to_string())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup("AGRILINK_DATABASE").filter(|v| !v.is_empty()) {
            self.database = Some(PathBuf::from(db));
        }
        if let Some(secret) = lookup("AGRILINK_INVITE_SECRET").filter(|v| !v.is_empty()) {
            self.invites.secret = secret;
        }
        if let Some(env) = lookup("AGRILINK_ENV").filter(|v| !v.is_empty()) {
            self.environment = env;
        }
        if let Some(level) = lookup("AGRILINK_LOG").filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Whether the built-in development secret is still in use
    pub fn uses_default_secret(&self) -> bool {
        self.invites.secret == DEV_SECRET
    }

    /// Database file; relative paths resolve against the workspace root
    pub fn database_path(&self) -> PathBuf {
        match (&self.database, &self.workspace) {
            (Some(path), Some(root)) if path.is_relative() => root.join(path),
            (Some(path), _) => path.clone(),
            (None, Some(root)) => root.join(WORKSPACE_DIR).join(DATABASE_FILE),
            (None, None) => project_dirs()
                .map(|d| d.data_dir().join(DATABASE_FILE))
                .unwrap_or_else(|| PathBuf::from(DATABASE_FILE)),
        }
    }

    /// Directory spooled mail is written to
    pub fn spool_dir(&self) -> PathBuf {
        match (&self.mail.spool_dir, &self.workspace) {
            (Some(path), Some(root)) if path.is_relative() => root.join(path),
            (Some(path), _) => path.clone(),
            (None, Some(root)) => root.join(WORKSPACE_DIR).join("outbox"),
            (None, None) => PathBuf::from("outbox"),
        }
    }

    /// Validity window of an invite token for `kind`
    pub fn invite_ttl(&self, kind: LinkKind) -> Duration {
        let days = match kind {
            LinkKind::Worker => self.invites.worker_ttl_days,
            LinkKind::ApplicatorUser => self.invites.applicator_user_ttl_days,
            LinkKind::Grower => self.invites.grower_ttl_days,
        };
        Duration::days(days.max(1))
    }

    /// Accept link embedded in invite mail
    pub fn accept_link(&self, token: &str) -> String {
        format!("{}?token={}", self.invites.accept_url, token)
    }
}

/// Starter workspace config written by `agrilink init`
pub fn default_workspace_config() -> String {
    let mut out = String::from("# Agrilink workspace configuration\n");
    out.push_str("environment: development\n");
    out.push_str("log_level: warn\n");
    out.push_str("invites:\n");
    out.push_str("  worker_ttl_days: 3\n");
    out.push_str("  applicator_user_ttl_days: 3\n");
    out.push_str("  grower_ttl_days: 3\n");
    out.push_str("mail:\n");
    out.push_str("  transport: log\n");
    out.push_str("  max_attempts: 3\n");
    out.push_str("  retry_delay_ms: 1000\n");
    out.push_str("pagination:\n");
    out.push_str("  default_limit: 10\n");
    out
}

/// Walk up from `start` looking for a `.agrilink` directory
pub fn find_workspace(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(WORKSPACE_DIR).is_dir())
        .map(Path::to_path_buf)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "agrilink")
}

fn read_layer(path: &Path) -> Result<Value, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a layer and make sure it deserializes on its own, so errors name the file
fn checked_layer(path: &Path) -> Result<Value, ConfigError> {
    let layer = read_layer(path)?;
    Config::from_layers(vec![layer.clone()]).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(layer)
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn layer(yaml: &str) -> Value {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.invites.worker_ttl_days, 3);
        assert_eq!(config.mail.max_attempts, 3);
        assert_eq!(config.mail.retry_delay_ms, 1000);
        assert_eq!(config.pagination.default_limit, 10);
        assert!(!config.is_production());
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_later_layers_win_and_nested_keys_merge() {
        let config = Config::from_layers(vec![
            layer("invites:\n  worker_ttl_days: 5\nenvironment: staging\n"),
            layer("invites:\n  grower_ttl_days: 7\nenvironment: production\n"),
        ])
        .unwrap();

        assert_eq!(config.invites.worker_ttl_days, 5);
        assert_eq!(config.invites.grower_ttl_days, 7);
        assert_eq!(config.invites.applicator_user_ttl_days, 3);
        assert!(config.is_production());
    }

    #[test]
    fn test_env_overrides_files() {
        let mut config = Config::from_layers(vec![layer("environment: staging\n")]).unwrap();
        config.apply_env(|key| match key {
            "AGRILINK_ENV" => Some("production".to_string()),
            "AGRILINK_INVITE_SECRET" => Some("s3cret".to_string()),
            _ => None,
        });
        assert!(config.is_production());
        assert_eq!(config.invites.secret, "s3cret");
        assert!(!config.uses_default_secret());
    }

    #[test]
    fn test_workspace_discovery_and_database_path() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(WORKSPACE_DIR)).unwrap();
        std::fs::write(
            tmp.path().join(WORKSPACE_DIR).join(CONFIG_FILE),
            "mail:\n  transport: spool\n",
        )
        .unwrap();
        let nested = tmp.path().join("fields/north");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load_from(Some(&nested)).unwrap();
        assert_eq!(config.workspace.as_deref(), Some(tmp.path()));
        assert_eq!(config.mail.transport, MailTransport::Spool);
        if std::env::var("AGRILINK_DATABASE").is_err() {
            assert_eq!(
                config.database_path(),
                tmp.path().join(WORKSPACE_DIR).join(DATABASE_FILE)
            );
        }
    }

    #[test]
    fn test_malformed_workspace_layer_is_an_error() {
        let tmp = tempdir().unwrap();
        let ws_file = tmp.path().join(WORKSPACE_DIR).join(CONFIG_FILE);
        std::fs::create_dir_all(tmp.path().join(WORKSPACE_DIR)).unwrap();
        std::fs::write(
            &ws_file,
            "environment: production\ninvites:\n  secret: prod-secret\npagination:\n  default_limit: ten\n",
        )
        .unwrap();

        match Config::load_from(Some(tmp.path())) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, ws_file),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_yaml_is_an_error() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(WORKSPACE_DIR)).unwrap();
        std::fs::write(
            tmp.path().join(WORKSPACE_DIR).join(CONFIG_FILE),
            "environment: [production\n",
        )
        .unwrap();

        assert!(matches!(
            Config::load_from(Some(tmp.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invite_ttl_per_kind() {
        let config = Config::from_layers(vec![layer("invites:\n  grower_ttl_days: 14\n")]).unwrap();
        assert_eq!(config.invite_ttl(LinkKind::Worker), Duration::days(3));
        assert_eq!(config.invite_ttl(LinkKind::Grower), Duration::days(14));
    }

    #[test]
    fn test_starter_config_parses() {
        let config = Config::from_layers(vec![layer(&default_workspace_config())]).unwrap();
        assert_eq!(config.environment, "development");
    }
}
