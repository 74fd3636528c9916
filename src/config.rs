//! Configuration for taskboard, read from `.taskboard/taskboard.toml`.
//!
//! Layered like so (later wins):
//! 1. `taskboard.toml` in the project's `.taskboard/` directory, or the
//!    user-level `taskboard/taskboard.toml` under the platform config dir
//! 2. Environment variables (`.env` is loaded by the binary)
//! 3. CLI flags
//!
//! # Configuration File Format
//!
//! ```toml
//! [backend]
//! url = "https://abc.supabase.co"
//! api_key = "public-anon-key"
//!
//! [webhook]
//! host = "0.0.0.0"
//! port = 8787
//! forward_url = "https://automation.example.app/webhook/new-file"
//! storage_public_url = "https://kong.example.app"
//! mode = "detach"
//! timeout_secs = 10
//!
//! [board]
//! rollback = "keep"
//! default_columns = ["To Do", "In Progress", "Review", "Done"]
//! default_color = "bg-blue-500"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::board::RollbackPolicy;
use crate::board::dashboard;
use crate::webhook::ForwardMode;
use crate::webhook::forward::DEFAULT_TIMEOUT_SECS;

pub const CONFIG_DIR: &str = ".taskboard";
pub const CONFIG_FILE: &str = "taskboard.toml";

pub const ENV_BACKEND_URL: &str = "TASKBOARD_BACKEND_URL";
pub const ENV_API_KEY: &str = "TASKBOARD_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "TASKBOARD_ACCESS_TOKEN";
pub const ENV_FORWARD_URL: &str = "TASKBOARD_FORWARD_URL";

/// Connection to the hosted backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Signed-in user's JWT; the anonymous key is used when absent.
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub forward_url: Option<String>,
    /// Base URL for public object links; falls back to `backend.url`.
    pub storage_public_url: Option<String>,
    #[serde(default)]
    pub mode: ForwardMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for WebhookSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            forward_url: None,
            storage_public_url: None,
            mode: ForwardMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default)]
    pub rollback: RollbackPolicy,
    #[serde(default = "dashboard::default_columns")]
    pub default_columns: Vec<String>,
    #[serde(default = "default_color")]
    pub default_color: String,
}

fn default_color() -> String {
    dashboard::DEFAULT_COLOR.to_string()
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            rollback: RollbackPolicy::default(),
            default_columns: dashboard::default_columns(),
            default_color: default_color(),
        }
    }
}

/// Root of `taskboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskboardToml {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub webhook: WebhookSection,
    #[serde(default)]
    pub board: BoardSection,
}

impl TaskboardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskboard.toml")
    }

    /// Load `taskboard.toml` from `config_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize taskboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Overlay environment values. `lookup` is `std::env::var` in the binary.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_BACKEND_URL) {
            self.backend.url = Some(url);
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.backend.api_key = Some(key);
        }
        if let Some(token) = non_empty(ENV_ACCESS_TOKEN) {
            self.backend.access_token = Some(token);
        }
        if let Some(url) = non_empty(ENV_FORWARD_URL) {
            self.webhook.forward_url = Some(url);
        }
    }

    /// Base for public object URLs: `webhook.storage_public_url`, else `backend.url`.
    pub fn storage_public_url(&self) -> Option<&str> {
        self.webhook
            .storage_public_url
            .as_deref()
            .or(self.backend.url.as_deref())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.backend.url.is_none() {
            warnings.push(format!(
                "backend.url is not set (or {}); board commands will fail",
                ENV_BACKEND_URL
            ));
        }
        if self.backend.api_key.is_none() {
            warnings.push(format!(
                "backend.api_key is not set (or {}); board commands will fail",
                ENV_API_KEY
            ));
        }
        if self.webhook.forward_url.is_none() {
            warnings.push(format!(
                "webhook.forward_url is not set (or {}); `webhook serve` will refuse to start",
                ENV_FORWARD_URL
            ));
        }
        if self.storage_public_url().is_none() {
            warnings.push(
                "webhook.storage_public_url and backend.url are both unset; public object URLs cannot be built"
                    .to_string(),
            );
        }
        if self.webhook.timeout_secs == 0 {
            warnings.push("webhook.timeout_secs is 0; every awaited forward will time out".into());
        }
        if self.board.default_columns.iter().any(|c| c.trim().is_empty()) {
            warnings.push("board.default_columns contains a blank title".into());
        }

        warnings
    }
}

/// Resolved configuration: file, then environment, then CLI flags applied
/// by the command that needs them.
#[derive(Debug, Clone)]
pub struct TaskboardConfig {
    /// Path to the project directory
    pub project_dir: PathBuf,
    /// Path to the .taskboard directory
    pub config_dir: PathBuf,
    /// Where the TOML was read from, if anywhere
    pub source: Option<PathBuf>,
    pub toml: TaskboardToml,
}

impl TaskboardConfig {
    /// Load from `project_dir` and overlay the process environment.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let mut config = Self::from_files(project_dir, dirs::config_dir())?;
        config.toml.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from the project directory, falling back to the user-level file
    /// under `user_config_dir`. No environment is read.
    pub fn from_files(project_dir: PathBuf, user_config_dir: Option<PathBuf>) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve project directory: {}", project_dir.display()))?;
        let config_dir = project_dir.join(CONFIG_DIR);

        let project_file = config_dir.join(CONFIG_FILE);
        let user_file = user_config_dir.map(|d| d.join("taskboard").join(CONFIG_FILE));
        let source = if project_file.exists() {
            Some(project_file)
        } else {
            user_file.filter(|f| f.exists())
        };

        let toml = match &source {
            Some(path) => TaskboardToml::load(path)?,
            None => TaskboardToml::default(),
        };

        Ok(Self {
            project_dir,
            config_dir,
            source,
            toml,
        })
    }

    /// Path of the project-level config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Write a default `taskboard.toml` into the project. Refuses to
    /// overwrite an existing file unless `force` is set.
    pub fn init(&self, force: bool) -> Result<PathBuf> {
        let path = self.config_file();
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        std::fs::create_dir_all(&self.config_dir).with_context(|| {
            format!("Failed to create config directory: {}", self.config_dir.display())
        })?;
        TaskboardToml::default().save(&path)?;
        Ok(path)
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
