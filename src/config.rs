use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::GroupBy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    9635
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(default = "default_restic_binary")]
    pub restic_binary: String,
    /// Upper bound on one target's collection (all probes) within a scrape.
    #[serde(default = "default_target_timeout_secs")]
    pub target_timeout_secs: u64,
    /// Grouping used by targets without their own `group_by`.
    #[serde(default)]
    pub group_by: GroupBy,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            restic_binary: default_restic_binary(),
            target_timeout_secs: default_target_timeout_secs(),
            group_by: GroupBy::NONE,
        }
    }
}

fn default_restic_binary() -> String {
    "restic".into()
}

fn default_target_timeout_secs() -> u64 {
    300
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default)]
    pub alias: String,
    pub path: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    /// When present (even as `[]`), replaces `global.group_by` outright; flags are not merged.
    #[serde(default)]
    pub group_by: Option<GroupBy>,
}

impl TargetConfig {
    pub fn effective_group_by(&self, global: &GlobalConfig) -> GroupBy {
        self.group_by.unwrap_or(global.group_by)
    }
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("alias", &self.alias)
            .field("path", &self.path)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("password_file", &self.password_file)
            .field("group_by", &self.group_by)
            .finish()
    }
}

impl AppConfig {
    /// Loads from `path`, falling back to `CONFIG_FILE` and then `config.toml`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var("CONFIG_FILE")
                .unwrap_or_else(|_| "config.toml".into())
                .into(),
        };
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.global.restic_binary.is_empty(),
            "global.restic_binary must be non-empty"
        );
        anyhow::ensure!(
            self.global.target_timeout_secs > 0,
            "global.target_timeout_secs must be > 0, got {}",
            self.global.target_timeout_secs
        );

        let mut seen = HashSet::new();
        for (i, target) in self.targets.iter().enumerate() {
            anyhow::ensure!(
                !target.path.is_empty(),
                "targets[{}].path must be non-empty",
                i
            );
            anyhow::ensure!(
                target.password.is_some() != target.password_file.is_some(),
                "targets[{}] ({}) needs exactly one of password or password_file",
                i,
                target.path
            );
            anyhow::ensure!(
                seen.insert(target.path.as_str()),
                "targets[{}].path {} is configured more than once",
                i,
                target.path
            );
        }
        Ok(())
    }
}
