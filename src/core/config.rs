//! # Configuration Module / 配置模块
//!
//! Loads the synchronization settings from a TOML file, applies command-line
//! overrides, and validates the result into a [`SyncConfig`]. Validation
//! reports every missing required key at once.
//!
//! 从 TOML 文件加载同步设置，应用命令行覆盖，并将结果验证为 [`SyncConfig`]。
//! 验证会一次性报告所有缺失的必需键。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::links::LinkTemplates;

pub const DEFAULT_TAP_REPORT: &str = "tests/_output/report.tap.log";
pub const DEFAULT_HTML_REPORT: &str = "tests/_output/report.html";

/// Errors raised while assembling the configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The configuration file as written by the user. Every field is optional so
/// that validation can list all gaps instead of stopping at the first one.
///
/// 用户编写的配置文件。每个字段都是可选的，以便验证可以列出所有缺失项。
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Base URL of the remote API, e.g. `https://example.testrail.io/index.php?/api/v2`.
    pub url: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub project_id: Option<u64>,
    /// Public host name of the CI system, used in generated links.
    pub ci_host: Option<String>,
    /// Domain suffix for per-build artifact hosts (`<build_id>.<artifact_domain>`).
    pub artifact_domain: Option<String>,
    pub suite_id: Option<u64>,
    pub assignee_id: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub tap_report: Option<PathBuf>,
    pub html_report: Option<PathBuf>,
    #[serde(default)]
    pub links: LinkTemplates,
}

/// Values passed on the command line. They take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub project_id: Option<u64>,
}

/// Validated settings for one synchronization pass.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub remote: RemoteConfig,
    pub project_id: u64,
    pub suite_id: u64,
    pub assignee_id: u64,
    pub ci_host: String,
    pub artifact_domain: String,
    pub tap_report: PathBuf,
    pub html_report: PathBuf,
    pub links: LinkTemplates,
}

/// Connection settings for the remote API.
#[derive(Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub login: String,
    pub password: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RawConfig {
    /// Reads the config file. A missing file yields an empty config, since all
    /// required values may still arrive as overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if overrides.url.is_some() {
            self.url = overrides.url;
        }
        if overrides.login.is_some() {
            self.login = overrides.login;
        }
        if overrides.password.is_some() {
            self.password = overrides.password;
        }
        if overrides.project_id.is_some() {
            self.project_id = overrides.project_id;
        }
        self
    }

    /// Checks that all required keys are present. Blank strings count as missing.
    ///
    /// 检查所有必需键是否存在。空白字符串视为缺失。
    pub fn validate(self) -> Result<SyncConfig, ConfigError> {
        let mut missing = Vec::new();

        let url = required_str(self.url, "url", &mut missing);
        let login = required_str(self.login, "login", &mut missing);
        let password = required_str(self.password, "password", &mut missing);
        if self.project_id.is_none() {
            missing.push("project_id");
        }
        let ci_host = required_str(self.ci_host, "ci_host", &mut missing);
        let artifact_domain = required_str(self.artifact_domain, "artifact_domain", &mut missing);

        match (url, login, password, self.project_id, ci_host, artifact_domain) {
            (
                Some(url),
                Some(login),
                Some(password),
                Some(project_id),
                Some(ci_host),
                Some(artifact_domain),
            ) if missing.is_empty() => Ok(SyncConfig {
                remote: RemoteConfig {
                    base_url: url.trim_end_matches('/').to_string(),
                    login,
                    password,
                    timeout: Duration::from_secs(self.timeout_secs.unwrap_or(30)),
                },
                project_id,
                suite_id: self.suite_id.unwrap_or(1),
                assignee_id: self.assignee_id.unwrap_or(1),
                ci_host: ci_host.trim_end_matches('/').to_string(),
                artifact_domain: artifact_domain.trim_matches('.').to_string(),
                tap_report: self
                    .tap_report
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TAP_REPORT)),
                html_report: self
                    .html_report
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_REPORT)),
                links: self.links,
            }),
            _ => Err(ConfigError::Missing(missing)),
        }
    }
}

fn required_str(
    value: Option<String>,
    key: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            missing.push(key);
            None
        }
    }
}

/// Loads the file at `path`, applies `overrides` and validates.
pub fn load_sync_config(path: &Path, overrides: ConfigOverrides) -> Result<SyncConfig, ConfigError> {
    RawConfig::load(path)?.apply(overrides).validate()
}
