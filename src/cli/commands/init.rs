//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command, which writes a commented
//! default configuration file.
//!
//! 此模块实现了 `init` 命令，用于写入带注释的默认配置文件。

use anyhow::{Context, Result};
use colored::*;
use std::{fs, path::Path};

pub const DEFAULT_CONFIG: &str = r#"# testrail-sync configuration / testrail-sync 配置

# Base URL of the TestRail API / TestRail API 的基础 URL
url = "https://example.testrail.io/index.php?/api/v2"
login = "ci@example.com"
# Prefer the TESTRAIL_PASSWORD environment variable / 建议使用 TESTRAIL_PASSWORD 环境变量
password = ""
# Project the runs are created in / 创建运行所在的项目
project_id = 1

# Public host of the CI server, used in result comments / CI 服务器的公共主机，用于结果注释
ci_host = "https://ci.example.com"
# Per-build artifact hosts are <build_id>.<artifact_domain> / 每个构建的产物主机
artifact_domain = "builds.example.com"

# suite_id = 1
# assignee_id = 1
# timeout_secs = 30
# tap_report = "tests/_output/report.tap.log"
# html_report = "tests/_output/report.html"

# Link templates / 链接模板
# Placeholders: {ci_host} {artifact_host} {build_id} {branch} {case_id}
[links]
build = "{ci_host}/build/view/{build_id}"
recording = "http://{artifact_host}/tests/_output/records.html"
steps = "http://{artifact_host}/tests/_output/report.html"
"#;

/// Writes [`DEFAULT_CONFIG`] to `path`. An existing file is only replaced with `force`.
pub fn execute(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    println!(
        "{} {}",
        "Created configuration file:".green(),
        path.display()
    );
    Ok(())
}
