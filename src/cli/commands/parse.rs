//! # Parse Command Module / 解析命令模块
//!
//! Implements the `parse` command: reads both reports and prints the local
//! results without contacting the remote service. Only the report paths of
//! the configuration are used, so an incomplete config file is fine here.
//!
//! 实现 `parse` 命令：读取两个报告并打印本地结果，不联系远程服务。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::{
    core::{
        config::{DEFAULT_HTML_REPORT, DEFAULT_TAP_REPORT, RawConfig},
        sync::parse_reports,
    },
    infra::fs::resolve_artifact,
    reporting::console::print_local_view,
};

pub async fn execute(config_path: &Path, build_root: &Path) -> Result<()> {
    let raw = RawConfig::load(config_path).context("invalid configuration")?;
    let tap_report = raw
        .tap_report
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TAP_REPORT));
    let html_report = raw
        .html_report
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_REPORT));

    let reports = parse_reports(
        &resolve_artifact(build_root, &tap_report),
        &resolve_artifact(build_root, &html_report),
    )
    .await?;

    print_local_view(&reports);
    Ok(())
}
