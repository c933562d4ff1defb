//! # Sync Command Module / 同步命令模块
//!
//! Implements the `sync` command: one synchronization pass for the current
//! build against the configured TestRail instance.
//!
//! 实现 `sync` 命令：针对配置的 TestRail 实例，为当前构建执行一次同步。

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::{
    core::{
        config::{self, ConfigOverrides},
        models::BuildContext,
        sync::{SyncError, SyncOrchestrator},
    },
    infra::remote::TestRailClient,
    reporting::console::print_summary,
};

/// Arguments gathered by the CLI for a sync run.
#[derive(Debug, Clone)]
pub struct SyncArgs {
    pub config: PathBuf,
    pub overrides: ConfigOverrides,
    pub build: BuildContext,
}

/// Executes the sync command.
///
/// Configuration is validated before anything else, so a missing key fails
/// the command without any HTTP traffic.
pub async fn execute(args: SyncArgs) -> Result<()> {
    let config = config::load_sync_config(&args.config, args.overrides)
        .context("invalid configuration")?;

    println!(
        "Synchronizing build {} of branch {}",
        args.build.build_id.yellow(),
        args.build.branch.yellow()
    );

    let client = TestRailClient::new(&config.remote);
    let orchestrator = SyncOrchestrator::new(&client, &config, &args.build);

    match orchestrator.run().await {
        Ok(summary) => {
            print_summary(&summary);
            println!("\n{}", "RESULTS SYNCHRONIZED SUCCESSFULLY".green().bold());
            Ok(())
        }
        Err(e) => {
            if let SyncError::Remote {
                run_id: Some(run_id),
                ..
            } = &e
            {
                eprintln!(
                    "{}",
                    format!("Run {run_id} was created; check its state before re-running.").yellow()
                );
            }
            Err(anyhow::Error::new(e)
                .context(format!("synchronization of build {} failed", args.build.build_id)))
        }
    }
}
