// src/cli.rs
use anyhow::Result;
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use crate::core::config::ConfigOverrides;
use crate::core::models::BuildContext;
use crate::infra::logging::{self, Verbosity};

pub mod commands;

pub const DEFAULT_CONFIG_FILE: &str = "testrail-sync.toml";

fn build_root_arg() -> Arg {
    Arg::new("build-root")
        .long("build-root")
        .env("CI_BUILD_ROOT")
        .help("Directory the report paths are resolved against")
        .value_name("BUILD_ROOT")
        .default_value(".")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

pub fn build_cli() -> Command {
    Command::new("testrail-sync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pushes a build's TAP and HTML test reports into a TestRail run")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to the configuration file")
                .value_name("CONFIG")
                .default_value(DEFAULT_CONFIG_FILE)
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log request-level detail")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .global(true)
                .conflicts_with("verbose")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("sync")
                .about("Create a run for this build, submit its results and close it")
                .arg(build_root_arg())
                .arg(
                    Arg::new("branch")
                        .long("branch")
                        .env("CI_BRANCH")
                        .help("Branch the build ran on")
                        .value_name("BRANCH")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("build-id")
                        .long("build-id")
                        .env("CI_BUILD_ID")
                        .help("CI build identifier")
                        .value_name("BUILD_ID")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("Base URL of the TestRail API")
                        .value_name("URL")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("login")
                        .long("login")
                        .help("TestRail login")
                        .value_name("LOGIN")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .env("TESTRAIL_PASSWORD")
                        .hide_env_values(true)
                        .help("TestRail password or API key")
                        .value_name("PASSWORD")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("project-id")
                        .long("project-id")
                        .help("TestRail project to create the run in")
                        .value_name("PROJECT_ID")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse the reports and show the local results without contacting TestRail")
                .arg(build_root_arg()),
        )
        .subcommand(
            Command::new("init")
                .about("Write a default configuration file")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help("Overwrite an existing configuration file")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn sync_args(matches: &ArgMatches, config: PathBuf) -> commands::sync::SyncArgs {
    let overrides = ConfigOverrides {
        url: matches.get_one::<String>("url").cloned(),
        login: matches.get_one::<String>("login").cloned(),
        password: matches.get_one::<String>("password").cloned(),
        project_id: matches.get_one::<u64>("project-id").copied(),
    };
    let build = BuildContext {
        branch: matches
            .get_one::<String>("branch")
            .cloned()
            .unwrap_or_default(), // Required by clap
        build_id: matches
            .get_one::<String>("build-id")
            .cloned()
            .unwrap_or_default(), // Required by clap
        build_root: build_root(matches),
        started_at: Utc::now(),
    };
    commands::sync::SyncArgs {
        config,
        overrides,
        build,
    }
}

fn build_root(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("build-root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(".")) // Has default
}

pub async fn run() -> Result<()> {
    let matches = build_cli().get_matches();

    logging::init(Verbosity::from_flags(
        matches.get_flag("verbose"),
        matches.get_flag("quiet"),
    ));

    let config = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)); // Has default

    match matches.subcommand() {
        Some(("sync", sync_matches)) => {
            commands::sync::execute(sync_args(sync_matches, config)).await?;
        }
        Some(("parse", parse_matches)) => {
            commands::parse::execute(&config, &build_root(parse_matches)).await?;
        }
        Some(("init", init_matches)) => {
            commands::init::execute(&config, init_matches.get_flag("force"))?;
        }
        _ => {
            // `subcommand_required` makes clap print help before we get here.
        }
    }
    Ok(())
}
