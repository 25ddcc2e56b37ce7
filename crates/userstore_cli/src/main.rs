//! CLI entry point.
//!
//! # Responsibility
//! - Load repository configuration and start logging.
//! - Run a scripted CRUD session against the configured backend and print
//!   each step as JSON, as a smoke check of the wiring.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use userstore_core::{
    core_version, init_logging, load_config, LogLevel, RepoResult, RepositoryConfig, UserService,
};

#[derive(Debug, Parser)]
#[command(name = "userstore", version, about = "User repository smoke runner")]
struct Cli {
    /// JSON repository config; defaults to the in-memory backend.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, default_value_t = LogLevel::build_default())]
    log_level: LogLevel,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        if let Err(err) = init_logging(cli.log_level, log_dir) {
            eprintln!("userstore: {err}");
            return ExitCode::FAILURE;
        }
    }

    let config = match cli.config.as_ref() {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("userstore: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => RepositoryConfig::Ram,
    };

    println!("userstore_core version={}", core_version());
    match run_session(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("userstore: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_session(config: &RepositoryConfig) -> RepoResult<()> {
    let service = UserService::from_config(config)?;
    println!("backend={}", service.repository().backend_kind());

    service.add_user(1, "Pyotr Pervy")?;
    service.add_user(2, "Aleksandr Pushkin")?;
    print_users("after add", &service)?;

    service.update_user(2, "A.S. Pushkin")?;
    service.delete_user(1)?;
    print_users("after update+delete", &service)?;

    let missing = service.get_user(1)?;
    println!(
        "get 1 -> {}",
        serde_json::Value::Object(service.user_dict(&missing))
    );
    Ok(())
}

fn print_users(label: &str, service: &UserService) -> RepoResult<()> {
    let users = service.list_user_dicts()?;
    println!(
        "{label}: {}",
        serde_json::Value::Array(users.into_iter().map(serde_json::Value::Object).collect())
    );
    Ok(())
}
