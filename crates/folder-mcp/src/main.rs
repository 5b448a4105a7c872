//! Per-folder semantic search daemon exposing MCP.

mod config;
mod continuation;
mod envelope;
mod health;
mod mcp;
mod paths;
mod server;
mod signal;
mod transport;

use std::process::ExitCode;

use clap::Parser;
use config::Args;
use folder_mcp_common::init::initialize_environment;
use folder_mcp_common::tracing_setup::init_tracing;
use paths::{PidClaimError, claim_pid_file, default_state_dir, release_pid_file};

const EXIT_GENERIC_FAILURE: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_ALREADY_RUNNING: u8 = 3;

fn main() -> ExitCode {
    initialize_environment();
    let args = Args::parse();

    let config = match config::load_app_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let state_dir = default_state_dir();
    let log_dir = args.log_dir.clone().unwrap_or_else(|| state_dir.join("logs"));
    let _tracing_guards = match init_tracing(&log_dir, "folder-mcp") {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            return ExitCode::from(EXIT_GENERIC_FAILURE);
        }
    };

    let pid_path = match claim_pid_file(&state_dir) {
        Ok(path) => path,
        Err(PidClaimError::AlreadyRunning { pid }) => {
            eprintln!("folder-mcp is already running (pid {pid})");
            return ExitCode::from(EXIT_ALREADY_RUNNING);
        }
        Err(e) => {
            eprintln!("failed to claim pid file: {e}");
            return ExitCode::from(EXIT_GENERIC_FAILURE);
        }
    };

    let sse_addr = match args.sse_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("invalid --sse-addr '{}': {e}", args.sse_addr);
            release_pid_file(&state_dir);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            release_pid_file(&state_dir);
            return ExitCode::from(EXIT_GENERIC_FAILURE);
        }
    };

    let result = runtime.block_on(server::start(args.transport, sse_addr, config, state_dir.clone()));

    release_pid_file(&state_dir);
    let _ = pid_path;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("folder-mcp exited with error: {e}");
            ExitCode::from(EXIT_GENERIC_FAILURE)
        }
    }
}
