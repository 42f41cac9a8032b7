//! Entry point: parse CLI and dispatch to command handlers.

use clap::Parser;
use fieldhouse::{
    cli::{Cli, Commands},
    commands::{
        run::{handle_run, RunParams},
        vision_serve::{handle_vision, VisionParams},
        EXIT_CONFIG, EXIT_STAGE_FAILED,
    },
    FieldhouseError,
};
use tracing_subscriber::EnvFilter;

/// Run the CLI.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let app = Cli::parse();

    let result = match app.command {
        Commands::Run {
            live,
            leagues,
            focus_teams,
            agent,
            skip_tests,
            skip_readiness,
            out_dir,
            fixtures_dir,
        } => {
            handle_run(RunParams {
                live,
                leagues,
                focus_teams,
                agent,
                skip_tests,
                skip_readiness,
                out_dir,
                fixtures_dir,
            })
            .await
        }

        Commands::Vision {
            workers,
            port,
            model,
            bench_frames,
            worker_id,
        } => {
            handle_vision(VisionParams {
                workers,
                port,
                model,
                bench_frames,
                worker_id,
            })
            .await
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(err @ FieldhouseError::Config { .. }) => {
            eprintln!("{err}");
            EXIT_CONFIG
        }
        Err(err) => {
            eprintln!("{err}");
            EXIT_STAGE_FAILED
        }
    };
    std::process::exit(code);
}
