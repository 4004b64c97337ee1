use clap::Parser;

use laserquote_lib::cli::{self, Cli};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let _tracing_guard = laserquote_lib::init_tracing(cli.log_stderr);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "laserquote starting");

    match cli::run(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            // Same { kind, message } shape an HTTP layer would return.
            match serde_json::to_string(&e) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{e}"),
            }
            std::process::ExitCode::FAILURE
        }
    }
}
