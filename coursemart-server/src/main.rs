//! The coursemart HTTP server binary.

use std::process::ExitCode;

use coursemart_server::config::ServerConfig;
use coursemart_server::telemetry;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Environment misconfigured: {e}");
            return ExitCode::FAILURE;
        }
    };

    match coursemart_server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
