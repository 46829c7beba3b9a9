use std::process::ExitCode;

use clap::Parser;
use colored::*;
use log::*;

use mount_monitor_service_lib::{args::Args, service::Service};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(args.log_level)
        .init();

    debug!("Starting mount monitor service");

    let service = match Service::new(&args).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("{} Failed to start the service: {e}", "error:".bright_red());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = service.run().await {
        eprintln!("{} {e}", "error:".bright_red());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
