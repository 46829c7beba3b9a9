//! ## Mount monitor
//!
//! Mount monitor listens to the MountMonitor service signals on the session bus
//! and prints every mount event as a single line:
//!
//! ```text
//! MountAdded serial:S1 vendor:Acme model:X100 uuid:U-1
//! MountRemoved serial:S1 vendor:Acme model:X100 uuid:U-1
//! ```
//!
//! ## Usage
//! ```sh
//! Mount monitor signal listener
//!
//! Usage: mount-monitor [OPTIONS]
//!
//! Options:
//!   -l, --log-level <LOG_LEVEL>  Log level: OFF, ERROR, WARN, INFO, DEBUG, TRACE [default: WARN]
//!   -a, --address <ADDRESS>      Bus address. Session bus if not set
//!   -s, --service <SERVICE>      Service to listen to [default: org.freedesktop.MountMonitor]
//!   -h, --help                   Print help
//!   -V, --version                Print version
//! ```
//!

use std::{error::Error as StdError, io, process::ExitCode};

use clap::{self, Parser};
use colored::*;
use log::{LevelFilter, *};
use mount_monitor_common::{
    MountEventKind, MOUNT_ADDED_SIGNAL, MOUNT_MONITOR_INTERFACE, MOUNT_MONITOR_OBJECT_PATH,
    MOUNT_MONITOR_SERVICE_NAME, MOUNT_REMOVED_SIGNAL,
};
use mount_monitor_lib::{BusConnection, DispatchLoop, LineWriter, Result};

/// Mount monitor signal listener
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Log level: OFF, ERROR, WARN, INFO, DEBUG, TRACE
    #[clap(short, long, default_value_t = LevelFilter::Warn)]
    pub log_level: log::LevelFilter,

    /// Bus address. Session bus if not set
    #[clap(short, long)]
    pub address: Option<String>,

    /// Service to listen to
    #[clap(short, long, default_value = MOUNT_MONITOR_SERVICE_NAME)]
    pub service: String,
}

/// Resolves on Ctrl-C or SIGTERM
async fn termination() {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("Failed to listen to SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

async fn run(args: Args) -> Result<()> {
    let connection = match &args.address {
        Some(address) => BusConnection::address(address).await?,
        None => BusConnection::session().await?,
    };

    let mut proxy = connection.object_proxy(&args.service, MOUNT_MONITOR_OBJECT_PATH)?;
    proxy.subscribe(MOUNT_MONITOR_INTERFACE, MOUNT_ADDED_SIGNAL, MountEventKind::Added)?;
    proxy.subscribe(
        MOUNT_MONITOR_INTERFACE,
        MOUNT_REMOVED_SIGNAL,
        MountEventKind::Removed,
    )?;

    DispatchLoop::new(proxy, LineWriter::new(io::stdout().lock()))
        .run_until(termination())
        .await?;

    debug!("Shutting monitor down");
    Ok(())
}

fn report(error: &dyn StdError) {
    let mut message = error.to_string();

    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }

    eprintln!("{} {message}", "error:".bright_red());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(args.log_level)
        .init();

    debug!("Starting mount monitor");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
