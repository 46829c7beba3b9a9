use std::future::Future;

use futures::{pin_mut, select, FutureExt as _};
use log::{debug, info, warn};
use zbus::{connection::Builder, Connection, SignalContext};

use mount_monitor_common::{MOUNT_MONITOR_OBJECT_PATH, MOUNT_MONITOR_SERVICE_NAME};

use crate::{
    args::Args,
    device::{DeviceResolver, UDisksResolver},
    interface::{emit_event, MountMonitorInterface},
    monitor::MountMonitor,
    watcher::MountWatcher,
    Result,
};

/// Session bus service, which broadcasts mount table changes
pub struct Service<R: DeviceResolver> {
    connection: Connection,
    watcher: MountWatcher,
    monitor: MountMonitor<R>,
}

impl Service<UDisksResolver> {
    /// Claim the service name and start watching the mount table
    pub async fn new(args: &Args) -> Result<Self> {
        let watcher = MountWatcher::open(&args.mountinfo)?;

        let builder = match &args.address {
            Some(address) => Builder::address(address.as_str())?,
            None => Builder::session()?,
        };

        let connection = builder
            .name(MOUNT_MONITOR_SERVICE_NAME)?
            .serve_at(MOUNT_MONITOR_OBJECT_PATH, MountMonitorInterface)?
            .build()
            .await?;

        info!(
            "Registered {MOUNT_MONITOR_SERVICE_NAME} at {MOUNT_MONITOR_OBJECT_PATH} as {:?}",
            connection.unique_name()
        );

        Self::with_resolver(connection, watcher, UDisksResolver::connect().await).await
    }
}

impl<R: DeviceResolver> Service<R> {
    /// Create a service over an established connection. Reads the initial mount table
    pub async fn with_resolver(
        connection: Connection,
        mut watcher: MountWatcher,
        resolver: R,
    ) -> Result<Self> {
        let mut monitor = MountMonitor::new(resolver);
        monitor.init(watcher.read()?).await;

        Ok(Self {
            connection,
            watcher,
            monitor,
        })
    }

    pub fn monitor(&self) -> &MountMonitor<R> {
        &self.monitor
    }

    /// Service main loop. Returns on Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {e}");
            }
        })
        .await
    }

    /// Watch the mount table and broadcast changes until `shutdown` resolves
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let ctxt = SignalContext::new(&self.connection, MOUNT_MONITOR_OBJECT_PATH)?;

        let shutdown = shutdown.fuse();
        pin_mut!(shutdown);

        info!("Mount monitor service is running");

        loop {
            select! {
                table = self.watcher.changed().fuse() => {
                    let table = match table {
                        Ok(table) => table,
                        Err(e) => {
                            warn!("{e}. Keeping previous mount table");
                            continue;
                        }
                    };

                    for event in self.monitor.update(table).await {
                        emit_event(&ctxt, &event).await?;
                    }
                },
                _ = shutdown => {
                    debug!("Shutting service down");
                    return Ok(());
                }
            }
        }
    }
}
