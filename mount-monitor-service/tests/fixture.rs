#![allow(dead_code)]

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use log::LevelFilter;
use mount_monitor_common::{
    MountEventKind, MOUNT_ADDED_SIGNAL, MOUNT_MONITOR_INTERFACE, MOUNT_MONITOR_OBJECT_PATH,
    MOUNT_MONITOR_SERVICE_NAME, MOUNT_REMOVED_SIGNAL,
};
use mount_monitor_lib::{BusConnection, ObjectProxy};
use mount_monitor_service_lib::interface::MountMonitorInterface;
use rstest::fixture;
use tokio::{net::UnixStream, time};

/// Service connection serving the mount monitor interface, and a listener connected to it
pub struct Fixture {
    pub service: zbus::Connection,
    pub listener: BusConnection,
}

impl Fixture {
    pub async fn new(log_level: LevelFilter) -> Self {
        let _ = pretty_env_logger::formatted_builder()
            .filter_level(log_level)
            .try_init();

        let guid = zbus::Guid::generate();
        let (service_socket, listener_socket) =
            UnixStream::pair().expect("Failed to create socket pair");

        let (service, listener) = futures::try_join!(
            zbus::connection::Builder::unix_stream(service_socket)
                .server(guid)
                .expect("Invalid server guid")
                .p2p()
                .serve_at(MOUNT_MONITOR_OBJECT_PATH, MountMonitorInterface)
                .expect("Failed to serve the interface")
                .build(),
            zbus::connection::Builder::unix_stream(listener_socket)
                .p2p()
                .build(),
        )
        .expect("Failed to establish peer connection");

        Self {
            service,
            listener: BusConnection::peer(listener),
        }
    }

    /// Listener proxy subscribed to both mount signals
    pub fn mount_proxy(&self) -> ObjectProxy {
        let mut proxy = self
            .listener
            .object_proxy(MOUNT_MONITOR_SERVICE_NAME, MOUNT_MONITOR_OBJECT_PATH)
            .expect("Failed to create proxy");

        proxy
            .subscribe(MOUNT_MONITOR_INTERFACE, MOUNT_ADDED_SIGNAL, MountEventKind::Added)
            .expect("Failed to subscribe");
        proxy
            .subscribe(
                MOUNT_MONITOR_INTERFACE,
                MOUNT_REMOVED_SIGNAL,
                MountEventKind::Removed,
            )
            .expect("Failed to subscribe");

        proxy
    }
}

/// Cloneable in-memory output sink
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .expect("Non UTF-8 output")
            .lines()
            .map(String::from)
            .collect()
    }

    /// Resolves when at least `count` lines are written
    pub async fn wait_lines(&self, count: usize) {
        while self.lines().len() < count {
            time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[fixture]
pub async fn make_fixture() -> Fixture {
    Fixture::new(LevelFilter::Debug).await
}
