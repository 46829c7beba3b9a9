use log::debug;
use zbus::{interface, SignalContext};

use mount_monitor_common::{MountEvent, MountEventKind};

/// MountMonitor bus object. Has no methods or properties, only emits mount signals
pub struct MountMonitorInterface;

#[interface(name = "org.freedesktop.MountMonitor.Base")]
impl MountMonitorInterface {
    #[zbus(signal)]
    pub async fn mount_added(
        ctxt: &SignalContext<'_>,
        serial: &str,
        vendor: &str,
        model: &str,
        uuid: &str,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn mount_removed(
        ctxt: &SignalContext<'_>,
        serial: &str,
        vendor: &str,
        model: &str,
        uuid: &str,
    ) -> zbus::Result<()>;
}

/// Broadcast a mount event as the corresponding signal
pub async fn emit_event(ctxt: &SignalContext<'_>, event: &MountEvent) -> zbus::Result<()> {
    debug!("Emitting {event:?}");

    match event.kind {
        MountEventKind::Added => {
            MountMonitorInterface::mount_added(
                ctxt,
                &event.serial,
                &event.vendor,
                &event.model,
                &event.uuid,
            )
            .await
        }
        MountEventKind::Removed => {
            MountMonitorInterface::mount_removed(
                ctxt,
                &event.serial,
                &event.vendor,
                &event.model,
                &event.uuid,
            )
            .await
        }
    }
}
