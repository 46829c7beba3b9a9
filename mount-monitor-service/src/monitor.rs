use log::{debug, info, warn};

use mount_monitor_common::{MountEvent, MountEventKind};

use crate::{
    device::{DeviceResolver, DriveIdentity},
    mountinfo::{MountEntry, MountTable},
};

/// Drive identity published for a mount. Kept until the mount is gone,
/// so that removal signals repeat the identity of the addition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub mount_path: String,
    pub dev: u64,
    pub identity: DriveIdentity,
}

impl DeviceInfo {
    fn event(&self, kind: MountEventKind) -> MountEvent {
        MountEvent::new(
            kind,
            self.identity.serial.clone(),
            self.identity.vendor.clone(),
            self.identity.model.clone(),
            self.identity.uuid.clone(),
        )
    }
}

/// Mount table tracker. Turns mount table snapshots into mount events
pub struct MountMonitor<R: DeviceResolver> {
    resolver: R,
    mounts: MountTable,
    devices: Vec<DeviceInfo>,
}

impl<R: DeviceResolver> MountMonitor<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            mounts: MountTable::default(),
            devices: Vec::new(),
        }
    }

    /// Take the initial snapshot. Drive identities of existing mounts are resolved,
    /// but no events are produced
    pub async fn init(&mut self, table: MountTable) {
        info!("Initial mount table contains {} entries", table.len());

        self.devices.clear();
        for entry in table.iter() {
            let info = self.resolve(entry).await;
            self.devices.push(info);
        }

        self.mounts = table;
    }

    /// Update current snapshot. Returns removal events first, then addition events
    pub async fn update(&mut self, table: MountTable) -> Vec<MountEvent> {
        let diff = self.mounts.diff(&table);
        if diff.is_empty() {
            debug!("Mount table changed, but no mounts were added or removed");
            self.mounts = table;
            return Vec::new();
        }

        let mut events = Vec::with_capacity(diff.added.len() + diff.removed.len());

        for entry in diff.removed {
            match self
                .devices
                .iter()
                .position(|info| info.mount_path == entry.mount_path && info.dev == entry.dev)
            {
                Some(index) => {
                    let info = self.devices.remove(index);
                    info!("Unmounted {}", entry.mount_path);
                    events.push(info.event(MountEventKind::Removed));
                }
                None => warn!("No device info for the unmounted {}", entry.mount_path),
            }
        }

        for entry in diff.added {
            let info = self.resolve(&entry).await;
            info!("Mounted {}", entry.mount_path);

            events.push(info.event(MountEventKind::Added));
            self.devices.push(info);
        }

        self.mounts = table;
        events
    }

    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    async fn resolve(&self, entry: &MountEntry) -> DeviceInfo {
        DeviceInfo {
            mount_path: entry.mount_path.clone(),
            dev: entry.dev,
            identity: self.resolver.resolve(entry.dev).await,
        }
    }
}
