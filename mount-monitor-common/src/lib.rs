pub mod event;

pub use event::{MountEvent, MountEventKind};

pub const MOUNT_MONITOR_SERVICE_NAME: &str = "org.freedesktop.MountMonitor";
pub const MOUNT_MONITOR_OBJECT_PATH: &str = "/org/freedesktop/MountMonitor";
pub const MOUNT_MONITOR_INTERFACE: &str = "org.freedesktop.MountMonitor.Base";

pub const MOUNT_ADDED_SIGNAL: &str = "MountAdded";
pub const MOUNT_REMOVED_SIGNAL: &str = "MountRemoved";
