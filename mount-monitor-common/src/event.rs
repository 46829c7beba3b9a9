use std::fmt;

use crate::{MOUNT_ADDED_SIGNAL, MOUNT_REMOVED_SIGNAL};

/// Which of the two mount signals an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountEventKind {
    Added,
    Removed,
}

impl MountEventKind {
    /// Bus signal name for the kind
    pub fn signal_name(&self) -> &'static str {
        match self {
            MountEventKind::Added => MOUNT_ADDED_SIGNAL,
            MountEventKind::Removed => MOUNT_REMOVED_SIGNAL,
        }
    }

    /// Kind for a signal name. Matching is case-sensitive
    pub fn from_signal_name(name: &str) -> Option<Self> {
        match name {
            MOUNT_ADDED_SIGNAL => Some(MountEventKind::Added),
            MOUNT_REMOVED_SIGNAL => Some(MountEventKind::Removed),
            _ => None,
        }
    }
}

impl fmt::Display for MountEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signal_name())
    }
}

/// A single mount notification. Field values are opaque text and are never validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEvent {
    pub kind: MountEventKind,
    pub serial: String,
    pub vendor: String,
    pub model: String,
    pub uuid: String,
}

impl MountEvent {
    pub fn new(
        kind: MountEventKind,
        serial: impl Into<String>,
        vendor: impl Into<String>,
        model: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            serial: serial.into(),
            vendor: vendor.into(),
            model: model.into(),
            uuid: uuid.into(),
        }
    }

    /// Build an event from a decoded `(serial, vendor, model, uuid)` signal body
    pub fn from_payload(
        kind: MountEventKind,
        (serial, vendor, model, uuid): (String, String, String, String),
    ) -> Self {
        Self {
            kind,
            serial,
            vendor,
            model,
            uuid,
        }
    }

    /// Single output line, without the trailing newline
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MountEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} serial:{} vendor:{} model:{} uuid:{}",
            self.kind, self.serial, self.vendor, self.model, self.uuid
        )
    }
}
