//! ## Mount monitor service
//!
//! Watches the mount table and broadcasts `MountAdded` and `MountRemoved` signals of the
//! `org.freedesktop.MountMonitor.Base` interface on the session bus.
//!
//! Every signal carries the drive identity of the mounted filesystem: `(serial, vendor, model, uuid)`.
//! Drive identities are requested from UDisks2 on the system bus.
//!

pub mod args;
pub mod device;
mod error;
pub mod interface;
pub mod monitor;
pub mod mountinfo;
pub mod service;
pub mod watcher;

pub use error::{Error, Result};
