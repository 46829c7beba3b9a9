//! ## Mount monitor bus library
//!
//! A library to listen to the `MountAdded` and `MountRemoved` signals of the MountMonitor service.
//!
//! To connect to the bus call [BusConnection::session], or [BusConnection::address] for a custom bus.
//! [BusConnection::object_proxy] returns an [ObjectProxy], which collects signal subscriptions
//! made with [ObjectProxy::subscribe].
//!
//! ### Polling
//! To receive signals you need to run a [DispatchLoop]. The loop owns the proxy and an [EventHandler],
//! which receives every decoded [MountEvent]:
//!
//! ```rust
//! use mount_monitor_common::{
//!     MountEventKind, MOUNT_ADDED_SIGNAL, MOUNT_MONITOR_INTERFACE, MOUNT_MONITOR_OBJECT_PATH,
//!     MOUNT_MONITOR_SERVICE_NAME,
//! };
//! use mount_monitor_lib::{BusConnection, DispatchLoop, LineWriter};
//!
//! async fn example() -> mount_monitor_lib::Result<()> {
//!     let connection = BusConnection::session().await?;
//!
//!     let mut proxy =
//!         connection.object_proxy(MOUNT_MONITOR_SERVICE_NAME, MOUNT_MONITOR_OBJECT_PATH)?;
//!     proxy.subscribe(MOUNT_MONITOR_INTERFACE, MOUNT_ADDED_SIGNAL, MountEventKind::Added)?;
//!
//!     DispatchLoop::new(proxy, LineWriter::new(std::io::stdout()))
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!

pub mod connection;
pub mod dispatch;
mod error;
pub mod handler;
pub mod proxy;

pub use connection::BusConnection;
pub use dispatch::DispatchLoop;
pub use error::{Error, Result};
pub use handler::{EventHandler, LineWriter};
pub use proxy::{ObjectProxy, Subscription};

pub use mount_monitor_common::{MountEvent, MountEventKind};
