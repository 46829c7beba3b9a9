use log::{debug, info};

use crate::{proxy::ObjectProxy, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionKind {
    /// Connection to a message bus daemon
    Bus,
    /// Direct peer-to-peer connection without a daemon in between
    Peer,
}

/// Bus connection handle. The underlying socket stays open until the last
/// clone of the handle (including the ones held by proxies) is dropped
#[derive(Clone)]
pub struct BusConnection {
    inner: zbus::Connection,
    kind: ConnectionKind,
}

impl BusConnection {
    /// Connect to the session bus. The address is taken from the environment
    pub async fn session() -> Result<Self> {
        debug!("Connecting to the session bus");

        let inner = zbus::Connection::session()
            .await
            .map_err(Error::Connection)?;

        info!("Connected to the session bus as {:?}", inner.unique_name());
        Ok(Self::bus(inner))
    }

    /// Connect to a bus at a given `address`, e.g. `unix:path=/run/user/1000/bus`
    pub async fn address(address: &str) -> Result<Self> {
        debug!("Connecting to the bus at {address}");

        let inner = zbus::connection::Builder::address(address)
            .map_err(Error::Connection)?
            .build()
            .await
            .map_err(Error::Connection)?;

        info!("Connected to {address} as {:?}", inner.unique_name());
        Ok(Self::bus(inner))
    }

    /// Wrap an established message bus connection
    pub fn bus(inner: zbus::Connection) -> Self {
        Self {
            inner,
            kind: ConnectionKind::Bus,
        }
    }

    /// Wrap an established peer-to-peer connection.
    /// No match rules are registered on such connections
    pub fn peer(inner: zbus::Connection) -> Self {
        Self {
            inner,
            kind: ConnectionKind::Peer,
        }
    }

    /// Get a handle to the `object_path` object of the `service_name` service.
    /// The remote object is not checked to exist
    pub fn object_proxy(&self, service_name: &str, object_path: &str) -> Result<ObjectProxy> {
        ObjectProxy::new(self.clone(), service_name, object_path)
    }

    pub fn is_bus(&self) -> bool {
        self.kind == ConnectionKind::Bus
    }

    pub fn inner(&self) -> &zbus::Connection {
        &self.inner
    }
}
