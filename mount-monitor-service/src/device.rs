use std::future::Future;

use log::{debug, warn};
use zbus::{
    fdo::ObjectManagerProxy, proxy, proxy::CacheProperties, zvariant::OwnedObjectPath,
    Connection,
};

use crate::mountinfo::major_minor;

const UDISKS_SERVICE_NAME: &str = "org.freedesktop.UDisks2";
const UDISKS_OBJECT_PATH: &str = "/org/freedesktop/UDisks2";
const UDISKS_BLOCK_INTERFACE: &str = "org.freedesktop.UDisks2.Block";

#[proxy(
    interface = "org.freedesktop.UDisks2.Block",
    default_service = "org.freedesktop.UDisks2",
    gen_blocking = false
)]
trait Block {
    #[zbus(property)]
    fn device_number(&self) -> zbus::Result<u64>;

    #[zbus(property, name = "IdUUID")]
    fn id_uuid(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn drive(&self) -> zbus::Result<OwnedObjectPath>;
}

#[proxy(
    interface = "org.freedesktop.UDisks2.Drive",
    default_service = "org.freedesktop.UDisks2",
    gen_blocking = false
)]
trait Drive {
    #[zbus(property)]
    fn serial(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn vendor(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn model(&self) -> zbus::Result<String>;
}

/// Identity of the drive holding a mounted filesystem. Unknown fields are empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveIdentity {
    pub serial: String,
    pub vendor: String,
    pub model: String,
    pub uuid: String,
}

/// Device number to drive identity lookup
pub trait DeviceResolver {
    fn resolve(&self, dev: u64) -> impl Future<Output = DriveIdentity>;
}

/// Resolves drive identities with the UDisks2 daemon on the system bus
pub struct UDisksResolver {
    connection: Option<Connection>,
}

impl UDisksResolver {
    /// Connect to the system bus. If the bus is unavailable, all lookups return empty identities
    pub async fn connect() -> Self {
        let connection = match Connection::system().await {
            Ok(connection) => Some(connection),
            Err(e) => {
                warn!("Failed to connect to the system bus. Drive info won't be available: {e}");
                None
            }
        };

        Self { connection }
    }

    /// Find the block object of the `dev` device. Returns its filesystem UUID and drive object path
    async fn find_block(
        connection: &Connection,
        dev: u64,
    ) -> zbus::Result<Option<(String, OwnedObjectPath)>> {
        let manager = ObjectManagerProxy::builder(connection)
            .destination(UDISKS_SERVICE_NAME)?
            .path(UDISKS_OBJECT_PATH)?
            .build()
            .await?;

        for (path, interfaces) in manager.get_managed_objects().await? {
            if !interfaces
                .keys()
                .any(|name| name.as_str() == UDISKS_BLOCK_INTERFACE)
            {
                continue;
            }

            let block = BlockProxy::builder(connection)
                .path(path.as_str())?
                .cache_properties(CacheProperties::No)
                .build()
                .await?;

            if block.device_number().await? == dev {
                return Ok(Some((block.id_uuid().await?, block.drive().await?)));
            }
        }

        Ok(None)
    }

    async fn lookup(connection: &Connection, dev: u64) -> zbus::Result<DriveIdentity> {
        let (major, minor) = major_minor(dev);

        let Some((uuid, drive_path)) = Self::find_block(connection, dev).await? else {
            warn!("Failed to find a block object for device {major}:{minor}");
            return Ok(DriveIdentity::default());
        };

        let mut identity = DriveIdentity {
            uuid,
            ..Default::default()
        };

        // Block devices without a drive, e.g. loop devices, point to the root path
        if drive_path.as_str() == "/" {
            warn!("Block device {major}:{minor} has no drive");
            return Ok(identity);
        }

        let drive = DriveProxy::builder(connection)
            .path(drive_path.as_str())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        identity.serial = drive.serial().await?;
        identity.vendor = drive.vendor().await?;
        identity.model = drive.model().await?;

        Ok(identity)
    }
}

impl DeviceResolver for UDisksResolver {
    async fn resolve(&self, dev: u64) -> DriveIdentity {
        let Some(connection) = &self.connection else {
            return DriveIdentity::default();
        };

        match Self::lookup(connection, dev).await {
            Ok(identity) => {
                debug!("Device {dev:#x} identity: {identity:?}");
                identity
            }
            Err(e) => {
                let (major, minor) = major_minor(dev);
                warn!("Failed to get drive info for device {major}:{minor}: {e}");
                DriveIdentity::default()
            }
        }
    }
}
