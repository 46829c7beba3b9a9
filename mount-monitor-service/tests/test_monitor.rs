use std::collections::HashMap;

use mount_monitor_common::{MountEvent, MountEventKind};
use mount_monitor_service_lib::{
    device::{DeviceResolver, DriveIdentity},
    monitor::MountMonitor,
    mountinfo::{MountEntry, MountTable},
};
use rstest::{fixture, rstest};

struct StaticResolver(HashMap<u64, DriveIdentity>);

impl DeviceResolver for StaticResolver {
    async fn resolve(&self, dev: u64) -> DriveIdentity {
        self.0.get(&dev).cloned().unwrap_or_default()
    }
}

fn identity(serial: &str, vendor: &str, model: &str, uuid: &str) -> DriveIdentity {
    DriveIdentity {
        serial: serial.into(),
        vendor: vendor.into(),
        model: model.into(),
        uuid: uuid.into(),
    }
}

fn table(entries: &[(&str, u64)]) -> MountTable {
    entries
        .iter()
        .map(|(path, dev)| MountEntry::new(*path, *dev))
        .collect()
}

#[fixture]
async fn make_monitor() -> MountMonitor<StaticResolver> {
    let resolver = StaticResolver(HashMap::from([
        (1, identity("ROOT", "Disk", "SSD", "U-0")),
        (17, identity("S1", "Acme", "X100", "U-1")),
        (33, identity("S2", "Beta", "Y200", "U-2")),
    ]));

    let mut monitor = MountMonitor::new(resolver);
    monitor.init(table(&[("/", 1)])).await;
    monitor
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_add_then_remove(
    #[from(make_monitor)]
    #[future]
    monitor: MountMonitor<StaticResolver>,
) {
    let mut monitor = monitor;

    let events = monitor.update(table(&[("/", 1), ("/media/a", 17)])).await;
    assert_eq!(
        events,
        vec![MountEvent::new(MountEventKind::Added, "S1", "Acme", "X100", "U-1")]
    );
    assert_eq!(monitor.devices().len(), 2);

    let events = monitor.update(table(&[("/", 1)])).await;
    assert_eq!(
        events,
        vec![MountEvent::new(MountEventKind::Removed, "S1", "Acme", "X100", "U-1")]
    );
    assert_eq!(monitor.devices().len(), 1);
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_removals_before_additions(
    #[from(make_monitor)]
    #[future]
    monitor: MountMonitor<StaticResolver>,
) {
    let mut monitor = monitor;

    monitor.update(table(&[("/", 1), ("/media/a", 17)])).await;

    let events = monitor.update(table(&[("/", 1), ("/media/b", 33)])).await;
    assert_eq!(
        events,
        vec![
            MountEvent::new(MountEventKind::Removed, "S1", "Acme", "X100", "U-1"),
            MountEvent::new(MountEventKind::Added, "S2", "Beta", "Y200", "U-2"),
        ]
    );
    assert_eq!(monitor.mounts(), &table(&[("/", 1), ("/media/b", 33)]));
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_initial_mounts_are_silent(
    #[from(make_monitor)]
    #[future]
    monitor: MountMonitor<StaticResolver>,
) {
    let mut monitor = monitor;

    assert!(monitor.update(table(&[("/", 1)])).await.is_empty());

    // Initial mounts are still reported on removal
    let events = monitor.update(MountTable::default()).await;
    assert_eq!(
        events,
        vec![MountEvent::new(MountEventKind::Removed, "ROOT", "Disk", "SSD", "U-0")]
    );
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_unknown_device_has_empty_identity(
    #[from(make_monitor)]
    #[future]
    monitor: MountMonitor<StaticResolver>,
) {
    let mut monitor = monitor;

    let events = monitor.update(table(&[("/", 1), ("/mnt/loop", 1792)])).await;

    assert_eq!(
        events,
        vec![MountEvent::new(MountEventKind::Added, "", "", "", "")]
    );
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_stacked_mounts(
    #[from(make_monitor)]
    #[future]
    monitor: MountMonitor<StaticResolver>,
) {
    let mut monitor = monitor;

    monitor
        .update(table(&[("/", 1), ("/media/a", 17), ("/media/a", 33)]))
        .await;

    let events = monitor.update(table(&[("/", 1), ("/media/a", 17)])).await;
    assert_eq!(
        events,
        vec![MountEvent::new(MountEventKind::Removed, "S2", "Beta", "Y200", "U-2")]
    );
}
