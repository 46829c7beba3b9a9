use std::io;

use futures::stream;
use mount_monitor_common::{
    MountEvent, MountEventKind, MOUNT_ADDED_SIGNAL, MOUNT_MONITOR_INTERFACE,
    MOUNT_MONITOR_OBJECT_PATH, MOUNT_MONITOR_SERVICE_NAME, MOUNT_REMOVED_SIGNAL,
};
use mount_monitor_lib::{DispatchLoop, Error, LineWriter, ObjectProxy};
use rstest::rstest;
use zbus::Message;

use fixture::{make_fixture, Fixture, SharedBuffer};

fn mount_proxy(fixture: &Fixture) -> ObjectProxy {
    let mut proxy = fixture
        .listener
        .object_proxy(MOUNT_MONITOR_SERVICE_NAME, MOUNT_MONITOR_OBJECT_PATH)
        .unwrap();

    proxy
        .subscribe(MOUNT_MONITOR_INTERFACE, MOUNT_ADDED_SIGNAL, MountEventKind::Added)
        .unwrap();
    proxy
        .subscribe(
            MOUNT_MONITOR_INTERFACE,
            MOUNT_REMOVED_SIGNAL,
            MountEventKind::Removed,
        )
        .unwrap();

    proxy
}

fn signal(name: &str, body: (&str, &str, &str, &str)) -> zbus::Result<Message> {
    Message::signal(MOUNT_MONITOR_OBJECT_PATH, MOUNT_MONITOR_INTERFACE, name)?.build(&body)
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_stream_end_is_connection_lost(
    #[from(make_fixture)]
    #[future]
    fixture: Fixture,
) {
    let output = SharedBuffer::default();
    let messages = stream::iter(vec![
        signal(MOUNT_ADDED_SIGNAL, ("S1", "Acme", "X100", "U-1")),
        signal(MOUNT_REMOVED_SIGNAL, ("S1", "Acme", "X100", "U-1")),
    ]);

    let result = DispatchLoop::with_stream(
        mount_proxy(&fixture),
        LineWriter::new(output.clone()),
        messages,
    )
    .run_until(futures::future::pending())
    .await;

    assert!(matches!(result, Err(Error::ConnectionLost(None))));
    assert_eq!(
        output.lines(),
        vec![
            "MountAdded serial:S1 vendor:Acme model:X100 uuid:U-1",
            "MountRemoved serial:S1 vendor:Acme model:X100 uuid:U-1",
        ]
    );
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_stream_error_is_connection_lost(
    #[from(make_fixture)]
    #[future]
    fixture: Fixture,
) {
    let output = SharedBuffer::default();
    let messages = stream::iter(vec![
        signal(MOUNT_ADDED_SIGNAL, ("S1", "Acme", "X100", "U-1")),
        Err(zbus::Error::from(io::Error::from(io::ErrorKind::UnexpectedEof))),
        signal(MOUNT_REMOVED_SIGNAL, ("S1", "Acme", "X100", "U-1")),
    ]);

    let result = DispatchLoop::with_stream(
        mount_proxy(&fixture),
        LineWriter::new(output.clone()),
        messages,
    )
    .run_until(futures::future::pending())
    .await;

    assert!(matches!(result, Err(Error::ConnectionLost(Some(_)))));
    assert_eq!(
        output.lines(),
        vec!["MountAdded serial:S1 vendor:Acme model:X100 uuid:U-1"]
    );
}

#[rstest]
#[awt]
#[tokio::test]
async fn test_closure_handler_receives_events(
    #[from(make_fixture)]
    #[future]
    fixture: Fixture,
) {
    let mut events = Vec::new();
    let messages = stream::iter(vec![
        signal(MOUNT_REMOVED_SIGNAL, ("S2", "Beta", "Y200", "U-2")),
        signal(MOUNT_ADDED_SIGNAL, ("S1", "Acme", "X100", "U-1")),
    ]);

    assert!(matches!(
        DispatchLoop::with_stream(
            mount_proxy(&fixture),
            |event: &MountEvent| -> mount_monitor_lib::Result<()> {
                events.push(event.clone());
                Ok(())
            },
            messages,
        )
        .run_until(futures::future::pending())
        .await,
        Err(Error::ConnectionLost(None))
    ));
    assert_eq!(
        events,
        vec![
            MountEvent::new(MountEventKind::Removed, "S2", "Beta", "Y200", "U-2"),
            MountEvent::new(MountEventKind::Added, "S1", "Acme", "X100", "U-1"),
        ]
    );
}
