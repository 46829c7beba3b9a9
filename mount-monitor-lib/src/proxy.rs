use log::{debug, info, trace, warn};
use zbus::{
    fdo::{self, DBusProxy},
    message::Type as MessageType,
    names::{
        BusName, InterfaceName, MemberName, OwnedBusName, OwnedInterfaceName, OwnedMemberName,
        OwnedUniqueName, UniqueName,
    },
    zvariant::{ObjectPath, OwnedObjectPath},
    Message, MatchRule,
};

use mount_monitor_common::MountEventKind;

use crate::{connection::BusConnection, Error, Result};

const DBUS_NAME: &str = "org.freedesktop.DBus";
const DBUS_PATH: &str = "/org/freedesktop/DBus";
const NAME_OWNER_CHANGED_SIGNAL: &str = "NameOwnerChanged";

/// Registered signal subscription
#[derive(Debug, Clone)]
pub struct Subscription {
    interface: OwnedInterfaceName,
    signal: OwnedMemberName,
    kind: MountEventKind,
}

impl Subscription {
    pub fn interface(&self) -> &str {
        self.interface.as_str()
    }

    pub fn signal(&self) -> &str {
        self.signal.as_str()
    }

    pub fn kind(&self) -> MountEventKind {
        self.kind
    }
}

/// Local handle of a remote object. Holds the signal subscriptions made on the object.
///
/// On a message bus connection only signals sent by the current owner of the service name
/// are dispatched. The owner is looked up when the dispatch loop starts and followed through
/// `NameOwnerChanged` afterwards. Peer-to-peer connections have a single sender and skip the check
pub struct ObjectProxy {
    connection: BusConnection,
    service: OwnedBusName,
    path: OwnedObjectPath,
    subscriptions: Vec<Subscription>,
    owner: Option<OwnedUniqueName>,
}

impl ObjectProxy {
    pub(crate) fn new(
        connection: BusConnection,
        service_name: &str,
        object_path: &str,
    ) -> Result<Self> {
        let service = BusName::try_from(service_name)
            .map_err(|_| Error::InvalidName(service_name.into()))?;
        let path = ObjectPath::try_from(object_path)
            .map_err(|_| Error::InvalidName(object_path.into()))?;

        Ok(Self {
            connection,
            service: service.into(),
            path: path.into(),
            subscriptions: Vec::new(),
            owner: None,
        })
    }

    /// Subscribe to the `signal_name` signal of the `interface_name` interface.
    /// Every incoming matching signal is dispatched as a `kind` event.
    ///
    /// Subscriptions are additive: subscribing twice results in two events per signal
    pub fn subscribe(
        &mut self,
        interface_name: &str,
        signal_name: &str,
        kind: MountEventKind,
    ) -> Result<()> {
        let interface = InterfaceName::try_from(interface_name)
            .map_err(|_| Error::InvalidName(interface_name.into()))?;
        let signal = MemberName::try_from(signal_name)
            .map_err(|_| Error::InvalidName(signal_name.into()))?;

        debug!(
            "Subscribing to {}.{} of {}{} as {kind}",
            interface_name,
            signal_name,
            self.service.as_str(),
            self.path.as_str()
        );

        self.subscriptions.push(Subscription {
            interface: interface.into(),
            signal: signal.into(),
            kind,
        });

        Ok(())
    }

    pub fn service(&self) -> &str {
        self.service.as_str()
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn connection(&self) -> &BusConnection {
        &self.connection
    }

    /// Unique name of the current service owner. Always `None` on peer-to-peer connections
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_ref().map(|owner| owner.as_str())
    }

    /// Event kinds of all subscriptions matching the message, in registration order
    pub fn matching_kinds(&self, message: &Message) -> Vec<MountEventKind> {
        let header = message.header();

        if header.message_type() != MessageType::Signal {
            return Vec::new();
        }

        let (Some(path), Some(interface), Some(member)) =
            (header.path(), header.interface(), header.member())
        else {
            trace!("Signal without path, interface, or member. Ignoring");
            return Vec::new();
        };

        if path.as_str() != self.path.as_str() {
            return Vec::new();
        }

        if self.connection.is_bus() {
            let from_owner = match (header.sender(), &self.owner) {
                (Some(sender), Some(owner)) => sender.as_str() == owner.as_str(),
                _ => false,
            };

            if !from_owner {
                trace!(
                    "Signal from {:?}, which doesn't own {}. Ignoring",
                    header.sender(),
                    self.service.as_str()
                );
                return Vec::new();
            }
        }

        self.subscriptions
            .iter()
            .filter(|sub| {
                sub.interface.as_str() == interface.as_str()
                    && sub.signal.as_str() == member.as_str()
            })
            .map(|sub| sub.kind)
            .collect()
    }

    /// Follow service owner changes announced by the bus daemon
    pub(crate) fn track_owner(&mut self, message: &Message) {
        if !self.connection.is_bus() {
            return;
        }

        let header = message.header();
        if header.message_type() != MessageType::Signal
            || header.sender().map(|s| s.as_str()) != Some(DBUS_NAME)
            || header.interface().map(|i| i.as_str()) != Some(DBUS_NAME)
            || header.member().map(|m| m.as_str()) != Some(NAME_OWNER_CHANGED_SIGNAL)
        {
            return;
        }

        let (name, _, new_owner) = match message.body().deserialize::<(String, String, String)>() {
            Ok(args) => args,
            Err(e) => {
                warn!("Invalid {NAME_OWNER_CHANGED_SIGNAL} signal: {e}");
                return;
            }
        };

        if name != self.service.as_str() {
            return;
        }

        self.owner = UniqueName::try_from(new_owner).ok().map(Into::into);
        info!("Owner of {name} changed to {:?}", self.owner());
    }

    /// Ask the bus daemon to route subscribed signals to us and find out the current
    /// service owner. Peer-to-peer connections receive all signals and need no rules
    pub(crate) async fn bind(&mut self) -> Result<()> {
        if !self.connection.is_bus() {
            debug!("Peer connection. Skipping match rules");
            return Ok(());
        }

        let dbus = DBusProxy::new(self.connection.inner())
            .await
            .map_err(Error::Subscription)?;

        // Watch owner changes before asking for the owner, so that no change is missed
        if let BusName::WellKnown(_) = &*self.service {
            let rule = MatchRule::builder()
                .msg_type(MessageType::Signal)
                .sender(DBUS_NAME)
                .and_then(|b| b.path(DBUS_PATH))
                .and_then(|b| b.interface(DBUS_NAME))
                .and_then(|b| b.member(NAME_OWNER_CHANGED_SIGNAL))
                .and_then(|b| b.arg(0, self.service.as_str()))
                .map_err(Error::Subscription)?
                .build();

            debug!("Adding match rule: {rule}");
            dbus.add_match_rule(rule)
                .await
                .map_err(|e| Error::Subscription(e.into()))?;
        }

        let mut installed: Vec<(&str, &str)> = Vec::new();
        for sub in &self.subscriptions {
            let key = (sub.interface(), sub.signal());
            if installed.contains(&key) {
                continue;
            }

            let rule = MatchRule::builder()
                .msg_type(MessageType::Signal)
                .sender(self.service.as_str())
                .and_then(|b| b.path(self.path.as_str()))
                .and_then(|b| b.interface(sub.interface()))
                .and_then(|b| b.member(sub.signal()))
                .map_err(Error::Subscription)?
                .build();

            debug!("Adding match rule: {rule}");
            dbus.add_match_rule(rule)
                .await
                .map_err(|e| Error::Subscription(e.into()))?;

            installed.push(key);
        }

        self.owner = match &*self.service {
            BusName::Unique(name) => Some(name.to_owned().into()),
            BusName::WellKnown(_) => match dbus.get_name_owner(BusName::clone(&self.service)).await {
                Ok(owner) => Some(owner),
                Err(fdo::Error::NameHasNoOwner(_)) => {
                    info!("{} is not running yet", self.service.as_str());
                    None
                }
                Err(e) => return Err(Error::Subscription(e.into())),
            },
        };
        debug!("Owner of {}: {:?}", self.service.as_str(), self.owner());

        Ok(())
    }
}
