use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to connect to the bus")]
    Connection(#[source] zbus::Error),
    #[error("Invalid name or path `{0}`")]
    InvalidName(String),
    #[error("Failed to subscribe to the bus signals")]
    Subscription(#[source] zbus::Error),
    #[error("Malformed signal payload. Expected four strings")]
    Decode(#[source] zbus::Error),
    #[error("Bus connection lost")]
    ConnectionLost(#[source] Option<zbus::Error>),
    #[error("Failed to write an event")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
