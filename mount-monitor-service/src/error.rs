use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read mount table {0:?}: {1}")]
    MountTable(PathBuf, #[source] std::io::Error),
    #[error("Bus error: {0}")]
    Bus(#[from] zbus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
