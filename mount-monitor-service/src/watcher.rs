use std::{
    fs::File,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use tokio::io::{unix::AsyncFd, Interest};

use crate::{error::Error, mountinfo::MountTable, Result};

/// Mount table change watcher. The kernel reports mount table changes
/// as priority events on open mountinfo files.
///
/// Only pollable files can be watched. Regular files are rejected by `epoll`
pub struct MountWatcher {
    file: AsyncFd<File>,
    path: PathBuf,
}

impl MountWatcher {
    pub fn open(path: &Path) -> Result<Self> {
        let mount_table_error = |e| Error::MountTable(path.into(), e);

        let file = File::open(path).map_err(mount_table_error)?;
        let file = AsyncFd::with_interest(file, Interest::PRIORITY).map_err(mount_table_error)?;

        debug!("Watching {path:?}");
        Ok(Self {
            file,
            path: path.into(),
        })
    }

    /// Read current mount table. Reading also acknowledges pending change notifications
    pub fn read(&mut self) -> Result<MountTable> {
        MountTable::read_from(self.file.get_mut())
            .map_err(|e| Error::MountTable(self.path.clone(), e))
    }

    /// Wait for a mount table change and read the new table
    pub async fn changed(&mut self) -> Result<MountTable> {
        {
            let mut guard = self
                .file
                .ready(Interest::PRIORITY)
                .await
                .map_err(|e| Error::MountTable(self.path.clone(), e))?;

            trace!("Mount table change notification");
            guard.clear_ready();
        }

        self.read()
    }
}
