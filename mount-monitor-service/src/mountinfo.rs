//! Mount table parsing.
//!
//! Each `/proc/<pid>/mountinfo` line has the following format (see `proc(5)`):
//! ```text
//! 36 35 98:0 /mnt1 /mnt/parent\040dir rw,noatime master:1 - ext3 /dev/root rw,errors=continue
//! (1)(2)(3)   (4)   (5)                (6)       (7)     (8) (9)   (10)      (11)
//! ```
//! Only the device number (3), the mount point (5), and for `major == 0` entries
//! the filesystem type (9) and the mount source (10) are used.

use std::{
    collections::BTreeSet,
    fs,
    io::{self, Read, Seek, SeekFrom},
    os::unix::fs::{FileTypeExt, MetadataExt},
    path::Path,
};

use log::{debug, trace, warn};

/// A single mounted filesystem. Ordered by mount path, then by device number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MountEntry {
    pub mount_path: String,
    pub dev: u64,
}

impl MountEntry {
    pub fn new(mount_path: impl Into<String>, dev: u64) -> Self {
        Self {
            mount_path: mount_path.into(),
            dev,
        }
    }
}

/// Encode a device number the way glibc `makedev` does
pub fn makedev(major: u32, minor: u32) -> u64 {
    let (major, minor) = (major as u64, minor as u64);

    ((major & 0xffff_f000) << 32)
        | ((major & 0x0000_0fff) << 8)
        | ((minor & 0xffff_ff00) << 12)
        | (minor & 0x0000_00ff)
}

/// Split a device number into `(major, minor)`
pub fn major_minor(dev: u64) -> (u32, u32) {
    let major = ((dev >> 32) & 0xffff_f000) | ((dev >> 8) & 0x0000_0fff);
    let minor = ((dev >> 12) & 0xffff_ff00) | (dev & 0x0000_00ff);

    (major as u32, minor as u32)
}

/// Decode octal escapes of the mount table, e.g. `\040` for a space
pub fn unescape(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
            let value = bytes[i + 1..i + 4]
                .iter()
                .fold(0u32, |acc, digit| acc * 8 + (digit - b'0') as u32);

            result.push(value as u8);
            i += 4;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&result).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3
        && digits.iter().all(|d| (b'0'..=b'7').contains(d))
        && digits[0] <= b'3'
}

/// Device number of a block device node
pub fn block_device_number(path: &Path) -> io::Result<u64> {
    let metadata = fs::metadata(path)?;

    if !metadata.file_type().is_block_device() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a block device", path.display()),
        ));
    }

    Ok(metadata.rdev())
}

/// Snapshot of the mounted filesystems
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    entries: BTreeSet<MountEntry>,
}

/// Difference between two mount table snapshots
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MountDiff {
    pub added: Vec<MountEntry>,
    pub removed: Vec<MountEntry>,
}

impl MountDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl MountTable {
    /// Read and parse a mount table file
    pub fn read(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Re-read a mount table from the beginning of an already open file
    pub fn read_from<F: Read + Seek>(file: &mut F) -> io::Result<Self> {
        let mut contents = String::new();

        file.seek(SeekFrom::Start(0))?;
        file.read_to_string(&mut contents)?;

        Ok(Self::parse(&contents))
    }

    /// Parse mount table contents. Block devices of `major == 0` btrfs mounts are resolved
    /// with [block_device_number]
    pub fn parse(contents: &str) -> Self {
        Self::parse_with(contents, block_device_number)
    }

    /// Parse mount table contents using a custom block device resolver
    pub fn parse_with<F>(contents: &str, resolve_block: F) -> Self
    where
        F: Fn(&Path) -> io::Result<u64>,
    {
        let mut entries = BTreeSet::new();

        for line in contents.lines() {
            if line.is_empty() {
                continue;
            }

            match parse_line(line, &resolve_block) {
                Ok(Some(entry)) => {
                    trace!("Mount entry: {entry:?}");
                    entries.insert(entry);
                }
                Ok(None) => {}
                Err(reason) => warn!("Failed to parse mount table line '{line}': {reason}"),
            }
        }

        debug!("Mount table contains {} entries", entries.len());
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &MountEntry) -> bool {
        self.entries.contains(entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountEntry> {
        self.entries.iter()
    }

    /// Entries missing in `self` but present in `other` are added, and vice versa
    pub fn diff(&self, other: &MountTable) -> MountDiff {
        MountDiff {
            added: other.entries.difference(&self.entries).cloned().collect(),
            removed: self.entries.difference(&other.entries).cloned().collect(),
        }
    }
}

impl FromIterator<MountEntry> for MountTable {
    fn from_iter<T: IntoIterator<Item = MountEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn parse_line<F>(line: &str, resolve_block: &F) -> Result<Option<MountEntry>, String>
where
    F: Fn(&Path) -> io::Result<u64>,
{
    let mut fields = line.split_whitespace();

    let mut next_field = |name: &str| fields.next().ok_or_else(|| format!("Missing {name}"));

    next_field("mount id")?
        .parse::<u32>()
        .map_err(|_| "Invalid mount id".to_owned())?;
    next_field("parent id")?
        .parse::<u32>()
        .map_err(|_| "Invalid parent id".to_owned())?;

    let (major, minor) = next_field("device number")?
        .split_once(':')
        .and_then(|(major, minor)| Some((major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?)))
        .ok_or("Invalid device number".to_owned())?;

    let _root = next_field("root")?;
    let mount_point = unescape(next_field("mount point")?);

    if major != 0 {
        return Ok(Some(MountEntry::new(mount_point, makedev(major, minor))));
    }

    // Anonymous devices are virtual filesystems, except for btrfs, which reports
    // anonymous device numbers for its subvolumes
    let Some((_, tail)) = line.split_once(" - ") else {
        return Ok(None);
    };

    let mut tail = tail.split_whitespace();
    let (Some(fs_type), Some(source)) = (tail.next(), tail.next()) else {
        return Err("Missing filesystem type or mount source".into());
    };

    if fs_type != "btrfs" || !source.starts_with("/dev/") {
        return Ok(None);
    }

    match resolve_block(Path::new(source)) {
        Ok(dev) => Ok(Some(MountEntry::new(mount_point, dev))),
        Err(e) => Err(format!("Failed to stat {source}: {e}")),
    }
}
