//! Storage hierarchy addresses.
//!
//! A [`StorageAddress`] names one position in the disk → partition → mount →
//! directory → file hierarchy. Values are immutable and built per navigation;
//! moving somewhere else means building a new one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{EncodedSegment, encode};
use crate::config::{
    DISK_SEGMENT, FILES_SEGMENT, PARTITIONS_SEGMENT, ROOT_INTERNAL_PATH, VIEW_SEGMENT,
};

// ============================================================================
// MountId
// ============================================================================

/// Opaque identifier of a mounted partition.
///
/// Issued by the mounting backend (e.g. `341A`) and never interpreted here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountId(String);

impl MountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Internal Paths
// ============================================================================

/// Parent of a path inside a mount, or `None` at the root.
///
/// Relative paths (as typed into a catch-all, e.g. `sub/dir`) are treated as
/// rooted.
pub fn parent_path(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(match trimmed.rfind('/') {
        Some(0) | None => ROOT_INTERNAL_PATH.to_string(),
        Some(idx) => trimmed[..idx].to_string(),
    })
}

/// Append a child name to a directory path.
pub fn join_path(dir: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        format!("/{}", name)
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Last component of a path, for display.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

// ============================================================================
// StorageAddress
// ============================================================================

/// A position in the storage hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageAddress {
    /// Disk selection screen at `/`.
    Root,
    /// Disk list at `/disk`, optionally with a disk highlighted.
    ///
    /// The selection is not part of the address.
    Disk { selected: Option<EncodedSegment> },
    /// Partitions of one disk.
    Partitions { disk_path: EncodedSegment },
    /// Directory listing inside a mount.
    Directory {
        mount_id: MountId,
        internal_path: EncodedSegment,
    },
    /// One file inside a mount.
    FileView {
        mount_id: MountId,
        file_path: EncodedSegment,
    },
}

impl StorageAddress {
    /// Partition list for a raw disk path.
    pub fn partitions(disk_path: &str) -> Self {
        Self::Partitions {
            disk_path: encode(disk_path),
        }
    }

    /// Directory listing for a raw internal path.
    pub fn directory(mount_id: impl Into<MountId>, internal_path: &str) -> Self {
        Self::Directory {
            mount_id: mount_id.into(),
            internal_path: encode(internal_path),
        }
    }

    /// Root directory of a mount.
    pub fn mount_root(mount_id: impl Into<MountId>) -> Self {
        Self::directory(mount_id, ROOT_INTERNAL_PATH)
    }

    /// File view for a raw file path.
    pub fn file(mount_id: impl Into<MountId>, file_path: &str) -> Self {
        Self::FileView {
            mount_id: mount_id.into(),
            file_path: encode(file_path),
        }
    }

    /// Canonical address of this position.
    pub fn to_address(&self) -> String {
        match self {
            Self::Root => "/".to_string(),
            Self::Disk { .. } => format!("/{}", DISK_SEGMENT),
            Self::Partitions { disk_path } => format!("/{}/{}", PARTITIONS_SEGMENT, disk_path),
            Self::Directory {
                mount_id,
                internal_path,
            } => format!(
                "/{}/{}/{}",
                FILES_SEGMENT,
                encode(mount_id.as_str()),
                internal_path
            ),
            Self::FileView {
                mount_id,
                file_path,
            } => format!(
                "/{}/{}/{}",
                VIEW_SEGMENT,
                encode(mount_id.as_str()),
                file_path
            ),
        }
    }

    /// Mount this address lives in, if any.
    pub fn mount_id(&self) -> Option<&MountId> {
        match self {
            Self::Directory { mount_id, .. } | Self::FileView { mount_id, .. } => Some(mount_id),
            _ => None,
        }
    }

    /// Position one level up.
    ///
    /// A mount does not know which disk it came from, so the parent of a
    /// mount root is the disk list. Returns `None` on the disk list itself.
    pub fn parent(&self) -> Option<Self> {
        match self {
            Self::Root | Self::Disk { .. } => None,
            Self::Partitions { disk_path } => Some(Self::Disk {
                selected: Some(disk_path.clone()),
            }),
            Self::Directory {
                mount_id,
                internal_path,
            } => Some(match parent_path(&internal_path.decode()) {
                Some(parent) => Self::directory(mount_id.clone(), &parent),
                None => Self::Root,
            }),
            Self::FileView {
                mount_id,
                file_path,
            } => {
                let parent = parent_path(&file_path.decode())
                    .unwrap_or_else(|| ROOT_INTERNAL_PATH.to_string());
                Some(Self::directory(mount_id.clone(), &parent))
            }
        }
    }

    /// This address and its ancestors, outermost first.
    pub fn trail(&self) -> Vec<Self> {
        let mut trail = vec![self.clone()];
        while let Some(parent) = trail.last().and_then(Self::parent) {
            trail.push(parent);
        }
        trail.reverse();
        trail
    }

    /// Short label for breadcrumbs and titles.
    pub fn label(&self) -> String {
        match self {
            Self::Root | Self::Disk { .. } => "disks".to_string(),
            Self::Partitions { disk_path } => disk_path.decode(),
            Self::Directory {
                mount_id,
                internal_path,
            } => {
                let path = internal_path.decode();
                match base_name(&path) {
                    "" => mount_id.to_string(),
                    name => name.to_string(),
                }
            }
            Self::FileView { file_path, .. } => base_name(&file_path.decode()).to_string(),
        }
    }
}

impl fmt::Display for StorageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

// ============================================================================
// Tests
// ============================================================================
