//! Filesystem abstraction for marker-stream probing, removal and attribute handling.

#![allow(missing_docs)]

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reserved name of the untrusted-origin marker stream.
pub const MARKER_STREAM: &str = "Zone.Identifier";

/// Whether `path` is itself a marker name (`<file>:Zone.Identifier`).
///
/// Only possible on filesystems that allow `:` in names, where it is the
/// sibling left behind for a file rather than a file in its own right.
#[must_use]
pub fn is_marker_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(MARKER_STREAM))
        .is_some_and(|base| base.len() > 1 && base.ends_with(':'))
}

/// Build the composite marker identifier `<file>:Zone.Identifier`.
#[must_use]
pub fn marker_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(":");
    name.push(MARKER_STREAM);
    PathBuf::from(name)
}

/// What a path points at when probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Directory,
    Missing,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Snapshot of a file's attribute bitset.
///
/// `raw` is the platform-native value (`FILE_ATTRIBUTE_*` flags on Windows,
/// permission mode bits on Unix). `readonly` is the decoded read-only flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub raw: u32,
    pub readonly: bool,
}

impl FileAttributes {
    /// Windows `FILE_ATTRIBUTE_READONLY`.
    pub const WIN_READONLY: u32 = 0x1;
    /// Windows `FILE_ATTRIBUTE_ARCHIVE`.
    pub const WIN_ARCHIVE: u32 = 0x20;

    #[must_use]
    pub const fn new(raw: u32, readonly: bool) -> Self {
        Self { raw, readonly }
    }
}

impl fmt::Display for FileAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.readonly {
            write!(f, "{:#x} (read-only)", self.raw)
        } else {
            write!(f, "{:#x}", self.raw)
        }
    }
}

/// Filesystem operations the stripper needs.
///
/// Implementations must only ever toggle the read-only bit in
/// [`MarkerFs::clear_readonly`] and must restore the full recorded bitset in
/// [`MarkerFs::restore_attributes`].
pub trait MarkerFs: Send + Sync {
    fn classify(&self, path: &Path) -> PathKind;
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirChild>>;
    fn has_marker(&self, file: &Path) -> bool;
    fn remove_marker(&self, file: &Path) -> io::Result<()>;
    fn attributes(&self, file: &Path) -> io::Result<FileAttributes>;
    fn clear_readonly(&self, file: &Path) -> io::Result<()>;
    fn restore_attributes(&self, file: &Path, original: &FileAttributes) -> io::Result<()>;
}

/// The real filesystem, via `std::fs` on the composite marker name.
///
/// On NTFS the composite name addresses the alternate data stream. On Unix it
/// addresses the literal `file:Zone.Identifier` sibling that Windows tooling
/// leaves behind when copying downloads onto a Linux filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFs;

impl NativeFs {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MarkerFs for NativeFs {
    fn classify(&self, path: &Path) -> PathKind {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => PathKind::File,
            Ok(meta) if meta.is_dir() => PathKind::Directory,
            _ => PathKind::Missing,
        }
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirChild>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let child_path = entry.path();
            if is_marker_name(&child_path) {
                continue;
            }
            let file_type = entry.file_type()?;
            // Symlinks are classified by their target, like a plain stat would.
            let is_dir = if file_type.is_symlink() {
                fs::metadata(&child_path).is_ok_and(|m| m.is_dir())
            } else {
                file_type.is_dir()
            };
            children.push(DirChild {
                path: child_path,
                is_dir,
            });
        }
        children.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(children)
    }

    fn has_marker(&self, file: &Path) -> bool {
        fs::symlink_metadata(marker_path(file)).is_ok()
    }

    fn remove_marker(&self, file: &Path) -> io::Result<()> {
        fs::remove_file(marker_path(file))
    }

    fn attributes(&self, file: &Path) -> io::Result<FileAttributes> {
        let meta = fs::metadata(file)?;
        Ok(native_attributes(&meta))
    }

    fn clear_readonly(&self, file: &Path) -> io::Result<()> {
        let meta = fs::metadata(file)?;
        fs::set_permissions(file, writable_permissions(meta.permissions()))
    }

    fn restore_attributes(&self, file: &Path, original: &FileAttributes) -> io::Result<()> {
        let meta = fs::metadata(file)?;
        fs::set_permissions(file, restored_permissions(meta.permissions(), original))
    }
}

#[cfg(unix)]
fn native_attributes(meta: &fs::Metadata) -> FileAttributes {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode() & 0o7777;
    FileAttributes::new(mode, meta.permissions().readonly())
}

#[cfg(windows)]
fn native_attributes(meta: &fs::Metadata) -> FileAttributes {
    use std::os::windows::fs::MetadataExt;
    let raw = meta.file_attributes();
    FileAttributes::new(raw, raw & FileAttributes::WIN_READONLY != 0)
}

#[cfg(not(any(unix, windows)))]
fn native_attributes(meta: &fs::Metadata) -> FileAttributes {
    let readonly = meta.permissions().readonly();
    FileAttributes::new(u32::from(readonly), readonly)
}

/// Add only the owner write bit; group/other bits stay as they were.
#[cfg(unix)]
fn writable_permissions(perms: fs::Permissions) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(perms.mode() | 0o200)
}

/// `Permissions` on Windows carries the full attribute bitset, so toggling
/// read-only leaves every other flag intact.
#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn writable_permissions(mut perms: fs::Permissions) -> fs::Permissions {
    perms.set_readonly(false);
    perms
}

#[cfg(unix)]
fn restored_permissions(_current: fs::Permissions, original: &FileAttributes) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(original.raw)
}

#[cfg(not(unix))]
fn restored_permissions(mut current: fs::Permissions, original: &FileAttributes) -> fs::Permissions {
    current.set_readonly(original.readonly);
    current
}
