//! In-memory [`MarkerFs`] with NTFS stream semantics and fault injection.
//!
//! Read-only files refuse marker deletion, exactly like an NTFS alternate data
//! stream on a file carrying `FILE_ATTRIBUTE_READONLY`. Individual paths can be
//! made unlistable, undeletable or unrestorable to exercise the failure paths
//! of the stripper without touching a real disk.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::pal::{DirChild, FileAttributes, MarkerFs, PathKind};

#[derive(Debug, Clone)]
enum Node {
    Dir {
        unlistable: bool,
    },
    File {
        content: Vec<u8>,
        attributes: u32,
        marker: bool,
        fail_remove: bool,
        fail_restore: bool,
    },
}

/// Snapshot of one in-memory file, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    pub content: Vec<u8>,
    pub attributes: FileAttributes,
    pub marker: bool,
}

/// Thread-safe in-memory filesystem tree.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory (and any missing ancestors).
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let mut nodes = self.nodes.lock();
        insert_ancestors(&mut nodes, path.as_ref());
        nodes.insert(path.as_ref().to_path_buf(), Node::Dir { unlistable: false });
        self
    }

    /// Add a regular file with archive attributes and the given marker state.
    pub fn add_file(&self, path: impl AsRef<Path>, content: &[u8], marker: bool) -> &Self {
        let mut nodes = self.nodes.lock();
        insert_ancestors(&mut nodes, path.as_ref());
        nodes.insert(
            path.as_ref().to_path_buf(),
            Node::File {
                content: content.to_vec(),
                attributes: FileAttributes::WIN_ARCHIVE,
                marker,
                fail_remove: false,
                fail_restore: false,
            },
        );
        self
    }

    /// Set or clear the read-only bit of an existing file.
    pub fn set_readonly(&self, path: impl AsRef<Path>, readonly: bool) -> &Self {
        self.with_file(path.as_ref(), |attributes, _, _, _| {
            if readonly {
                *attributes |= FileAttributes::WIN_READONLY;
            } else {
                *attributes &= !FileAttributes::WIN_READONLY;
            }
        });
        self
    }

    /// Make listing this directory fail with `PermissionDenied`.
    pub fn deny_listing(&self, path: impl AsRef<Path>) -> &Self {
        if let Some(Node::Dir { unlistable }) = self.nodes.lock().get_mut(path.as_ref()) {
            *unlistable = true;
        }
        self
    }

    /// Make marker removal on this file fail as if the stream were in use.
    pub fn fail_marker_removal(&self, path: impl AsRef<Path>) -> &Self {
        self.with_file(path.as_ref(), |_, _, fail_remove, _| *fail_remove = true);
        self
    }

    /// Make attribute restoration on this file fail.
    pub fn fail_restore(&self, path: impl AsRef<Path>) -> &Self {
        self.with_file(path.as_ref(), |_, _, _, fail_restore| *fail_restore = true);
        self
    }

    /// Current state of a file, or `None` if the path is not a file.
    #[must_use]
    pub fn file_state(&self, path: impl AsRef<Path>) -> Option<FileState> {
        match self.nodes.lock().get(path.as_ref()) {
            Some(Node::File {
                content,
                attributes,
                marker,
                ..
            }) => Some(FileState {
                content: content.clone(),
                attributes: decode(*attributes),
                marker: *marker,
            }),
            _ => None,
        }
    }

    /// Number of files that still carry a marker stream.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.nodes
            .lock()
            .values()
            .filter(|node| matches!(node, Node::File { marker: true, .. }))
            .count()
    }

    fn with_file<F>(&self, path: &Path, f: F)
    where
        F: FnOnce(&mut u32, &mut bool, &mut bool, &mut bool),
    {
        if let Some(Node::File {
            attributes,
            marker,
            fail_remove,
            fail_restore,
            ..
        }) = self.nodes.lock().get_mut(path)
        {
            f(attributes, marker, fail_remove, fail_restore);
        }
    }
}

fn insert_ancestors(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        nodes
            .entry(ancestor.to_path_buf())
            .or_insert(Node::Dir { unlistable: false });
    }
}

const fn decode(raw: u32) -> FileAttributes {
    FileAttributes::new(raw, raw & FileAttributes::WIN_READONLY != 0)
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    )
}

impl MarkerFs for MemoryFs {
    fn classify(&self, path: &Path) -> PathKind {
        match self.nodes.lock().get(path) {
            Some(Node::File { .. }) => PathKind::File,
            Some(Node::Dir { .. }) => PathKind::Directory,
            None => PathKind::Missing,
        }
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirChild>> {
        let nodes = self.nodes.lock();
        match nodes.get(path) {
            Some(Node::Dir { unlistable: true }) => {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "access to the path is denied",
                ));
            }
            Some(Node::Dir { unlistable: false }) => {}
            _ => return Err(not_found(path)),
        }
        Ok(nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .map(|(child, node)| DirChild {
                path: child.clone(),
                is_dir: matches!(node, Node::Dir { .. }),
            })
            .collect())
    }

    fn has_marker(&self, file: &Path) -> bool {
        matches!(
            self.nodes.lock().get(file),
            Some(Node::File { marker: true, .. })
        )
    }

    fn remove_marker(&self, file: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        let Some(Node::File {
            attributes,
            marker,
            fail_remove,
            ..
        }) = nodes.get_mut(file)
        else {
            return Err(not_found(file));
        };
        if !*marker {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "the marker stream does not exist",
            ));
        }
        if *attributes & FileAttributes::WIN_READONLY != 0 {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "access to the path is denied",
            ));
        }
        if *fail_remove {
            return Err(io::Error::other(
                "the process cannot access the file because it is being used by another process",
            ));
        }
        *marker = false;
        Ok(())
    }

    fn attributes(&self, file: &Path) -> io::Result<FileAttributes> {
        match self.nodes.lock().get(file) {
            Some(Node::File { attributes, .. }) => Ok(decode(*attributes)),
            _ => Err(not_found(file)),
        }
    }

    fn clear_readonly(&self, file: &Path) -> io::Result<()> {
        match self.nodes.lock().get_mut(file) {
            Some(Node::File { attributes, .. }) => {
                *attributes &= !FileAttributes::WIN_READONLY;
                Ok(())
            }
            _ => Err(not_found(file)),
        }
    }

    fn restore_attributes(&self, file: &Path, original: &FileAttributes) -> io::Result<()> {
        match self.nodes.lock().get_mut(file) {
            Some(Node::File {
                fail_restore: true, ..
            }) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "attributes cannot be written",
            )),
            Some(Node::File { attributes, .. }) => {
                *attributes = original.raw;
                Ok(())
            }
            _ => Err(not_found(file)),
        }
    }
}
