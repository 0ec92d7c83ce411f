//! Tree module: the entity model the delta engine reads from.
//!
//! A versioned tree is presented to the engine through the [`Directory`]
//! and [`File`] capability traits. The engine only ever reads: it fetches
//! sorted entry lists, property lists, node identities and file contents,
//! holds each node for the duration of one edit operation, and releases it
//! when the corresponding part of the edit closes. The [`memory`] module
//! supplies a ready-made in-memory store.

mod id;
pub mod memory;
mod props;

pub use self::{id::*, props::*};
use crate::error::{Error, Result};
use crate::path::Relpath;
use std::fmt::{self, Display, Formatter};
use std::io::{self, Read};

/// The two kinds of versioned node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    /// A node holding a sorted list of named entries.
    Directory,
    /// A node holding a byte stream.
    File,
}

impl Display for NodeKind {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Directory => "directory",
            NodeKind::File => "file",
        })
    }
}

/// One row of a directory's entry list.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DirEntry {
    /// The entry's name, unique within its directory.
    pub name: String,
    /// The identity of the node the entry points at.
    pub id: NodeId,
}

impl DirEntry {
    /// Creates an entry.
    #[inline]
    pub fn new(name: impl Into<String>, id: impl Into<NodeId>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A read-only handle to a versioned directory.
///
/// Entry lists are sorted by byte-wise name comparison and unique by name;
/// the delta engine's lockstep walk depends on every implementation using
/// that same total order.
pub trait Directory {
    /// The identity of this directory.
    fn id(&self) -> NodeId;

    /// The version this directory was read at.
    fn version(&self) -> Version;

    /// The directory's own property list.
    fn properties(&self) -> Result<PropertyList>;

    /// The sorted entry list.
    fn entries(&self) -> Result<Vec<DirEntry>>;

    /// The property list attached to the named entry (not to the node the
    /// entry points at).
    fn entry_properties(&self, name: &str) -> Result<PropertyList>;

    /// The kind of node the named entry points at.
    fn kind_of(&self, name: &str) -> Result<NodeKind>;

    /// Opens the named entry as a directory.
    fn open_directory(&self, name: &str) -> Result<Box<dyn Directory + '_>>;

    /// Opens the named entry as a file.
    fn open_file(&self, name: &str) -> Result<Box<dyn File + '_>>;
}

/// A read-only handle to a versioned file.
pub trait File {
    /// The identity of this file.
    fn id(&self) -> NodeId;

    /// The version this file was read at.
    fn version(&self) -> Version;

    /// The file's property list.
    fn properties(&self) -> Result<PropertyList>;

    /// The file's contents as a single forward pass. The stream is
    /// restarted by asking for the contents again.
    fn contents(&self) -> Result<Box<dyn Read + '_>>;
}

macro_rules! delegate_directory {
    () => {
        #[inline]
        fn id(&self) -> NodeId {
            (**self).id()
        }

        #[inline]
        fn version(&self) -> Version {
            (**self).version()
        }

        #[inline]
        fn properties(&self) -> Result<PropertyList> {
            (**self).properties()
        }

        #[inline]
        fn entries(&self) -> Result<Vec<DirEntry>> {
            (**self).entries()
        }

        #[inline]
        fn entry_properties(&self, name: &str) -> Result<PropertyList> {
            (**self).entry_properties(name)
        }

        #[inline]
        fn kind_of(&self, name: &str) -> Result<NodeKind> {
            (**self).kind_of(name)
        }

        #[inline]
        fn open_directory(&self, name: &str) -> Result<Box<dyn Directory + '_>> {
            (**self).open_directory(name)
        }

        #[inline]
        fn open_file(&self, name: &str) -> Result<Box<dyn File + '_>> {
            (**self).open_file(name)
        }
    };
}

impl<D: Directory + ?Sized> Directory for &D {
    delegate_directory!();
}

impl<D: Directory + ?Sized> Directory for Box<D> {
    delegate_directory!();
}

macro_rules! delegate_file {
    () => {
        #[inline]
        fn id(&self) -> NodeId {
            (**self).id()
        }

        #[inline]
        fn version(&self) -> Version {
            (**self).version()
        }

        #[inline]
        fn properties(&self) -> Result<PropertyList> {
            (**self).properties()
        }

        #[inline]
        fn contents(&self) -> Result<Box<dyn Read + '_>> {
            (**self).contents()
        }
    };
}

impl<F: File + ?Sized> File for &F {
    delegate_file!();
}

impl<F: File + ?Sized> File for Box<F> {
    delegate_file!();
}

/// Derived lookups available on every [`Directory`].
pub trait DirectoryExt: Directory {
    /// Resolves the identity of the node at `relpath` below this
    /// directory. The empty relpath resolves to the directory itself.
    ///
    /// ## Examples
    /// ```
    /// use libtreedelta::memory::{MemoryDirectory, MemoryFile};
    /// use libtreedelta::{prelude::*, NodeId, Relpath};
    ///
    /// let mut sub = MemoryDirectory::new([2], 1);
    /// sub.insert("file", MemoryFile::new([3], 1, "bytes"));
    /// let mut root = MemoryDirectory::new([1], 1);
    /// root.insert("sub", sub);
    ///
    /// let id = root.node_id(&Relpath::from("sub/file")).unwrap();
    /// assert_eq!(NodeId::from([3]), id);
    /// ```
    fn node_id(&self, relpath: &Relpath) -> Result<NodeId> {
        match relpath.split_first() {
            None => Ok(self.id()),
            Some((name, rest)) if rest.is_empty() => self
                .entries()?
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.id.clone())
                .ok_or_else(|| missing_entry("node_id", name)),
            Some((name, rest)) => self.open_directory(name)?.node_id(&rest),
        }
    }
}

impl<D: Directory + ?Sized> DirectoryExt for D {}

pub(crate) fn missing_entry(operation: &'static str, name: &str) -> Error {
    Error::io(
        operation,
        io::Error::new(io::ErrorKind::NotFound, format!("no entry named '{name}'")),
    )
}
