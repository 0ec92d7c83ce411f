//! An in-memory entity store.
//!
//! [`MemoryDirectory`] and [`MemoryFile`] build versioned trees directly in
//! memory. They are the reference [`Directory`]/[`File`] implementation and
//! the store every test in this crate diffs against.
//!
//! ## Examples
//! ```
//! use libtreedelta::memory::{MemoryDirectory, MemoryFile};
//! use libtreedelta::prelude::*;
//!
//! let mut root = MemoryDirectory::new([1], 4);
//! root.insert("greeting", MemoryFile::new([2], 4, "hello\n"));
//!
//! let entries = root.entries().unwrap();
//! assert_eq!(1, entries.len());
//! assert_eq!("greeting", entries[0].name);
//! ```

use crate::error::Result;
use crate::path::Relpath;
use crate::tree::{
    DirEntry, Directory, File, NodeId, NodeKind, PropertyList, Version, missing_entry,
};
use std::collections::BTreeMap;
use std::io::{self, Read};

/// A versioned file held in memory.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MemoryFile {
    id: NodeId,
    version: Version,
    properties: PropertyList,
    content: Vec<u8>,
}

impl MemoryFile {
    /// Creates a file node with the given identity, version and contents.
    #[inline]
    pub fn new(id: impl Into<NodeId>, version: Version, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            version,
            properties: PropertyList::new(),
            content: content.into(),
        }
    }

    /// Adds a property, builder style.
    #[inline]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// The raw contents.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replaces the contents.
    #[inline]
    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    /// Mutable access to the property list.
    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyList {
        &mut self.properties
    }
}

impl File for MemoryFile {
    #[inline]
    fn id(&self) -> NodeId {
        self.id.clone()
    }

    #[inline]
    fn version(&self) -> Version {
        self.version
    }

    #[inline]
    fn properties(&self) -> Result<PropertyList> {
        Ok(self.properties.clone())
    }

    #[inline]
    fn contents(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.content.as_slice()))
    }
}

/// A directory node or a file node, as stored inside a parent directory.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum MemoryNode {
    /// A subdirectory.
    Directory(MemoryDirectory),
    /// A file.
    File(MemoryFile),
}

impl MemoryNode {
    fn kind(&self) -> NodeKind {
        match self {
            MemoryNode::Directory(_) => NodeKind::Directory,
            MemoryNode::File(_) => NodeKind::File,
        }
    }

    fn id(&self) -> NodeId {
        match self {
            MemoryNode::Directory(d) => d.id.clone(),
            MemoryNode::File(f) => f.id.clone(),
        }
    }
}

impl From<MemoryDirectory> for MemoryNode {
    #[inline]
    fn from(value: MemoryDirectory) -> Self {
        Self::Directory(value)
    }
}

impl From<MemoryFile> for MemoryNode {
    #[inline]
    fn from(value: MemoryFile) -> Self {
        Self::File(value)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct MemoryEntry {
    properties: PropertyList,
    node: MemoryNode,
}

/// A versioned directory held in memory.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MemoryDirectory {
    id: NodeId,
    version: Version,
    properties: PropertyList,
    entries: BTreeMap<String, MemoryEntry>,
}

impl MemoryDirectory {
    /// Creates an empty directory node with the given identity and
    /// version.
    #[inline]
    pub fn new(id: impl Into<NodeId>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            properties: PropertyList::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Adds a property, builder style.
    #[inline]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// Inserts (or replaces) an entry with an empty entry property list.
    #[inline]
    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<MemoryNode>) -> &mut Self {
        self.insert_with_properties(name, PropertyList::new(), node)
    }

    /// Inserts (or replaces) an entry together with its entry property
    /// list.
    pub fn insert_with_properties(
        &mut self,
        name: impl Into<String>,
        properties: PropertyList,
        node: impl Into<MemoryNode>,
    ) -> &mut Self {
        self.entries.insert(
            name.into(),
            MemoryEntry {
                properties,
                node: node.into(),
            },
        );
        self
    }

    /// Removes an entry by name.
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<MemoryNode> {
        self.entries.remove(name).map(|e| e.node)
    }

    /// Mutable access to this directory's own property list.
    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyList {
        &mut self.properties
    }

    /// Mutable access to the property list attached to entry `name`.
    #[inline]
    pub fn entry_properties_mut(&mut self, name: &str) -> Option<&mut PropertyList> {
        self.entries.get_mut(name).map(|e| &mut e.properties)
    }

    /// Borrows the directory at `relpath` below this one. The empty
    /// relpath is this directory itself.
    pub fn directory(&self, relpath: &Relpath) -> Option<&MemoryDirectory> {
        match relpath.split_first() {
            None => Some(self),
            Some((name, rest)) => match &self.entries.get(name)?.node {
                MemoryNode::Directory(d) => d.directory(&rest),
                MemoryNode::File(_) => None,
            },
        }
    }

    /// Mutably borrows the directory at `relpath` below this one.
    pub fn directory_mut(&mut self, relpath: &Relpath) -> Option<&mut MemoryDirectory> {
        match relpath.split_first() {
            None => Some(self),
            Some((name, rest)) => match &mut self.entries.get_mut(name)?.node {
                MemoryNode::Directory(d) => d.directory_mut(&rest),
                MemoryNode::File(_) => None,
            },
        }
    }

    /// Borrows the file at `relpath` below this directory.
    pub fn file(&self, relpath: &Relpath) -> Option<&MemoryFile> {
        match self.directory(&relpath.dirname())?.entries.get(relpath.basename())? {
            MemoryEntry {
                node: MemoryNode::File(f),
                ..
            } => Some(f),
            _ => None,
        }
    }

    /// Mutably borrows the file at `relpath` below this directory.
    pub fn file_mut(&mut self, relpath: &Relpath) -> Option<&mut MemoryFile> {
        match self
            .directory_mut(&relpath.dirname())?
            .entries
            .get_mut(relpath.basename())?
        {
            MemoryEntry {
                node: MemoryNode::File(f),
                ..
            } => Some(f),
            _ => None,
        }
    }

    fn entry(&self, operation: &'static str, name: &str) -> Result<&MemoryEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| missing_entry(operation, name))
    }
}

impl Directory for MemoryDirectory {
    #[inline]
    fn id(&self) -> NodeId {
        self.id.clone()
    }

    #[inline]
    fn version(&self) -> Version {
        self.version
    }

    #[inline]
    fn properties(&self) -> Result<PropertyList> {
        Ok(self.properties.clone())
    }

    fn entries(&self) -> Result<Vec<DirEntry>> {
        Ok(self
            .entries
            .iter()
            .map(|(name, entry)| DirEntry::new(name.clone(), entry.node.id()))
            .collect())
    }

    #[inline]
    fn entry_properties(&self, name: &str) -> Result<PropertyList> {
        Ok(self.entry("entry_properties", name)?.properties.clone())
    }

    #[inline]
    fn kind_of(&self, name: &str) -> Result<NodeKind> {
        Ok(self.entry("kind_of", name)?.node.kind())
    }

    fn open_directory(&self, name: &str) -> Result<Box<dyn Directory + '_>> {
        match &self.entry("open_directory", name)?.node {
            MemoryNode::Directory(d) => Ok(Box::new(d)),
            MemoryNode::File(_) => Err(crate::Error::io(
                "open_directory",
                io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("entry '{name}' is a file"),
                ),
            )),
        }
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn File + '_>> {
        match &self.entry("open_file", name)?.node {
            MemoryNode::File(f) => Ok(Box::new(f)),
            MemoryNode::Directory(_) => Err(crate::Error::io(
                "open_file",
                io::Error::new(
                    io::ErrorKind::IsADirectory,
                    format!("entry '{name}' is a directory"),
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_sorted() {
        let mut dir = MemoryDirectory::new([1], 1);
        dir.insert("zeta", MemoryFile::new([2], 1, ""))
            .insert("alpha", MemoryFile::new([3], 1, ""))
            .insert("mid", MemoryDirectory::new([4], 1));
        let names: Vec<_> = dir.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(vec!["alpha", "mid", "zeta"], names);
    }

    #[test]
    fn open_checks_kind() {
        let mut dir = MemoryDirectory::new([1], 1);
        dir.insert("f", MemoryFile::new([2], 1, "x"));
        assert!(dir.open_file("f").is_ok());
        assert!(dir.open_directory("f").is_err());
        assert!(dir.open_file("missing").is_err());
        assert_eq!(NodeKind::File, dir.kind_of("f").unwrap());
    }

    #[test]
    fn contents_restart() {
        let file = MemoryFile::new([1], 1, "abc");
        let mut buf = String::new();
        file.contents().unwrap().read_to_string(&mut buf).unwrap();
        file.contents().unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!("abcabc", buf);
    }
}
