//! Applying the emitted edit stream to a copy of the source tree must
//! reproduce the target tree exactly.

use libtreedelta::memory::{MemoryDirectory, MemoryFile, MemoryNode};
use libtreedelta::prelude::*;
use libtreedelta::{
    Ancestor, ApplyDelta, DiffOptions, MAX_WINDOW_SIZE, NodeKind, PropertyList, Relpath, Result,
    diff,
};
use std::cell::RefCell;
use std::io::{Cursor, Read, Write};
use std::rc::Rc;

/// A growable buffer the editor and its delta sinks share.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct FileToken {
    path: Relpath,
    base: Vec<u8>,
    out: SharedBuf,
}

/// A faithful mutator: starts from a copy of the source tree and performs
/// every edit the driver sends, fetching replace ancestors from the
/// pristine source by their advertised relpath.
struct ApplyEditor {
    source: MemoryDirectory,
    result: MemoryDirectory,
}

impl ApplyEditor {
    fn new(source: &MemoryDirectory) -> Self {
        Self {
            source: source.clone(),
            result: source.clone(),
        }
    }

    fn dir_mut(&mut self, path: &Relpath) -> &mut MemoryDirectory {
        self.result.directory_mut(path).expect("open directory")
    }

    fn place(&mut self, parent: &Relpath, name: &str, node: impl Into<MemoryNode>) -> Relpath {
        let dir = self.dir_mut(parent);
        // Replacing the node keeps whatever entry properties the entry
        // already carries; entry property edits travel separately.
        let props = dir
            .entry_properties_mut(name)
            .map(|p| p.clone())
            .unwrap_or_default();
        dir.insert_with_properties(name, props, node);
        parent.join(&Relpath::from(name))
    }
}

impl Editor for ApplyEditor {
    type Dir = Relpath;
    type File = FileToken;
    type Sink = ApplyDelta<Cursor<Vec<u8>>, SharedBuf>;

    fn replace_root(&mut self, _ancestor: Option<Ancestor<'_>>) -> Result<Relpath> {
        Ok(Relpath::new())
    }

    fn replace_directory(
        &mut self,
        parent: &mut Relpath,
        name: &str,
        ancestor: Option<Ancestor<'_>>,
    ) -> Result<Relpath> {
        let node = match ancestor {
            Some(a) => self.source.directory(a.path).expect("ancestor dir").clone(),
            None => MemoryDirectory::new([0], 0),
        };
        let parent = parent.clone();
        Ok(self.place(&parent, name, node))
    }

    fn replace_file(
        &mut self,
        parent: &mut Relpath,
        name: &str,
        ancestor: Option<Ancestor<'_>>,
    ) -> Result<FileToken> {
        let node = match ancestor {
            Some(a) => self.source.file(a.path).expect("ancestor file").clone(),
            None => MemoryFile::new([0], 0, ""),
        };
        let base = node.content().to_vec();
        let parent = parent.clone();
        let path = self.place(&parent, name, node);
        Ok(FileToken {
            path,
            base,
            out: SharedBuf::default(),
        })
    }

    fn add_directory(&mut self, parent: &mut Relpath, name: &str) -> Result<Relpath> {
        let parent = parent.clone();
        Ok(self.place(&parent, name, MemoryDirectory::new([0], 0)))
    }

    fn add_file(&mut self, parent: &mut Relpath, name: &str) -> Result<FileToken> {
        let parent = parent.clone();
        let path = self.place(&parent, name, MemoryFile::new([0], 0, ""));
        Ok(FileToken {
            path,
            base: Vec::new(),
            out: SharedBuf::default(),
        })
    }

    fn delete(&mut self, parent: &mut Relpath, name: &str) -> Result<()> {
        let parent = parent.clone();
        self.dir_mut(&parent).remove(name);
        Ok(())
    }

    fn change_dir_prop(
        &mut self,
        dir: &mut Relpath,
        name: &str,
        value: Option<&[u8]>,
    ) -> Result<()> {
        let dir = dir.clone();
        let props = self.dir_mut(&dir).properties_mut();
        match value {
            Some(v) => props.insert(name, v),
            None => props.remove(name),
        };
        Ok(())
    }

    fn change_entry_prop(
        &mut self,
        dir: &mut Relpath,
        entry: &str,
        name: &str,
        value: Option<&[u8]>,
    ) -> Result<()> {
        let dir = dir.clone();
        let props = self
            .dir_mut(&dir)
            .entry_properties_mut(entry)
            .expect("entry exists");
        match value {
            Some(v) => props.insert(name, v),
            None => props.remove(name),
        };
        Ok(())
    }

    fn change_file_prop(
        &mut self,
        file: &mut FileToken,
        name: &str,
        value: Option<&[u8]>,
    ) -> Result<()> {
        let props = self
            .result
            .file_mut(&file.path)
            .expect("open file")
            .properties_mut();
        match value {
            Some(v) => props.insert(name, v),
            None => props.remove(name),
        };
        Ok(())
    }

    fn apply_text_delta(&mut self, file: &mut FileToken) -> Result<Self::Sink> {
        Ok(ApplyDelta::new(
            Cursor::new(file.base.clone()),
            file.out.clone(),
        ))
    }

    fn close_directory(&mut self, _dir: Relpath) -> Result<()> {
        Ok(())
    }

    fn close_file(&mut self, file: FileToken) -> Result<()> {
        let content = file.out.0.borrow().clone();
        self.result
            .file_mut(&file.path)
            .expect("open file")
            .set_content(content);
        Ok(())
    }
}

/// Structural equality: names, kinds, properties, entry properties and
/// file contents. Node identities and versions are bookkeeping of the
/// stores and deliberately ignored.
fn assert_same_shape(a: &dyn Directory, b: &dyn Directory, at: &str) {
    assert_eq!(
        a.properties().unwrap(),
        b.properties().unwrap(),
        "dir props at '{at}'"
    );
    let a_entries = a.entries().unwrap();
    let b_entries = b.entries().unwrap();
    let a_names: Vec<_> = a_entries.iter().map(|e| e.name.as_str()).collect();
    let b_names: Vec<_> = b_entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(a_names, b_names, "entries at '{at}'");
    for entry in &a_entries {
        let name = entry.name.as_str();
        let here = if at.is_empty() {
            name.to_owned()
        } else {
            format!("{at}/{name}")
        };
        assert_eq!(
            a.entry_properties(name).unwrap(),
            b.entry_properties(name).unwrap(),
            "entry props at '{here}'"
        );
        let kind = a.kind_of(name).unwrap();
        assert_eq!(kind, b.kind_of(name).unwrap(), "kind at '{here}'");
        match kind {
            NodeKind::Directory => {
                assert_same_shape(
                    &*a.open_directory(name).unwrap(),
                    &*b.open_directory(name).unwrap(),
                    &here,
                );
            }
            NodeKind::File => {
                let read = |d: &dyn Directory| {
                    let f = d.open_file(name).unwrap();
                    let mut buf = Vec::new();
                    f.contents().unwrap().read_to_end(&mut buf).unwrap();
                    (buf, f.properties().unwrap())
                };
                assert_eq!(read(a), read(b), "file at '{here}'");
            }
        }
    }
}

fn roundtrip(source: &MemoryDirectory, target: &MemoryDirectory) {
    let mut editor = ApplyEditor::new(source);
    diff(source, target, &mut editor, DiffOptions::new()).unwrap();
    assert_same_shape(&editor.result, target, "");
}

#[test]
fn identical_trees_stay_identical() {
    let mut source = MemoryDirectory::new([1], 1);
    source.insert("a", MemoryFile::new([2], 1, "alpha"));
    roundtrip(&source, &source.clone());
}

#[test]
fn mixed_edits_reproduce_the_target() {
    let mut source_sub = MemoryDirectory::new([20], 3);
    source_sub.insert("inner", MemoryFile::new([21], 3, "inner v1"));
    let mut source = MemoryDirectory::new([1], 3).with_property("r", "1");
    source.insert_with_properties(
        "a",
        [("ep", "1")].into_iter().collect::<PropertyList>(),
        MemoryFile::new([10], 3, "alpha\n").with_property("k", "v"),
    );
    source.insert("b", source_sub);
    source.insert("c", MemoryFile::new([30], 3, "gone"));
    source.insert("d", MemoryFile::new([40], 3, "old content"));

    let mut target_sub = MemoryDirectory::new([20, 1], 4);
    target_sub.insert("inner", MemoryFile::new([21, 1], 4, "inner v2 with more"));
    target_sub.insert("fresh", MemoryFile::new([90], 4, "fresh"));
    let mut target_deep = MemoryDirectory::new([91], 4);
    target_deep.insert("leaf", MemoryFile::new([92], 4, "leaf bytes"));
    let mut target = MemoryDirectory::new([1, 1], 4)
        .with_property("r", "2")
        .with_property("n", "new");
    target.insert_with_properties(
        "a",
        [("ep", "2")].into_iter().collect::<PropertyList>(),
        MemoryFile::new([10], 3, "alpha\n").with_property("k", "v"),
    );
    target.insert("b", target_sub);
    target.insert("d", MemoryFile::new([5, 1], 4, "entirely new stuff"));
    target.insert("e", target_deep);

    roundtrip(&source, &target);
}

#[test]
fn large_files_cross_window_boundaries() {
    let mut base = Vec::with_capacity(MAX_WINDOW_SIZE * 2 + 123);
    for i in 0..MAX_WINDOW_SIZE * 2 + 123 {
        base.push((i % 251) as u8);
    }
    let mut changed = base.clone();
    changed[10] = 0xFF;
    changed[MAX_WINDOW_SIZE + 999] = 0xFE;
    changed.truncate(MAX_WINDOW_SIZE * 2);
    changed.extend_from_slice(b"and a new tail");

    let mut source = MemoryDirectory::new([1], 1);
    source.insert("big", MemoryFile::new([3, 3], 1, base));
    let mut target = MemoryDirectory::new([1, 1], 2);
    target.insert("big", MemoryFile::new([3, 3, 1], 2, changed));

    roundtrip(&source, &target);
}

#[test]
fn empty_files_and_emptied_files() {
    let mut source = MemoryDirectory::new([1], 1);
    source.insert("full", MemoryFile::new([2], 1, "bytes"));
    let mut target = MemoryDirectory::new([1, 1], 2);
    target.insert("full", MemoryFile::new([2, 1], 2, ""));
    target.insert("empty", MemoryFile::new([4], 2, ""));

    roundtrip(&source, &target);
}

#[test]
fn unrelated_replace_rebuilds_directories() {
    let mut source_sub = MemoryDirectory::new([60], 1);
    source_sub.insert("old", MemoryFile::new([61], 1, "old"));
    let mut source = MemoryDirectory::new([1], 1);
    source.insert("dir", source_sub);

    let mut target_sub = MemoryDirectory::new([70], 2).with_property("fresh", "yes");
    target_sub.insert("new", MemoryFile::new([71], 2, "new"));
    let mut target = MemoryDirectory::new([1, 1], 2);
    target.insert("dir", target_sub);

    roundtrip(&source, &target);
}
