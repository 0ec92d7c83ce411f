use crate::delta::editor::{Ancestor, DeltaSink, Editor};
use crate::delta::props::diff_properties;
use crate::delta::text::TextDelta;
use crate::error::{Error, Result};
use crate::path::Relpath;
use crate::tree::{
    DirEntry, Directory, File, NodeId, NodeKind, PropertyList, Version, missing_entry,
};
use log::trace;
use std::cmp::Ordering;
use std::io::{self, Read};

/// State shared by every level of one delta traversal.
pub(crate) struct Context<'a, E: Editor> {
    pub(crate) editor: &'a mut E,
    pub(crate) cancel: Option<Box<dyn FnMut() -> bool + 'a>>,
}

impl<E: Editor> Context<'_, E> {
    fn check_cancel(&mut self) -> Result<()> {
        match &mut self.cancel {
            Some(probe) => {
                if probe() {
                    Err(Error::Cancelled)
                } else {
                    Ok(())
                }
            }
            None => Ok(()),
        }
    }

    /// Emits the edits that turn `source` into `target` inside the open
    /// directory `dir`. `source_path` is the path of `source` relative to
    /// the top of the delta, empty when `source` is the top itself.
    pub(crate) fn delta_dirs(
        &mut self,
        dir: &mut E::Dir,
        source: &dyn Directory,
        source_path: &Relpath,
        target: &dyn Directory,
    ) -> Result<()> {
        diff_properties(
            Some(&source.properties()?),
            &target.properties()?,
            |name, value| self.editor.change_dir_prop(dir, name, value),
        )?;

        let source_entries = source.entries()?;
        let target_entries = target.entries()?;

        // Walk both sorted entry lists in lockstep; a name present on only
        // one side sorts before the other side's next name, so it is an
        // add or a delete. Past the end of a list everything compares
        // greater.
        let (mut si, mut ti) = (0, 0);
        while si < source_entries.len() || ti < target_entries.len() {
            self.check_cancel()?;
            let order = match (source_entries.get(si), target_entries.get(ti)) {
                (Some(s), Some(t)) => s.name.as_str().cmp(t.name.as_str()),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => unreachable!("loop condition"),
            };
            match order {
                Ordering::Equal => {
                    let source_entry = &source_entries[si];
                    let target_entry = &target_entries[ti];
                    self.delta_entry_props(dir, source, target, &source_entry.name)?;
                    // Equal identities mean identical subtrees; no descent.
                    if source_entry.id != target_entry.id {
                        self.replace(dir, source, source_path, target, target_entry)?;
                    }
                    si += 1;
                    ti += 1;
                }
                Ordering::Less => {
                    trace!("delete '{}'", source_entries[si].name);
                    self.editor.delete(dir, &source_entries[si].name)?;
                    si += 1;
                }
                Ordering::Greater => {
                    self.add(dir, target, &target_entries[ti].name)?;
                    ti += 1;
                }
            }
        }
        Ok(())
    }

    /// Compares the property lists both sides attach to the entry `name`.
    fn delta_entry_props(
        &mut self,
        dir: &mut E::Dir,
        source: &dyn Directory,
        target: &dyn Directory,
        name: &str,
    ) -> Result<()> {
        let source_props = source.entry_properties(name)?;
        let target_props = target.entry_properties(name)?;
        diff_properties(Some(&source_props), &target_props, |prop, value| {
            self.editor.change_entry_prop(dir, name, prop, value)
        })
    }

    /// Replaces `target_entry` in the open directory `dir`, picking the
    /// best ancestor available in `source` or describing the node from
    /// scratch.
    fn replace(
        &mut self,
        dir: &mut E::Dir,
        source: &dyn Directory,
        source_path: &Relpath,
        target: &dyn Directory,
        target_entry: &DirEntry,
    ) -> Result<()> {
        // Rank the source entries by identity distance, an approximation
        // of expected delta size. Ties keep the earliest entry so the
        // output is reproducible. Candidates outside this directory are
        // not considered.
        let source_entries = source.entries()?;
        let mut best: Option<(usize, u64)> = None;
        for (i, entry) in source_entries.iter().enumerate() {
            if let Some(distance) = target_entry.id.distance(&entry.id)
                && best.is_none_or(|(_, best_distance)| distance < best_distance)
            {
                best = Some((i, distance));
            }
        }

        let target_kind = target.kind_of(&target_entry.name)?;
        // A related node of the other kind is no use as an ancestor.
        let mut usable = None;
        if let Some((i, distance)) = best
            && source.kind_of(&source_entries[i].name)? == target_kind
        {
            usable = Some((i, distance));
        }
        match usable {
            Some((i, distance)) => {
                trace!(
                    "replace '{}' from '{}' (distance {distance})",
                    target_entry.name, source_entries[i].name
                );
                self.replace_related(
                    dir,
                    target,
                    &target_entry.name,
                    target_kind,
                    source,
                    source_path,
                    &source_entries[i].name,
                )
            }
            None => {
                trace!("replace '{}' from scratch", target_entry.name);
                self.replace_from_scratch(dir, target, &target_entry.name, target_kind)
            }
        }
    }

    /// Replaces using the entry `ancestor_name` of `ancestor_dir` as the
    /// starting point.
    #[allow(clippy::too_many_arguments)]
    fn replace_related(
        &mut self,
        dir: &mut E::Dir,
        target: &dyn Directory,
        target_name: &str,
        kind: NodeKind,
        ancestor_dir: &dyn Directory,
        ancestor_dir_path: &Relpath,
        ancestor_name: &str,
    ) -> Result<()> {
        let ancestor_path = ancestor_dir_path.join(&Relpath::from(ancestor_name));
        match kind {
            NodeKind::File => {
                let ancestor_file = ancestor_dir.open_file(ancestor_name)?;
                let target_file = target.open_file(target_name)?;
                let ancestor = Ancestor {
                    path: &ancestor_path,
                    version: ancestor_file.version(),
                };
                let mut file = self.editor.replace_file(dir, target_name, Some(ancestor))?;
                self.delta_files(&mut file, Some(&*ancestor_file), &*target_file)?;
                self.editor.close_file(file)
            }
            NodeKind::Directory => {
                let ancestor_subdir = ancestor_dir.open_directory(ancestor_name)?;
                let target_subdir = target.open_directory(target_name)?;
                let ancestor = Ancestor {
                    path: &ancestor_path,
                    version: ancestor_subdir.version(),
                };
                let mut subdir = self
                    .editor
                    .replace_directory(dir, target_name, Some(ancestor))?;
                self.delta_dirs(&mut subdir, &*ancestor_subdir, &ancestor_path, &*target_subdir)?;
                self.editor.close_directory(subdir)
            }
        }
    }

    /// Replaces the entry `name` with a node nothing in the source is
    /// related to.
    fn replace_from_scratch(
        &mut self,
        dir: &mut E::Dir,
        target: &dyn Directory,
        name: &str,
        kind: NodeKind,
    ) -> Result<()> {
        match kind {
            NodeKind::File => {
                let file = target.open_file(name)?;
                let mut token = self.editor.replace_file(dir, name, None)?;
                self.file_from_scratch(&mut token, &*file)?;
                self.editor.close_file(token)
            }
            NodeKind::Directory => {
                let subdir = target.open_directory(name)?;
                let mut token = self.editor.replace_directory(dir, name, None)?;
                self.dir_from_scratch(&mut token, &*subdir)?;
                self.editor.close_directory(token)
            }
        }
    }

    /// Adds the entry `name` of `target` to the open directory `dir`.
    /// New entries are always described from scratch; no ancestor search
    /// happens across the rest of the source tree.
    fn add(&mut self, dir: &mut E::Dir, target: &dyn Directory, name: &str) -> Result<()> {
        trace!("add '{name}'");
        match target.kind_of(name)? {
            NodeKind::File => {
                let file = target.open_file(name)?;
                let mut token = self.editor.add_file(dir, name)?;
                self.file_from_scratch(&mut token, &*file)?;
                self.editor.close_file(token)
            }
            NodeKind::Directory => {
                let subdir = target.open_directory(name)?;
                let mut token = self.editor.add_directory(dir, name)?;
                self.dir_from_scratch(&mut token, &*subdir)?;
                self.editor.close_directory(token)
            }
        }
    }

    /// Describes `target` into the open directory `dir` as if the source
    /// were an empty directory: every property and entry is an addition.
    fn dir_from_scratch(&mut self, dir: &mut E::Dir, target: &dyn Directory) -> Result<()> {
        self.delta_dirs(dir, &EmptyDirectory, &Relpath::new(), target)
    }

    /// Emits the property and content edits that turn `ancestor` into
    /// `target` on the open file. An absent ancestor reads as the empty
    /// file with no properties.
    fn delta_files(
        &mut self,
        file: &mut E::File,
        ancestor: Option<&dyn File>,
        target: &dyn File,
    ) -> Result<()> {
        let ancestor_props = match ancestor {
            Some(f) => Some(f.properties()?),
            None => None,
        };
        diff_properties(
            ancestor_props.as_ref(),
            &target.properties()?,
            |name, value| self.editor.change_file_prop(file, name, value),
        )?;

        let source: Box<dyn Read + '_> = match ancestor {
            Some(f) => f.contents()?,
            None => Box::new(io::empty()),
        };
        let mut delta = TextDelta::new(source, target.contents()?);
        let mut sink = self.editor.apply_text_delta(file)?;
        for window in &mut delta {
            sink.window(&window?)?;
            self.check_cancel()?;
        }
        sink.finish()
    }

    fn file_from_scratch(&mut self, file: &mut E::File, target: &dyn File) -> Result<()> {
        self.delta_files(file, None, target)
    }
}

/// The synthetic source the from-scratch cases diff against.
struct EmptyDirectory;

impl Directory for EmptyDirectory {
    fn id(&self) -> NodeId {
        NodeId::from(Vec::new())
    }

    fn version(&self) -> Version {
        0
    }

    fn properties(&self) -> Result<PropertyList> {
        Ok(PropertyList::new())
    }

    fn entries(&self) -> Result<Vec<DirEntry>> {
        Ok(Vec::new())
    }

    fn entry_properties(&self, name: &str) -> Result<PropertyList> {
        Err(missing_entry("entry_properties", name))
    }

    fn kind_of(&self, name: &str) -> Result<NodeKind> {
        Err(missing_entry("kind_of", name))
    }

    fn open_directory(&self, name: &str) -> Result<Box<dyn Directory + '_>> {
        Err(missing_entry("open_directory", name))
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn File + '_>> {
        Err(missing_entry("open_file", name))
    }
}
