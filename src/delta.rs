//! Delta module: comparing trees and driving editors.
//!
//! The entry point is [`diff`]: given a source directory, a target
//! directory and an [`Editor`], it pushes the edit operations that turn
//! the source into the target through the editor as one strictly nested
//! call sequence. The pieces it is built from are public as well: the
//! property differ ([`diff_properties`]), the text-delta window stream
//! ([`TextDelta`]) and its applying counterpart ([`ApplyDelta`]).

mod editor;
mod props;
mod text;
mod walk;

pub use self::{editor::*, props::*, text::*};
use self::walk::Context;
use crate::error::Result;
use crate::path::Relpath;
use crate::tree::Directory;
use log::debug;
use std::fmt::{self, Debug, Formatter};

/// Options for one [`diff`] traversal.
///
/// ## Examples
/// ```
/// use libtreedelta::DiffOptions;
///
/// let deadline = std::time::Instant::now() + std::time::Duration::from_secs(30);
/// let options = DiffOptions::new().cancel_when(move || std::time::Instant::now() > deadline);
/// # let _ = options;
/// ```
#[derive(Default)]
pub struct DiffOptions<'a> {
    cancel: Option<Box<dyn FnMut() -> bool + 'a>>,
}

impl<'a> DiffOptions<'a> {
    /// Creates the default options: no cancellation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a cancellation probe.
    ///
    /// The probe is consulted between entry steps of the directory walk
    /// and between text-delta windows. When it returns `true` the
    /// traversal stops with [`Error::Cancelled`](crate::Error::Cancelled),
    /// leaving the editor partially driven; the consumer is expected to
    /// discard that edit.
    #[inline]
    pub fn cancel_when(mut self, probe: impl FnMut() -> bool + 'a) -> Self {
        self.cancel = Some(Box::new(probe));
        self
    }
}

impl Debug for DiffOptions<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Computes the delta between two directory trees and drives `editor`
/// with it.
///
/// The editor first sees `replace_root`, then the edits that turn
/// `source` into `target` (entries in ascending name order, children
/// closed before their parents), and finally the close of the root. The
/// first error — from a store, from the editor, or a cancellation —
/// aborts the traversal and is returned unchanged; the editor will have
/// observed a prefix of the stream and should abandon it.
///
/// ## Examples
/// ```
/// use libtreedelta::memory::{MemoryDirectory, MemoryFile};
/// use libtreedelta::{diff, DiffOptions};
/// # use libtreedelta::{prelude::*, Ancestor, Result, Window};
/// # #[derive(Default)]
/// # struct CountingEditor(usize);
/// # struct NullSink;
/// # impl DeltaSink for NullSink {
/// #     fn window(&mut self, _: &Window) -> Result<()> { Ok(()) }
/// #     fn finish(&mut self) -> Result<()> { Ok(()) }
/// # }
/// # impl Editor for CountingEditor {
/// #     type Dir = ();
/// #     type File = ();
/// #     type Sink = NullSink;
/// #     fn replace_root(&mut self, _: Option<Ancestor<'_>>) -> Result<()> { self.0 += 1; Ok(()) }
/// #     fn replace_directory(&mut self, _: &mut (), _: &str, _: Option<Ancestor<'_>>) -> Result<()> { self.0 += 1; Ok(()) }
/// #     fn replace_file(&mut self, _: &mut (), _: &str, _: Option<Ancestor<'_>>) -> Result<()> { self.0 += 1; Ok(()) }
/// #     fn add_directory(&mut self, _: &mut (), _: &str) -> Result<()> { self.0 += 1; Ok(()) }
/// #     fn add_file(&mut self, _: &mut (), _: &str) -> Result<()> { self.0 += 1; Ok(()) }
/// #     fn delete(&mut self, _: &mut (), _: &str) -> Result<()> { self.0 += 1; Ok(()) }
/// #     fn change_dir_prop(&mut self, _: &mut (), _: &str, _: Option<&[u8]>) -> Result<()> { Ok(()) }
/// #     fn change_entry_prop(&mut self, _: &mut (), _: &str, _: &str, _: Option<&[u8]>) -> Result<()> { Ok(()) }
/// #     fn change_file_prop(&mut self, _: &mut (), _: &str, _: Option<&[u8]>) -> Result<()> { Ok(()) }
/// #     fn apply_text_delta(&mut self, _: &mut ()) -> Result<NullSink> { Ok(NullSink) }
/// #     fn close_directory(&mut self, _: ()) -> Result<()> { Ok(()) }
/// #     fn close_file(&mut self, _: ()) -> Result<()> { Ok(()) }
/// # }
///
/// let source = MemoryDirectory::new([1], 1);
/// let mut target = MemoryDirectory::new([1, 1], 2);
/// target.insert("new-file", MemoryFile::new([9], 2, "fresh\n"));
///
/// let mut editor = CountingEditor::default();
/// diff(&source, &target, &mut editor, DiffOptions::new()).unwrap();
/// assert!(editor.0 > 1);
/// ```
pub fn diff<E: Editor>(
    source: &dyn Directory,
    target: &dyn Directory,
    editor: &mut E,
    options: DiffOptions<'_>,
) -> Result<()> {
    debug!("tree delta: {} -> {}", source.id(), target.id());
    let mut context = Context {
        editor,
        cancel: options.cancel,
    };
    let mut root = context.editor.replace_root(None)?;
    context.delta_dirs(&mut root, source, &Relpath::new(), target)?;
    context.editor.close_directory(root)?;
    debug!("tree delta: complete");
    Ok(())
}
