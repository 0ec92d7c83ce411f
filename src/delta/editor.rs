use crate::delta::text::Window;
use crate::error::Result;
use crate::path::Relpath;
use crate::tree::Version;

/// The node a replace operation reconstructs its target from.
///
/// The path is always a canonical relpath measured from the top of the
/// delta, paired with the version the ancestor was read at.
#[derive(Copy, Clone, Debug)]
pub struct Ancestor<'a> {
    /// Path of the ancestor, relative to the delta's top.
    pub path: &'a Relpath,
    /// The version the ancestor was read at.
    pub version: Version,
}

/// Consumes the window stream of one text delta.
///
/// The driver pushes every window of the stream in order and then calls
/// [`finish`](DeltaSink::finish) exactly once to mark the end of the
/// stream; no window follows it.
pub trait DeltaSink {
    /// Accepts the next window of the stream.
    fn window(&mut self, window: &Window) -> Result<()>;

    /// Marks the end of the stream.
    fn finish(&mut self) -> Result<()>;
}

/// The consumer-supplied callback bundle that receives an edit stream.
///
/// An editor turns a tree delta into whatever its implementation wants: a
/// materialized tree, a printed change summary, a network protocol. The
/// driver calls it in a strictly nested fashion:
///
/// - [`replace_root`](Editor::replace_root) opens the root and yields the
///   root's directory token; every other call happens inside it.
/// - Opening calls (`replace_*`, `add_*`) yield a token for the opened
///   node. The token is threaded back through every operation on that node
///   and finally moved into the matching `close_*` call, so each opened
///   node is closed exactly once, children before their parents.
/// - Within one directory, calls referencing entry names arrive in
///   ascending name order.
///
/// Any error returned from an editor method aborts the traversal and is
/// surfaced to the driver's caller unchanged.
pub trait Editor {
    /// Token for an open directory, owned by the editor implementation.
    type Dir;
    /// Token for an open file, owned by the editor implementation.
    type File;
    /// Receiver for text-delta windows, handed out per file.
    type Sink: DeltaSink;

    /// Opens the root of the edit. `ancestor` names the node the root is
    /// reconstructed from, or `None` to describe it from scratch.
    fn replace_root(&mut self, ancestor: Option<Ancestor<'_>>) -> Result<Self::Dir>;

    /// Replaces the entry `name` of `parent` with a directory,
    /// reconstructed from `ancestor` when one is given.
    fn replace_directory(
        &mut self,
        parent: &mut Self::Dir,
        name: &str,
        ancestor: Option<Ancestor<'_>>,
    ) -> Result<Self::Dir>;

    /// Replaces the entry `name` of `parent` with a file, reconstructed
    /// from `ancestor` when one is given.
    fn replace_file(
        &mut self,
        parent: &mut Self::Dir,
        name: &str,
        ancestor: Option<Ancestor<'_>>,
    ) -> Result<Self::File>;

    /// Adds a new directory entry `name` to `parent`.
    fn add_directory(&mut self, parent: &mut Self::Dir, name: &str) -> Result<Self::Dir>;

    /// Adds a new file entry `name` to `parent`.
    fn add_file(&mut self, parent: &mut Self::Dir, name: &str) -> Result<Self::File>;

    /// Deletes the entry `name` of `parent`.
    fn delete(&mut self, parent: &mut Self::Dir, name: &str) -> Result<()>;

    /// Changes a property of the open directory itself. A `None` value
    /// deletes the property.
    fn change_dir_prop(
        &mut self,
        dir: &mut Self::Dir,
        name: &str,
        value: Option<&[u8]>,
    ) -> Result<()>;

    /// Changes a property of the named entry of the open directory. This
    /// is distinct from [`change_dir_prop`](Editor::change_dir_prop): the
    /// property belongs to the entry, not to the directory or to the node
    /// the entry points at.
    fn change_entry_prop(
        &mut self,
        dir: &mut Self::Dir,
        entry: &str,
        name: &str,
        value: Option<&[u8]>,
    ) -> Result<()>;

    /// Changes a property of the open file. A `None` value deletes the
    /// property.
    fn change_file_prop(
        &mut self,
        file: &mut Self::File,
        name: &str,
        value: Option<&[u8]>,
    ) -> Result<()>;

    /// Announces a text delta against the open file and returns the sink
    /// the driver will push the window stream into. No other call touches
    /// the file until the sink has been finished.
    fn apply_text_delta(&mut self, file: &mut Self::File) -> Result<Self::Sink>;

    /// Closes an open directory. All of its children have been closed.
    fn close_directory(&mut self, dir: Self::Dir) -> Result<()>;

    /// Closes an open file. Its text delta, if any, has been fully
    /// streamed.
    fn close_file(&mut self, file: Self::File) -> Result<()>;
}
