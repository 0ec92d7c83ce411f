use crate::error::{Error, Result};
use std::io::{self, Read, Write};

use crate::delta::editor::DeltaSink;

/// The largest source or target view a single [`Window`] describes.
///
/// Bounding the view bounds the memory a delta traversal holds per file,
/// no matter how large the file is.
pub const MAX_WINDOW_SIZE: usize = 64 * 1024;

/// One instruction of a [`Window`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WindowOp {
    /// Append `len` bytes of the window's source view, starting at
    /// `offset` within the view.
    CopySource {
        /// Start within the source view.
        offset: usize,
        /// Bytes to copy.
        len: usize,
    },
    /// Append `len` bytes of the output this window has already
    /// reconstructed, starting at `offset` within it. The region may
    /// overlap the end of the output, which repeats it run-length style.
    CopyTarget {
        /// Start within the reconstructed output.
        offset: usize,
        /// Bytes to copy.
        len: usize,
    },
    /// Append `len` bytes of the window's literal data, starting at
    /// `offset` within it.
    Insert {
        /// Start within [`Window::literal`].
        offset: usize,
        /// Bytes to append.
        len: usize,
    },
}

/// One unit of a text delta.
///
/// A window reconstructs `target_len` bytes of the target from a bounded
/// view of the source stream plus inline literal data. Applying every
/// window of a stream, in order, to the source yields the target
/// byte-for-byte.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Window {
    /// Offset of this window's source view within the source stream.
    /// Views of consecutive windows never move backwards.
    pub source_offset: u64,
    /// Length of the source view.
    pub source_len: usize,
    /// Length of the output this window reconstructs.
    pub target_len: usize,
    /// The instructions, applied in order.
    pub ops: Vec<WindowOp>,
    /// Literal bytes that [`WindowOp::Insert`] instructions draw from.
    pub literal: Vec<u8>,
}

impl Window {
    /// Reconstructs this window's portion of the target from its source
    /// view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] when the view is shorter than
    /// [`source_len`](Window::source_len), when an instruction reaches out
    /// of bounds, or when the instructions do not produce exactly
    /// [`target_len`](Window::target_len) bytes.
    pub fn apply(&self, source_view: &[u8]) -> Result<Vec<u8>> {
        if source_view.len() < self.source_len {
            return Err(Error::Invariant("window source view is truncated"));
        }
        let view = &source_view[..self.source_len];
        let mut out = Vec::with_capacity(self.target_len);
        for op in &self.ops {
            match *op {
                WindowOp::CopySource { offset, len } => {
                    let end = offset
                        .checked_add(len)
                        .filter(|&end| end <= view.len())
                        .ok_or(Error::Invariant("source copy out of bounds"))?;
                    out.extend_from_slice(&view[offset..end]);
                }
                WindowOp::CopyTarget { offset, len } => {
                    if offset >= out.len() && len > 0 {
                        return Err(Error::Invariant("target copy starts past the output"));
                    }
                    // Overlap with the growing end is deliberate.
                    for i in 0..len {
                        let byte = out[offset + i];
                        out.push(byte);
                    }
                }
                WindowOp::Insert { offset, len } => {
                    let end = offset
                        .checked_add(len)
                        .filter(|&end| end <= self.literal.len())
                        .ok_or(Error::Invariant("literal read out of bounds"))?;
                    out.extend_from_slice(&self.literal[offset..end]);
                }
            }
        }
        if out.len() != self.target_len {
            return Err(Error::Invariant("window output length mismatch"));
        }
        Ok(out)
    }
}

/// A lazy producer of the [`Window`] stream turning one byte stream into
/// another.
///
/// Both streams are consumed in bounded views; the iterator ends when the
/// target stream is exhausted, which is the terminal mark of the stream.
/// The produced windows favor source copies where the view contents line
/// up and fall back to literal data in between; whatever their shape, the
/// contract is only that applying them in order to the source yields the
/// target byte-for-byte.
///
/// ## Examples
/// ```
/// use libtreedelta::TextDelta;
///
/// let windows: Vec<_> = TextDelta::new(b"one\n".as_slice(), b"two\n".as_slice())
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(1, windows.len());
/// assert_eq!(b"two\n".to_vec(), windows[0].apply(b"one\n").unwrap());
/// ```
pub struct TextDelta<S, T> {
    source: S,
    target: T,
    source_offset: u64,
    checksum: crc32fast::Hasher,
    done: bool,
}

impl<S: Read, T: Read> TextDelta<S, T> {
    /// Creates a window stream that turns `source` into `target`.
    #[inline]
    pub fn new(source: S, target: T) -> Self {
        Self {
            source,
            target,
            source_offset: 0,
            checksum: crc32fast::Hasher::new(),
            done: false,
        }
    }

    /// CRC-32 digest of the target bytes described so far; the digest of
    /// the whole target once the stream is exhausted.
    #[inline]
    pub fn target_checksum(&self) -> u32 {
        self.checksum.clone().finalize()
    }

    fn next_window(&mut self) -> Result<Option<Window>> {
        let mut target_view = vec![0u8; MAX_WINDOW_SIZE];
        let target_len = read_full(&mut self.target, &mut target_view)
            .map_err(|e| Error::io("read target contents", e))?;
        if target_len == 0 {
            return Ok(None);
        }
        target_view.truncate(target_len);
        self.checksum.update(&target_view);

        let mut source_view = vec![0u8; MAX_WINDOW_SIZE];
        let source_len = read_full(&mut self.source, &mut source_view)
            .map_err(|e| Error::io("read source contents", e))?;
        source_view.truncate(source_len);

        let window = build_window(self.source_offset, &source_view, &target_view);
        self.source_offset += source_len as u64;
        Ok(Some(window))
    }
}

impl<S: Read, T: Read> Iterator for TextDelta<S, T> {
    type Item = Result<Window>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_window() {
            Ok(Some(window)) => Some(Ok(window)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Copies the matching head and tail of the source view, inserting the
/// differing middle of the target as literal data.
fn build_window(source_offset: u64, source: &[u8], target: &[u8]) -> Window {
    let mut ops = Vec::new();
    let mut literal = Vec::new();

    let prefix = source
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = source.len().min(target.len()) - prefix;
    let suffix = source
        .iter()
        .rev()
        .zip(target.iter().rev())
        .take_while(|(a, b)| a == b)
        .take(max_suffix)
        .count();

    if prefix > 0 {
        ops.push(WindowOp::CopySource {
            offset: 0,
            len: prefix,
        });
    }
    let middle = &target[prefix..target.len() - suffix];
    if !middle.is_empty() {
        ops.push(WindowOp::Insert {
            offset: 0,
            len: middle.len(),
        });
        literal.extend_from_slice(middle);
    }
    if suffix > 0 {
        ops.push(WindowOp::CopySource {
            offset: source.len() - suffix,
            len: suffix,
        });
    }

    Window {
        source_offset,
        source_len: source.len(),
        target_len: target.len(),
        ops,
        literal,
    }
}

/// Reads until `buf` is full or the stream ends, returning the number of
/// bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// A [`DeltaSink`] that reconstructs the target stream.
///
/// Feed it the window stream of a text delta and it applies each window to
/// the matching view of `source`, writing the reconstructed target to
/// `out`. This is the applying half of [`TextDelta`] and the natural sink
/// for an editor that materializes files.
///
/// ## Examples
/// ```
/// use libtreedelta::{prelude::*, ApplyDelta, TextDelta};
///
/// let source = b"the quick fox".as_slice();
/// let target = b"the slow fox".as_slice();
///
/// let mut sink = ApplyDelta::new(source, Vec::new());
/// for window in TextDelta::new(source, target) {
///     sink.window(&window.unwrap()).unwrap();
/// }
/// sink.finish().unwrap();
/// assert_eq!(target, sink.into_inner().as_slice());
/// ```
pub struct ApplyDelta<S, W> {
    source: S,
    out: W,
    position: u64,
}

impl<S: Read, W: Write> ApplyDelta<S, W> {
    /// Creates a sink applying windows against `source`, writing the
    /// reconstruction to `out`.
    #[inline]
    pub fn new(source: S, out: W) -> Self {
        Self {
            source,
            out,
            position: 0,
        }
    }

    /// Returns the output writer.
    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<S: Read, W: Write> DeltaSink for ApplyDelta<S, W> {
    fn window(&mut self, window: &Window) -> Result<()> {
        if window.source_offset < self.position {
            return Err(Error::Invariant("window source views move backwards"));
        }
        let skip = window.source_offset - self.position;
        if skip > 0 {
            io::copy(&mut (&mut self.source).take(skip), &mut io::sink())
                .map_err(|e| Error::io("skip source contents", e))?;
        }
        let mut view = vec![0u8; window.source_len];
        let got = read_full(&mut self.source, &mut view)
            .map_err(|e| Error::io("read source contents", e))?;
        self.position = window.source_offset + got as u64;
        let data = window.apply(&view[..got])?;
        self.out
            .write_all(&data)
            .map_err(|e| Error::io("write reconstructed contents", e))
    }

    #[inline]
    fn finish(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| Error::io("flush reconstructed contents", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(source: &[u8], target: &[u8]) -> Vec<Window> {
        TextDelta::new(source, target).collect::<Result<_>>().unwrap()
    }

    fn reconstruct(source: &[u8], windows: &[Window]) -> Vec<u8> {
        let mut sink = ApplyDelta::new(source, Vec::new());
        for w in windows {
            sink.window(w).unwrap();
        }
        sink.finish().unwrap();
        sink.into_inner()
    }

    #[test]
    fn empty_target_is_no_windows() {
        assert!(windows(b"anything", b"").is_empty());
        assert!(windows(b"", b"").is_empty());
    }

    #[test]
    fn from_scratch_is_pure_literal() {
        let w = windows(b"", b"hi");
        assert_eq!(1, w.len());
        assert_eq!(0, w[0].source_len);
        assert_eq!(b"hi".to_vec(), w[0].literal);
        assert_eq!(b"hi".to_vec(), reconstruct(b"", &w));
    }

    #[test]
    fn identical_streams_are_one_copy() {
        let w = windows(b"same bytes", b"same bytes");
        assert_eq!(1, w.len());
        assert_eq!(
            vec![WindowOp::CopySource { offset: 0, len: 10 }],
            w[0].ops
        );
        assert!(w[0].literal.is_empty());
    }

    #[test]
    fn shared_head_and_tail_are_copied() {
        let source = b"one two three";
        let target = b"one 2 three";
        let w = windows(source, target);
        assert_eq!(1, w.len());
        let literal_len: usize = w[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                WindowOp::Insert { len, .. } => Some(len),
                _ => None,
            })
            .sum();
        assert!(literal_len < target.len());
        assert_eq!(target.to_vec(), reconstruct(source, &w));
    }

    #[test]
    fn large_streams_take_multiple_windows() {
        let source = vec![7u8; MAX_WINDOW_SIZE * 2 + 17];
        let mut target = source.clone();
        target[MAX_WINDOW_SIZE + 5] = 9;
        target.extend_from_slice(b"tail");
        let w = windows(&source, &target);
        assert_eq!(3, w.len());
        assert_eq!(target, reconstruct(&source, &w));
    }

    #[test]
    fn checksum_covers_the_whole_target() {
        let mut delta = TextDelta::new(b"abc".as_slice(), b"abcdef".as_slice());
        while delta.next().transpose().unwrap().is_some() {}
        assert_eq!(crc32fast::hash(b"abcdef"), delta.target_checksum());
    }

    #[test]
    fn target_copy_repeats_runs() {
        let window = Window {
            source_offset: 0,
            source_len: 0,
            target_len: 6,
            ops: vec![
                WindowOp::Insert { offset: 0, len: 2 },
                WindowOp::CopyTarget { offset: 0, len: 4 },
            ],
            literal: b"ab".to_vec(),
        };
        assert_eq!(b"ababab".to_vec(), window.apply(b"").unwrap());
    }

    #[test]
    fn apply_polices_bounds() {
        let window = Window {
            source_offset: 0,
            source_len: 4,
            target_len: 4,
            ops: vec![WindowOp::CopySource { offset: 2, len: 4 }],
            literal: Vec::new(),
        };
        assert!(matches!(
            window.apply(b"abcd"),
            Err(Error::Invariant(_))
        ));
        assert!(matches!(window.apply(b"ab"), Err(Error::Invariant(_))));
    }
}
