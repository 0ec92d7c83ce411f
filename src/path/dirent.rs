use crate::path::internal::{self, PathKind, Style};
use camino::Utf8Path;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::{self, Utf8Error};

/// A canonical local filesystem path.
///
/// Construction canonicalizes: separators are normalized (`\` becomes `/`
/// under DOS rules), empty and `.` segments are dropped, `..` segments fold
/// against the segment before them, and on DOS platforms drive letters are
/// uppercased and UNC hosts lowercased. The canonical roots are `/`, and
/// under DOS rules also `X:`, `X:/` and `//server/share`.
///
/// ## Examples
/// ```
/// use libtreedelta::Dirent;
///
/// assert_eq!("/usr/bin", Dirent::from("/usr/bin/"));
/// assert_eq!("/usr/bin", Dirent::from("/usr/./bin//"));
/// assert_eq!("/usr/lib", Dirent::from("/usr/bin/../lib"));
/// assert_eq!("/", Dirent::from("/"));
/// assert_eq!("", Dirent::from(""));
/// ```
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Dirent(String);

impl Dirent {
    /// Wraps a string that is already canonical.
    #[inline]
    pub(crate) fn from_canonical(s: impl Into<String>) -> Self {
        let s = s.into();
        debug_assert!(internal::dirent_is_canonical(Style::LOCAL, &s));
        Self(s)
    }

    /// Whether `s` is already in the canonical form construction produces.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// assert!(Dirent::is_canonical("/a/b"));
    /// assert!(!Dirent::is_canonical("/a/b/"));
    /// assert!(!Dirent::is_canonical("a/./b"));
    /// ```
    #[inline]
    pub fn is_canonical(s: &str) -> bool {
        internal::dirent_is_canonical(Style::LOCAL, s)
    }

    /// Extracts a string slice containing the entire [`Dirent`].
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this is the empty dirent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Coerces to a [`Path`] slice.
    #[inline]
    pub fn as_path(&self) -> &Path {
        self.0.as_ref()
    }

    /// Whether this dirent names one location regardless of the current
    /// working directory.
    ///
    /// On POSIX platforms every dirent starting with `/` is absolute; under
    /// DOS rules `X:/...` and `//server/share/...` are, while a lone `X:`
    /// or a drive-relative `/foo` is not.
    #[inline]
    pub fn is_absolute(&self) -> bool {
        internal::dirent_is_absolute(Style::LOCAL, &self.0)
    }

    /// Whether this dirent is nothing but a root (`/`, and under DOS rules
    /// `X:`, `X:/` or `//server/share`).
    #[inline]
    pub fn is_root(&self) -> bool {
        internal::dirent_is_root(Style::LOCAL, &self.0)
    }

    /// Joins `other` onto this dirent.
    ///
    /// An absolute `other` replaces the base outright, and either side may
    /// be empty. Under DOS rules a leading separator on `other` is
    /// drive-relative: it resolves against the base's root.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// let base = Dirent::from("/usr");
    /// assert_eq!("/usr/bin", base.join(&Dirent::from("bin")));
    /// assert_eq!("/etc", base.join(&Dirent::from("/etc")));
    /// assert_eq!("/usr", base.join(&Dirent::from("")));
    /// ```
    #[inline]
    pub fn join(&self, other: &Dirent) -> Dirent {
        Dirent(join_in(Style::LOCAL, &self.0, &other.0))
    }

    /// Returns everything up to the final segment. The dirname of a root
    /// is the root itself.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// assert_eq!("/a", Dirent::from("/a/b").dirname());
    /// assert_eq!("/", Dirent::from("/a").dirname());
    /// assert_eq!("/", Dirent::from("/").dirname());
    /// assert_eq!("", Dirent::from("a").dirname());
    /// ```
    #[inline]
    pub fn dirname(&self) -> Dirent {
        Dirent(dirname_in(Style::LOCAL, &self.0).to_owned())
    }

    /// Returns the final segment, or the empty string for a root.
    #[inline]
    pub fn basename(&self) -> &str {
        basename_in(Style::LOCAL, &self.0)
    }

    /// Splits into ([`dirname`](Self::dirname), [`basename`](Self::basename)).
    #[inline]
    pub fn split(&self) -> (Dirent, &str) {
        (self.dirname(), self.basename())
    }

    /// Whether this dirent is `other` or an ancestor of it. The empty
    /// dirent is an ancestor of every unrooted dirent.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// assert!(Dirent::from("/a").is_ancestor_of(&Dirent::from("/a/b")));
    /// assert!(Dirent::from("/").is_ancestor_of(&Dirent::from("/a")));
    /// assert!(!Dirent::from("/a").is_ancestor_of(&Dirent::from("/ab")));
    /// ```
    #[inline]
    pub fn is_ancestor_of(&self, other: &Dirent) -> bool {
        internal::is_ancestor(PathKind::Dirent(Style::LOCAL), &self.0, &other.0)
    }

    /// When `other` is a proper child of this dirent, returns the trailing
    /// portion of `other` after the ancestor and its separator. A path is
    /// never a child of itself.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// let parent = Dirent::from("/a");
    /// assert_eq!(Some("b"), parent.is_child(&Dirent::from("/a/b")));
    /// assert_eq!(None, parent.is_child(&Dirent::from("/a")));
    /// assert_eq!(None, parent.is_child(&Dirent::from("/ab")));
    /// ```
    #[inline]
    pub fn is_child<'a>(&self, other: &'a Dirent) -> Option<&'a str> {
        internal::is_child(PathKind::Dirent(Style::LOCAL), &self.0, &other.0).map(|i| &other.0[i..])
    }

    /// Strips this dirent (and the following separator) off the front of
    /// `other`; `other` is returned unchanged when this is not an ancestor
    /// of it.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// let parent = Dirent::from("/a");
    /// assert_eq!("b/c", parent.skip_ancestor(&Dirent::from("/a/b/c")));
    /// assert_eq!("", parent.skip_ancestor(&Dirent::from("/a")));
    /// assert_eq!("/x", parent.skip_ancestor(&Dirent::from("/x")));
    /// ```
    #[inline]
    pub fn skip_ancestor<'a>(&self, other: &'a Dirent) -> &'a str {
        skip_ancestor_in(Style::LOCAL, &self.0, &other.0)
    }

    /// Returns the longest dirent that is an ancestor of both `self` and
    /// `other`, or the empty dirent when they share none.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// let a = Dirent::from("/a/b/c");
    /// assert_eq!("/a/b", a.longest_common_ancestor(&Dirent::from("/a/b/d")));
    /// assert_eq!("/", a.longest_common_ancestor(&Dirent::from("/x")));
    /// assert_eq!("", a.longest_common_ancestor(&Dirent::from("x")));
    /// ```
    #[inline]
    pub fn longest_common_ancestor(&self, other: &Dirent) -> Dirent {
        let len =
            internal::longest_ancestor_length(PathKind::Dirent(Style::LOCAL), &self.0, &other.0);
        Dirent(self.0[..len].to_owned())
    }
}

/// Join under explicit separator rules; canonical inputs produce a
/// canonical result.
pub(crate) fn join_in(style: Style, base: &str, component: &str) -> String {
    if internal::dirent_is_absolute(style, component) || base.is_empty() {
        return component.to_owned();
    }
    if component.is_empty() {
        return base.to_owned();
    }

    let mut base_part = Cow::Borrowed(base);
    let mut comp = component;
    if style == Style::Dos {
        if let Some(stripped) = comp.strip_prefix('/') {
            // A leading separator is drive-relative, not absolute.
            if !internal::dirent_is_rooted(style, base) {
                return comp.to_owned();
            }
            let root_len = internal::dirent_root_length(style, base);
            let mut root = base[..root_len].to_owned();
            if root_len == 2 && root.ends_with(':') {
                root.push('/');
            }
            comp = stripped;
            if comp.is_empty() {
                return root;
            }
            base_part = Cow::Owned(root);
        } else if internal::dirent_is_rooted(style, comp) {
            return comp.to_owned();
        }
    }

    let last = base_part.as_bytes()[base_part.len() - 1];
    let mut joined = String::with_capacity(base_part.len() + 1 + comp.len());
    joined.push_str(&base_part);
    if last != b'/' && !(style == Style::Dos && last == b':') {
        joined.push('/');
    }
    joined.push_str(comp);
    // A `..`-leading component folds into the base.
    if comp.starts_with("..") {
        internal::canonicalize_dirent(style, &joined)
    } else {
        joined
    }
}

pub(crate) fn dirname_in(style: Style, dirent: &str) -> &str {
    if internal::dirent_root_length(style, dirent) == dirent.len() {
        dirent
    } else {
        &dirent[..internal::dirent_previous_segment(style, dirent)]
    }
}

pub(crate) fn basename_in(style: Style, dirent: &str) -> &str {
    if internal::dirent_is_root(style, dirent) {
        return "";
    }
    let b = dirent.as_bytes();
    let mut start = b.len();
    while start > 0 && b[start - 1] != b'/' && !(style == Style::Dos && b[start - 1] == b':') {
        start -= 1;
    }
    &dirent[start..]
}

pub(crate) fn skip_ancestor_in<'a>(style: Style, parent: &str, child: &'a str) -> &'a str {
    if !child.starts_with(parent) {
        return child;
    }
    if child.len() == parent.len() {
        return "";
    }
    let root_len = internal::dirent_root_length(style, child);
    if root_len > parent.len() {
        return child;
    }
    if parent == "/" {
        return &child[1..];
    }
    if child.as_bytes()[parent.len()] == b'/' {
        return &child[parent.len() + 1..];
    }
    if style == Style::Dos && root_len == parent.len() && !parent.is_empty() {
        return &child[parent.len()..];
    }
    child
}

impl From<&str> for Dirent {
    #[inline]
    fn from(value: &str) -> Self {
        Self(internal::canonicalize_dirent(Style::LOCAL, value))
    }
}

impl From<String> for Dirent {
    #[inline]
    fn from(value: String) -> Self {
        if internal::dirent_is_canonical(Style::LOCAL, &value) {
            Self(value)
        } else {
            Self::from(value.as_str())
        }
    }
}

impl From<&String> for Dirent {
    #[inline]
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Cow<'_, str>> for Dirent {
    #[inline]
    fn from(value: Cow<'_, str>) -> Self {
        Self::from(value.as_ref())
    }
}

impl From<&Utf8Path> for Dirent {
    #[inline]
    fn from(value: &Utf8Path) -> Self {
        Self::from(value.as_str())
    }
}

impl TryFrom<&Path> for Dirent {
    type Error = Utf8Error;

    /// ## Examples
    /// ```
    /// use libtreedelta::Dirent;
    /// use std::path::Path;
    ///
    /// let p = Path::new("/path/to/file");
    /// assert_eq!("/path/to/file", Dirent::try_from(p).unwrap());
    /// ```
    #[inline]
    fn try_from(value: &Path) -> Result<Self, Self::Error> {
        let s = str::from_utf8(value.as_os_str().as_encoded_bytes())?;
        Ok(Self::from(s))
    }
}

impl TryFrom<PathBuf> for Dirent {
    type Error = Utf8Error;

    #[inline]
    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        Self::try_from(value.as_path())
    }
}

impl Display for Dirent {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for Dirent {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<OsStr> for Dirent {
    #[inline]
    fn as_ref(&self) -> &OsStr {
        self.0.as_ref()
    }
}

impl AsRef<Path> for Dirent {
    #[inline]
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl PartialEq<str> for Dirent {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        PartialEq::eq(self.as_str(), other)
    }
}

impl PartialEq<&str> for Dirent {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        PartialEq::eq(self.as_str(), *other)
    }
}

impl PartialEq<Dirent> for str {
    #[inline]
    fn eq(&self, other: &Dirent) -> bool {
        PartialEq::eq(self, other.as_str())
    }
}

impl PartialEq<Dirent> for &str {
    #[inline]
    fn eq(&self, other: &Dirent) -> bool {
        PartialEq::eq(*self, other.as_str())
    }
}
