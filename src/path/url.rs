use crate::error::{Error, Result};
use crate::path::dirent::Dirent;
use crate::path::internal::{self, PathKind, Style};
use crate::path::relpath::Relpath;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// A canonical URL.
///
/// Construction canonicalizes: the scheme and authority are lowercased,
/// empty and `.` path segments dropped, the trailing separator removed, and
/// percent escapes normalized (unreserved bytes decoded, reserved bytes
/// encoded, uppercase hex digits).
///
/// ## Examples
/// ```
/// use libtreedelta::Url;
///
/// assert_eq!("http://ex.com/a/b", Url::from("HTTP://Ex.COM/a/./b/"));
/// assert_eq!("http://ex.com/a%20b", Url::from("http://ex.com/a b"));
/// assert_eq!("http://ex.com/%7Ename", Url::from("http://ex.com/%7ename"));
/// assert_eq!("https://", Url::from("https://"));
/// ```
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Url(String);

impl Url {
    /// Wraps a string that is already canonical.
    #[inline]
    pub(crate) fn from_canonical(s: impl Into<String>) -> Self {
        let s = s.into();
        debug_assert!(internal::url_is_canonical(Style::LOCAL, &s));
        Self(s)
    }

    /// Whether `s` is already in the canonical form construction produces.
    ///
    /// ```
    /// use libtreedelta::Url;
    ///
    /// assert!(Url::is_canonical("http://ex.com/a"));
    /// assert!(!Url::is_canonical("HTTP://ex.com/a"));
    /// assert!(!Url::is_canonical("http://ex.com/a/"));
    /// assert!(!Url::is_canonical("http://ex.com/a%2fb"));
    /// ```
    #[inline]
    pub fn is_canonical(s: &str) -> bool {
        internal::url_is_canonical(Style::LOCAL, s)
    }

    /// Extracts a string slice containing the entire [`Url`].
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this is the empty URL.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this URL is nothing but its `scheme://authority` root.
    ///
    /// ```
    /// use libtreedelta::Url;
    ///
    /// assert!(Url::from("http://ex.com").is_root());
    /// assert!(!Url::from("http://ex.com/a").is_root());
    /// ```
    #[inline]
    pub fn is_root(&self) -> bool {
        internal::url_is_root(&self.0)
    }

    /// Appends a relpath to this URL, percent-encoding bytes the canonical
    /// form cannot carry verbatim.
    ///
    /// ```
    /// use libtreedelta::{Relpath, Url};
    ///
    /// let base = Url::from("http://ex.com/r");
    /// assert_eq!("http://ex.com/r/a/b", base.join(&Relpath::from("a/b")));
    /// assert_eq!("http://ex.com/r", base.join(&Relpath::new()));
    /// ```
    #[inline]
    pub fn join(&self, relpath: &Relpath) -> Url {
        if relpath.is_empty() {
            return self.clone();
        }
        Url::from(format!("{}/{}", self.0, relpath).as_str())
    }

    /// Returns everything up to the final path segment. The dirname of a
    /// root is the root itself.
    ///
    /// ```
    /// use libtreedelta::Url;
    ///
    /// assert_eq!("http://ex.com/a", Url::from("http://ex.com/a/b").dirname());
    /// assert_eq!("http://ex.com", Url::from("http://ex.com/a").dirname());
    /// assert_eq!("http://ex.com", Url::from("http://ex.com").dirname());
    /// ```
    #[inline]
    pub fn dirname(&self) -> Url {
        if self.is_root() {
            self.clone()
        } else {
            Url(self.0[..internal::uri_previous_segment(&self.0)].to_owned())
        }
    }

    /// Returns the final path segment, or the empty string for a root.
    #[inline]
    pub fn basename(&self) -> &str {
        if self.is_root() {
            return "";
        }
        match self.0.rfind('/') {
            Some(i) => &self.0[i + 1..],
            None => &self.0,
        }
    }

    /// Splits into ([`dirname`](Self::dirname), [`basename`](Self::basename)).
    #[inline]
    pub fn split(&self) -> (Url, &str) {
        (self.dirname(), self.basename())
    }

    /// Whether this URL is `other` or an ancestor of it.
    #[inline]
    pub fn is_ancestor_of(&self, other: &Url) -> bool {
        internal::is_ancestor(PathKind::Url, &self.0, &other.0)
    }

    /// When `other` is a proper child of this URL, returns the trailing
    /// portion of `other` after the ancestor and its separator.
    #[inline]
    pub fn is_child<'a>(&self, other: &'a Url) -> Option<&'a str> {
        internal::is_child(PathKind::Url, &self.0, &other.0).map(|i| &other.0[i..])
    }

    /// Strips this URL (and the following separator) off the front of
    /// `other`; `other` is returned unchanged when this is not an ancestor
    /// of it.
    ///
    /// ```
    /// use libtreedelta::Url;
    ///
    /// let parent = Url::from("http://h/a");
    /// assert_eq!("b", parent.skip_ancestor(&Url::from("http://h/a/b")));
    /// assert_eq!("", parent.skip_ancestor(&Url::from("http://h/a")));
    /// assert_eq!("http://h/x", parent.skip_ancestor(&Url::from("http://h/x")));
    /// ```
    #[inline]
    pub fn skip_ancestor<'a>(&self, other: &'a Url) -> &'a str {
        if !self.is_ancestor_of(other) {
            return other.as_str();
        }
        if other.0.len() == self.0.len() {
            return "";
        }
        let rest = &other.0[self.0.len()..];
        rest.strip_prefix('/').unwrap_or(rest)
    }

    /// Returns the longest URL that is an ancestor of both `self` and
    /// `other`. The schemes and authorities must match exactly, otherwise
    /// the result is empty.
    ///
    /// ```
    /// use libtreedelta::Url;
    ///
    /// let a = Url::from("http://ex.com/a/b");
    /// assert_eq!("http://ex.com/a", a.longest_common_ancestor(&Url::from("http://ex.com/a/c")));
    /// assert_eq!("", a.longest_common_ancestor(&Url::from("https://ex.com/a/b")));
    /// assert_eq!("", a.longest_common_ancestor(&Url::from("http://other.com/a")));
    /// ```
    pub fn longest_common_ancestor(&self, other: &Url) -> Url {
        let p1 = self.0.as_str();
        let p2 = other.0.as_str();
        let url1 = internal::is_url_str(p1);
        let url2 = internal::is_url_str(p2);
        if url1 && url2 {
            // Schemes must match byte for byte through "://".
            let i = match p1.find(':') {
                Some(i) => i + 3,
                None => return Url::default(),
            };
            if p2.len() < i || p1.as_bytes()[..i] != p2.as_bytes()[..i] {
                return Url::default();
            }
            let len = internal::longest_ancestor_length(PathKind::Url, &p1[i..], &p2[i..]);
            if len == 0 || (len == 1 && p1.as_bytes()[i] == b'/') {
                Url::default()
            } else {
                Url(p1[..i + len].to_owned())
            }
        } else if !url1 && !url2 {
            let len = internal::longest_ancestor_length(PathKind::Url, p1, p2);
            let prefix = &p1[..len];
            // Degenerate scheme-less inputs can put the cut mid-root.
            if internal::url_is_canonical(Style::LOCAL, prefix) {
                Url(prefix.to_owned())
            } else {
                Url::default()
            }
        } else {
            Url::default()
        }
    }

    /// Converts a `file:` URL into the local path it names.
    ///
    /// The authority must be empty or `localhost`; under DOS rules any
    /// other authority becomes a UNC prefix, and a leading separator before
    /// a drive letter (`/C:/...` or `/C|/...`) is stripped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedUrl`] when the URL does not start with
    /// `file://`, when the authority is unsupported on this platform, or
    /// when the URL holds a hostname and no path.
    ///
    /// ```
    /// use libtreedelta::Url;
    ///
    /// let url = Url::from("file:///usr/local%20files");
    /// # #[cfg(not(windows))]
    /// assert_eq!("/usr/local files", url.to_dirent().unwrap());
    /// assert!(Url::from("http://ex.com/a").to_dirent().is_err());
    /// ```
    #[inline]
    pub fn to_dirent(&self) -> Result<Dirent> {
        dirent_from_file_url_in(Style::LOCAL, &self.0).map(Dirent::from_canonical)
    }
}

impl Dirent {
    /// Converts an absolute dirent into the `file:` URL that names it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPath`] when this dirent is not absolute.
    ///
    /// ```
    /// use libtreedelta::Dirent;
    ///
    /// # #[cfg(not(windows))]
    /// assert_eq!(
    ///     "file:///usr/local%20files",
    ///     Dirent::from("/usr/local files").to_file_url().unwrap()
    /// );
    /// assert!(Dirent::from("relative").to_file_url().is_err());
    /// ```
    #[inline]
    pub fn to_file_url(&self) -> Result<Url> {
        file_url_from_dirent_in(Style::LOCAL, self.as_str()).map(Url::from_canonical)
    }
}

/// The `file:` URL → dirent conversion, under explicit separator rules.
/// Returns a canonical dirent string.
pub(crate) fn dirent_from_file_url_in(style: Style, url: &str) -> Result<String> {
    let Some(rest) = url.strip_prefix("file://") else {
        return Err(Error::MalformedUrl {
            url: url.to_owned(),
            reason: "does not contain a 'file://' prefix",
        });
    };

    // The hostname runs to the first separator; everything from there on is
    // the path. A bare "file://" reads as "file:///".
    let (hostname, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let hostname = match internal::uri_decode(hostname) {
        h if h.is_empty() || h == "localhost" => None,
        h => Some(h),
    };
    let path = internal::uri_decode(path);

    match style {
        Style::Posix => {
            if hostname.is_some() {
                return Err(Error::MalformedUrl {
                    url: url.to_owned(),
                    reason: "contains an unsupported hostname",
                });
            }
            Ok(internal::canonicalize_dirent(style, &path))
        }
        Style::Dos => {
            let dirent = match hostname {
                None => {
                    let b = path.as_bytes();
                    if b.len() >= 3
                        && b[0] == b'/'
                        && b[1].is_ascii_alphabetic()
                        && (b[2] == b':' || b[2] == b'|')
                    {
                        // Strip the separator before the drive letter and
                        // normalize '|' to ':'.
                        let mut drive = path[1..].to_owned();
                        if drive.as_bytes()[1] == b'|' {
                            drive.replace_range(1..2, ":");
                        }
                        if drive.len() == 2 {
                            // "C:" alone would be drive-relative.
                            drive.push('/');
                        }
                        drive
                    } else {
                        path
                    }
                }
                Some(host) => {
                    if path == "/" {
                        return Err(Error::MalformedUrl {
                            url: url.to_owned(),
                            reason: "contains only a hostname, no path",
                        });
                    }
                    format!("//{host}{path}")
                }
            };
            Ok(internal::canonicalize_dirent(style, &dirent))
        }
    }
}

/// The dirent → `file:` URL conversion, under explicit separator rules.
/// Returns a canonical URL string.
pub(crate) fn file_url_from_dirent_in(style: Style, dirent: &str) -> Result<String> {
    if !internal::dirent_is_absolute(style, dirent) {
        return Err(Error::MalformedPath {
            path: dirent.to_owned(),
            reason: "not an absolute path",
        });
    }
    let encoded = internal::uri_encode(dirent);
    let raw = match style {
        Style::Posix => format!("file://{encoded}"),
        // A UNC host doubles as the URL authority; a drive sits in the path.
        Style::Dos if encoded.starts_with("//") => format!("file:{encoded}"),
        Style::Dos => format!("file:///{encoded}"),
    };
    Ok(internal::canonicalize_url(style, &raw))
}

impl From<&str> for Url {
    #[inline]
    fn from(value: &str) -> Self {
        Self(internal::canonicalize_url(Style::LOCAL, value))
    }
}

impl From<String> for Url {
    #[inline]
    fn from(value: String) -> Self {
        if internal::url_is_canonical(Style::LOCAL, &value) {
            Self(value)
        } else {
            Self::from(value.as_str())
        }
    }
}

impl From<&String> for Url {
    #[inline]
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Cow<'_, str>> for Url {
    #[inline]
    fn from(value: Cow<'_, str>) -> Self {
        Self::from(value.as_ref())
    }
}

impl Display for Url {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for Url {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Url {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        PartialEq::eq(self.as_str(), other)
    }
}

impl PartialEq<&str> for Url {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        PartialEq::eq(self.as_str(), *other)
    }
}

impl PartialEq<Url> for str {
    #[inline]
    fn eq(&self, other: &Url) -> bool {
        PartialEq::eq(self, other.as_str())
    }
}

impl PartialEq<Url> for &str {
    #[inline]
    fn eq(&self, other: &Url) -> bool {
        PartialEq::eq(*self, other.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::internal::{canonicalize_url, url_is_canonical};

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!("http://ex.com/a/b", Url::from("HTTP://Ex.COM/a/./b/"));
        assert_eq!("ssh://host", Url::from("SSH://HOST/"));
        assert_eq!("http://user@host/x", Url::from("http://user@HOST/x"));
    }

    #[test]
    fn normalizes_escapes() {
        assert_eq!("http://h/%7Ename", Url::from("http://h/%7ename"));
        assert_eq!("http://h/~name", Url::from("http://h/%7Ename"));
        assert_eq!("http://h/a%20b", Url::from("http://h/a b"));
        assert_eq!("http://h/100%25", Url::from("http://h/100%"));
        assert_eq!("http://h/a%2Fb", Url::from("http://h/a%2fb"));
    }

    #[test]
    fn canonical_fixed_point() {
        for style in [Style::Posix, Style::Dos] {
            for s in [
                "",
                "/",
                "/a/b",
                "a/b",
                "http://ex.com",
                "http://ex.com/a/b",
                "https://",
                "file:///tmp",
                "http://user@host/x",
                "http://h/%20",
            ] {
                assert!(url_is_canonical(style, s), "{style:?} {s}");
                assert_eq!(s, canonicalize_url(style, s), "{style:?} {s}");
            }
            for s in [
                "HTTP://ex.com",
                "http://EX.com",
                "http://ex.com/",
                "http://ex.com/a/",
                "http://ex.com//a",
                "http://ex.com/./a",
                "http://h/%7e",
                "http://h/a b",
            ] {
                assert!(!url_is_canonical(style, s), "{style:?} {s}");
                assert_ne!(s, canonicalize_url(style, s), "{style:?} {s}");
            }
        }
        assert!(url_is_canonical(Style::Dos, "file:///C:/x"));
        assert!(!url_is_canonical(Style::Dos, "file:///c:/x"));
        assert_eq!("file:///C:/x", canonicalize_url(Style::Dos, "file:///c:/x"));
    }

    #[test]
    fn url_roots() {
        assert!(Url::from("http://ex.com").is_root());
        assert!(Url::from("file://").is_root());
        assert!(!Url::from("file:///a").is_root());
    }

    #[test]
    fn dirname_walks_to_root() {
        let url = Url::from("http://ex.com/a/b");
        assert_eq!("http://ex.com/a", url.dirname());
        assert_eq!("http://ex.com", url.dirname().dirname());
        assert_eq!("http://ex.com", url.dirname().dirname().dirname());
        assert_eq!("b", url.basename());
        assert_eq!("", Url::from("http://ex.com").basename());
    }

    #[test]
    fn ancestor_child_duality() {
        let cases = [
            ("http://h/a", "http://h/a/b"),
            ("http://h/a", "http://h/a"),
            ("http://h/a", "http://h/ab"),
            ("http://h", "http://h/a"),
        ];
        for (p, q) in cases {
            let p = Url::from(p);
            let q = Url::from(q);
            let ancestor = p.is_ancestor_of(&q) && p != q;
            assert_eq!(ancestor, p.is_child(&q).is_some(), "{p:?} {q:?}");
        }
    }

    #[test]
    fn file_url_round_trip_posix() {
        for d in ["/", "/a", "/a/b c", "/usr/local"] {
            let url = file_url_from_dirent_in(Style::Posix, d).unwrap();
            assert_eq!(d, dirent_from_file_url_in(Style::Posix, &url).unwrap());
        }
        assert!(file_url_from_dirent_in(Style::Posix, "relative").is_err());
        assert!(dirent_from_file_url_in(Style::Posix, "http://h/a").is_err());
        assert!(dirent_from_file_url_in(Style::Posix, "file://host/a").is_err());
    }

    #[test]
    fn file_url_round_trip_dos() {
        for d in ["C:/", "C:/x", "C:/Program Files", "//server/share", "//server/share/x"] {
            let url = file_url_from_dirent_in(Style::Dos, d).unwrap();
            assert_eq!(d, dirent_from_file_url_in(Style::Dos, &url).unwrap(), "{url}");
        }
        assert!(file_url_from_dirent_in(Style::Dos, "C:").is_err());
        assert!(file_url_from_dirent_in(Style::Dos, "/x").is_err());
    }

    #[test]
    fn file_url_dos_forms() {
        assert_eq!(
            "C:/x",
            dirent_from_file_url_in(Style::Dos, "file:///C:/x").unwrap()
        );
        assert_eq!(
            "C:/x",
            dirent_from_file_url_in(Style::Dos, "file:///C|/x").unwrap()
        );
        assert_eq!(
            "C:/",
            dirent_from_file_url_in(Style::Dos, "file:///C:").unwrap()
        );
        assert_eq!(
            "//h/share/x",
            dirent_from_file_url_in(Style::Dos, "file://h/share/x").unwrap()
        );
        assert!(dirent_from_file_url_in(Style::Dos, "file://h").is_err());
        assert_eq!("/x", dirent_from_file_url_in(Style::Dos, "file:///x").unwrap());
    }

    #[test]
    fn localhost_is_empty_authority() {
        assert_eq!(
            "/a",
            dirent_from_file_url_in(Style::Posix, "file://localhost/a").unwrap()
        );
    }
}
