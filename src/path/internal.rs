//! Canonicalization machinery shared by the path types.
//!
//! Everything here is keyed off a [`Style`] so the DOS rules (drive letters,
//! UNC shares, `\` separators) stay in one place and both styles can be
//! exercised by the test matrix regardless of the host platform.

use std::borrow::Cow;

/// Path separator conventions.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Style {
    /// Single-rooted paths, `/` only.
    Posix,
    /// Drive letters, UNC shares, `\` accepted as a separator.
    Dos,
}

impl Style {
    /// The style of the platform this crate was compiled for.
    pub(crate) const LOCAL: Style = if cfg!(any(windows, target_os = "cygwin")) {
        Style::Dos
    } else {
        Style::Posix
    };
}

/// Which kind of path a shared algorithm is operating on.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum PathKind {
    Dirent(Style),
    Relpath,
    Url,
}

/// Where `..` segments may appear in a canonical path.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum ParentRule {
    Anywhere,
    LeadingOnly,
    Nowhere,
}

/// Validates the segment run after any root: no empty segments (which also
/// rules out leading, doubled and trailing separators), no `.`, and `..`
/// only where `rule` permits.
fn segments_canonical(s: &str, rule: ParentRule) -> bool {
    if s.is_empty() {
        return true;
    }
    let mut leading = true;
    for seg in s.split('/') {
        if seg.is_empty() || seg == "." {
            return false;
        }
        if seg == ".." {
            match rule {
                ParentRule::Anywhere => {}
                ParentRule::LeadingOnly if leading => {}
                _ => return false,
            }
        } else {
            leading = false;
        }
    }
    true
}

/// Length of the root prefix of `dirent`, or 0 when it has none.
///
/// Roots are `/`, and under [`Style::Dos`] also `X:`, `X:/` and
/// `//server/share`.
pub(crate) fn dirent_root_length(style: Style, dirent: &str) -> usize {
    let b = dirent.as_bytes();
    let len = b.len();
    if style == Style::Dos {
        if len >= 2 && b[1] == b':' && b[0].is_ascii_alphabetic() {
            return if len > 2 && b[2] == b'/' { 3 } else { 2 };
        }
        if len > 2 && b[0] == b'/' && b[1] == b'/' {
            let mut i = 2;
            while i < len && b[i] != b'/' {
                i += 1;
            }
            if i == len {
                return len;
            }
            i += 1;
            while i < len && b[i] != b'/' {
                i += 1;
            }
            return i;
        }
    }
    if len >= 1 && b[0] == b'/' { 1 } else { 0 }
}

/// Whether `dirent` has a root, absolute or not (`/foo`, `X:foo`, ...).
pub(crate) fn dirent_is_rooted(style: Style, dirent: &str) -> bool {
    let b = dirent.as_bytes();
    if b.first() == Some(&b'/') {
        return true;
    }
    style == Style::Dos && b.len() >= 2 && b[1] == b':' && b[0].is_ascii_alphabetic()
}

/// Whether `dirent` identifies one location regardless of the current
/// directory or drive. Under DOS rules a lone `/` or `X:` does not.
pub(crate) fn dirent_is_absolute(style: Style, dirent: &str) -> bool {
    let b = dirent.as_bytes();
    match style {
        Style::Posix => b.first() == Some(&b'/'),
        Style::Dos => {
            (b.len() >= 2 && b[0] == b'/' && b[1] == b'/')
                || (b.len() >= 3 && b[0].is_ascii_uppercase() && b[1] == b':' && b[2] == b'/')
        }
    }
}

/// Whether `dirent` is nothing but a root.
pub(crate) fn dirent_is_root(style: Style, dirent: &str) -> bool {
    let b = dirent.as_bytes();
    let len = b.len();
    if style == Style::Dos {
        if (len == 2 || (len == 3 && b[2] == b'/')) && b[1] == b':' && b[0].is_ascii_alphabetic() {
            return true;
        }
        // //server/share, exactly two segments and no trailing separator
        if len >= 2 && b[0] == b'/' && b[1] == b'/' && b[len - 1] != b'/' {
            let segments = b[2..].iter().filter(|&&c| c == b'/').count();
            return segments == 1;
        }
    }
    len == 1 && b[0] == b'/'
}

/// Returns the canonical form of `dirent`.
///
/// Separators are normalized, empty and `.` segments dropped, `..` folded
/// against the segment before it (or the root), drive letters uppercased and
/// UNC hosts lowercased.
pub(crate) fn canonicalize_dirent(style: Style, dirent: &str) -> String {
    let converted: Cow<'_, str> = if style == Style::Dos && dirent.contains('\\') {
        Cow::Owned(dirent.replace('\\', "/"))
    } else {
        Cow::Borrowed(dirent)
    };
    let s = converted.as_ref();
    if s.is_empty() {
        return String::new();
    }

    let b = s.as_bytes();
    let (mut root, rest) = if style == Style::Dos
        && b.len() >= 2
        && b[1] == b':'
        && b[0].is_ascii_alphabetic()
    {
        let drive = b[0].to_ascii_uppercase() as char;
        if b.get(2) == Some(&b'/') {
            (format!("{drive}:/"), &s[3..])
        } else {
            (format!("{drive}:"), &s[2..])
        }
    } else if b[0] == b'/' {
        if style == Style::Dos && b.get(1) == Some(&b'/') {
            (String::from("//"), &s[2..])
        } else {
            (String::from("/"), &s[1..])
        }
    } else {
        (String::new(), s)
    };

    let mut segments: Vec<&str> = rest
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();

    let mut unc = false;
    if root == "//" {
        // A UNC root needs both a host and a share; anything shorter
        // degrades to a single-rooted path. The host is case-insensitive,
        // the share is not, and both are part of the root.
        if segments.len() >= 2 {
            let host = segments.remove(0).to_ascii_lowercase();
            let share = segments.remove(0);
            root = format!("//{host}/{share}");
            unc = true;
        } else {
            root = String::from("/");
        }
    }

    let rooted = !root.is_empty();
    let mut canonical: Vec<&str> = Vec::with_capacity(segments.len());
    for seg in segments {
        if seg != ".." {
            canonical.push(seg);
        } else if canonical.last().is_some_and(|&last| last != "..") {
            canonical.pop();
        } else if !rooted {
            canonical.push("..");
        }
    }

    let mut out = root;
    if unc && !canonical.is_empty() {
        out.push('/');
    }
    out.push_str(&canonical.join("/"));
    // Dropping noop segments can expose a drive spec at the front of a
    // rootless path; run it through again so the drive rules apply.
    if style == Style::Dos && !rooted {
        let ob = out.as_bytes();
        if ob.len() >= 2 && ob[1] == b':' && ob[0].is_ascii_alphabetic() {
            return canonicalize_dirent(style, &out);
        }
    }
    out
}

/// Whether `dirent` already is in the form [`canonicalize_dirent`] produces.
pub(crate) fn dirent_is_canonical(style: Style, dirent: &str) -> bool {
    if dirent.is_empty() {
        return true;
    }
    if style == Style::Dos && dirent.contains('\\') {
        return false;
    }
    let b = dirent.as_bytes();
    if b[0] == b'/' {
        if style == Style::Dos && b.get(1) == Some(&b'/') {
            // UNC shares carry case rules of their own; compare outright.
            return canonicalize_dirent(style, dirent) == dirent;
        }
        return segments_canonical(&dirent[1..], ParentRule::Nowhere);
    }
    if style == Style::Dos && b.len() >= 2 && b[1] == b':' && b[0].is_ascii_alphabetic() {
        if !b[0].is_ascii_uppercase() {
            return false;
        }
        let rest = if b.get(2) == Some(&b'/') {
            &dirent[3..]
        } else {
            &dirent[2..]
        };
        return segments_canonical(rest, ParentRule::Nowhere);
    }
    segments_canonical(dirent, ParentRule::LeadingOnly)
}

/// Returns the canonical form of `relpath`: no leading separator, no empty
/// or `.` segments, no trailing separator. `..` segments are kept verbatim.
pub(crate) fn canonicalize_relpath(relpath: &str) -> String {
    let mut out = String::with_capacity(relpath.len());
    for seg in relpath.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(seg);
    }
    out
}

/// Whether `relpath` already is in canonical relative form.
pub(crate) fn relpath_is_canonical(relpath: &str) -> bool {
    segments_canonical(relpath, ParentRule::Anywhere)
}

/// Bytes that may appear verbatim in the path portion of a canonical URL.
pub(crate) fn is_uri_char(c: u8) -> bool {
    matches!(c,
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
        | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b','
        | b'-' | b'.' | b'/' | b':' | b'=' | b'@' | b'_' | b'~')
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Percent-encodes every byte of `s` that may not appear verbatim in a URL
/// path.
pub(crate) fn uri_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &c in s.as_bytes() {
        if is_uri_char(c) {
            out.push(c as char);
        } else {
            out.push_str(&format!("%{c:02X}"));
        }
    }
    out
}

/// Decodes every well-formed percent escape in `s`. Malformed escapes are
/// kept verbatim; decoded bytes that do not form UTF-8 are replaced.
pub(crate) fn uri_decode(s: &str) -> String {
    let b = s.as_bytes();
    let mut out = Vec::with_capacity(b.len());
    let mut i = 0;
    while i < b.len() {
        if b[i] == b'%'
            && let (Some(hi), Some(lo)) = (
                b.get(i + 1).copied().and_then(hex_value),
                b.get(i + 2).copied().and_then(hex_value),
            )
        {
            out.push(hi * 16 + lo);
            i += 3;
        } else {
            out.push(b[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Re-encodes the path portion of a URL: well-formed escapes of unreserved
/// bytes are decoded, kept escapes get uppercase hex digits, reserved bytes
/// are escaped, and a dangling `%` becomes `%25`.
fn normalize_escapes(path: &str) -> String {
    let b = path.as_bytes();
    let mut out = String::with_capacity(b.len());
    let mut i = 0;
    while i < b.len() {
        let c = b[i];
        if c == b'%' {
            match (b.get(i + 1).copied(), b.get(i + 2).copied()) {
                (Some(hi), Some(lo)) if hex_value(hi).is_some() && hex_value(lo).is_some() => {
                    let val = hex_value(hi).unwrap() * 16 + hex_value(lo).unwrap();
                    // An escaped separator must stay escaped or it would
                    // splice in a segment boundary.
                    if is_uri_char(val) && val != b'/' {
                        out.push(val as char);
                    } else {
                        out.push('%');
                        out.push(hi.to_ascii_uppercase() as char);
                        out.push(lo.to_ascii_uppercase() as char);
                    }
                    i += 3;
                }
                _ => {
                    out.push_str("%25");
                    i += 1;
                }
            }
        } else if c == b'/' || is_uri_char(c) {
            out.push(c as char);
            i += 1;
        } else {
            out.push_str(&format!("%{c:02X}"));
            i += 1;
        }
    }
    out
}

/// Splits `url` into its `scheme://[user@]host` prefix and the remainder,
/// when it has one.
fn split_url_prefix(url: &str) -> Option<(&str, &str)> {
    let b = url.as_bytes();
    if b.first() == Some(&b'/') {
        return None;
    }
    let i = url.find(['/', ':'])?;
    if !url[i..].starts_with("://") {
        return None;
    }
    let mut end = i + 3;
    // Optional userinfo, then the hostname, up to the first separator.
    let after = &url[end..];
    if let Some(j) = after.find(['/', '@'])
        && after.as_bytes()[j] == b'@'
    {
        end += j + 1;
    }
    let host_end = url[end..].find('/').map_or(url.len(), |j| end + j);
    Some((&url[..host_end], &url[host_end..]))
}

/// Whether `s` looks like a `scheme://` URL at all.
pub(crate) fn is_url_str(s: &str) -> bool {
    match s.find("://") {
        Some(i) if i > 0 => s[..i]
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.')),
        _ => false,
    }
}

/// Returns the canonical form of `url`.
pub(crate) fn canonicalize_url(style: Style, url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if let Some((prefix, rest)) = split_url_prefix(url) {
        let scheme_end = prefix.find(':').unwrap_or(0);
        let host_start = prefix[scheme_end..]
            .find('@')
            .map_or(scheme_end + 3, |j| scheme_end + j + 1);
        let mut out = String::with_capacity(url.len());
        out.push_str(&prefix[..scheme_end].to_ascii_lowercase());
        out.push_str(&prefix[scheme_end..host_start]);
        out.push_str(&prefix[host_start..].to_ascii_lowercase());

        let mut segments: Vec<Cow<'_, str>> = rest
            .split('/')
            .filter(|seg| !seg.is_empty() && *seg != ".")
            .map(Cow::Borrowed)
            .collect();
        if style == Style::Dos
            && out.starts_with("file://")
            && let Some(first) = segments.first_mut()
        {
            let fb = first.as_bytes();
            if fb.len() == 2 && fb[1] == b':' && fb[0].is_ascii_lowercase() {
                *first = Cow::Owned(first.to_ascii_uppercase());
            }
        }
        if segments.is_empty() {
            return out;
        }
        let path = segments.join("/");
        out.push('/');
        out.push_str(&normalize_escapes(&path));
        return out;
    }

    // Not a URL; treat as a plain slash-separated path.
    let rooted = url.starts_with('/');
    let mut out = String::with_capacity(url.len());
    if rooted {
        out.push('/');
    }
    let mut first = true;
    for seg in url.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if !first {
            out.push('/');
        }
        out.push_str(seg);
        first = false;
    }
    out
}

/// Whether `url` already is in the form [`canonicalize_url`] produces.
pub(crate) fn url_is_canonical(style: Style, url: &str) -> bool {
    if url.is_empty() {
        return true;
    }
    if let Some((prefix, rest)) = split_url_prefix(url) {
        let scheme_end = prefix.find(':').unwrap_or(0);
        if prefix[..scheme_end].bytes().any(|c| c.is_ascii_uppercase()) {
            return false;
        }
        let host_start = prefix[scheme_end..]
            .find('@')
            .map_or(scheme_end + 3, |j| scheme_end + j + 1);
        if prefix[host_start..].bytes().any(|c| c.is_ascii_uppercase()) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        let path = &rest[1..];
        if path.is_empty() {
            return false;
        }
        if style == Style::Dos && prefix.starts_with("file://") {
            let first = path.split('/').next().unwrap_or("");
            let fb = first.as_bytes();
            if fb.len() == 2 && fb[1] == b':' && fb[0].is_ascii_lowercase() {
                return false;
            }
        }
        if !segments_canonical(path, ParentRule::Anywhere) {
            return false;
        }
        return escapes_are_canonical(path);
    }

    // Not a URL; a lone "/" is canonical, otherwise plain segments.
    if url == "/" {
        return true;
    }
    if let Some(rest) = url.strip_prefix('/') {
        segments_canonical(rest, ParentRule::Anywhere)
    } else {
        segments_canonical(url, ParentRule::Anywhere)
    }
}

/// Escape-level validity of a canonical URL path: uppercase hex digits only,
/// nothing escaped that need not be, nothing verbatim that must be escaped.
fn escapes_are_canonical(path: &str) -> bool {
    let b = path.as_bytes();
    let mut i = 0;
    while i < b.len() {
        let c = b[i];
        if c == b'%' {
            let (Some(hi), Some(lo)) = (b.get(i + 1).copied(), b.get(i + 2).copied()) else {
                return false;
            };
            if !matches!(hi, b'0'..=b'9' | b'A'..=b'F') || !matches!(lo, b'0'..=b'9' | b'A'..=b'F')
            {
                return false;
            }
            let val = hex_value(hi).unwrap() * 16 + hex_value(lo).unwrap();
            if is_uri_char(val) && val != b'/' {
                return false;
            }
            i += 3;
        } else {
            if c != b'/' && !is_uri_char(c) {
                return false;
            }
            i += 1;
        }
    }
    true
}

/// Length of the `scheme://host` root of `uri`, or 0 when it has none.
pub(crate) fn uri_schema_root_length(uri: &str) -> usize {
    let b = uri.as_bytes();
    let len = b.len();
    for i in 0..len {
        if b[i] == b'/' {
            if i > 0 && b[i - 1] == b':' && i < len - 1 && b[i + 1] == b'/' {
                if i == 5 && uri.starts_with("file") {
                    return 7;
                }
                for (j, &c) in b.iter().enumerate().skip(i + 2) {
                    if c == b'/' {
                        return j;
                    }
                }
                return len;
            }
            return 0;
        }
    }
    0
}

/// Whether `uri` is nothing but its scheme root (or a lone `/`).
pub(crate) fn url_is_root(uri: &str) -> bool {
    if uri == "/" {
        return true;
    }
    !uri.is_empty() && uri.len() == uri_schema_root_length(uri)
}

/// Length of the prefix of `dirent` up to and excluding its last segment.
/// The trailing separator is kept only when the remainder is a root.
pub(crate) fn dirent_previous_segment(style: Style, dirent: &str) -> usize {
    let b = dirent.as_bytes();
    if b.is_empty() {
        return 0;
    }
    let mut i = b.len() - 1;
    while i > 0 && b[i] != b'/' && !(style == Style::Dos && b[i] == b':' && i == 1) {
        i -= 1;
    }
    if b[i] != b'/' && !(style == Style::Dos && b[i] == b':' && i == 1) {
        return 0;
    }
    if dirent_root_length(style, &dirent[..i + 1]) == i + 1 {
        i + 1
    } else {
        i
    }
}

/// Length of the prefix of `relpath` up to and excluding its last segment.
pub(crate) fn relpath_previous_segment(relpath: &str) -> usize {
    relpath.rfind('/').unwrap_or(0)
}

/// Length of the prefix of `uri` up to and excluding its last segment.
pub(crate) fn uri_previous_segment(uri: &str) -> usize {
    let b = uri.as_bytes();
    if b.is_empty() {
        return 0;
    }
    let root = uri_schema_root_length(uri);
    let mut i = b.len() - 1;
    while i > root && b[i] != b'/' {
        i -= 1;
    }
    if b[i] != b'/' {
        return root;
    }
    if i == 0 && b.len() > 1 && b[0] == b'/' { 1 } else { i }
}

/// Whether `p1` is `p2` or an ancestor of it.
pub(crate) fn is_ancestor(kind: PathKind, p1: &str, p2: &str) -> bool {
    if p1.is_empty() {
        return match kind {
            PathKind::Dirent(style) => !dirent_is_rooted(style, p2),
            PathKind::Relpath => true,
            PathKind::Url => false,
        };
    }
    let dos_dirent = matches!(kind, PathKind::Dirent(Style::Dos));
    // A UNC path has no ancestors outside its own share.
    if dos_dirent && p2.starts_with("//") && !p1.starts_with("//") {
        return false;
    }
    if !p2.starts_with(p1) {
        return false;
    }
    if p2.len() == p1.len() {
        return true;
    }
    let b1 = p1.as_bytes();
    if dos_dirent && b1.len() == 2 && b1[1] == b':' && b1[0].is_ascii_alphabetic() {
        // A bare drive is drive-relative; it does not contain the drive
        // root or anything below it.
        return p2.as_bytes()[2] != b'/';
    }
    let next = p2.as_bytes()[p1.len()];
    if b1[b1.len() - 1] == b'/' {
        next != b'/'
    } else {
        next == b'/'
    }
}

/// When `p2` is a proper child of `p1`, returns the byte offset of the
/// trailing portion of `p2` after the ancestor and its separator.
pub(crate) fn is_child(kind: PathKind, p1: &str, p2: &str) -> Option<usize> {
    if p1.is_empty() {
        if p2.is_empty() {
            return None;
        }
        return match kind {
            PathKind::Url => None,
            PathKind::Dirent(style) if dirent_is_rooted(style, p2) => None,
            _ => Some(0),
        };
    }

    let b1 = p1.as_bytes();
    let b2 = p2.as_bytes();
    let mut i = 0;
    while i < b1.len() && i < b2.len() {
        if b1[i] != b2[i] {
            return None;
        }
        i += 1;
    }
    if i < b1.len() || i == b2.len() {
        return None;
    }
    let bare_drive = matches!(kind, PathKind::Dirent(Style::Dos))
        && i == 2
        && b1[1] == b':'
        && b1[0].is_ascii_alphabetic();
    if b1[i - 1] == b'/' || bare_drive {
        if b2[i] == b'/' { None } else { Some(i) }
    } else if b2[i] == b'/' {
        if i + 1 < b2.len() { Some(i + 1) } else { None }
    } else {
        None
    }
}

/// Length of the longest common ancestor of `p1` and `p2`, as a prefix of
/// either, ending at a segment boundary.
pub(crate) fn longest_ancestor_length(kind: PathKind, p1: &str, p2: &str) -> usize {
    let b1 = p1.as_bytes();
    let b2 = p2.as_bytes();
    if b1.is_empty() || b2.is_empty() {
        return 0;
    }
    let dirent_style = match kind {
        PathKind::Dirent(style) => Some(style),
        _ => None,
    };
    if dirent_style == Some(Style::Dos) {
        // A UNC path shares nothing with a non-UNC path, and two UNC
        // paths share nothing unless host and share agree exactly.
        let unc1 = p1.starts_with("//");
        let unc2 = p2.starts_with("//");
        if unc1 != unc2 {
            return 0;
        }
        if unc1 {
            let root = dirent_root_length(Style::Dos, p1);
            if root != dirent_root_length(Style::Dos, p2) || b1[..root] != b2[..root] {
                return 0;
            }
        }
    }

    let mut i = 0;
    let mut last_dirsep = 0;
    while i < b1.len() && i < b2.len() && b1[i] == b2[i] {
        if b1[i] == b'/' {
            last_dirsep = i;
        }
        i += 1;
    }

    // '/' is the longest common ancestor of '/' and '/foo'.
    if i == 1 && b1[0] == b'/' && b2[0] == b'/' {
        return 1;
    }
    if dirent_style.is_some() && i == 0 {
        return 0;
    }

    if dirent_style == Some(Style::Dos) {
        // X:/ and X:/foo
        if i == 3 && b1.len() > 2 && b1[2] == b'/' && b1[1] == b':' {
            return i;
        }
        if i == 2 && b1[1] == b':' && b1[0].is_ascii_alphabetic() {
            // X: and X:/ do not share a root; X: and X:foo share the
            // drive-relative X:.
            if b1.get(2) == Some(&b'/') || b2.get(2) == Some(&b'/') {
                return 0;
            }
            return i;
        }
    }

    if (i == b1.len() && b2.get(i) == Some(&b'/'))
        || (i == b2.len() && b1.get(i) == Some(&b'/'))
        || (i == b1.len() && i == b2.len())
    {
        return i;
    }

    if dirent_style == Some(Style::Dos)
        && last_dirsep == 2
        && b1.len() > 2
        && b2.len() > 2
        && b1[1] == b':'
        && b1[2] == b'/'
        && b2[1] == b':'
        && b2[2] == b'/'
    {
        return 3;
    }
    if last_dirsep == 0 && b1[0] == b'/' && b2[0] == b'/' {
        return 1;
    }
    last_dirsep
}
