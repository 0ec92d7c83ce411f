//! Path module: the canonical path algebra.
//!
//! Three string newtypes cover the path flavors the engine deals in:
//! [`Dirent`] for local filesystem paths, [`Relpath`] for slash-separated
//! relative paths, and [`Url`]. Construction canonicalizes, so holding one
//! of these types is holding the canonical form; the rest of the crate
//! relies on that contract. Platform-dependent rules (drive letters, UNC
//! shares, `\` separators) live behind one internal style switch.

mod condense;
mod dirent;
mod internal;
mod relpath;
mod url;

pub use self::{condense::*, dirent::*, relpath::*, url::*};

#[cfg(test)]
mod tests {
    use super::internal::{
        Style, canonicalize_dirent, canonicalize_relpath, canonicalize_url, dirent_is_canonical,
        relpath_is_canonical, url_is_canonical,
    };
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    const PIECES: &[&str] = &[
        "/", "//", "a", "b", "foo", ".", "..", ":", "\\", "c:", "C:", "%7e", "%7E", "%2f", "%",
        "http://", "HTTP://", "file://", "host", "@", "a b", "~", "Ex.COM",
    ];

    fn arbitrary_path(rng: &mut impl Rng) -> String {
        let count = rng.gen_range(0..6);
        let mut s = String::new();
        for _ in 0..count {
            s.push_str(PIECES[rng.gen_range(0..PIECES.len())]);
        }
        s
    }

    /// Canonicalization is idempotent and `is_canonical` is exactly its
    /// fixed-point predicate, for every kind and style.
    #[test]
    fn canonicalize_properties() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x747265_65);
        for _ in 0..4000 {
            let s = arbitrary_path(&mut rng);
            for style in [Style::Posix, Style::Dos] {
                let c = canonicalize_dirent(style, &s);
                assert_eq!(c, canonicalize_dirent(style, &c), "dirent {style:?} {s:?}");
                assert!(dirent_is_canonical(style, &c), "dirent {style:?} {s:?}");
                assert_eq!(
                    dirent_is_canonical(style, &s),
                    c == s,
                    "dirent fixed point {style:?} {s:?}"
                );

                let c = canonicalize_url(style, &s);
                assert_eq!(c, canonicalize_url(style, &c), "url {style:?} {s:?}");
                assert!(url_is_canonical(style, &c), "url {style:?} {s:?}");
                assert_eq!(
                    url_is_canonical(style, &s),
                    c == s,
                    "url fixed point {style:?} {s:?}"
                );
            }
            let c = canonicalize_relpath(&s);
            assert_eq!(c, canonicalize_relpath(&c), "relpath {s:?}");
            assert!(relpath_is_canonical(&c), "relpath {s:?}");
            assert_eq!(relpath_is_canonical(&s), c == s, "relpath fixed point {s:?}");
        }
    }
}
