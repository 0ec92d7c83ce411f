//! A library for computing deltas between versioned directory trees
//!
//! Given two snapshots of a content-addressed tree — a source and a
//! target — this library produces the stream of edit operations that turn
//! the one into the other, delivered through a caller-supplied [`Editor`].
//! Both trees are read through streaming interfaces and never need to be
//! fully resident in memory; file contents travel as bounded text-delta
//! windows. The path algebra the engine is built on ([`Dirent`],
//! [`Relpath`], [`Url`]) is part of the public surface, canonical form
//! included.

#![doc(html_root_url = "https://docs.rs/libtreedelta/0.3.0")]
#![deny(missing_docs)]
pub(crate) mod delta;
pub(crate) mod error;
pub(crate) mod path;
pub mod prelude;
pub(crate) mod tree;

pub use delta::*;
pub use error::*;
pub use path::*;
pub use tree::*;
