//! Traits intended for glob import.
//!
//! ```
//! use libtreedelta::prelude::*;
//! ```

pub use crate::delta::{DeltaSink, Editor};
pub use crate::tree::{Directory, DirectoryExt, File};
