//! `dirkit_fs` v1:
//! Directory utilities for build/packaging helpers.
//!
//! Modules:
//! - `mkpath` : recursive directory creation + creation cache
//! - `copy`   : recursive directory-tree copy
//! - `file`   : single-file copy primitive
//! - `tree`   : create/remove whole trees
//! - `spec`   : enums/options/errors
//! - `report` : run-time report models
//! - `util`   : shared helper functions
//!
//! Every operation logs through the `log` facade; installing a logger is left
//! to the host program.

pub mod copy;
pub mod file;
pub mod mkpath;
pub mod report;
pub mod spec;
pub mod tree;
mod util;

#[cfg(test)]
mod test_support;

pub use copy::copy_tree;
pub use file::{copy_file, newer};
pub use mkpath::{PathCreationCache, mkpath};
pub use report::{ReportCopyTree, ReportRemoveTree};
pub use spec::{
    C_PATTERN_EXCLUDE_NFS, DirUtilError, EnumCopyFileLinkMode, EnumDirUtilErrorKind,
    EnumExcludePatternMode, N_MODE_DIR_DEFAULT, SpecCopyFileOptions, SpecCopyTreeOptions,
    SpecMkpathOptions,
};
pub use tree::{create_tree, ensure_relative, remove_tree};
