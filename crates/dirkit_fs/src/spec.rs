//! Option models, rule enums and the crate error type.

use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Pattern matching mode for the entry exclusion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumExcludePatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Entry name starts with the pattern string.
    LiteralPrefix,
}

/// How `copy_file` materializes the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFileLinkMode {
    /// Copy file contents.
    None,
    /// Create a hard link, falling back to a content copy on failure.
    Hard,
    /// Create a symbolic link pointing at the source path.
    Symbolic,
}

impl EnumCopyFileLinkMode {
    pub(crate) fn action_label(self) -> &'static str {
        match self {
            Self::None => "copying",
            Self::Hard => "hard linking",
            Self::Symbolic => "symbolically linking",
        }
    }
}

/// Error classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDirUtilErrorKind {
    /// A call precondition was violated.
    InvalidArgument,
    /// An OS-level filesystem operation failed.
    FileOperation,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Default permission bits for newly created directories.
pub const N_MODE_DIR_DEFAULT: u32 = 0o777;

/// Default exclusion list: NFS silly-rename files left behind for entries
/// that were deleted while still open elsewhere.
pub const C_PATTERN_EXCLUDE_NFS: &str = ".nfs*";

/// Input options for `mkpath` and `create_tree`.
#[derive(Debug, Clone)]
pub struct SpecMkpathOptions {
    /// Permission bits for each created level (Unix only).
    pub mode: u32,
    /// Log each created level when `>= 1`.
    pub verbose: u8,
    /// Do not mutate filesystem; still record levels in the cache.
    pub if_dry_run: bool,
}

impl Default for SpecMkpathOptions {
    fn default() -> Self {
        Self {
            mode: N_MODE_DIR_DEFAULT,
            verbose: 1,
            if_dry_run: false,
        }
    }
}

/// Input options for `copy_file`.
#[derive(Debug, Clone)]
pub struct SpecCopyFileOptions {
    /// Copy permission bits (and Linux xattrs) from source.
    pub if_preserve_mode: bool,
    /// Copy access/modification times from source.
    pub if_preserve_times: bool,
    /// Skip when destination exists and is not older than source.
    pub if_update: bool,
    /// Copy, hard-link or symlink.
    pub rule_link: EnumCopyFileLinkMode,
    /// Log the copy action when `>= 1`.
    pub verbose: u8,
    /// Do not mutate filesystem.
    pub if_dry_run: bool,
}

impl Default for SpecCopyFileOptions {
    fn default() -> Self {
        Self {
            if_preserve_mode: true,
            if_preserve_times: true,
            if_update: false,
            rule_link: EnumCopyFileLinkMode::None,
            verbose: 1,
            if_dry_run: false,
        }
    }
}

/// Input options for `copy_tree`.
#[derive(Debug, Clone)]
pub struct SpecCopyTreeOptions {
    /// See [`SpecCopyFileOptions::if_preserve_mode`]. Regular files only.
    pub if_preserve_mode: bool,
    /// See [`SpecCopyFileOptions::if_preserve_times`]. Regular files only.
    pub if_preserve_times: bool,
    /// Recreate symlinks as symlinks instead of copying their targets.
    pub if_preserve_symlinks: bool,
    /// See [`SpecCopyFileOptions::if_update`].
    pub if_update: bool,
    /// Log created directories, links and copies when `>= 1`.
    pub verbose: u8,
    /// Do not mutate filesystem; report the same outputs.
    pub if_dry_run: bool,
    /// Entry-name patterns that are never copied nor reported.
    pub patterns_exclude: Vec<String>,
    /// Interpretation of `patterns_exclude`.
    pub rule_pattern: EnumExcludePatternMode,
}

impl Default for SpecCopyTreeOptions {
    fn default() -> Self {
        Self {
            if_preserve_mode: true,
            if_preserve_times: true,
            if_preserve_symlinks: false,
            if_update: false,
            verbose: 1,
            if_dry_run: false,
            patterns_exclude: vec![C_PATTERN_EXCLUDE_NFS.to_string()],
            rule_pattern: EnumExcludePatternMode::Glob,
        }
    }
}

impl SpecCopyTreeOptions {
    /// Per-file options forwarded to `copy_file` (never links).
    pub(crate) fn to_copy_file_options(&self) -> SpecCopyFileOptions {
        SpecCopyFileOptions {
            if_preserve_mode: self.if_preserve_mode,
            if_preserve_times: self.if_preserve_times,
            if_update: self.if_update,
            rule_link: EnumCopyFileLinkMode::None,
            verbose: self.verbose,
            if_dry_run: self.if_dry_run,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failures raised by directory and file operations.
#[derive(Debug, thiserror::Error)]
pub enum DirUtilError {
    /// Precondition violation (e.g. path with an interior NUL byte).
    #[error("{0}")]
    InvalidArgument(String),
    /// Exclusion pattern failed to compile.
    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(String),
    /// `copy_tree` source exists but is not a directory.
    #[error("cannot copy tree '{}': not a directory", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Directory listing failed.
    #[error("error listing files in '{}': {message}", .path.display())]
    ListDirectoryFailed {
        /// Directory that could not be listed.
        path: PathBuf,
        /// Underlying OS error text.
        message: String,
    },
    /// Single-level directory creation failed.
    #[error("could not create '{}': {message}", .path.display())]
    CreateDirectoryFailed {
        /// Directory level that could not be created.
        path: PathBuf,
        /// Underlying OS error text.
        message: String,
    },
    /// Reading a symlink target failed.
    #[error("could not read link '{}': {message}", .path.display())]
    ReadSymlinkFailed {
        /// Source symlink path.
        path: PathBuf,
        /// Underlying OS error text.
        message: String,
    },
    /// Creating a symlink failed.
    #[error("could not create link '{}': {message}", .path.display())]
    CreateSymlinkFailed {
        /// Destination link path.
        path: PathBuf,
        /// Underlying OS error text.
        message: String,
    },
    /// `copy_file` source is missing or not a regular file.
    #[error("can't copy '{}': doesn't exist or not a regular file", .0.display())]
    SourceNotRegularFile(PathBuf),
    /// `newer` source does not exist.
    #[error("file '{}' does not exist", .0.display())]
    SourceMissing(PathBuf),
    /// Content copy failed.
    #[error("could not copy '{}' to '{}': {message}", .source_path.display(), .destination.display())]
    CopyFileFailed {
        /// Source file.
        source_path: PathBuf,
        /// Destination file.
        destination: PathBuf,
        /// Underlying OS error text.
        message: String,
    },
    /// Applying mode/times to the destination failed.
    #[error("could not apply metadata to '{}': {message}", .path.display())]
    ApplyMetadataFailed {
        /// Destination file.
        path: PathBuf,
        /// Underlying OS error text.
        message: String,
    },
}

impl DirUtilError {
    /// Coarse classification of this error.
    pub fn kind(&self) -> EnumDirUtilErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::InvalidPattern(_) => {
                EnumDirUtilErrorKind::InvalidArgument
            }
            _ => EnumDirUtilErrorKind::FileOperation,
        }
    }

    /// Offending path, when the error is path-scoped.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::InvalidArgument(_) | Self::InvalidPattern(_) => None,
            Self::SourceNotDirectory(path)
            | Self::SourceNotRegularFile(path)
            | Self::SourceMissing(path) => Some(path),
            Self::ListDirectoryFailed { path, .. }
            | Self::CreateDirectoryFailed { path, .. }
            | Self::ReadSymlinkFailed { path, .. }
            | Self::CreateSymlinkFailed { path, .. }
            | Self::ApplyMetadataFailed { path, .. } => Some(path),
            Self::CopyFileFailed { destination, .. } => Some(destination),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{DirUtilError, EnumDirUtilErrorKind, SpecCopyTreeOptions};

    #[test]
    fn copy_tree_options_exclude_nfs_by_default() {
        let spec_options = SpecCopyTreeOptions::default();
        assert_eq!(spec_options.patterns_exclude, vec![".nfs*".to_string()]);
        assert!(!spec_options.if_preserve_symlinks);
    }

    #[test]
    fn error_kind_separates_argument_and_file_failures() {
        let err = DirUtilError::InvalidArgument("bad".to_string());
        assert_eq!(err.kind(), EnumDirUtilErrorKind::InvalidArgument);
        assert!(err.path().is_none());

        let err = DirUtilError::CreateDirectoryFailed {
            path: PathBuf::from("a/b"),
            message: "Permission denied".to_string(),
        };
        assert_eq!(err.kind(), EnumDirUtilErrorKind::FileOperation);
        assert_eq!(err.path(), Some(Path::new("a/b")));
        assert_eq!(err.to_string(), "could not create 'a/b': Permission denied");
    }
}
