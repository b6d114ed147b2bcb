use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{DirUtilError, EnumExcludePatternMode};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum SpecExcludePatterns {
    LiteralPrefix(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl SpecExcludePatterns {
    /// Compile the raw pattern list. An empty list disables exclusion.
    pub(crate) fn from_raw(
        patterns: &[String],
        rule_pattern: EnumExcludePatternMode,
    ) -> Result<Option<Self>, DirUtilError> {
        if patterns.is_empty() {
            return Ok(None);
        }

        match rule_pattern {
            EnumExcludePatternMode::LiteralPrefix => {
                Ok(Some(Self::LiteralPrefix(patterns.to_vec())))
            }
            EnumExcludePatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| DirUtilError::InvalidPattern(e.to_string()))?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                Ok(Some(Self::Glob(l_glob)))
            }
            EnumExcludePatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let regex = Regex::new(pattern)
                        .map_err(|e| DirUtilError::InvalidPattern(e.to_string()))?;
                    l_regex.push(regex);
                }
                Ok(Some(Self::Regex(l_regex)))
            }
        }
    }

    pub(crate) fn is_excluded(&self, name: &str) -> bool {
        match self {
            Self::LiteralPrefix(v) => v.iter().any(|p| name.starts_with(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(name)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(name)),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Lexical normalization: drops `.`, folds `name/..`, strips trailing
/// separators. Leading `..` on relative paths is kept; `..` at the root is
/// dropped. Returns an empty path for the current directory.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut path_norm = PathBuf::new();
    let mut n_parts_poppable = 0_usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => path_norm.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if n_parts_poppable > 0 {
                    path_norm.pop();
                    n_parts_poppable -= 1;
                } else if !path_norm.has_root() {
                    path_norm.push("..");
                }
            }
            Component::Normal(part) => {
                path_norm.push(part);
                n_parts_poppable += 1;
            }
        }
    }
    path_norm
}

/// Absolute, lexically normalized form used as the creation-cache key.
pub(crate) fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path);
    }
    let path_cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    normalize_path(&path_cwd.join(path))
}

pub(crate) fn validate_path_argument(path: &Path, c_arg_name: &str) -> Result<(), DirUtilError> {
    if path.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(DirUtilError::InvalidArgument(format!(
            "'{c_arg_name}' must be a path without NUL bytes (got {path:?})"
        )));
    }
    Ok(())
}

/// Whether two existing paths refer to the same filesystem object.
pub(crate) fn is_same_file(path_a: &Path, path_b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (fs::metadata(path_a), fs::metadata(path_b)) {
            (Ok(stat_a), Ok(stat_b)) => {
                stat_a.dev() == stat_b.dev() && stat_a.ino() == stat_b.ino()
            }
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (fs::canonicalize(path_a), fs::canonicalize(path_b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LinksAndMetadata

/// Create `path_dst` as a symbolic link whose content is `target`.
///
/// `if_target_dir` only matters on Windows, where file and directory links
/// are distinct kinds.
pub(crate) fn create_symbolic_link(
    target: &Path,
    path_dst: &Path,
    if_target_dir: bool,
) -> Result<(), io::Error> {
    #[cfg(unix)]
    {
        let _ = if_target_dir;
        std::os::unix::fs::symlink(target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if if_target_dir {
            symlink_dir(target, path_dst)
        } else {
            symlink_file(target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_dst, if_target_dir);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// Copy times and/or permission bits from `path_file_src` onto
/// `path_file_dst`. With `if_preserve_mode` on Linux, extended attributes
/// are copied best-effort as well.
pub(crate) fn apply_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_mode: bool,
    if_preserve_times: bool,
) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    if !if_preserve_mode && !if_preserve_times {
        return Ok(());
    }

    let stat_src = fs::metadata(path_file_src)?;
    if if_preserve_times {
        let file_time_access = FileTime::from_last_access_time(&stat_src);
        let file_time_modify = FileTime::from_last_modification_time(&stat_src);
        set_file_times(path_file_dst, file_time_access, file_time_modify)?;
    }
    if if_preserve_mode {
        fs::set_permissions(path_file_dst, stat_src.permissions())?;
        #[cfg(target_os = "linux")]
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            log::debug!(
                "skipping xattr {:?} on {} ({e})",
                name,
                path_file_dst.display()
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{SpecExcludePatterns, absolutize_path, normalize_path, validate_path_argument};
    use crate::spec::{DirUtilError, EnumExcludePatternMode};

    #[test]
    fn normalize_path_folds_dots_and_trailing_separators() {
        assert_eq!(normalize_path(Path::new("a/./b/../c/")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::new());
        assert_eq!(normalize_path(Path::new("")), PathBuf::new());
        assert_eq!(normalize_path(Path::new("../x/../y")), PathBuf::from("../y"));
        assert_eq!(normalize_path(Path::new("a/../..")), PathBuf::from(".."));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_path_keeps_root() {
        assert_eq!(normalize_path(Path::new("/../a//b/")), PathBuf::from("/a/b"));
        assert_eq!(normalize_path(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn absolutize_path_is_absolute_and_normalized() {
        let path_abs = absolutize_path(Path::new("x/./y/.."));
        assert!(path_abs.is_absolute());
        assert!(path_abs.ends_with("x"));
    }

    #[test]
    fn exclude_patterns_cover_all_modes() {
        let l_glob = vec![".nfs*".to_string()];
        let pats = SpecExcludePatterns::from_raw(&l_glob, EnumExcludePatternMode::Glob)
            .expect("compile glob")
            .expect("non-empty");
        assert!(pats.is_excluded(".nfs000000001"));
        assert!(!pats.is_excluded("data.nfs"));

        let l_regex = vec![r"^\.nfs[0-9a-f]+$".to_string()];
        let pats = SpecExcludePatterns::from_raw(&l_regex, EnumExcludePatternMode::Regex)
            .expect("compile regex")
            .expect("non-empty");
        assert!(pats.is_excluded(".nfs00ab"));
        assert!(!pats.is_excluded(".nfsx"));

        let l_prefix = vec![".nfs".to_string()];
        let pats = SpecExcludePatterns::from_raw(&l_prefix, EnumExcludePatternMode::LiteralPrefix)
            .expect("literal")
            .expect("non-empty");
        assert!(pats.is_excluded(".nfs1"));
        assert!(!pats.is_excluded("x.nfs1"));
    }

    #[test]
    fn exclude_patterns_empty_disables_and_invalid_rejected() {
        let pats = SpecExcludePatterns::from_raw(&[], EnumExcludePatternMode::Glob).expect("empty");
        assert!(pats.is_none());

        let err = SpecExcludePatterns::from_raw(&["(".to_string()], EnumExcludePatternMode::Regex)
            .expect_err("invalid regex must fail");
        assert!(matches!(err, DirUtilError::InvalidPattern(_)));

        let err = SpecExcludePatterns::from_raw(&["[".to_string()], EnumExcludePatternMode::Glob)
            .expect_err("invalid glob must fail");
        assert!(matches!(err, DirUtilError::InvalidPattern(_)));
    }

    #[cfg(unix)]
    #[test]
    fn validate_path_argument_rejects_nul() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path_bad = Path::new(OsStr::from_bytes(b"a\0b"));
        let err = validate_path_argument(path_bad, "name").expect_err("nul must fail");
        assert!(matches!(err, DirUtilError::InvalidArgument(_)));
        assert!(validate_path_argument(Path::new("a/b"), "name").is_ok());
    }
}
