//! Recursive directory creation with a shared creation cache.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::spec::{DirUtilError, SpecMkpathOptions};
use crate::util::{absolutize_path, normalize_path, validate_path_argument};

/// Set of absolute directory paths already ensured by `mkpath`.
///
/// Entries are added when a level is created or confirmed (also under
/// dry-run) and removed only by `remove_tree`. Cheap to share by reference
/// across threads.
#[derive(Debug, Default)]
pub struct PathCreationCache {
    set_paths_ensured: Mutex<HashSet<PathBuf>>,
}

impl PathCreationCache {
    /// Empty, isolated cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache instance.
    pub fn global() -> &'static PathCreationCache {
        static CACHE_GLOBAL: OnceLock<PathCreationCache> = OnceLock::new();
        CACHE_GLOBAL.get_or_init(PathCreationCache::new)
    }

    /// Whether the absolute form of `path` is cached.
    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.lock().contains(&absolutize_path(path.as_ref()))
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no path is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn contains_abs(&self, path_abs: &Path) -> bool {
        self.lock().contains(path_abs)
    }

    pub(crate) fn insert_abs(&self, path_abs: PathBuf) {
        self.lock().insert(path_abs);
    }

    pub(crate) fn remove_abs(&self, path_abs: &Path) {
        self.lock().remove(path_abs);
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // The set holds no cross-entry invariant, so a poisoned guard is usable.
        self.set_paths_ensured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create directory `path` and any missing ancestors.
///
/// Returns the levels this call created, shallowest first. Nothing is
/// returned under dry-run, when the path already exists, or when `path` is
/// empty (the current directory). A level that fails to be created but turns
/// out to be a directory (lost race with another creator) counts as ensured.
pub fn mkpath<P: AsRef<Path>>(
    path: P,
    spec_mk_options: &SpecMkpathOptions,
    cache: &PathCreationCache,
) -> Result<Vec<PathBuf>, DirUtilError> {
    let path_raw = path.as_ref();
    validate_path_argument(path_raw, "name")?;

    let path_norm = normalize_path(path_raw);
    let mut l_dirs_created: Vec<PathBuf> = Vec::new();
    if path_norm.as_os_str().is_empty() || path_norm.is_dir() {
        return Ok(l_dirs_created);
    }
    if cache.contains_abs(&absolutize_path(&path_norm)) {
        return Ok(l_dirs_created);
    }

    // Peel trailing segments until `path_head` is an existing directory.
    let mut l_tails: Vec<OsString> = Vec::new();
    let mut path_head = path_norm;
    while let Some(name_tail) = path_head.file_name().map(|v| v.to_os_string()) {
        l_tails.push(name_tail);
        path_head.pop();
        if path_head.as_os_str().is_empty() || path_head.is_dir() {
            break;
        }
    }

    for name_tail in l_tails.into_iter().rev() {
        path_head.push(name_tail);
        let path_head_abs = absolutize_path(&path_head);
        if cache.contains_abs(&path_head_abs) {
            continue;
        }

        if spec_mk_options.verbose >= 1 {
            log::info!("creating {}", path_head.display());
        }

        if !spec_mk_options.if_dry_run {
            match create_dir_level(&path_head, spec_mk_options.mode) {
                Ok(()) => l_dirs_created.push(path_head.clone()),
                Err(_) if path_head.is_dir() => {}
                Err(e) => {
                    return Err(DirUtilError::CreateDirectoryFailed {
                        path: path_head,
                        message: e.to_string(),
                    });
                }
            }
        }

        cache.insert_abs(path_head_abs);
    }
    Ok(l_dirs_created)
}

fn create_dir_level(path_dir: &Path, mode: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().mode(mode).create(path_dir)
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
        fs::DirBuilder::new().create(path_dir)
    }
}
