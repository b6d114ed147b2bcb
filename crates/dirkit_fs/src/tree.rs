//! Whole-tree helpers built on top of `mkpath`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::mkpath::{PathCreationCache, mkpath};
use crate::report::ReportRemoveTree;
use crate::spec::{DirUtilError, SpecMkpathOptions};
use crate::util::{absolutize_path, validate_path_argument};

/// Ensure the parent directory of every `base_dir/file` exists.
///
/// Parents are deduplicated and created in sorted order. Returns every level
/// created across all `mkpath` calls.
pub fn create_tree<P, I, F>(
    base_dir: P,
    files: I,
    spec_mk_options: &SpecMkpathOptions,
    cache: &PathCreationCache,
) -> Result<Vec<PathBuf>, DirUtilError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = F>,
    F: AsRef<Path>,
{
    let path_dir_base = base_dir.as_ref();
    validate_path_argument(path_dir_base, "base_dir")?;

    let mut set_dirs_needed: BTreeSet<PathBuf> = BTreeSet::new();
    for file in files {
        let path_file = path_dir_base.join(file.as_ref());
        if let Some(path_parent) = path_file.parent() {
            set_dirs_needed.insert(path_parent.to_path_buf());
        }
    }

    let mut l_dirs_created = Vec::new();
    for path_dir in set_dirs_needed {
        l_dirs_created.extend(mkpath(&path_dir, spec_mk_options, cache)?);
    }
    Ok(l_dirs_created)
}

#[derive(Debug)]
enum EnumRemoveAction {
    File(PathBuf),
    Dir(PathBuf),
}

/// Recursively delete `directory` and everything under it.
///
/// Symlinks are removed, never followed. Entries that cannot be listed or
/// removed are logged and recorded in [`ReportRemoveTree::warnings`]; the
/// walk continues past them. Every removed directory is evicted from
/// `cache` so a later `mkpath` recreates it.
pub fn remove_tree<P: AsRef<Path>>(
    directory: P,
    verbose: u8,
    if_dry_run: bool,
    cache: &PathCreationCache,
) -> Result<ReportRemoveTree, DirUtilError> {
    let path_dir_root = directory.as_ref();
    validate_path_argument(path_dir_root, "directory")?;

    if verbose >= 1 {
        log::info!(
            "removing '{}' (and everything under it)",
            path_dir_root.display()
        );
    }
    let mut report = ReportRemoveTree::default();
    if if_dry_run {
        return Ok(report);
    }

    let mut l_actions: Vec<EnumRemoveAction> = Vec::new();
    collect_remove_actions(path_dir_root, &mut l_actions, &mut report);

    for action in l_actions {
        match action {
            EnumRemoveAction::File(path_file) => match fs::remove_file(&path_file) {
                Ok(()) => report.cnt_files_removed += 1,
                Err(e) => add_remove_warning(&mut report, &path_file, &e),
            },
            EnumRemoveAction::Dir(path_dir) => match fs::remove_dir(&path_dir) {
                Ok(()) => {
                    report.cnt_dirs_removed += 1;
                    cache.remove_abs(&absolutize_path(&path_dir));
                }
                Err(e) => add_remove_warning(&mut report, &path_dir, &e),
            },
        }
    }
    Ok(report)
}

/// Post-order: children are queued before their parent directory.
fn collect_remove_actions(
    path_dir: &Path,
    l_actions: &mut Vec<EnumRemoveAction>,
    report: &mut ReportRemoveTree,
) {
    let iter_entries = match fs::read_dir(path_dir) {
        Ok(iter) => iter,
        Err(e) => {
            add_remove_warning(report, path_dir, &e);
            return;
        }
    };

    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                add_remove_warning(report, path_dir, &e);
                continue;
            }
        };
        let path_entry = entry.path();
        match entry.file_type() {
            Ok(cfg_file_type) if cfg_file_type.is_dir() => {
                collect_remove_actions(&path_entry, l_actions, report);
            }
            Ok(_) => l_actions.push(EnumRemoveAction::File(path_entry)),
            Err(e) => add_remove_warning(report, &path_entry, &e),
        }
    }
    l_actions.push(EnumRemoveAction::Dir(path_dir.to_path_buf()));
}

fn add_remove_warning(report: &mut ReportRemoveTree, path: &Path, e: &std::io::Error) {
    let c_warning = format!("error removing {}: {e}", path.display());
    log::warn!("{c_warning}");
    report.warnings.push(c_warning);
}

/// Strip any drive prefix and root so `path` can be joined under another
/// directory. Relative paths come back unchanged.
pub fn ensure_relative<P: AsRef<Path>>(path: P) -> PathBuf {
    path.as_ref()
        .components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{create_tree, ensure_relative, remove_tree};
    use crate::mkpath::{PathCreationCache, mkpath};
    use crate::spec::SpecMkpathOptions;
    use crate::test_support::{TestDir, init_logging, write_text};

    #[test]
    fn create_tree_creates_each_parent_once() {
        init_logging();
        let tmp = TestDir::new();
        let cache = PathCreationCache::new();
        let base = tmp.path().join("base");

        let l_created = create_tree(
            &base,
            ["pkg/a.py", "pkg/b.py", "pkg/sub/c.py", "top.py"],
            &SpecMkpathOptions::default(),
            &cache,
        )
        .expect("create tree");

        assert_eq!(
            l_created,
            vec![base.clone(), base.join("pkg"), base.join("pkg/sub")]
        );
        assert!(base.join("pkg/sub").is_dir());
        assert!(!base.join("top.py").exists());
    }

    #[test]
    fn create_tree_dry_run_creates_nothing() {
        let tmp = TestDir::new();
        let cache = PathCreationCache::new();
        let base = tmp.path().join("base");
        let spec_mk_options = SpecMkpathOptions {
            if_dry_run: true,
            ..SpecMkpathOptions::default()
        };

        let l_created =
            create_tree(&base, ["x/y.txt"], &spec_mk_options, &cache).expect("create tree");
        assert!(l_created.is_empty());
        assert!(!base.exists());
    }

    #[test]
    fn remove_tree_deletes_everything_and_evicts_cache() {
        init_logging();
        let tmp = TestDir::new();
        let cache = PathCreationCache::new();
        let root = tmp.path().join("root");
        let spec_mk_options = SpecMkpathOptions::default();

        mkpath(root.join("a/b"), &spec_mk_options, &cache).expect("mkpath");
        write_text(&root.join("a/b/f.txt"), "f");
        write_text(&root.join("g.txt"), "g");
        assert!(cache.contains(root.join("a/b")));

        let report = remove_tree(&root, 1, false, &cache).expect("remove tree");
        assert_eq!(report.cnt_files_removed, 2);
        assert_eq!(report.cnt_dirs_removed, 3);
        assert_eq!(report.warning_count(), 0);
        assert!(!root.exists());
        assert!(!cache.contains(&root));
        assert!(!cache.contains(root.join("a/b")));

        let l_created = mkpath(root.join("a/b"), &spec_mk_options, &cache).expect("recreate");
        assert_eq!(l_created.len(), 3);
        assert!(root.join("a/b").is_dir());
    }

    #[test]
    fn remove_tree_dry_run_keeps_files() {
        let tmp = TestDir::new();
        let root = tmp.path().join("root");
        write_text(&root.join("f.txt"), "f");

        let report =
            remove_tree(&root, 1, true, &PathCreationCache::new()).expect("dry run remove");
        assert_eq!(report.cnt_files_removed, 0);
        assert!(root.join("f.txt").exists());
    }

    #[test]
    fn remove_tree_missing_root_is_a_warning() {
        let tmp = TestDir::new();
        let report = remove_tree(tmp.path().join("gone"), 0, false, &PathCreationCache::new())
            .expect("missing root does not raise");
        assert_eq!(report.warning_count(), 1);
        assert!(report.warnings[0].starts_with("error removing"));
    }

    #[cfg(unix)]
    #[test]
    fn remove_tree_removes_symlink_without_following() {
        use std::os::unix::fs::symlink;

        let tmp = TestDir::new();
        let root = tmp.path().join("root");
        let outside = tmp.path().join("outside");
        write_text(&outside.join("keep.txt"), "k");
        std::fs::create_dir_all(&root).expect("mkdir");
        symlink(&outside, root.join("link")).expect("symlink");

        let report = remove_tree(&root, 0, false, &PathCreationCache::new()).expect("remove");
        assert_eq!(report.warning_count(), 0);
        assert!(!root.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[test]
    fn ensure_relative_strips_root() {
        assert_eq!(ensure_relative("a/b"), PathBuf::from("a/b"));
        #[cfg(unix)]
        assert_eq!(ensure_relative("/usr/lib/x"), PathBuf::from("usr/lib/x"));
        #[cfg(windows)]
        assert_eq!(ensure_relative(r"C:\tmp\x"), PathBuf::from(r"tmp\x"));
        assert_eq!(ensure_relative(Path::new("")), PathBuf::new());
    }
}
