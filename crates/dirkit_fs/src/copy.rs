//! Recursive directory-tree copy.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::file::copy_file;
use crate::mkpath::{PathCreationCache, mkpath};
use crate::report::{ReportCopyTree, ReportCopyTreeBuilder};
use crate::spec::{DirUtilError, SpecCopyFileOptions, SpecCopyTreeOptions, SpecMkpathOptions};
use crate::util::{SpecExcludePatterns, create_symbolic_link, validate_path_argument};

#[derive(Debug)]
struct SpecCopyContext<'a> {
    spec_cp_options: &'a SpecCopyTreeOptions,
    spec_cp_file_options: SpecCopyFileOptions,
    spec_mk_options: SpecMkpathOptions,
    spec_exclude_pats: Option<SpecExcludePatterns>,
    cache: &'a PathCreationCache,
    builder_cp_report: ReportCopyTreeBuilder,
}

/// Copy every file and subdirectory of `dir_source` into `dir_destination`.
///
/// The destination root is created with [`mkpath`] when missing. For each
/// source entry, in listing order:
/// - names matching `patterns_exclude` are skipped,
/// - symlinks are recreated as links when `if_preserve_symlinks` is set,
/// - directories (including followed symlinks) are copied recursively,
/// - everything else goes through [`copy_file`].
///
/// [`ReportCopyTree::outputs`] lists the destination of every file and
/// symlink, whether or not it was actually written (dry-run, update).
/// Directories are not listed.
///
/// Errors from any entry abort the walk immediately; whatever was already
/// copied stays on disk. Under dry-run a missing source is treated as
/// empty, and entries that cannot be read are skipped.
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: &SpecCopyTreeOptions,
    cache: &PathCreationCache,
) -> Result<ReportCopyTree, DirUtilError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref();
    let path_dir_dst = dir_destination.as_ref();
    validate_path_argument(path_dir_src, "src")?;
    validate_path_argument(path_dir_dst, "dst")?;

    let spec_exclude_pats = SpecExcludePatterns::from_raw(
        &spec_cp_options.patterns_exclude,
        spec_cp_options.rule_pattern,
    )?;

    let mut spec_cp_ctx = SpecCopyContext {
        spec_cp_options,
        spec_cp_file_options: spec_cp_options.to_copy_file_options(),
        spec_mk_options: SpecMkpathOptions {
            verbose: spec_cp_options.verbose,
            ..SpecMkpathOptions::default()
        },
        spec_exclude_pats,
        cache,
        builder_cp_report: ReportCopyTreeBuilder::default(),
    };

    walk_directory(path_dir_src, path_dir_dst, &mut spec_cp_ctx)?;
    Ok(spec_cp_ctx.builder_cp_report.build())
}

fn list_directory(
    path_dir_src: &Path,
    if_dry_run: bool,
) -> Result<Vec<(PathBuf, OsString, fs::FileType)>, DirUtilError> {
    if !if_dry_run && !path_dir_src.is_dir() && path_dir_src.exists() {
        return Err(DirUtilError::SourceNotDirectory(path_dir_src.to_path_buf()));
    }

    let iter_entries = match fs::read_dir(path_dir_src) {
        Ok(iter) => iter,
        Err(_) if if_dry_run => return Ok(Vec::new()),
        Err(e) => return Err(to_list_error(path_dir_src, e)),
    };

    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        let Some(entry) = keep_listed(path_dir_src, entry_res, if_dry_run)? else {
            continue;
        };
        let Some(cfg_file_type) = keep_listed(path_dir_src, entry.file_type(), if_dry_run)?
        else {
            continue;
        };
        l_entries.push((entry.path(), entry.file_name(), cfg_file_type));
    }
    Ok(l_entries)
}

fn to_list_error(path_dir_src: &Path, e: io::Error) -> DirUtilError {
    DirUtilError::ListDirectoryFailed {
        path: path_dir_src.to_path_buf(),
        message: e.to_string(),
    }
}

/// Per-entry listing failures drop only that entry under dry-run.
fn keep_listed<T>(
    path_dir_src: &Path,
    res: io::Result<T>,
    if_dry_run: bool,
) -> Result<Option<T>, DirUtilError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if if_dry_run => {
            log::debug!("skipping unreadable entry in {} ({e})", path_dir_src.display());
            Ok(None)
        }
        Err(e) => Err(to_list_error(path_dir_src, e)),
    }
}

fn walk_directory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<(), DirUtilError> {
    let if_dry_run = spec_cp_ctx.spec_cp_options.if_dry_run;
    let l_entries = list_directory(path_dir_src, if_dry_run)?;

    if !if_dry_run {
        let l_dirs_created =
            mkpath(path_dir_dst, &spec_cp_ctx.spec_mk_options, spec_cp_ctx.cache)?;
        spec_cp_ctx
            .builder_cp_report
            .add_dirs_created(l_dirs_created.len());
    }

    for (path_entry_src, name_entry, cfg_file_type) in l_entries {
        if let Some(spec_exclude_pats) = &spec_cp_ctx.spec_exclude_pats
            && spec_exclude_pats.is_excluded(&name_entry.to_string_lossy())
        {
            log::debug!("skipping excluded entry {}", path_entry_src.display());
            spec_cp_ctx.builder_cp_report.add_excluded();
            continue;
        }

        let path_entry_dst = path_dir_dst.join(&name_entry);
        if spec_cp_ctx.spec_cp_options.if_preserve_symlinks && cfg_file_type.is_symlink() {
            copy_symlink_entry(&path_entry_src, path_entry_dst, spec_cp_ctx)?;
        } else if path_entry_src.is_dir() {
            walk_directory(&path_entry_src, &path_entry_dst, spec_cp_ctx)?;
        } else {
            let (_, b_copied) = copy_file(
                &path_entry_src,
                &path_entry_dst,
                &spec_cp_ctx.spec_cp_file_options,
            )?;
            spec_cp_ctx
                .builder_cp_report
                .add_file(path_entry_dst, b_copied);
        }
    }
    Ok(())
}

fn copy_symlink_entry(
    path_link_src: &Path,
    path_link_dst: PathBuf,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<(), DirUtilError> {
    let target = fs::read_link(path_link_src).map_err(|e| DirUtilError::ReadSymlinkFailed {
        path: path_link_src.to_path_buf(),
        message: e.to_string(),
    })?;

    if spec_cp_ctx.spec_cp_options.verbose >= 1 {
        log::info!(
            "linking {} -> {}",
            path_link_dst.display(),
            target.display()
        );
    }
    if !spec_cp_ctx.spec_cp_options.if_dry_run {
        create_symbolic_link(&target, &path_link_dst, path_link_src.is_dir()).map_err(|e| {
            DirUtilError::CreateSymlinkFailed {
                path: path_link_dst.clone(),
                message: e.to_string(),
            }
        })?;
    }
    spec_cp_ctx.builder_cp_report.add_symlink(path_link_dst);
    Ok(())
}
