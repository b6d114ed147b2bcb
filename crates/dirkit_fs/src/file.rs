//! Single-file copy primitive used for every leaf of a tree copy.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::spec::{DirUtilError, EnumCopyFileLinkMode, SpecCopyFileOptions};
use crate::util::{apply_metadata, create_symbolic_link, is_same_file, validate_path_argument};

/// Whether `path_source` was modified more recently than `path_target`.
///
/// A missing target counts as older. Equal timestamps are not newer.
pub fn newer<P, Q>(path_source: P, path_target: Q) -> Result<bool, DirUtilError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_source = path_source.as_ref();
    let path_target = path_target.as_ref();

    let stat_source = fs::metadata(path_source)
        .map_err(|_| DirUtilError::SourceMissing(path_source.to_path_buf()))?;
    let Ok(stat_target) = fs::metadata(path_target) else {
        return Ok(true);
    };
    Ok(FileTime::from_last_modification_time(&stat_source)
        > FileTime::from_last_modification_time(&stat_target))
}

/// Copy regular file `file_source` to `file_destination`.
///
/// When the destination is an existing directory the file lands inside it
/// under its own name. Returns the resolved destination and whether the file
/// was (or, under dry-run, would be) copied; `false` means it was skipped as
/// up-to-date.
pub fn copy_file<P, Q>(
    file_source: P,
    file_destination: Q,
    spec_cp_options: &SpecCopyFileOptions,
) -> Result<(PathBuf, bool), DirUtilError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_src = file_source.as_ref();
    validate_path_argument(path_file_src, "src")?;
    validate_path_argument(file_destination.as_ref(), "dst")?;

    if !path_file_src.is_file() {
        return Err(DirUtilError::SourceNotRegularFile(
            path_file_src.to_path_buf(),
        ));
    }

    let (path_file_dst, path_dir_dst) =
        resolve_destination(path_file_src, file_destination.as_ref());

    if spec_cp_options.if_update && !newer(path_file_src, &path_file_dst)? {
        log::debug!(
            "not copying {} (output up-to-date)",
            path_file_src.display()
        );
        return Ok((path_file_dst, false));
    }

    if spec_cp_options.verbose >= 1 {
        let c_action = spec_cp_options.rule_link.action_label();
        if path_file_dst.file_name() == path_file_src.file_name() {
            log::info!(
                "{c_action} {} -> {}",
                path_file_src.display(),
                path_dir_dst.display()
            );
        } else {
            log::info!(
                "{c_action} {} -> {}",
                path_file_src.display(),
                path_file_dst.display()
            );
        }
    }

    if spec_cp_options.if_dry_run {
        return Ok((path_file_dst, true));
    }

    let b_dst_is_same = path_file_dst.exists() && is_same_file(path_file_src, &path_file_dst);
    match spec_cp_options.rule_link {
        EnumCopyFileLinkMode::Hard if !b_dst_is_same => {
            // Cross-device or unsupported: fall through to a content copy.
            if fs::hard_link(path_file_src, &path_file_dst).is_ok() {
                return Ok((path_file_dst, true));
            }
        }
        EnumCopyFileLinkMode::Symbolic if !b_dst_is_same => {
            create_symbolic_link(path_file_src, &path_file_dst, false).map_err(|e| {
                DirUtilError::CreateSymlinkFailed {
                    path: path_file_dst.clone(),
                    message: e.to_string(),
                }
            })?;
            return Ok((path_file_dst, true));
        }
        EnumCopyFileLinkMode::Hard | EnumCopyFileLinkMode::Symbolic => {
            return Ok((path_file_dst, true));
        }
        EnumCopyFileLinkMode::None => {}
    }

    copy_file_contents(path_file_src, &path_file_dst)?;
    apply_metadata(
        path_file_src,
        &path_file_dst,
        spec_cp_options.if_preserve_mode,
        spec_cp_options.if_preserve_times,
    )
    .map_err(|e| DirUtilError::ApplyMetadataFailed {
        path: path_file_dst.clone(),
        message: e.to_string(),
    })?;

    Ok((path_file_dst, true))
}

/// Returns `(destination file, directory shown in log lines)`.
fn resolve_destination(path_file_src: &Path, path_dst: &Path) -> (PathBuf, PathBuf) {
    if path_dst.is_dir() {
        let path_file_dst = match path_file_src.file_name() {
            Some(name) => path_dst.join(name),
            None => path_dst.to_path_buf(),
        };
        return (path_file_dst, path_dst.to_path_buf());
    }
    let path_dir_dst = path_dst
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    (path_dst.to_path_buf(), path_dir_dst)
}

fn copy_file_contents(path_file_src: &Path, path_file_dst: &Path) -> Result<(), DirUtilError> {
    let to_error = |e: std::io::Error| DirUtilError::CopyFileFailed {
        source_path: path_file_src.to_path_buf(),
        destination: path_file_dst.to_path_buf(),
        message: e.to_string(),
    };

    // Replace rather than write through an existing entry (it may be a link).
    if fs::symlink_metadata(path_file_dst).is_ok() {
        fs::remove_file(path_file_dst).map_err(to_error)?;
    }
    fs::copy(path_file_src, path_file_dst).map_err(to_error)?;
    Ok(())
}
