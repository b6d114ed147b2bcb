use std::path::{Path, PathBuf};

use dirkit_fs::{
    C_PATTERN_EXCLUDE_NFS, DirUtilError, EnumCopyFileLinkMode, EnumDirUtilErrorKind,
    EnumExcludePatternMode, PathCreationCache, SpecCopyFileOptions, SpecCopyTreeOptions,
    SpecMkpathOptions, copy_file, copy_tree, create_tree, ensure_relative, mkpath, newer,
    remove_tree,
};
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyString;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "dirkit.fs.dir_util.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

create_exception!(_dirkit_fs_rs, DirUtilFileError, PyOSError);
create_exception!(_dirkit_fs_rs, DirUtilInternalError, PyException);

fn map_dir_util_error(exception: DirUtilError) -> PyErr {
    match exception.kind() {
        EnumDirUtilErrorKind::InvalidArgument => {
            DirUtilInternalError::new_err(exception.to_string())
        }
        EnumDirUtilErrorKind::FileOperation => DirUtilFileError::new_err(exception.to_string()),
    }
}

/// Accept `str` or `os.PathLike[str]`; anything else (notably `None`) is a
/// caller bug.
fn extract_path(value: &Bound<'_, PyAny>, c_func: &str, c_arg: &str) -> PyResult<PathBuf> {
    if value.is_instance_of::<PyString>() {
        return Ok(PathBuf::from(value.extract::<String>()?));
    }
    if value.hasattr("__fspath__")? {
        let value_fspath = value.call_method0("__fspath__")?;
        if value_fspath.is_instance_of::<PyString>() {
            return Ok(PathBuf::from(value_fspath.extract::<String>()?));
        }
    }
    Err(DirUtilInternalError::new_err(format!(
        "{c_func}: '{c_arg}' must be a string (got {})",
        value.repr()?
    )))
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn parse_rule_pattern(value: &str) -> PyResult<EnumExcludePatternMode> {
    match value {
        "glob" => Ok(EnumExcludePatternMode::Glob),
        "regex" => Ok(EnumExcludePatternMode::Regex),
        "prefix" => Ok(EnumExcludePatternMode::LiteralPrefix),
        _ => Err(PyValueError::new_err(format!(
            "Invalid pattern strategy: `{value}`. Expected one of: ['glob', 'regex', 'prefix']"
        ))),
    }
}

fn parse_rule_link(value: Option<&str>) -> PyResult<EnumCopyFileLinkMode> {
    match value {
        None => Ok(EnumCopyFileLinkMode::None),
        Some("hard") => Ok(EnumCopyFileLinkMode::Hard),
        Some("sym") => Ok(EnumCopyFileLinkMode::Symbolic),
        Some(other) => Err(PyValueError::new_err(format!(
            "invalid value '{other}' for 'link' argument. Expected one of: [None, 'hard', 'sym']"
        ))),
    }
}

#[pyfunction(name = "mkpath")]
#[pyo3(signature = (name, mode = 0o777, verbose = 1, dry_run = false))]
fn mkpath_py(
    py: Python<'_>,
    name: &Bound<'_, PyAny>,
    mode: u32,
    verbose: u8,
    dry_run: bool,
) -> PyResult<Vec<String>> {
    let path_target = extract_path(name, "mkpath", "name")?;
    let spec_mk_options = SpecMkpathOptions {
        mode,
        verbose,
        if_dry_run: dry_run,
    };

    let l_created = py
        .allow_threads(|| mkpath(&path_target, &spec_mk_options, PathCreationCache::global()))
        .map_err(map_dir_util_error)?;
    Ok(l_created.iter().map(|p| path_to_string(p)).collect())
}

#[pyfunction(name = "copy_tree")]
#[pyo3(signature = (
    src,
    dst,
    preserve_mode = true,
    preserve_times = true,
    preserve_symlinks = false,
    update = false,
    verbose = 1,
    dry_run = false,
    patterns_exclude = None,
    rule_pattern = "glob"
))]
#[allow(clippy::too_many_arguments)]
fn copy_tree_py(
    py: Python<'_>,
    src: &Bound<'_, PyAny>,
    dst: &Bound<'_, PyAny>,
    preserve_mode: bool,
    preserve_times: bool,
    preserve_symlinks: bool,
    update: bool,
    verbose: u8,
    dry_run: bool,
    patterns_exclude: Option<Vec<String>>,
    rule_pattern: &str,
) -> PyResult<Vec<String>> {
    let path_dir_src = extract_path(src, "copy_tree", "src")?;
    let path_dir_dst = extract_path(dst, "copy_tree", "dst")?;
    let spec_cp_options = SpecCopyTreeOptions {
        if_preserve_mode: preserve_mode,
        if_preserve_times: preserve_times,
        if_preserve_symlinks: preserve_symlinks,
        if_update: update,
        verbose,
        if_dry_run: dry_run,
        patterns_exclude: patterns_exclude
            .unwrap_or_else(|| vec![C_PATTERN_EXCLUDE_NFS.to_string()]),
        rule_pattern: parse_rule_pattern(rule_pattern)?,
    };

    let report_copy = py
        .allow_threads(|| {
            copy_tree(
                &path_dir_src,
                &path_dir_dst,
                &spec_cp_options,
                PathCreationCache::global(),
            )
        })
        .map_err(map_dir_util_error)?;
    Ok(report_copy
        .into_outputs()
        .iter()
        .map(|p| path_to_string(p))
        .collect())
}

#[pyfunction(name = "copy_file")]
#[pyo3(signature = (
    src,
    dst,
    preserve_mode = true,
    preserve_times = true,
    update = false,
    link = None,
    verbose = 1,
    dry_run = false
))]
#[allow(clippy::too_many_arguments)]
fn copy_file_py(
    py: Python<'_>,
    src: &Bound<'_, PyAny>,
    dst: &Bound<'_, PyAny>,
    preserve_mode: bool,
    preserve_times: bool,
    update: bool,
    link: Option<&str>,
    verbose: u8,
    dry_run: bool,
) -> PyResult<(String, bool)> {
    let path_file_src = extract_path(src, "copy_file", "src")?;
    let path_file_dst = extract_path(dst, "copy_file", "dst")?;
    let spec_cp_options = SpecCopyFileOptions {
        if_preserve_mode: preserve_mode,
        if_preserve_times: preserve_times,
        if_update: update,
        rule_link: parse_rule_link(link)?,
        verbose,
        if_dry_run: dry_run,
    };

    let (path_out, b_copied) = py
        .allow_threads(|| copy_file(&path_file_src, &path_file_dst, &spec_cp_options))
        .map_err(map_dir_util_error)?;
    Ok((path_to_string(&path_out), b_copied))
}

#[pyfunction(name = "newer")]
fn newer_py(
    py: Python<'_>,
    source: &Bound<'_, PyAny>,
    target: &Bound<'_, PyAny>,
) -> PyResult<bool> {
    let path_source = extract_path(source, "newer", "source")?;
    let path_target = extract_path(target, "newer", "target")?;
    py.allow_threads(|| newer(&path_source, &path_target))
        .map_err(map_dir_util_error)
}

#[pyfunction(name = "create_tree")]
#[pyo3(signature = (base_dir, files, mode = 0o777, verbose = 1, dry_run = false))]
fn create_tree_py(
    py: Python<'_>,
    base_dir: &Bound<'_, PyAny>,
    files: Vec<String>,
    mode: u32,
    verbose: u8,
    dry_run: bool,
) -> PyResult<Vec<String>> {
    let path_dir_base = extract_path(base_dir, "create_tree", "base_dir")?;
    let spec_mk_options = SpecMkpathOptions {
        mode,
        verbose,
        if_dry_run: dry_run,
    };

    let l_created = py
        .allow_threads(|| {
            create_tree(
                &path_dir_base,
                &files,
                &spec_mk_options,
                PathCreationCache::global(),
            )
        })
        .map_err(map_dir_util_error)?;
    Ok(l_created.iter().map(|p| path_to_string(p)).collect())
}

#[pyfunction(name = "remove_tree")]
#[pyo3(signature = (directory, verbose = 1, dry_run = false))]
fn remove_tree_py(
    py: Python<'_>,
    directory: &Bound<'_, PyAny>,
    verbose: u8,
    dry_run: bool,
) -> PyResult<Vec<String>> {
    let path_dir = extract_path(directory, "remove_tree", "directory")?;
    let report_remove = py
        .allow_threads(|| remove_tree(&path_dir, verbose, dry_run, PathCreationCache::global()))
        .map_err(map_dir_util_error)?;
    Ok(report_remove.warnings)
}

#[pyfunction(name = "ensure_relative")]
fn ensure_relative_py(path: &Bound<'_, PyAny>) -> PyResult<String> {
    let path_raw = extract_path(path, "ensure_relative", "path")?;
    Ok(path_to_string(&ensure_relative(path_raw)))
}

#[pymodule]
fn _dirkit_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = module.py();
    module.add("DirUtilFileError", py.get_type::<DirUtilFileError>())?;
    module.add("DirUtilInternalError", py.get_type::<DirUtilInternalError>())?;
    module.add_function(wrap_pyfunction!(mkpath_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_file_py, module)?)?;
    module.add_function(wrap_pyfunction!(newer_py, module)?)?;
    module.add_function(wrap_pyfunction!(create_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(remove_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(ensure_relative_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
