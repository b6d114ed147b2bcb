//! Tree-operation report models and mutable report builders.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one `copy_tree` run.
///
/// `outputs` lists every file or symlink destination that was copied or would
/// have been copied, in source listing order. It is identical for dry-run and
/// update runs; only the counters differ.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyTree {
    /// Destination paths of copied files and symlinks.
    pub outputs: Vec<PathBuf>,
    /// Number of regular files whose content was (or would be) written.
    pub cnt_files_copied: u64,
    /// Number of files skipped because the destination was up-to-date.
    pub cnt_files_uptodate: u64,
    /// Number of symlinks recreated as symlinks.
    pub cnt_symlinks: u64,
    /// Number of entries dropped by the exclusion patterns.
    pub cnt_excluded: u64,
    /// Number of destination directories created.
    pub cnt_dirs_created: u64,
}

impl ReportCopyTree {
    /// Consume the report, keeping only the destination path list.
    pub fn into_outputs(self) -> Vec<PathBuf> {
        self.outputs
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_outputs".to_string(), self.outputs.len() as u64);
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("cnt_files_uptodate".to_string(), self.cnt_files_uptodate);
        dict_counts.insert("cnt_symlinks".to_string(), self.cnt_symlinks);
        dict_counts.insert("cnt_excluded".to_string(), self.cnt_excluded);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} outputs={} copied={} uptodate={} symlinks={} excluded={} dirs={}",
            self.outputs.len(),
            self.cnt_files_copied,
            self.cnt_files_uptodate,
            self.cnt_symlinks,
            self.cnt_excluded,
            self.cnt_dirs_created
        )
    }
}

impl fmt::Display for ReportCopyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY_TREE]"))
    }
}

/// Mutable accumulator threaded through the recursive copy walk.
#[derive(Debug, Default, Clone)]
pub(crate) struct ReportCopyTreeBuilder {
    outputs: Vec<PathBuf>,
    cnt_files_copied: u64,
    cnt_files_uptodate: u64,
    cnt_symlinks: u64,
    cnt_excluded: u64,
    cnt_dirs_created: u64,
}

impl ReportCopyTreeBuilder {
    pub(crate) fn add_file(&mut self, path_dst: PathBuf, if_copied: bool) {
        if if_copied {
            self.cnt_files_copied += 1;
        } else {
            self.cnt_files_uptodate += 1;
        }
        self.outputs.push(path_dst);
    }

    pub(crate) fn add_symlink(&mut self, path_dst: PathBuf) {
        self.cnt_symlinks += 1;
        self.outputs.push(path_dst);
    }

    pub(crate) fn add_excluded(&mut self) {
        self.cnt_excluded += 1;
    }

    pub(crate) fn add_dirs_created(&mut self, value: usize) {
        self.cnt_dirs_created += value as u64;
    }

    pub(crate) fn build(self) -> ReportCopyTree {
        ReportCopyTree {
            outputs: self.outputs,
            cnt_files_copied: self.cnt_files_copied,
            cnt_files_uptodate: self.cnt_files_uptodate,
            cnt_symlinks: self.cnt_symlinks,
            cnt_excluded: self.cnt_excluded,
            cnt_dirs_created: self.cnt_dirs_created,
        }
    }
}

/// Outcome of one `remove_tree` run.
///
/// Removal failures do not abort the run; they are logged and kept in
/// `warnings`.
#[derive(Debug, Default, Clone)]
pub struct ReportRemoveTree {
    /// Number of files and symlinks removed.
    pub cnt_files_removed: u64,
    /// Number of directories removed.
    pub cnt_dirs_removed: u64,
    /// One entry per path that could not be listed or removed.
    pub warnings: Vec<String>,
}

impl ReportRemoveTree {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} files={} dirs={} warnings={}",
            self.cnt_files_removed,
            self.cnt_dirs_removed,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportRemoveTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[REMOVE_TREE]"))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportCopyTreeBuilder, ReportRemoveTree};

    #[test]
    fn report_copy_tree_counts_and_keeps_output_order() {
        let mut builder = ReportCopyTreeBuilder::default();
        builder.add_file(PathBuf::from("dst/b.txt"), true);
        builder.add_symlink(PathBuf::from("dst/link"));
        builder.add_file(PathBuf::from("dst/a.txt"), false);
        builder.add_excluded();
        builder.add_dirs_created(2);
        let report = builder.build();

        assert_eq!(
            report.outputs,
            vec![
                PathBuf::from("dst/b.txt"),
                PathBuf::from("dst/link"),
                PathBuf::from("dst/a.txt"),
            ]
        );
        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_outputs"], 3);
        assert_eq!(dict_counts["cnt_files_copied"], 1);
        assert_eq!(dict_counts["cnt_files_uptodate"], 1);
        assert_eq!(dict_counts["cnt_symlinks"], 1);
        assert_eq!(dict_counts["cnt_excluded"], 1);
        assert_eq!(dict_counts["cnt_dirs_created"], 2);
        assert_eq!(
            report.to_string(),
            "[COPY_TREE] outputs=3 copied=1 uptodate=1 symlinks=1 excluded=1 dirs=2"
        );
    }

    #[test]
    fn report_remove_tree_format() {
        let report = ReportRemoveTree {
            cnt_files_removed: 4,
            cnt_dirs_removed: 2,
            warnings: vec!["w".to_string()],
        };
        assert_eq!(report.to_string(), "[REMOVE_TREE] files=4 dirs=2 warnings=1");
    }
}
