//! Merge per-department exports into the staff report workbook.

mod reader;
mod writer;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::XlsxError;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::workflows::crawl::naming::{department_for_file, EXPORT_EXTENSION};

pub use reader::{read_table, read_table_from_path, DepartmentTable, TableError};
pub use writer::{write_workbook, SHEET_NAME};

pub const SOURCE_COLUMN: &str = "Source Department";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("could not scan {}: {source}", .path.display())]
    Scan { path: PathBuf, source: io::Error },
    #[error("could not write workbook {}: {source}", .path.display())]
    Workbook { path: PathBuf, source: XlsxError },
    #[error("could not move workbook into place at {}: {source}", .path.display())]
    Publish { path: PathBuf, source: io::Error },
}

/// All department rows aligned to one column set, `Source Department` last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedReport {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ConsolidatedReport {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn source_departments(&self) -> Vec<&str> {
        let Some(index) = self.column(SOURCE_COLUMN) else {
            return Vec::new();
        };
        self.rows.iter().map(|row| row[index].as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub path: PathBuf,
    pub departments: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub rows: usize,
}

/// Every `*.csv` in `dir`, sorted by file name.
///
/// Any CSV present is picked up, not just the ones this run exported.
pub fn collect_exports(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    let scan_error = |source| ReportError::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let mut exports = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_error)? {
        let path = entry.map_err(scan_error)?.path();
        let is_export = path.is_file()
            && path
                .extension()
                .is_some_and(|extension| extension == EXPORT_EXTENSION);
        if is_export {
            exports.push(path);
        }
    }

    exports.sort();
    Ok(exports)
}

/// Read every export, setting aside the ones that cannot be parsed.
pub fn load_tables(paths: &[PathBuf]) -> (Vec<DepartmentTable>, Vec<SkippedFile>) {
    let mut tables = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        let Some(department) = department_for_file(path) else {
            warn!(file = %path.display(), "skipping export with unreadable file name");
            skipped.push(SkippedFile {
                path: path.clone(),
                reason: "file name is not valid UTF-8".to_string(),
            });
            continue;
        };

        match read_table_from_path(department, path) {
            Ok(table) => {
                info!(department = %table.department, rows = table.rows.len(), "loaded export");
                tables.push(table);
            }
            Err(err) => {
                error!(file = %path.display(), error = %err, "failed to read export");
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    (tables, skipped)
}

/// Stack the tables in order, tagging each row with its department.
///
/// Columns are the union of every header in first-seen order; a department
/// missing a column gets blank cells. An existing `Source Department` column is
/// replaced.
pub fn merge_tables(tables: &[DepartmentTable]) -> ConsolidatedReport {
    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for header in tables.iter().flat_map(|table| table.headers.iter()) {
        if header != SOURCE_COLUMN && !positions.contains_key(header.as_str()) {
            positions.insert(header.as_str(), columns.len());
            columns.push(header.clone());
        }
    }
    let source_index = columns.len();
    columns.push(SOURCE_COLUMN.to_string());

    let mut rows = Vec::new();
    for table in tables {
        let targets: Vec<Option<usize>> = table
            .headers
            .iter()
            .map(|header| positions.get(header.as_str()).copied())
            .collect();

        for record in &table.rows {
            let mut row = vec![String::new(); columns.len()];
            for (value, target) in record.iter().zip(&targets) {
                if let Some(index) = target {
                    row[*index] = value.clone();
                }
            }
            row[source_index] = table.department.clone();
            rows.push(row);
        }
    }

    ConsolidatedReport { columns, rows }
}

/// Merge every export in `dir` into the workbook at `report_path`.
///
/// Returns `Ok(None)` without touching `report_path` when no export could be
/// read. The workbook is written beside its final path and renamed into place,
/// so its presence always means it is complete.
pub fn consolidate(dir: &Path, report_path: &Path) -> Result<Option<ReportSummary>, ReportError> {
    info!(dir = %dir.display(), "looking for exports");
    let exports = collect_exports(dir)?;
    if exports.is_empty() {
        warn!("no CSV exports found; workbook not created");
        return Ok(None);
    }

    info!(count = exports.len(), "combining exports");
    let (tables, skipped) = load_tables(&exports);
    if tables.is_empty() {
        warn!("no export could be read; workbook not created");
        return Ok(None);
    }

    let report = merge_tables(&tables);
    let staging = staging_path(report_path);
    write_workbook(&staging, &report).map_err(|source| ReportError::Workbook {
        path: staging.clone(),
        source,
    })?;
    std::fs::rename(&staging, report_path).map_err(|source| ReportError::Publish {
        path: report_path.to_path_buf(),
        source,
    })?;

    info!(
        path = %report_path.display(),
        rows = report.rows.len(),
        "staff report created"
    );

    Ok(Some(ReportSummary {
        path: report_path.to_path_buf(),
        departments: tables.into_iter().map(|table| table.department).collect(),
        skipped,
        rows: report.rows.len(),
    }))
}

fn staging_path(report_path: &Path) -> PathBuf {
    let mut name = report_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    report_path.with_file_name(name)
}
