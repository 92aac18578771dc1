use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One department's export, as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentTable {
    pub department: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to open export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("export has no header row")]
    MissingHeader,
    #[error("row {line} has {found} fields but the header has {expected}")]
    TooManyFields {
        line: u64,
        found: usize,
        expected: usize,
    },
}

pub fn read_table_from_path<P: AsRef<Path>>(
    department: impl Into<String>,
    path: P,
) -> Result<DepartmentTable, TableError> {
    let file = File::open(path)?;
    read_table(department, file)
}

/// Parse a headed CSV. Short rows are padded with empty cells; a row wider
/// than the header rejects the whole file.
pub fn read_table<R: Read>(
    department: impl Into<String>,
    reader: R,
) -> Result<DepartmentTable, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|header| header.trim().is_empty()) {
        return Err(TableError::MissingHeader);
    }

    let expected = headers.len();
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.len() > expected {
            return Err(TableError::TooManyFields {
                line: record.position().map_or(0, |position| position.line()),
                found: record.len(),
                expected,
            });
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(expected, String::new());
        rows.push(row);
    }

    Ok(DepartmentTable {
        department: department.into(),
        headers: disambiguate_headers(headers.iter()),
        rows,
    })
}

/// Repeated header names get `.1`, `.2`, ... suffixes so no column is lost.
fn disambiguate_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .map(|header| {
            let count = seen.entry(header.to_string()).or_insert(0);
            let name = if *count == 0 {
                header.to_string()
            } else {
                format!("{header}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}
