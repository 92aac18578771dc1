//! Mapping between department names and their export file names.
//!
//! Department names are used verbatim as file stems except for characters no
//! common filesystem accepts, which are percent-encoded. `%` itself is encoded
//! too so the mapping stays reversible.

use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

pub const EXPORT_EXTENSION: &str = "csv";

const UNSAFE: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '%'];

/// `<department>.csv`, with unsafe characters percent-encoded.
pub fn export_file_name(department: &str) -> String {
    let mut stem = String::with_capacity(department.len());
    for (index, ch) in department.chars().enumerate() {
        if index == 0 && ch == '.' {
            // urlencoding leaves dots alone
            stem.push_str("%2E");
        } else if ch.is_control() || UNSAFE.contains(&ch) {
            let mut buf = [0u8; 4];
            stem.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        } else {
            stem.push(ch);
        }
    }

    format!("{stem}.{EXPORT_EXTENSION}")
}

/// Inverse of [`export_file_name`]: the department a file was exported for.
///
/// Stems that are not valid percent-encoding are returned as-is.
pub fn department_for_file(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let department = match urlencoding::decode(stem) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => stem.to_string(),
    };
    Some(department)
}

/// Drop blank names and repeat requests, keeping first-seen order.
pub fn dedupe_departments<I, S>(requested: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut departments = Vec::new();

    for name in requested {
        let name = name.into();
        if name.trim().is_empty() {
            warn!("skipping blank department name");
            continue;
        }
        if !seen.insert(name.clone()) {
            warn!(department = %name, "skipping duplicate department");
            continue;
        }
        departments.push(name);
    }

    departments
}
