use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::ConsolidatedReport;

pub const SHEET_NAME: &str = "All Staff";

/// Write the report as a single worksheet with a bold header row.
pub fn write_workbook(path: &Path, report: &ConsolidatedReport) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col_idx, header) in report.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
    }

    for (row_idx, row) in report.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            match numeric_value(cell) {
                Some(number) => worksheet.write_number(excel_row, col_idx as u16, number)?,
                None => worksheet.write_string(excel_row, col_idx as u16, cell)?,
            };
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Beyond this many digits an `f64` no longer holds every digit exactly.
const MAX_EXACT_DIGITS: usize = 15;

/// Cells that read as plain numbers are stored as numbers. Zero-padded codes
/// such as `007` and long identifiers stay text so no digit is lost.
fn numeric_value(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    let mut chars = trimmed.chars();
    if let (Some('0'), Some(next)) = (chars.next(), chars.next()) {
        if next.is_ascii_digit() {
            return None;
        }
    }

    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }

    if trimmed.chars().filter(char::is_ascii_digit).count() > MAX_EXACT_DIGITS {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}
