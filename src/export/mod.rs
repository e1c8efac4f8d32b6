//! XLSX append pipeline.
//!
//! Produces a modified XLSX by patching the original ZIP archive.
//! Only the target sheet is re-serialized, plus the stylesheet when appended
//! dates need a date format it lacks; everything else is passed through
//! byte-identical.

pub(crate) mod sheet_writer;
pub(crate) mod style_patcher;
pub(crate) mod zip_patcher;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

use crate::error::{Result, XlappendError};
use crate::parser::{parse_workbook_from_archive, read_part};
use crate::types::{CellValue, Workbook};

/// A patched workbook ready to be written out.
#[derive(Debug)]
pub struct AppendedWorkbook {
    pub bytes: Vec<u8>,
    /// 1-based sheet row of the first appended row.
    pub start_row: u32,
    pub rows: usize,
}

/// Append `rows` to the sheet named `sheet_name` inside `original` XLSX bytes.
///
/// Fails with [`XlappendError::SheetNotFound`] when the workbook has no such
/// sheet, and with a parse error when the sheet part cannot be read; the
/// input bytes are never modified.
pub fn append_to_sheet<R: AsRef<[CellValue]>>(
    original: &[u8],
    sheet_name: &str,
    rows: &[R],
) -> Result<AppendedWorkbook> {
    let mut archive = ZipArchive::new(Cursor::new(original))?;
    let workbook = parse_workbook_from_archive(&mut archive)?;
    let info = workbook
        .sheet_index(sheet_name)
        .and_then(|idx| workbook.sheets.get(idx))
        .ok_or_else(|| XlappendError::SheetNotFound(sheet_name.to_string()))?;

    let part = read_part(&mut archive, &info.path)?;

    let mut replacements = HashMap::new();
    let has_dates = rows
        .iter()
        .any(|r| r.as_ref().iter().any(|v| matches!(v, CellValue::Date(_))));
    let date_style = match workbook.formats.first_date_style() {
        Some(idx) => Some(idx),
        None if has_dates => added_date_style(&mut archive, &workbook, &mut replacements)?,
        None => None,
    };

    let appended = sheet_writer::append_rows(&part, rows, &workbook, date_style)?;
    replacements.insert(info.path.clone(), appended.xml);
    let bytes = zip_patcher::patch_zip(original, &replacements)?;

    Ok(AppendedWorkbook {
        bytes,
        start_row: appended.start_row + 1,
        rows: rows.len(),
    })
}

/// Patch a date xf into the stylesheet, queueing the new part.
fn added_date_style<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    workbook: &Workbook,
    replacements: &mut HashMap<String, Vec<u8>>,
) -> Result<Option<u32>> {
    let Some(path) = workbook.formats.part.as_deref() else {
        return Ok(None);
    };
    let styles = read_part(archive, path)?;
    let Some((patched, idx)) = style_patcher::add_date_style(&styles, workbook.formats.date_styles.len())?
    else {
        return Ok(None);
    };
    tracing::debug!(part = path, xf = idx, "added date cell format");
    replacements.insert(path.to_string(), patched);
    Ok(Some(idx))
}

/// 1-based row the next appended row would land on.
pub fn next_append_row(original: &[u8], sheet_name: &str) -> Result<u32> {
    let mut archive = ZipArchive::new(Cursor::new(original))?;
    let workbook = parse_workbook_from_archive(&mut archive)?;
    let info = workbook
        .sheet_index(sheet_name)
        .and_then(|idx| workbook.sheets.get(idx))
        .ok_or_else(|| XlappendError::SheetNotFound(sheet_name.to_string()))?;
    let part = read_part(&mut archive, &info.path)?;
    Ok(sheet_writer::scan_sheet(&part)?.start_row() + 1)
}
