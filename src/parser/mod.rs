//! XLSX package reader
//!
//! Reads just enough of the OOXML package to get typed cell values out of a
//! worksheet: workbook relationships, the sheet list, shared strings, and the
//! date-ness of each cell format.

mod relationships;
mod styles;
pub(crate) mod worksheet;

use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

use crate::error::{Result, XlappendError};
use crate::types::{Sheet, Workbook};

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use styles::parse_cell_formats;
use worksheet::parse_sheet;

/// Parse workbook-level metadata from XLSX bytes.
pub fn parse_workbook(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    parse_workbook_from_archive(&mut archive)
}

pub(crate) fn parse_workbook_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Workbook> {
    // Relationships first to get actual part paths
    let relationships = parse_workbook_relationships(archive);
    let (sheets, date1904) = get_sheet_info(archive, &relationships.worksheets)?;
    let shared_strings = parse_shared_strings(archive, relationships.shared_strings.as_deref())?;
    let formats = parse_cell_formats(archive, relationships.styles.as_deref())?;

    tracing::debug!(
        sheets = sheets.len(),
        shared_strings = shared_strings.len(),
        cell_formats = formats.date_styles.len(),
        date1904,
        "parsed workbook metadata"
    );

    Ok(Workbook {
        sheets,
        shared_strings,
        formats,
        date1904,
    })
}

/// Read a whole ZIP entry into memory.
pub(crate) fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(path)?;
    let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Parse the sheet at `index` (workbook order).
pub fn read_sheet(data: &[u8], workbook: &Workbook, index: usize) -> Result<Sheet> {
    let info = workbook
        .sheets
        .get(index)
        .ok_or_else(|| XlappendError::SheetNotFound(format!("#{}", index + 1)))?;
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let part = read_part(&mut archive, &info.path)?;
    parse_sheet(&info.name, &part, workbook)
}

/// Parse the first sheet of an XLSX file.
pub fn read_first_sheet(data: &[u8]) -> Result<Sheet> {
    let workbook = parse_workbook(data)?;
    read_sheet(data, &workbook, 0)
}

/// Parse a sheet by name.
pub fn read_sheet_by_name(data: &[u8], name: &str) -> Result<Sheet> {
    let workbook = parse_workbook(data)?;
    let index = workbook
        .sheet_index(name)
        .ok_or_else(|| XlappendError::SheetNotFound(name.to_string()))?;
    read_sheet(data, &workbook, index)
}
