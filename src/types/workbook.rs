use serde::Serialize;

use super::{CellData, CellValue};

/// Sheet metadata from `xl/workbook.xml`, resolved against the workbook
/// relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetInfo {
    pub name: String,
    /// ZIP part path, e.g. `xl/worksheets/sheet2.xml`.
    pub path: String,
}

/// Number-format facts about each entry of `cellXfs`.
#[derive(Debug, Clone, Default)]
pub struct CellFormats {
    /// `date_styles[i]` is true when xf `i` uses a date/time number format.
    pub date_styles: Vec<bool>,
    /// Stylesheet part the formats were read from, if the package has one.
    pub part: Option<String>,
}

impl CellFormats {
    pub fn is_date_style(&self, style_idx: Option<u32>) -> bool {
        style_idx
            .and_then(|idx| self.date_styles.get(usize::try_from(idx).ok()?))
            .copied()
            .unwrap_or(false)
    }

    /// Index of the first xf with a date number format.
    pub fn first_date_style(&self) -> Option<u32> {
        let idx = self.date_styles.iter().position(|&d| d)?;
        u32::try_from(idx).ok()
    }
}

/// Workbook-level metadata needed to read cell values.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetInfo>,
    pub shared_strings: Vec<String>,
    pub formats: CellFormats,
    pub date1904: bool,
}

impl Workbook {
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }
}

/// A parsed worksheet: sparse cells in document order.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub cells: Vec<CellData>,
    /// 1 + highest row index holding a cell.
    pub max_row: u32,
    /// 1 + highest column index holding a cell.
    pub max_col: u32,
}

impl Sheet {
    /// Dense rows from the first non-blank row down, blank rows included.
    ///
    /// Each row is `max_col` wide; missing cells are `Empty`.
    pub fn dense_rows(&self) -> Vec<Vec<CellValue>> {
        let Some(first_row) = self
            .cells
            .iter()
            .filter(|cd| !cd.value.is_blank())
            .map(|cd| cd.r)
            .min()
        else {
            return Vec::new();
        };

        let width = usize::try_from(self.max_col).unwrap_or(0);
        let height = usize::try_from(self.max_row.saturating_sub(first_row)).unwrap_or(0);
        let mut rows = vec![vec![CellValue::Empty; width]; height];

        for cd in &self.cells {
            let Some(r) = cd.r.checked_sub(first_row) else {
                continue;
            };
            let (Ok(r), Ok(c)) = (usize::try_from(r), usize::try_from(cd.c)) else {
                continue;
            };
            if let Some(slot) = rows.get_mut(r).and_then(|row| row.get_mut(c)) {
                *slot = cd.value.clone();
            }
        }

        rows
    }
}
