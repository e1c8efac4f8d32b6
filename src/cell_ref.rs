//! Utilities for Excel-style cell references and ranges.
//!
//! Internally rows and columns are 0-indexed; the XML uses 1-based rows.

/// Parse a cell reference from raw bytes (ASCII) into (col, row), 0-indexed.
///
/// Works directly on `attr.value` from quick-xml. `$` anchors are ignored.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .saturating_mul(26)
                .saturating_add(u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((col - 1, row - 1))
}

/// Parse a cell reference like "A1" into (col, row), 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a range like "A1:D10" (or a single "A1") into
/// (start_row, start_col, end_row, end_col), 0-indexed.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (start_col, start_row) = parse_cell_ref(start)?;
    let (end_col, end_row) = parse_cell_ref(end)?;
    Some((start_row, start_col, end_row, end_col))
}

/// Convert a 0-indexed column to its letter form (0 -> "A", 26 -> "AA").
pub fn col_to_letter(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + u8::try_from(n % 26).unwrap_or(0));
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Format a 0-indexed (col, row) pair as an "A1" reference.
pub fn cell_ref(col: u32, row: u32) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// Format a 0-indexed inclusive range as "A1:D10" (or "A1" for one cell).
pub fn range_ref(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> String {
    if start_row == end_row && start_col == end_col {
        return cell_ref(start_col, start_row);
    }
    format!(
        "{}:{}",
        cell_ref(start_col, start_row),
        cell_ref(end_col, end_row)
    )
}
