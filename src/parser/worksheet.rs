//! Worksheet parsing - reads one sheet part into a sparse [`Sheet`].

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::numfmt::serial_to_datetime;
use crate::types::{CellData, CellValue, Sheet, Workbook};
use crate::xml_helpers::attr_raw;

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(crate) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

pub(crate) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Parse an ISO 8601 date or date-time as written in `t="d"` cells.
pub(crate) fn parse_iso_datetime(s: &str) -> Option<chrono::NaiveDateTime> {
    let s = s.trim().trim_end_matches('Z');
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Turn a raw `<v>`/`<t>` payload into a typed value.
fn resolve_cell_value(
    raw: Option<String>,
    tag: CellTypeTag,
    style_idx: Option<u32>,
    workbook: &Workbook,
) -> CellValue {
    let Some(raw) = raw else {
        return CellValue::Empty;
    };

    match tag {
        CellTypeTag::Shared => parse_u32_bytes(raw.as_bytes())
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| workbook.shared_strings.get(idx))
            .map_or(CellValue::Empty, |s| CellValue::Text(s.clone())),
        CellTypeTag::Inline | CellTypeTag::Str | CellTypeTag::Error => CellValue::Text(raw),
        CellTypeTag::Bool => CellValue::Bool(matches!(raw.as_str(), "1" | "true")),
        CellTypeTag::Date => {
            parse_iso_datetime(&raw).map_or(CellValue::Text(raw), CellValue::Date)
        }
        CellTypeTag::Default => {
            let Ok(num) = raw.trim().parse::<f64>() else {
                return CellValue::Text(raw);
            };
            if workbook.formats.is_date_style(style_idx) {
                if let Some(dt) = serial_to_datetime(num, workbook.date1904) {
                    return CellValue::Date(dt);
                }
            }
            CellValue::Number(num)
        }
    }
}

/// Read text content up to the end tag named `end`, concatenating `<t>` runs.
fn read_text_until(xml: &mut Reader<&[u8]>, end: &[u8], only_t: bool) -> Result<String> {
    let mut out = String::new();
    let mut in_t = !only_t;
    let mut in_phonetic = false;
    loop {
        match xml.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"t" if !in_phonetic => in_t = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Text(ref e) if in_t => out.push_str(&e.unescape()?),
            Event::End(ref e) => {
                let name = e.local_name();
                if name.as_ref() == end {
                    break;
                }
                match name.as_ref() {
                    b"t" if only_t => in_t = false,
                    b"rPh" => in_phonetic = false,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Parse a worksheet part into sparse cells.
///
/// Formulas are not evaluated; the cached `<v>` result is used.
pub(crate) fn parse_sheet(name: &str, data: &[u8], workbook: &Workbook) -> Result<Sheet> {
    let mut xml = Reader::from_reader(data);
    xml.trim_text(false);

    let mut sheet = Sheet {
        name: name.to_string(),
        ..Sheet::default()
    };

    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        match xml.read_event()? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        // r is optional; rows without it follow the previous one
                        current_row = attr_raw(e, b"r")
                            .and_then(|r| parse_u32_bytes(&r))
                            .map_or(current_row, |r| r.saturating_sub(1));
                        next_col = 0;
                    }
                    b"c" => {
                        let mut col = next_col;
                        let mut row = current_row;
                        let mut tag = CellTypeTag::Default;
                        let mut style_idx = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Some((c, r)) = parse_cell_ref_bytes(&attr.value) {
                                        col = c;
                                        row = r;
                                    }
                                }
                                b"t" => tag = parse_cell_type_tag(&attr.value),
                                b"s" => style_idx = parse_u32_bytes(&attr.value),
                                _ => {}
                            }
                        }
                        next_col = col.saturating_add(1);

                        let mut raw: Option<String> = None;
                        if is_start {
                            loop {
                                match xml.read_event()? {
                                    Event::Start(ref inner) => match inner.local_name().as_ref() {
                                        b"v" => raw = Some(read_text_until(&mut xml, b"v", false)?),
                                        b"is" => raw = Some(read_text_until(&mut xml, b"is", true)?),
                                        _ => {}
                                    },
                                    Event::End(ref inner) if inner.local_name().as_ref() == b"c" => {
                                        break
                                    }
                                    Event::Eof => break,
                                    _ => {}
                                }
                            }
                        }

                        let value = resolve_cell_value(raw, tag, style_idx, workbook);
                        if value != CellValue::Empty {
                            sheet.max_row = sheet.max_row.max(row.saturating_add(1));
                            sheet.max_col = sheet.max_col.max(col.saturating_add(1));
                            sheet.cells.push(CellData {
                                r: row,
                                c: col,
                                value,
                                style_idx,
                            });
                        }
                    }
                    _ => {}
                }
                if !is_start && e.local_name().as_ref() == b"row" {
                    current_row = current_row.saturating_add(1);
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"row" => {
                current_row = current_row.saturating_add(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheet)
}
