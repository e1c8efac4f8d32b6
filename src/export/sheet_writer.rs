//! Appends rows to an existing worksheet XML part.
//!
//! The part is streamed through quick-xml and written back event by event,
//! so everything outside the appended range is reproduced as it was read.
//! New cells use inline strings (`t="inlineStr"`) instead of shared string
//! references, avoiding a rebuild of the shared string table.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;

use crate::cell_ref::{cell_ref, parse_cell_range, parse_cell_ref_bytes, range_ref};
use crate::error::{Result, XlappendError};
use crate::numfmt::datetime_to_serial;
use crate::parser::worksheet::parse_u32_bytes;
use crate::types::{CellValue, Workbook};
use crate::xml_helpers::attr_raw;

/// Where appended rows go and how the row above them is styled.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct SheetScan {
    /// 0-based index of the last row holding a value, formula or inline string.
    pub last_used_row: Option<u32>,
    /// `s` attribute per column of the last used row.
    pub last_row_styles: BTreeMap<u32, u32>,
}

impl SheetScan {
    /// 0-based row the first appended row lands on.
    ///
    /// An empty sheet starts at the second row, leaving the first for a header.
    pub fn start_row(&self) -> u32 {
        self.last_used_row.map_or(1, |r| r.saturating_add(1))
    }

    /// Column styles appended cells inherit.
    ///
    /// Empty when the last used row is the first row, which holds the header.
    pub fn inherited_style(&self, col: u32) -> Option<u32> {
        match self.last_used_row {
            Some(r) if r > 0 => self.last_row_styles.get(&col).copied(),
            _ => None,
        }
    }
}

/// Result of [`append_rows`].
#[derive(Debug)]
pub(crate) struct AppendedSheet {
    pub xml: Vec<u8>,
    /// 0-based index of the first written row.
    pub start_row: u32,
}

/// A value-free row found inside the append range (pre-formatted template).
#[derive(Debug, Default)]
struct TemplateRow {
    /// Raw attributes other than `r` and `spans`.
    attrs: Vec<(Vec<u8>, Vec<u8>)>,
    /// Column -> style of the row's (empty) cells.
    cell_styles: BTreeMap<u32, Option<u32>>,
}

/// Row and column bookkeeping for rows and cells without `r` attributes.
#[derive(Default)]
struct Cursor {
    row: u32,
    next_col: u32,
}

impl Cursor {
    fn enter_row(&mut self, e: &BytesStart) -> u32 {
        if let Some(r) = attr_raw(e, b"r").and_then(|r| parse_u32_bytes(&r)) {
            self.row = r.saturating_sub(1);
        }
        self.next_col = 0;
        self.row
    }

    fn leave_row(&mut self) {
        self.row = self.row.saturating_add(1);
    }

    fn cell_col(&mut self, e: &BytesStart) -> u32 {
        let col = attr_raw(e, b"r")
            .and_then(|r| parse_cell_ref_bytes(&r))
            .map_or(self.next_col, |(c, _)| c);
        self.next_col = col.saturating_add(1);
        col
    }
}

/// Find the last used row of a worksheet part.
pub(crate) fn scan_sheet(xml: &[u8]) -> Result<SheetScan> {
    let mut reader = Reader::from_reader(xml);
    let mut cursor = Cursor::default();
    let mut scan = SheetScan::default();
    let mut saw_sheet_data = false;

    let mut row_used = false;
    let mut row_styles: BTreeMap<u32, u32> = BTreeMap::new();
    let mut in_cell = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheetData" => {
                saw_sheet_data = true;
            }
            Event::Start(ref e) if e.local_name().as_ref() == b"row" => {
                cursor.enter_row(e);
                row_used = false;
                row_styles.clear();
            }
            Event::End(ref e) if e.local_name().as_ref() == b"row" => {
                if row_used && scan.last_used_row.map_or(true, |last| cursor.row >= last) {
                    scan.last_used_row = Some(cursor.row);
                    scan.last_row_styles = std::mem::take(&mut row_styles);
                }
                cursor.leave_row();
            }
            Event::Empty(ref e) if e.local_name().as_ref() == b"row" => {
                cursor.enter_row(e);
                cursor.leave_row();
            }
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                match e.local_name().as_ref() {
                    b"c" => {
                        let col = cursor.cell_col(e);
                        if let Some(s) = attr_raw(e, b"s").and_then(|s| parse_u32_bytes(&s)) {
                            row_styles.insert(col, s);
                        }
                        in_cell = matches!(event, Event::Start(_));
                    }
                    b"v" | b"is" | b"f" if in_cell => row_used = true,
                    _ => {}
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"c" => {
                in_cell = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_sheet_data {
        return Err(XlappendError::Parse("worksheet has no sheetData".into()));
    }
    Ok(scan)
}

/// Element name with the sheet's namespace prefix, if it uses one.
fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

/// Serializes the appended rows, merging template rows into them.
struct RowEmitter<'a, R> {
    rows: &'a [R],
    start_row: u32,
    scan: &'a SheetScan,
    workbook: &'a Workbook,
    /// Date xf for dates landing in columns without a date format.
    date_style: Option<u32>,
    prefix: Option<String>,
}

impl<R: AsRef<[CellValue]>> RowEmitter<'_, R> {
    fn emit(&self, writer: &mut Writer<Vec<u8>>, templates: &BTreeMap<u32, TemplateRow>) -> Result<()> {
        let mut new_rows: BTreeMap<u32, &[CellValue]> = BTreeMap::new();
        for (offset, row) in self.rows.iter().enumerate() {
            let offset = u32::try_from(offset)
                .map_err(|_| XlappendError::Parse("too many rows to append".into()))?;
            new_rows.insert(self.start_row.saturating_add(offset), row.as_ref());
        }

        let mut all_rows: Vec<u32> = new_rows.keys().chain(templates.keys()).copied().collect();
        all_rows.sort_unstable();
        all_rows.dedup();

        let empty = TemplateRow::default();
        for r in all_rows {
            let template = templates.get(&r).unwrap_or(&empty);
            let values = new_rows.get(&r).copied().unwrap_or(&[]);
            self.emit_row(writer, r, values, template)?;
        }
        Ok(())
    }

    fn emit_row(
        &self,
        writer: &mut Writer<Vec<u8>>,
        row: u32,
        values: &[CellValue],
        template: &TemplateRow,
    ) -> Result<()> {
        let row_name = qualified(self.prefix.as_deref(), "row");
        let row_ref = (row + 1).to_string();
        let mut start = BytesStart::new(row_name.as_str());
        start.push_attribute(("r", row_ref.as_str()));
        for (key, value) in &template.attrs {
            start.push_attribute(Attribute::from((key.as_slice(), value.as_slice())));
        }
        writer.write_event(Event::Start(start))?;

        // Template cells keep their styles; written values override them
        let mut cells: BTreeMap<u32, (Option<&CellValue>, Option<u32>)> = BTreeMap::new();
        for (col, style) in &template.cell_styles {
            cells.insert(*col, (None, *style));
        }
        for (col, value) in values.iter().enumerate() {
            let col = u32::try_from(col)
                .map_err(|_| XlappendError::Parse("too many columns to append".into()))?;
            let style = template
                .cell_styles
                .get(&col)
                .copied()
                .flatten()
                .or_else(|| self.scan.inherited_style(col));
            cells.insert(col, (Some(value), style));
        }

        for (col, (value, style)) in cells {
            self.emit_cell(writer, row, col, value, style)?;
        }

        writer.write_event(Event::End(BytesEnd::new(row_name.as_str())))?;
        Ok(())
    }

    fn emit_cell(
        &self,
        writer: &mut Writer<Vec<u8>>,
        row: u32,
        col: u32,
        value: Option<&CellValue>,
        style: Option<u32>,
    ) -> Result<()> {
        let value = value.unwrap_or(&CellValue::Empty);
        if value == &CellValue::Empty && style.is_none() {
            return Ok(());
        }

        let formats = &self.workbook.formats;
        let style = match value {
            CellValue::Date(_) if !formats.is_date_style(style) => self.date_style.or(style),
            _ => style,
        };
        let date_styled = formats.is_date_style(style) || (style.is_some() && style == self.date_style);

        let c_name = qualified(self.prefix.as_deref(), "c");
        let reference = cell_ref(col, row);
        let style_str = style.map(|s| s.to_string());
        let mut start = BytesStart::new(c_name.as_str());
        start.push_attribute(("r", reference.as_str()));
        if let Some(ref s) = style_str {
            start.push_attribute(("s", s.as_str()));
        }

        let (type_attr, payload): (Option<&str>, Option<(String, &str)>) = match value {
            CellValue::Empty => (None, None),
            CellValue::Text(s) => (Some("inlineStr"), Some((s.clone(), "is"))),
            CellValue::Number(n) if n.is_finite() => (None, Some((n.to_string(), "v"))),
            CellValue::Number(n) => (Some("inlineStr"), Some((n.to_string(), "is"))),
            CellValue::Bool(b) => (Some("b"), Some((if *b { "1" } else { "0" }.to_string(), "v"))),
            CellValue::Date(dt) if date_styled => (
                None,
                Some((datetime_to_serial(*dt, self.workbook.date1904).to_string(), "v")),
            ),
            // No usable date xf in the package
            CellValue::Date(dt) => (
                Some("d"),
                Some((dt.format("%Y-%m-%dT%H:%M:%S").to_string(), "v")),
            ),
        };
        if let Some(t) = type_attr {
            start.push_attribute(("t", t));
        }

        let Some((text, container)) = payload else {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        };

        writer.write_event(Event::Start(start))?;
        if container == "is" {
            let is_name = qualified(self.prefix.as_deref(), "is");
            let t_name = qualified(self.prefix.as_deref(), "t");
            writer.write_event(Event::Start(BytesStart::new(is_name.as_str())))?;
            let mut t = BytesStart::new(t_name.as_str());
            if text.trim() != text {
                t.push_attribute(("xml:space", "preserve"));
            }
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(t_name.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new(is_name.as_str())))?;
        } else {
            let v_name = qualified(self.prefix.as_deref(), "v");
            writer.write_event(Event::Start(BytesStart::new(v_name.as_str())))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(v_name.as_str())))?;
        }
        writer.write_event(Event::End(BytesEnd::new(c_name.as_str())))?;
        Ok(())
    }
}

/// Capture a value-free row's attributes and cell styles, consuming it.
fn capture_template_row(reader: &mut Reader<&[u8]>, e: &BytesStart, has_children: bool) -> Result<TemplateRow> {
    let mut template = TemplateRow::default();
    for attr in e.attributes().flatten() {
        let key = attr.key.as_ref();
        if key == b"r" || key == b"spans" {
            continue;
        }
        template.attrs.push((key.to_vec(), attr.value.into_owned()));
    }
    if !has_children {
        return Ok(template);
    }

    let mut next_col: u32 = 0;
    loop {
        match reader.read_event()? {
            Event::Start(ref c) | Event::Empty(ref c) if c.local_name().as_ref() == b"c" => {
                let col = attr_raw(c, b"r")
                    .and_then(|r| parse_cell_ref_bytes(&r))
                    .map_or(next_col, |(col, _)| col);
                next_col = col.saturating_add(1);
                let style = attr_raw(c, b"s").and_then(|s| parse_u32_bytes(&s));
                template.cell_styles.insert(col, style);
            }
            Event::End(ref end) if end.local_name().as_ref() == b"row" => break,
            Event::Eof => {
                return Err(XlappendError::Parse("unterminated <row> element".into()));
            }
            _ => {}
        }
    }
    Ok(template)
}

/// Widen a `<dimension ref>` to include the appended block.
fn widened_dimension(e: &BytesStart, start_row: u32, end_row: u32, end_col: u32) -> Option<String> {
    let current = attr_raw(e, b"ref")?;
    let current = std::str::from_utf8(&current).ok()?;
    let (r0, c0, r1, c1) = parse_cell_range(current).unwrap_or((start_row, 0, end_row, end_col));
    Some(range_ref(
        r0.min(start_row),
        c0.min(0),
        r1.max(end_row),
        c1.max(end_col),
    ))
}

/// Append `rows` below the last used row of the worksheet part `xml`.
///
/// Each row is written from column A with no header. Cells take the style
/// of the same column in the last used data row, unless a pre-formatted
/// empty row already sits at that position, in which case its styles win.
/// Dates are written as serials; those landing in a column without a date
/// format get `date_style`.
pub(crate) fn append_rows<R: AsRef<[CellValue]>>(
    xml: &[u8],
    rows: &[R],
    workbook: &Workbook,
    date_style: Option<u32>,
) -> Result<AppendedSheet> {
    let scan = scan_sheet(xml)?;
    let start_row = scan.start_row();

    let width = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
    let row_count = u32::try_from(rows.len())
        .map_err(|_| XlappendError::Parse("too many rows to append".into()))?;
    let end_row = start_row.saturating_add(row_count.saturating_sub(1));
    let end_col = u32::try_from(width.saturating_sub(1)).unwrap_or(0);

    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + rows.len() * 160));
    let mut cursor = Cursor::default();
    let mut templates: BTreeMap<u32, TemplateRow> = BTreeMap::new();
    let mut emitter = RowEmitter {
        rows,
        start_row,
        scan: &scan,
        workbook,
        date_style,
        prefix: None,
    };

    loop {
        match reader.read_event()? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let has_children = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        let r = cursor.enter_row(e);
                        if r >= start_row {
                            templates.insert(r, capture_template_row(&mut reader, e, has_children)?);
                            cursor.leave_row();
                            continue;
                        }
                        if !has_children {
                            cursor.leave_row();
                        }
                        writer.write_event(event)?;
                    }
                    b"dimension" if !rows.is_empty() => {
                        match widened_dimension(e, start_row, end_row, end_col) {
                            Some(new_ref) => {
                                let mut patched = BytesStart::new(
                                    String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                                );
                                for attr in e.attributes().flatten() {
                                    if attr.key.as_ref() != b"ref" {
                                        patched.push_attribute(attr);
                                    }
                                }
                                patched.push_attribute(("ref", new_ref.as_str()));
                                if has_children {
                                    writer.write_event(Event::Start(patched))?;
                                } else {
                                    writer.write_event(Event::Empty(patched))?;
                                }
                            }
                            None => writer.write_event(event)?,
                        }
                    }
                    b"sheetData" => {
                        emitter.prefix = e
                            .name()
                            .prefix()
                            .and_then(|p| std::str::from_utf8(p.as_ref()).ok().map(str::to_string));
                        if has_children {
                            writer.write_event(event)?;
                        } else {
                            // <sheetData/> has to be opened up
                            let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                            writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
                            emitter.emit(&mut writer, &templates)?;
                            writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                        }
                    }
                    _ => writer.write_event(event)?,
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"row" => {
                cursor.leave_row();
                writer.write_event(Event::End(e.clone()))?;
            }
            Event::End(ref e) if e.local_name().as_ref() == b"sheetData" => {
                emitter.emit(&mut writer, &templates)?;
                writer.write_event(Event::End(e.clone()))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    Ok(AppendedSheet {
        xml: writer.into_inner(),
        start_row,
    })
}
