//! In-memory XLSX builders for master and employee workbooks.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

use xlappend::cell_ref::parse_cell_ref;

/// Style indexes provided by the generated `styles.xml`.
pub const STYLE_GENERAL: u32 = 0;
/// `numFmtId` 14 (m/d/yyyy).
pub const STYLE_DATE: u32 = 1;
/// `numFmtId` 4 (#,##0.00).
pub const STYLE_AMOUNT: u32 = 2;

/// Chart part added by [`XlsxBuilder::with_chart`].
pub const CHART_PART: &str = "xl/charts/chart1.xml";

/// Fixture cell value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Shared string.
    Shared(String),
    Inline(String),
    Number(f64),
    /// Formula with its cached result.
    Formula(String, f64),
    /// Style-only cell.
    Empty,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Shared(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

#[derive(Debug, Clone)]
struct CellEntry {
    cell_ref: String,
    value: Value,
    style: u32,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    cells: Vec<CellEntry>,
    /// Overrides the generated worksheet XML.
    raw_xml: Option<String>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cell<V: Into<Value>>(self, cell_ref: &str, value: V) -> Self {
        self.styled(cell_ref, value, STYLE_GENERAL)
    }

    #[must_use]
    pub fn styled<V: Into<Value>>(mut self, cell_ref: &str, value: V, style: u32) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    #[must_use]
    pub fn formula(self, cell_ref: &str, formula: &str, cached: f64) -> Self {
        self.cell(cell_ref, Value::Formula(formula.to_string(), cached))
    }

    /// Fill one row starting at column A.
    #[must_use]
    pub fn row<V: Into<Value> + Clone>(mut self, row: u32, values: &[V]) -> Self {
        for (i, v) in values.iter().enumerate() {
            let col = xlappend::cell_ref::col_to_letter(u32::try_from(i).unwrap());
            self = self.cell(&format!("{col}{row}"), v.clone());
        }
        self
    }

    /// Use `xml` verbatim as the worksheet part.
    #[must_use]
    pub fn raw(mut self, xml: &str) -> Self {
        self.raw_xml = Some(xml.to_string());
        self
    }
}

/// Builder for a whole workbook.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    chart: bool,
    /// Overrides the generated `styles.xml`.
    styles: Option<String>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Use `xml` verbatim as the stylesheet.
    #[must_use]
    pub fn styles(mut self, xml: &str) -> Self {
        self.styles = Some(xml.to_string());
        self
    }

    /// Add a chart part that nothing in the sheets refers to.
    #[must_use]
    pub fn with_chart(mut self) -> Self {
        self.chart = true;
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Value::Shared(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let part = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, body: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        part(&mut zip, "[Content_Types].xml", &generate_content_types(self.sheets.len()));
        part(&mut zip, "_rels/.rels", &generate_rels());
        part(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            &generate_workbook_rels(self.sheets.len()),
        );
        part(&mut zip, "xl/workbook.xml", &generate_workbook(&self.sheets));
        part(&mut zip, "xl/styles.xml", self.styles.as_deref().unwrap_or(STYLES_XML));
        part(&mut zip, "xl/sharedStrings.xml", &generate_shared_strings(&shared_strings));
        for (i, sheet) in self.sheets.iter().enumerate() {
            let xml = sheet
                .raw_xml
                .clone()
                .unwrap_or_else(|| generate_sheet_xml(sheet, &shared_strings));
            part(&mut zip, &format!("xl/worksheets/sheet{}.xml", i + 1), &xml);
        }
        if self.chart {
            part(&mut zip, CHART_PART, CHART_XML);
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

/// Master workbook with the given header row and data rows.
pub fn master_xlsx(headers: &[&str], rows: &[Vec<Value>]) -> Vec<u8> {
    let mut sheet = SheetBuilder::new("Master").row(1, headers);
    for (i, row) in rows.iter().enumerate() {
        sheet = sheet.row(u32::try_from(i).unwrap() + 2, row);
    }
    XlsxBuilder::new().sheet(sheet).build()
}

/// One master row in `EmpID, Date, Pay_Component, Amount` order.
pub fn master_row(emp_id: &str, date: &str, component: &str, amount: f64) -> Vec<Value> {
    vec![emp_id.into(), date.into(), component.into(), amount.into()]
}

/// Employee report: a `Summary` sheet with a formula, then `Raw_Data`
/// with a styled header row, plus a chart part.
pub fn employee_xlsx() -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Summary")
                .cell("A1", "Total")
                .formula("B1", "SUM(Raw_Data!D:D)", 0.0),
        )
        .sheet(raw_data_header())
        .with_chart()
        .build()
}

pub fn raw_data_header() -> SheetBuilder {
    SheetBuilder::new("Raw_Data").row(1, &["EmpID", "Date", "Pay_Component", "Amount"])
}

/// Decompressed content of a ZIP part.
pub fn read_part(xlsx: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(xlsx)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    buf
}

/// Part names in archive order.
pub fn part_names(xlsx: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(xlsx)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Cell values of a sheet as display strings, keyed by 1-based row.
pub fn sheet_rows(xlsx: &[u8], sheet: &str) -> BTreeMap<u32, Vec<String>> {
    let sheet = xlappend::parser::read_sheet_by_name(xlsx, sheet).unwrap();
    let mut rows: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for cell in &sheet.cells {
        let row = rows.entry(cell.r + 1).or_default();
        let col = usize::try_from(cell.c).unwrap();
        if row.len() <= col {
            row.resize(col + 1, String::new());
        }
        row[col] = cell.value.to_string();
    }
    rows
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
        "</Relationships>"
    )
    .to_string()
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut rows: BTreeMap<u32, Vec<&CellEntry>> = BTreeMap::new();
    for cell in &sheet.cells {
        let (_, row) = parse_cell_ref(&cell.cell_ref).expect("valid cell ref");
        rows.entry(row + 1).or_default().push(cell);
    }

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    if rows.is_empty() {
        xml.push_str("<sheetData/>");
    } else {
        xml.push_str("<sheetData>");
        for (row_num, cells) in rows {
            xml.push_str(&format!(r#"<row r="{row_num}">"#));
            for cell in cells {
                let mut attrs = format!(r#"r="{}""#, cell.cell_ref);
                if cell.style != STYLE_GENERAL {
                    attrs.push_str(&format!(r#" s="{}""#, cell.style));
                }
                match &cell.value {
                    Value::Shared(s) => {
                        let idx = shared_strings.iter().position(|x| x == s).unwrap();
                        xml.push_str(&format!(r#"<c {attrs} t="s"><v>{idx}</v></c>"#));
                    }
                    Value::Inline(s) => xml.push_str(&format!(
                        r#"<c {attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    )),
                    Value::Number(n) => xml.push_str(&format!(r#"<c {attrs}><v>{n}</v></c>"#)),
                    Value::Formula(f, cached) => xml.push_str(&format!(
                        r#"<c {attrs}><f>{}</f><v>{cached}</v></c>"#,
                        escape_xml(f)
                    )),
                    Value::Empty => xml.push_str(&format!("<c {attrs}/>")),
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");
    }
    xml.push_str("</worksheet>");
    xml
}

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="1"><fill><patternFill patternType="none"/></fill></fills>"#,
    r#"<borders count="1"><border/></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="3">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    r#"<xf numFmtId="4" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    "</cellXfs>",
    "</styleSheet>"
);

/// Stylesheet whose only cell format is General.
pub const PLAIN_STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="1"><fill><patternFill patternType="none"/></fill></fills>"#,
    r#"<borders count="1"><border/></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
    "</styleSheet>"
);

const CHART_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart">"#,
    r#"<c:chart><c:plotArea><c:barChart><c:barDir val="col"/></c:barChart></c:plotArea></c:chart>"#,
    "</c:chartSpace>"
);
