//! Stylesheet parsing, reduced to what value resolution needs: which cell
//! formats (`cellXfs` entries) carry a date number format.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;
use crate::numfmt::is_date_format_id;
use crate::types::CellFormats;
use crate::xml_helpers::{attr_string, attr_u32};

/// Parse `<numFmts>` and `<cellXfs>` from the styles part.
pub(super) fn parse_cell_formats<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<CellFormats> {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return Ok(CellFormats::default()); // Styles are optional
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut custom_formats: HashMap<u32, String> = HashMap::new();
    let mut xf_num_fmts: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            // <cellXfs count="0"/> has no children, so only Start opens the list
            Event::Start(ref e) if e.local_name().as_ref() == b"cellXfs" => {
                in_cell_xfs = true;
            }
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    if let (Some(id), Some(code)) =
                        (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                    {
                        let code = quick_xml::escape::unescape(&code)
                            .map(|c| c.into_owned())
                            .unwrap_or(code);
                        custom_formats.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    xf_num_fmts.push(attr_u32(e, b"numFmtId").unwrap_or(0));
                }
                _ => {}
            },
            Event::End(ref e) if e.local_name().as_ref() == b"cellXfs" => {
                in_cell_xfs = false;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let date_styles = xf_num_fmts
        .into_iter()
        .map(|id| is_date_format_id(id, custom_formats.get(&id).map(String::as_str)))
        .collect();

    Ok(CellFormats {
        date_styles,
        part: Some(styles_path.to_string()),
    })
}
