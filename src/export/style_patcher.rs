//! Adds a date cell format to a stylesheet part.
//!
//! Used when dates are appended to a workbook whose `cellXfs` has no date
//! entry to point them at. The part is streamed through unchanged apart
//! from the new `<xf>` and the `count` attribute of `<cellXfs>`.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;

/// `m/d/yyyy`, the built-in short date format.
const SHORT_DATE_FMT_ID: &str = "14";

fn date_xf(name: &str) -> BytesStart<'static> {
    let mut xf = BytesStart::new(name.to_string());
    for (key, value) in [
        ("numFmtId", SHORT_DATE_FMT_ID),
        ("fontId", "0"),
        ("fillId", "0"),
        ("borderId", "0"),
        ("xfId", "0"),
        ("applyNumberFormat", "1"),
    ] {
        xf.push_attribute((key, value));
    }
    xf
}

fn with_count(e: &BytesStart, count: &str) -> BytesStart<'static> {
    let mut patched = BytesStart::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() != b"count" {
            patched.push_attribute(attr);
        }
    }
    patched.push_attribute(("count", count));
    patched
}

/// Append a short-date xf to `<cellXfs>`, which holds `xf_count` entries.
///
/// Returns the patched part and the index of the new xf, or `None` when the
/// stylesheet has no `<cellXfs>` to extend.
pub(crate) fn add_date_style(xml: &[u8], xf_count: usize) -> Result<Option<(Vec<u8>, u32)>> {
    let Ok(index) = u32::try_from(xf_count) else {
        return Ok(None);
    };
    let count = (xf_count + 1).to_string();

    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 128));
    let mut xf_name = String::from("xf");
    let mut patched = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if e.local_name().as_ref() == b"cellXfs" => {
                if let Some(p) = e.name().prefix() {
                    xf_name = format!("{}:xf", String::from_utf8_lossy(p.as_ref()));
                }
                writer.write_event(Event::Start(with_count(e, &count)))?;
            }
            Event::Empty(ref e) if e.local_name().as_ref() == b"cellXfs" => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if let Some(p) = e.name().prefix() {
                    xf_name = format!("{}:xf", String::from_utf8_lossy(p.as_ref()));
                }
                writer.write_event(Event::Start(with_count(e, &count)))?;
                writer.write_event(Event::Empty(date_xf(&xf_name)))?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
                patched = true;
            }
            Event::End(ref e) if e.local_name().as_ref() == b"cellXfs" => {
                writer.write_event(Event::Empty(date_xf(&xf_name)))?;
                writer.write_event(Event::End(e.clone()))?;
                patched = true;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    Ok(patched.then(|| (writer.into_inner(), index)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

    #[test]
    fn test_date_xf_is_appended_and_counted() {
        let xml = format!(
            r#"<styleSheet xmlns="{NS}"><cellXfs count="1"><xf numFmtId="0" xfId="0"/></cellXfs><cellStyles count="1"/></styleSheet>"#
        );
        let (out, index) = add_date_style(xml.as_bytes(), 1).unwrap().unwrap();
        assert_eq!(index, 1);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains(r#"<cellXfs count="2"><xf numFmtId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs><cellStyles count="1"/>"#));
    }

    #[test]
    fn test_empty_cell_xfs_is_opened() {
        let xml = r#"<x:styleSheet xmlns:x="urn:s"><x:cellXfs count="0"/></x:styleSheet>"#;
        let (out, index) = add_date_style(xml.as_bytes(), 0).unwrap().unwrap();
        assert_eq!(index, 0);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains(r#"<x:cellXfs count="1"><x:xf numFmtId="14""#));
        assert!(s.contains("</x:cellXfs></x:styleSheet>"));
    }

    #[test]
    fn test_stylesheet_without_cell_xfs() {
        let xml = format!(r#"<styleSheet xmlns="{NS}"><fonts count="0"/></styleSheet>"#);
        assert!(add_date_style(xml.as_bytes(), 0).unwrap().is_none());
    }
}
