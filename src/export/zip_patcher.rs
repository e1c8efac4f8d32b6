//! Patch an XLSX ZIP archive with replacement parts.
//!
//! Untouched entries are copied via `raw_copy_file` (no recompression), so
//! every other sheet, chart, style and drawing stays byte-identical.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Result, XlappendError};

/// Rewrite `original_data`, swapping in the parts named in `replacements`.
///
/// Every replacement must name an existing entry; entry order is preserved.
pub(crate) fn patch_zip(
    original_data: &[u8],
    replacements: &HashMap<String, Vec<u8>>,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(original_data))?;

    for name in replacements.keys() {
        if !archive.file_names().any(|n| n == name) {
            return Err(XlappendError::Parse(format!("package has no part {name}")));
        }
    }

    let buf: Vec<u8> = Vec::with_capacity(original_data.len());
    let mut writer = ZipWriter::new(Cursor::new(buf));

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let name = entry.name().to_string();

        if let Some(data) = replacements.get(&name) {
            let options =
                FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
            continue;
        }

        // Pass through unmodified entry (raw copy, no re-compression)
        writer.raw_copy_file(entry)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Read;

    fn build(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn read(data: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_patch_replaces_one_part() {
        let original = build(&[("a.xml", "<a/>"), ("b.xml", "<b/>"), ("c.xml", "<c/>")]);
        let mut replacements = HashMap::new();
        replacements.insert("b.xml".to_string(), b"<b>new</b>".to_vec());

        let patched = patch_zip(&original, &replacements).unwrap();
        assert_eq!(read(&patched, "a.xml"), "<a/>");
        assert_eq!(read(&patched, "b.xml"), "<b>new</b>");
        assert_eq!(read(&patched, "c.xml"), "<c/>");

        let archive = ZipArchive::new(Cursor::new(patched.as_slice())).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_patch_unknown_part_fails() {
        let original = build(&[("a.xml", "<a/>")]);
        let mut replacements = HashMap::new();
        replacements.insert("zzz.xml".to_string(), Vec::new());
        assert!(patch_zip(&original, &replacements).is_err());
    }
}
