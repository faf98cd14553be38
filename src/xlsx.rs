//! Minimal xlsx writer.
//!
//! An `.xlsx` file is a zip archive of SpreadsheetML parts. Exports only
//! ever need one sheet of text cells, so we write exactly the parts a
//! reader requires: content types, package and workbook relationships, the
//! workbook, one worksheet and a shared-string table. Every cell is a shared
//! string; no styles, formulas or number formats.

use crate::error::PdfChatError;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A single-sheet workbook of text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub sheet_name: String,
    pub rows: Vec<Vec<String>>,
}

impl Workbook {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row of cells.
    pub fn append<I, S>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Write the workbook, replacing any existing file at `path`.
    pub fn save(&self, path: &Path) -> Result<(), PdfChatError> {
        let file = File::create(path).map_err(|e| PdfChatError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", content_types()),
            ("_rels/.rels", package_rels()),
            ("xl/workbook.xml", self.workbook_xml()),
            ("xl/_rels/workbook.xml.rels", workbook_rels()),
            ("xl/worksheets/sheet1.xml", self.sheet_xml()),
            ("xl/sharedStrings.xml", self.shared_strings_xml()),
        ];

        for (name, body) in parts {
            writer
                .start_file(name, options)
                .map_err(|e| PdfChatError::SpreadsheetFailed(format!("{name}: {e}")))?;
            writer
                .write_all(body.as_bytes())
                .map_err(|e| PdfChatError::SpreadsheetFailed(format!("{name}: {e}")))?;
        }

        writer
            .finish()
            .map_err(|e| PdfChatError::SpreadsheetFailed(format!("finalise archive: {e}")))?;

        debug!("Wrote workbook {} ({} rows)", path.display(), self.rows.len());
        Ok(())
    }

    fn workbook_xml(&self) -> String {
        format!(
            r#"{XML_DECL}<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            escape_xml(&self.sheet_name)
        )
    }

    /// Cells reference the shared-string table in row-major order.
    fn sheet_xml(&self) -> String {
        let mut xml = format!(r#"{XML_DECL}<worksheet xmlns="{NS_MAIN}"><sheetData>"#);
        let mut index = 0usize;
        for (r, row) in self.rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for c in 0..row.len() {
                xml.push_str(&format!(
                    r#"<c r="{}{}" t="s"><v>{}</v></c>"#,
                    column_name(c),
                    r + 1,
                    index
                ));
                index += 1;
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }

    fn shared_strings_xml(&self) -> String {
        let count: usize = self.rows.iter().map(Vec::len).sum();
        let mut xml = format!(
            r#"{XML_DECL}<sst xmlns="{NS_MAIN}" count="{count}" uniqueCount="{count}">"#
        );
        for cell in self.rows.iter().flatten() {
            xml.push_str(r#"<si><t xml:space="preserve">"#);
            xml.push_str(&escape_xml(cell));
            xml.push_str("</t></si>");
        }
        xml.push_str("</sst>");
        xml
    }
}

fn content_types() -> String {
    const SML: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml";
    format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="{SML}.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="{SML}.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="{SML}.sharedStrings+xml"/></Types>"#
    )
}

fn package_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}"><Relationship Id="rId1" Type="{NS_REL}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}"><Relationship Id="rId1" Type="{NS_REL}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{NS_REL}/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#
    )
}

/// Spreadsheet column letters: 0 → A, 25 → Z, 26 → AA.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Escape markup and drop characters XML 1.0 cannot carry.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}
