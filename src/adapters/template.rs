//! Built-in layout template: a minimal docx with one anchor paragraph and a
//! single 2x2 prototype table (poster cell, title cell, info cell). An
//! external template file with the same structure can be used instead.

use crate::utils::error::{KinolistError, Result};
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="jpg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

const BORDER: &str = r#" w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#;

fn prototype_table() -> String {
    let borders = format!(
        "<w:tblBorders><w:top{b}<w:left{b}<w:bottom{b}<w:right{b}<w:insideH{b}<w:insideV{b}</w:tblBorders>",
        b = BORDER
    );
    let cell = |width: u32, paragraphs: &str| {
        format!(
            r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr>{paragraphs}</w:tc>"#
        )
    };
    format!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/>{borders}</w:tblPr><w:tblGrid><w:gridCol w:w="4106"/><w:gridCol w:w="5245"/></w:tblGrid><w:tr>{poster}{title}</w:tr><w:tr>{spacer}{info}</w:tr></w:tbl>"#,
        borders = borders,
        // The poster is written into the cell's second paragraph.
        poster = cell(4106, "<w:p/><w:p/>"),
        title = cell(5245, "<w:p/>"),
        spacer = cell(4106, "<w:p/>"),
        info = cell(5245, "<w:p/>"),
    )
}

fn document_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:p/>{table}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="850" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        table = prototype_table()
    )
}

fn core_props() -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>Movie list</dc:title><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#
    )
}

/// Build the default template document as docx bytes.
pub fn default_template() -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("docProps/core.xml", core_props()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/document.xml", document_xml()),
    ];
    for (name, content) in parts {
        zip.start_file::<_, ()>(name, FileOptions::default())?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Read an external template, mapping any failure to a template error; a
/// missing layout prototype is fatal for the whole request.
pub fn load_template(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| KinolistError::TemplateError {
        message: format!("cannot read template {}: {}", path.display(), err),
    })
}
