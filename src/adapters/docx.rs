//! Document assembly. Works on the docx container directly: the template's
//! single prototype table is cloned once per record, each clone is filled
//! with styled runs and the embedded poster, and the whole package is
//! rewritten.

use crate::core::cover;
use crate::domain::model::{Cover, FilmRecord};
use crate::utils::error::{KinolistError, Result};
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::OnceLock;
use zip::write::{FileOptions, ZipWriter};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const TYPES_PART: &str = "[Content_Types].xml";

const EMU_PER_CM: u64 = 360_000;
/// Fixed physical poster width in the document.
const POSTER_WIDTH_CM: u64 = 7;

const EMPTY_PARAGRAPH: &str = "<w:p/>";

struct RunStyle {
    size_half_points: u32,
    bold: bool,
    underline: bool,
    color: Option<&'static str>,
}

const TITLE_STYLE: RunStyle = RunStyle {
    size_half_points: 22,
    bold: true,
    underline: false,
    color: None,
};

const BODY_STYLE: RunStyle = RunStyle {
    size_half_points: 20,
    bold: false,
    underline: false,
    color: None,
};

const CAST_LABEL_STYLE: RunStyle = RunStyle {
    size_half_points: 20,
    bold: false,
    underline: false,
    color: Some("FF6600"),
};

const CAST_LIST_STYLE: RunStyle = RunStyle {
    size_half_points: 20,
    bold: false,
    underline: true,
    color: Some("0000FF"),
};

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn run_xml(text: &str, style: &RunStyle) -> String {
    let mut props =
        String::from(r#"<w:rFonts w:ascii="Arial" w:hAnsi="Arial" w:cs="Arial"/>"#);
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.underline {
        props.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(color) = style.color {
        props.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
    }
    props.push_str(&format!(
        r#"<w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/>"#,
        sz = style.size_half_points
    ));
    format!(
        r#"<w:r><w:rPr>{props}</w:rPr><w:t xml:space="preserve">{text}</w:t></w:r>"#,
        text = xml_escape(text)
    )
}

fn paragraph(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

fn drawing_xml(rid: &str, n: usize, cx: u64, cy: u64) -> String {
    format!(
        r#"<w:p><w:r><w:drawing xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Poster {n}"/><a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="{n}" name="Poster {n}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
    )
}

fn table_start_regex() -> &'static Regex {
    static TBL: OnceLock<Regex> = OnceLock::new();
    TBL.get_or_init(|| Regex::new(r"<w:tbl[ >]").unwrap())
}

/// Byte offset of the `</w:tc>` closing cell `(row, col)` of the table.
fn cell_close_offset(table: &str, row: usize, col: usize) -> Option<usize> {
    static ROW: OnceLock<Regex> = OnceLock::new();
    let row_re = ROW.get_or_init(|| Regex::new(r"<w:tr[ >]").unwrap());

    let mut pos = 0;
    for _ in 0..=row {
        let m = row_re.find(&table[pos..])?;
        pos += m.end();
    }
    let mut search = pos;
    for current in 0..=col {
        let found = table[search..].find("</w:tc>")?;
        if current == col {
            return Some(search + found);
        }
        search += found + "</w:tc>".len();
    }
    None
}

fn insert_into_cell(table: &str, row: usize, col: usize, xml: &str) -> Result<String> {
    let offset =
        cell_close_offset(table, row, col).ok_or_else(|| KinolistError::TemplateError {
            message: format!("prototype table has no cell ({row},{col})"),
        })?;
    let mut out = String::with_capacity(table.len() + xml.len());
    out.push_str(&table[..offset]);
    out.push_str(xml);
    out.push_str(&table[offset..]);
    Ok(out)
}

/// One filled clone of the prototype. Cell roles are fixed: (0,0) poster,
/// (0,1) title, (1,1) info block.
fn fill_table(
    prototype: &str,
    record: &FilmRecord,
    index: usize,
    images: &mut Vec<(String, Vec<u8>)>,
    rels: &mut String,
) -> Result<String> {
    let mut table = prototype.to_string();

    let title_para = paragraph(&[run_xml(&record.title_line(), &TITLE_STYLE)]);
    table = insert_into_cell(&table, 0, 1, &title_para)?;

    let mut info = String::new();
    info.push_str(&paragraph(&[run_xml(&record.year, &BODY_STYLE)]));
    info.push_str(&paragraph(&[run_xml(&record.countries.join(", "), &BODY_STYLE)]));
    info.push_str(&paragraph(&[run_xml(
        &format!("Director: {}", record.director),
        &BODY_STYLE,
    )]));
    info.push_str(EMPTY_PARAGRAPH);
    info.push_str(&paragraph(&[
        run_xml("In starring: ", &CAST_LABEL_STYLE),
        run_xml(&record.cast_line(), &CAST_LIST_STYLE),
    ]));
    info.push_str(EMPTY_PARAGRAPH);
    info.push_str(EMPTY_PARAGRAPH);
    info.push_str(&paragraph(&[run_xml(&record.synopsis, &BODY_STYLE)]));
    info.push_str(EMPTY_PARAGRAPH);
    table = insert_into_cell(&table, 1, 1, &info)?;

    if let Cover::Image(img) = &record.cover {
        let jpeg = cover::encode_jpeg(img)?;
        let n = index + 1;
        let rid = format!("rIdPoster{n}");
        let (w, h) = img.dimensions();
        let cx = POSTER_WIDTH_CM * EMU_PER_CM;
        // Embedding preserves the normalized aspect ratio.
        let cy = cx * h as u64 / w as u64;
        table = insert_into_cell(&table, 0, 0, &drawing_xml(&rid, n, cx, cy))?;
        rels.push_str(&format!(
            r#"<Relationship Id="{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/poster{n}.jpg"/>"#
        ));
        images.push((format!("word/media/poster{n}.jpg"), jpeg));
    }

    Ok(table)
}

fn read_parts(template: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let template_err = |message: String| KinolistError::TemplateError { message };
    let mut archive = ZipArchive::new(Cursor::new(template))
        .map_err(|e| template_err(format!("unreadable template: {e}")))?;

    let mut parts = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| template_err(format!("unreadable template entry: {e}")))?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| template_err(format!("unreadable template entry: {e}")))?;
        parts.push((file.name().to_string(), data));
    }
    Ok(parts)
}

fn part_as_string(parts: &[(String, Vec<u8>)], name: &str) -> Result<String> {
    let (_, data) = parts
        .iter()
        .find(|(part, _)| part == name)
        .ok_or_else(|| KinolistError::TemplateError {
            message: format!("template has no {name} part"),
        })?;
    String::from_utf8(data.clone()).map_err(|_| KinolistError::TemplateError {
        message: format!("{name} is not valid UTF-8"),
    })
}

fn replace_part(parts: &mut Vec<(String, Vec<u8>)>, name: &str, data: Vec<u8>) {
    if let Some(entry) = parts.iter_mut().find(|(part, _)| part == name) {
        entry.1 = data;
    } else {
        parts.push((name.to_string(), data));
    }
}

/// Clone the template's prototype table to `records.len()` instances, fill
/// them in input order, and save the document to `out_path`.
pub fn assemble(template: &[u8], records: &[FilmRecord], out_path: &Path) -> Result<()> {
    if records.is_empty() {
        return Err(KinolistError::NothingEnriched);
    }

    let mut parts = read_parts(template)?;
    let document = part_as_string(&parts, DOCUMENT_PART)?;

    let tbl_start = table_start_regex()
        .find(&document)
        .map(|m| m.start())
        .ok_or_else(|| KinolistError::TemplateError {
            message: "template contains no prototype table".to_string(),
        })?;
    let tbl_end = document[tbl_start..]
        .find("</w:tbl>")
        .map(|i| tbl_start + i + "</w:tbl>".len())
        .ok_or_else(|| KinolistError::TemplateError {
            message: "prototype table is not closed".to_string(),
        })?;
    let prototype = &document[tbl_start..tbl_end];

    let mut images = Vec::new();
    let mut new_rels = String::new();
    let mut tables = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        tables.push(fill_table(prototype, record, index, &mut images, &mut new_rels)?);
    }

    let mut new_document = String::with_capacity(document.len() * records.len());
    new_document.push_str(&document[..tbl_start]);
    new_document.push_str(&tables.join(EMPTY_PARAGRAPH));
    new_document.push_str(&document[tbl_end..]);
    replace_part(&mut parts, DOCUMENT_PART, new_document.into_bytes());

    if !images.is_empty() {
        let rels = match part_as_string(&parts, RELS_PART) {
            Ok(existing) => existing.replace(
                "</Relationships>",
                &format!("{new_rels}</Relationships>"),
            ),
            Err(_) => format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{new_rels}</Relationships>"#
            ),
        };
        replace_part(&mut parts, RELS_PART, rels.into_bytes());

        let types = part_as_string(&parts, TYPES_PART)?;
        if !types.contains(r#"Extension="jpg""#) {
            let types = types.replace(
                "</Types>",
                r#"<Default Extension="jpg" ContentType="image/jpeg"/></Types>"#,
            );
            replace_part(&mut parts, TYPES_PART, types.into_bytes());
        }

        for (name, data) in images {
            parts.push((name, data));
        }
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in &parts {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let bytes = zip.finish()?.into_inner();

    // A save failure here is most likely concurrent access to the output
    // path; surface it distinctly instead of a generic IO error.
    std::fs::write(out_path, &bytes).map_err(|err| KinolistError::WriteError {
        path: out_path.display().to_string(),
        message: err.to_string(),
    })?;
    tracing::info!("File \"{}\" created", out_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::template::default_template;
    use crate::domain::model::Cover;
    use tempfile::TempDir;

    fn record(title: &str, cover: Cover) -> FilmRecord {
        FilmRecord {
            title: title.to_string(),
            year: "1984".to_string(),
            rating: Some(8.0),
            countries: vec!["USA".to_string()],
            synopsis: "A cyborg assassin & his target.".to_string(),
            poster_url: String::new(),
            file_stem: title.to_string(),
            director: "James Cameron".to_string(),
            cast: Default::default(),
            cover,
        }
    }

    fn read_document(path: &Path) -> String {
        let bytes = std::fs::read(path).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        document
    }

    #[test]
    fn table_count_matches_record_count_in_input_order() {
        for count in [1usize, 2, 5] {
            let records: Vec<FilmRecord> = (0..count)
                .map(|i| record(&format!("Film {i}"), Cover::Missing))
                .collect();
            let dir = TempDir::new().unwrap();
            let out = dir.path().join("list.docx");
            assemble(&default_template().unwrap(), &records, &out).unwrap();

            let document = read_document(&out);
            assert_eq!(table_start_regex().find_iter(&document).count(), count);

            let positions: Vec<usize> = (0..count)
                .map(|i| document.find(&format!("Film {i}")).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn title_cell_reflects_rating_state() {
        let mut with_rating = record("Rated", Cover::Missing);
        with_rating.rating = Some(7.5);
        let mut no_rating = record("Unrated", Cover::Missing);
        no_rating.rating = None;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("list.docx");
        assemble(
            &default_template().unwrap(),
            &[with_rating, no_rating],
            &out,
        )
        .unwrap();

        let document = read_document(&out);
        assert!(document.contains("Rated - Kinopoisk 7.5"));
        assert!(document.contains("Unrated - no rating"));
    }

    #[test]
    fn synopsis_text_is_xml_escaped() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("list.docx");
        assemble(
            &default_template().unwrap(),
            &[record("Amp", Cover::Missing)],
            &out,
        )
        .unwrap();

        let document = read_document(&out);
        assert!(document.contains("A cyborg assassin &amp; his target."));
    }

    #[test]
    fn cover_embeds_image_part_and_relationship() {
        let img = image::RgbImage::from_pixel(360, 540, image::Rgb([10, 20, 30]));
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("list.docx");
        assemble(
            &default_template().unwrap(),
            &[record("Pictured", Cover::Image(img))],
            &out,
        )
        .unwrap();

        let bytes = std::fs::read(&out).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/media/poster1.jpg").is_ok());

        let mut rels = String::new();
        archive
            .by_name(RELS_PART)
            .unwrap()
            .read_to_string(&mut rels)
            .unwrap();
        assert!(rels.contains("rIdPoster1"));

        let document = read_document(&out);
        assert!(document.contains(r#"r:embed="rIdPoster1""#));
    }

    #[test]
    fn missing_cover_leaves_poster_cell_empty() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("list.docx");
        assemble(
            &default_template().unwrap(),
            &[record("Bare", Cover::Missing)],
            &out,
        )
        .unwrap();

        let document = read_document(&out);
        assert!(!document.contains("<w:drawing"));
    }

    #[test]
    fn template_without_table_is_rejected() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file::<_, ()>(DOCUMENT_PART, FileOptions::default())
            .unwrap();
        zip.write_all(b"<w:document><w:body><w:p/></w:body></w:document>")
            .unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let dir = TempDir::new().unwrap();
        let err = assemble(
            &bytes,
            &[record("X", Cover::Missing)],
            &dir.path().join("out.docx"),
        )
        .unwrap_err();
        assert!(matches!(err, KinolistError::TemplateError { .. }));
    }

    #[test]
    fn unwritable_output_path_is_a_write_error() {
        let err = assemble(
            &default_template().unwrap(),
            &[record("X", Cover::Missing)],
            Path::new("/nonexistent-dir/out.docx"),
        )
        .unwrap_err();
        assert!(matches!(err, KinolistError::WriteError { .. }));
    }
}
