//! Alternative sink: write the enriched record into an MP4 container's tag
//! fields instead of a document table.

use crate::core::cover;
use crate::domain::model::{Cover, FilmRecord};
use crate::utils::error::Result;
use lofty::config::WriteOptions;
use lofty::mp4::{Atom, AtomData, AtomIdent, Ilst};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::TagExt;
use std::path::Path;

fn text_atom(fourcc: [u8; 4], value: &str) -> Atom<'static> {
    Atom::new(AtomIdent::Fourcc(fourcc), AtomData::UTF8(value.to_string()))
}

/// Build the full replacement `ilst` for one record. The short and long
/// description atoms carry the same synopsis; the cover atom is omitted for
/// the missing-cover sentinel.
fn build_ilst(record: &FilmRecord) -> Result<Ilst> {
    let mut ilst = Ilst::default();
    ilst.insert(text_atom(*b"\xa9nam", &record.title));
    ilst.insert(text_atom(*b"desc", &record.synopsis));
    ilst.insert(text_atom(*b"ldes", &record.synopsis));
    ilst.insert(text_atom(*b"\xa9day", &record.year));

    if let Cover::Image(img) = &record.cover {
        let png = cover::encode_png(img)?;
        ilst.insert(Atom::new(
            AtomIdent::Fourcc(*b"covr"),
            AtomData::Picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(MimeType::Png),
                None,
                png,
            )),
        ));
    }
    Ok(ilst)
}

/// Replace the media file's tag fields with the record's metadata. Saving
/// the fresh `ilst` wholesale clears every pre-existing field.
pub fn write_tags(record: &FilmRecord, media_path: &Path) -> Result<()> {
    let ilst = build_ilst(record)?;
    ilst.save_to_path(media_path, WriteOptions::default())?;
    tracing::info!("Tags written to {}", media_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::config::ParseOptions;
    use lofty::file::AudioFile;
    use lofty::mp4::{AtomIdent, Mp4File};
    use tempfile::TempDir;

    fn record(cover: Cover) -> FilmRecord {
        FilmRecord {
            title: "Terminator".to_string(),
            year: "1984".to_string(),
            rating: Some(8.0),
            countries: vec![],
            synopsis: "A relentless cyborg.".to_string(),
            poster_url: String::new(),
            file_stem: "Terminator".to_string(),
            director: String::new(),
            cast: Default::default(),
            cover,
        }
    }

    fn text_of(ilst: &Ilst, fourcc: [u8; 4]) -> Option<String> {
        let atom = ilst.get(&AtomIdent::Fourcc(fourcc))?;
        atom.data().find_map(|data| match data {
            AtomData::UTF8(text) => Some(text.clone()),
            _ => None,
        })
    }

    #[test]
    fn ilst_carries_title_descriptions_and_year() {
        let ilst = build_ilst(&record(Cover::Missing)).unwrap();
        assert_eq!(text_of(&ilst, *b"\xa9nam").as_deref(), Some("Terminator"));
        assert_eq!(
            text_of(&ilst, *b"desc").as_deref(),
            Some("A relentless cyborg.")
        );
        // Long description duplicates the synopsis.
        assert_eq!(text_of(&ilst, *b"ldes"), text_of(&ilst, *b"desc"));
        assert_eq!(text_of(&ilst, *b"\xa9day").as_deref(), Some("1984"));
        assert!(ilst.get(&AtomIdent::Fourcc(*b"covr")).is_none());
    }

    #[test]
    fn cover_atom_is_present_for_normalized_covers() {
        let img = image::RgbImage::from_pixel(4, 6, image::Rgb([1, 2, 3]));
        let ilst = build_ilst(&record(Cover::Image(img))).unwrap();
        assert!(ilst.get(&AtomIdent::Fourcc(*b"covr")).is_some());
    }

    fn boxed(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(name);
        out.extend_from_slice(payload);
        out
    }

    /// Smallest container the writer accepts: ftyp plus a moov whose ilst
    /// already carries a genre field.
    fn mp4_with_genre() -> Vec<u8> {
        let data = {
            let mut payload = vec![0, 0, 0, 1]; // UTF-8 type code
            payload.extend_from_slice(&[0; 4]); // locale
            payload.extend_from_slice(b"Action");
            boxed(b"data", &payload)
        };
        let genre = boxed(b"\xa9gen", &data);
        let ilst = boxed(b"ilst", &genre);
        let hdlr = {
            let mut payload = vec![0; 8]; // version/flags + predefined
            payload.extend_from_slice(b"mdir");
            payload.extend_from_slice(b"appl");
            payload.extend_from_slice(&[0; 9]);
            boxed(b"hdlr", &payload)
        };
        let meta = {
            let mut payload = vec![0; 4]; // version/flags
            payload.extend_from_slice(&hdlr);
            payload.extend_from_slice(&ilst);
            boxed(b"meta", &payload)
        };
        let udta = boxed(b"udta", &meta);
        let moov = boxed(b"moov", &udta);

        let mut file = boxed(b"ftyp", b"isom\x00\x00\x02\x00isomiso2mp41");
        file.extend_from_slice(&moov);
        file
    }

    #[test]
    fn write_tags_replaces_existing_fields_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Terminator.mp4");
        std::fs::write(&path, mp4_with_genre()).unwrap();

        let img = image::RgbImage::from_pixel(4, 6, image::Rgb([1, 2, 3]));
        write_tags(&record(Cover::Image(img)), &path).unwrap();

        let mut file = std::fs::File::open(&path).unwrap();
        let mp4 = Mp4File::read_from(&mut file, ParseOptions::new().read_properties(false))
            .unwrap();
        let ilst = mp4.ilst().unwrap();

        for fourcc in [*b"\xa9nam", *b"desc", *b"ldes", *b"\xa9day", *b"covr"] {
            assert!(
                ilst.get(&AtomIdent::Fourcc(fourcc)).is_some(),
                "missing {fourcc:?}"
            );
        }
        assert_eq!(text_of(ilst, *b"\xa9nam").as_deref(), Some("Terminator"));
        // The wholesale replacement dropped the pre-existing genre.
        assert!(ilst.get(&AtomIdent::Fourcc(*b"\xa9gen")).is_none());
    }
}
