//! Metadata fetching: turns a resolved catalog id into a full [`FilmRecord`]
//! with a normalized cover.

use crate::core::cover;
use crate::domain::model::{Cover, FilmId, FilmRecord, StaffEntry, CAST_SLOTS};
use crate::domain::ports::MetadataProvider;
use crate::utils::error::{KinolistError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Director slot plus ten cast slots.
const STAFF_SLOTS: usize = CAST_SLOTS + 1;

/// Maximum synopsis length (in characters) when shortening is requested.
pub const SYNOPSIS_LIMIT: usize = 665;

const TRUNCATION_MARKER: &str = "...";

pub struct MetadataFetcher<'a, P: MetadataProvider> {
    provider: &'a P,
}

impl<'a, P: MetadataProvider> MetadataFetcher<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Fetch staff and detail records plus the poster for one id. Fails when
    /// either sub-request fails or a required field is absent; a failed
    /// poster download only yields the missing-cover sentinel.
    pub async fn fetch(&self, id: FilmId, shorten: bool) -> Result<FilmRecord> {
        let staff = self.provider.film_staff(id).await?;
        let names = staff_names(&staff);

        let detail = self.provider.film_detail(id).await?;
        let title = detail
            .name_ru
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| detail.name_original.clone().filter(|name| !name.is_empty()))
            .ok_or(KinolistError::MissingField { field: "nameRu/nameOriginal" })?;
        let synopsis_raw = detail
            .description
            .clone()
            .ok_or(KinolistError::MissingField { field: "description" })?;
        let synopsis = if shorten {
            shorten_synopsis(&synopsis_raw, SYNOPSIS_LIMIT)
        } else {
            synopsis_raw
        };

        let poster_url = detail.poster_url.clone().unwrap_or_default();
        let cover = if poster_url.is_empty() {
            Cover::Missing
        } else {
            match self.provider.download_poster(&poster_url).await? {
                Some(bytes) => Cover::Image(cover::normalize(&bytes)?),
                None => {
                    tracing::warn!("Poster download failed ({})", poster_url);
                    Cover::Missing
                }
            }
        };

        let director = names[0].clone();
        let cast = std::array::from_fn(|i| names[i + 1].clone());

        Ok(FilmRecord {
            file_stem: sanitize_file_stem(&title),
            title,
            year: detail.display_year(),
            rating: detail.rating_kinopoisk,
            countries: extract_countries(&detail.countries),
            synopsis,
            poster_url,
            director,
            cast,
            cover,
        })
    }
}

/// First [`STAFF_SLOTS`] display names, right-padded with empty strings so
/// fixed-position access never indexes out of range.
fn staff_names(staff: &[StaffEntry]) -> Vec<String> {
    let mut names: Vec<String> = staff
        .iter()
        .take(STAFF_SLOTS)
        .map(StaffEntry::display_name)
        .collect();
    names.resize(STAFF_SLOTS, String::new());
    names
}

/// The provider's country field is free-form; pull out every
/// `"country": "..."` pair instead of trusting a strict schema.
pub fn extract_countries(value: &serde_json::Value) -> Vec<String> {
    static COUNTRY: OnceLock<Regex> = OnceLock::new();
    let country = COUNTRY.get_or_init(|| Regex::new(r#""country"\s*:\s*"([^"]*)""#).unwrap());
    country
        .captures_iter(&value.to_string())
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Strip filesystem-unsafe characters (removed, not replaced).
pub fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>'))
        .collect()
}

/// Collapse doubled newlines, then truncate at a word boundary so the result
/// (including the marker) stays within `limit` characters.
pub fn shorten_synopsis(text: &str, limit: usize) -> String {
    let collapsed = text.replace("\n\n", " ");
    let words: Vec<&str> = collapsed.split_whitespace().collect();
    let normalized = words.join(" ");
    if normalized.chars().count() <= limit {
        return normalized;
    }

    let budget = limit.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut kept = String::new();
    let mut kept_chars = 0;
    for word in &words {
        let word_chars = word.chars().count();
        let extra = if kept.is_empty() { word_chars } else { word_chars + 1 };
        if kept_chars + extra > budget {
            break;
        }
        if !kept.is_empty() {
            kept.push(' ');
        }
        kept.push_str(word);
        kept_chars += extra;
    }
    kept.push_str(TRUNCATION_MARKER);
    kept
}
