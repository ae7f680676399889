use serde::Deserialize;
use std::fmt;

/// Fixed number of cast slots in every [`FilmRecord`]. The provider staff
/// list is truncated or right-padded so downstream consumers can rely on it.
pub const CAST_SLOTS: usize = 10;

/// Opaque key into the catalog provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilmId(pub u64);

impl fmt::Display for FilmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of resolving a batch of raw titles. Every input ends up in
/// exactly one of the two lists; both preserve processing order.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    pub resolved: Vec<FilmId>,
    pub unresolved: Vec<String>,
}

/// Normalized poster, or an explicit sentinel when the download did not
/// succeed. Consumers branch on the sentinel instead of failing.
#[derive(Debug, Clone)]
pub enum Cover {
    Image(image::RgbImage),
    Missing,
}

impl Cover {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cover::Missing)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Cover::Image(img) => Some(img.dimensions()),
            Cover::Missing => None,
        }
    }
}

/// One enriched film. Created once by the fetcher, immutable thereafter.
#[derive(Debug, Clone)]
pub struct FilmRecord {
    pub title: String,
    pub year: String,
    pub rating: Option<f64>,
    pub countries: Vec<String>,
    pub synopsis: String,
    pub poster_url: String,
    /// Title with filesystem-unsafe characters removed.
    pub file_stem: String,
    pub director: String,
    pub cast: [String; CAST_SLOTS],
    pub cover: Cover,
}

impl FilmRecord {
    /// Heading line for the document table and the info output mode.
    pub fn title_line(&self) -> String {
        match self.rating {
            Some(rating) => format!("{} - Kinopoisk {:.1}", self.title, rating),
            None => format!("{} - no rating", self.title),
        }
    }

    pub fn cast_line(&self) -> String {
        self.cast
            .iter()
            .filter(|name| !name.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Plain-text rendering used by the "info" output mode.
    pub fn summary(&self) -> String {
        format!(
            "{}\n{}\n{}\nDirector: {}\nIn starring: {}\n\n{}",
            self.title_line(),
            self.year,
            self.countries.join(", "),
            self.director,
            self.cast_line(),
            self.synopsis,
        )
    }
}

/// Records produced from one request plus the carried-over unresolved titles.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentBatch {
    pub records: Vec<FilmRecord>,
    pub unresolved: Vec<String>,
}

// Provider wire DTOs. Every field is optional or defaulted; the upstream
// schema is loose and absent fields must not fail deserialization.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub search_films_count_result: u64,
    #[serde(default)]
    pub films: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub film_id: u64,
    #[serde(default)]
    pub name_ru: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub year: Option<serde_json::Value>,
}

impl SearchHit {
    /// Localized name preferred over the original-language one.
    pub fn display_name(&self) -> &str {
        match (&self.name_ru, &self.name_en) {
            (Some(ru), _) if !ru.is_empty() => ru,
            (_, Some(en)) => en,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmDetail {
    #[serde(default)]
    pub name_ru: Option<String>,
    #[serde(default)]
    pub name_original: Option<String>,
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub rating_kinopoisk: Option<f64>,
    /// Free-form upstream field; parsed defensively, see the fetcher.
    #[serde(default)]
    pub countries: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl FilmDetail {
    /// The detail endpoint returns the year as a number, the search endpoint
    /// as a string. Render either to a display string.
    pub fn display_year(&self) -> String {
        match &self.year {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffEntry {
    #[serde(default)]
    pub name_ru: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub profession_key: Option<String>,
}

impl StaffEntry {
    /// Localized name, falling back to the original-language one when the
    /// localized field is blank.
    pub fn display_name(&self) -> String {
        match &self.name_ru {
            Some(ru) if !ru.is_empty() => ru.clone(),
            _ => self.name_en.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_line_with_and_without_rating() {
        let mut record = FilmRecord {
            title: "Terminator".to_string(),
            year: "1984".to_string(),
            rating: Some(8.0),
            countries: vec!["USA".to_string()],
            synopsis: String::new(),
            poster_url: String::new(),
            file_stem: "Terminator".to_string(),
            director: String::new(),
            cast: Default::default(),
            cover: Cover::Missing,
        };
        assert_eq!(record.title_line(), "Terminator - Kinopoisk 8.0");

        record.rating = None;
        assert_eq!(record.title_line(), "Terminator - no rating");
    }

    #[test]
    fn summary_renders_the_full_info_block() {
        let mut cast: [String; CAST_SLOTS] = Default::default();
        cast[0] = "Arnold Schwarzenegger".to_string();
        cast[1] = "Linda Hamilton".to_string();
        let record = FilmRecord {
            title: "Terminator".to_string(),
            year: "1984".to_string(),
            rating: Some(8.0),
            countries: vec!["USA".to_string(), "UK".to_string()],
            synopsis: "A relentless cyborg.".to_string(),
            poster_url: String::new(),
            file_stem: "Terminator".to_string(),
            director: "James Cameron".to_string(),
            cast,
            cover: Cover::Missing,
        };

        // Empty cast slots are filtered out, not rendered as blanks.
        assert_eq!(
            record.summary(),
            "Terminator - Kinopoisk 8.0\n1984\nUSA, UK\n\
             Director: James Cameron\n\
             In starring: Arnold Schwarzenegger, Linda Hamilton\n\n\
             A relentless cyborg."
        );

        let mut unrated = record;
        unrated.rating = None;
        assert!(unrated.summary().starts_with("Terminator - no rating\n"));
    }

    #[test]
    fn staff_display_name_prefers_localized() {
        let entry = StaffEntry {
            name_ru: Some("Имя".to_string()),
            name_en: Some("Name".to_string()),
            profession_key: None,
        };
        assert_eq!(entry.display_name(), "Имя");

        let blank_localized = StaffEntry {
            name_ru: Some(String::new()),
            name_en: Some("Name".to_string()),
            profession_key: None,
        };
        assert_eq!(blank_localized.display_name(), "Name");
    }

    #[test]
    fn display_year_handles_both_wire_types() {
        let mut detail: FilmDetail = serde_json::from_str(r#"{"year": 1984}"#).unwrap();
        assert_eq!(detail.display_year(), "1984");

        detail.year = Some(serde_json::Value::String("1984".to_string()));
        assert_eq!(detail.display_year(), "1984");

        detail.year = None;
        assert_eq!(detail.display_year(), "");
    }
}
