//! Title resolution: maps raw input lines to catalog ids, tolerating
//! ambiguous and missing matches.

use crate::domain::model::{FilmId, ResolutionResult};
use crate::domain::ports::MetadataProvider;
use crate::utils::error::{KinolistError, Result};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Courtesy throttle between keyword searches, not a correctness concern.
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(200);

/// An explicit `KP~<digits>` tag in a title pins the catalog id and skips
/// the search step entirely.
pub fn find_inline_id(title: &str) -> Option<FilmId> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"KP~(\d+)").unwrap());
    tag.captures(title)
        .and_then(|caps| caps[1].parse().ok())
        .map(FilmId)
}

pub struct TitleResolver<'a, P: MetadataProvider> {
    provider: &'a P,
    search_delay: Duration,
}

impl<'a, P: MetadataProvider> TitleResolver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            search_delay: DEFAULT_SEARCH_DELAY,
        }
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    /// Resolve every query to either a catalog id or an unresolved token.
    ///
    /// Per-query transport or parse failures mark just that query as
    /// unresolved; a non-success status from the search endpoint aborts the
    /// whole batch, since the provider itself is unreachable. Duplicate ids
    /// are kept as-is.
    pub async fn resolve(&self, queries: &[String]) -> Result<ResolutionResult> {
        let mut result = ResolutionResult::default();

        for query in queries {
            if let Some(id) = find_inline_id(query) {
                match self.provider.film_detail(id).await {
                    Ok(detail) => {
                        tracing::info!(
                            "Found film: {} ({}), kinopoisk id: {}",
                            detail.name_ru.as_deref().unwrap_or_else(|| {
                                detail.name_original.as_deref().unwrap_or("")
                            }),
                            detail.display_year(),
                            id
                        );
                        result.resolved.push(id);
                    }
                    Err(err) => {
                        // The extracted id, not the raw line, is the
                        // unresolved token for tagged queries.
                        tracing::warn!("Tagged id {} failed detail fetch: {}", id, err);
                        result.unresolved.push(id.to_string());
                    }
                }
                continue;
            }

            tokio::time::sleep(self.search_delay).await;
            match self.provider.search_by_keyword(query).await {
                Ok(page) => {
                    if page.search_films_count_result == 0 || page.films.is_empty() {
                        tracing::info!("{} not found", query);
                        result.unresolved.push(query.clone());
                    } else {
                        // First match wins; no disambiguation.
                        let hit = &page.films[0];
                        tracing::info!(
                            "Found film: {}, kinopoisk id: {}",
                            hit.display_name(),
                            hit.film_id
                        );
                        result.resolved.push(FilmId(hit.film_id));
                    }
                }
                Err(KinolistError::ProviderStatus { status }) => {
                    tracing::warn!("Search endpoint unavailable (HTTP {})", status);
                    return Err(KinolistError::ProviderStatus { status });
                }
                Err(err) => {
                    tracing::warn!("Search for {} failed: {}", query, err);
                    result.unresolved.push(query.clone());
                }
            }
        }

        Ok(result)
    }
}
