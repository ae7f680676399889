use crate::domain::model::{FilmDetail, FilmId, SearchPage, StaffEntry};
use crate::utils::error::{KinolistError, Result};
use async_trait::async_trait;

/// Catalog id used for the cheap credential probe.
pub const PROBE_FILM_ID: FilmId = FilmId(328);

/// Everything the pipeline needs from the metadata provider. Implemented by
/// the HTTP client adapter and by in-memory stubs in tests.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn search_by_keyword(&self, keyword: &str) -> Result<SearchPage>;

    async fn film_detail(&self, id: FilmId) -> Result<FilmDetail>;

    async fn film_staff(&self, id: FilmId) -> Result<Vec<StaffEntry>>;

    /// Raw poster bytes; `None` when the provider answered with a
    /// non-success status (the record then carries a missing-cover sentinel).
    async fn download_poster(&self, url: &str) -> Result<Option<Vec<u8>>>;

    /// Credential check via a known-identifier detail fetch. Any failure is
    /// reported as an invalid credential and short-circuits the request.
    async fn probe(&self) -> Result<()> {
        self.film_detail(PROBE_FILM_ID)
            .await
            .map(|_| ())
            .map_err(|_| KinolistError::CredentialInvalid)
    }
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn shorten(&self) -> bool;
    fn convert_pdf(&self) -> bool;
}
