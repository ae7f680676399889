//! HTTP client for the unofficial Kinopoisk API.

use crate::domain::model::{FilmDetail, FilmId, SearchPage, StaffEntry};
use crate::domain::ports::MetadataProvider;
use crate::utils::error::{KinolistError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "https://kinopoiskapiunofficial.tech";

pub struct KinopoiskClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl KinopoiskClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Tests point this at a mock server.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "kinopoisk request");

        let response = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KinolistError::ProviderStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MetadataProvider for KinopoiskClient {
    async fn search_by_keyword(&self, keyword: &str) -> Result<SearchPage> {
        self.get_json(
            "/api/v2.1/films/search-by-keyword",
            &[("keyword", keyword), ("page", "1")],
        )
        .await
    }

    async fn film_detail(&self, id: FilmId) -> Result<FilmDetail> {
        self.get_json(&format!("/api/v2.2/films/{}", id), &[]).await
    }

    async fn film_staff(&self, id: FilmId) -> Result<Vec<StaffEntry>> {
        self.get_json("/api/v1/staff", &[("filmId", id.to_string().as_str())])
            .await
    }

    async fn download_poster(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            tracing::warn!("Poster fetch returned HTTP {} ({url})", response.status());
            return Ok(None);
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }
}
