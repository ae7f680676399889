//! Batch enrichment: drives the fetcher over an ordered id list. One id's
//! failure never aborts the batch; the id is logged and dropped.

use crate::core::fetcher::MetadataFetcher;
use crate::domain::model::{FilmId, FilmRecord};
use crate::domain::ports::MetadataProvider;

pub struct BatchEnricher<'a, P: MetadataProvider> {
    fetcher: MetadataFetcher<'a, P>,
}

impl<'a, P: MetadataProvider> BatchEnricher<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            fetcher: MetadataFetcher::new(provider),
        }
    }

    pub async fn enrich(&self, ids: &[FilmId], shorten: bool) -> Vec<FilmRecord> {
        self.enrich_with_progress(ids, shorten, |_, _| {}).await
    }

    /// Sequential enrichment with an observable completed-count. `progress`
    /// receives `(done, total)` after every id, successful or not.
    pub async fn enrich_with_progress<F>(
        &self,
        ids: &[FilmId],
        shorten: bool,
        mut progress: F,
    ) -> Vec<FilmRecord>
    where
        F: FnMut(usize, usize),
    {
        let total = ids.len();
        let mut records = Vec::with_capacity(total);

        for (done, id) in ids.iter().enumerate() {
            match self.fetcher.fetch(*id, shorten).await {
                Ok(record) => {
                    tracing::debug!("{} - ok", record.title);
                    records.push(record);
                }
                Err(err) => {
                    tracing::warn!("Dropping id {} from the batch: {}", id, err);
                }
            }
            progress(done + 1, total);
        }

        records
    }
}
