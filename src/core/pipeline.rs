//! End-to-end request engine: credential probe, resolution, enrichment,
//! document assembly, optional PDF rendering.

use crate::adapters::{docx, pdf, template};
use crate::core::enrich::BatchEnricher;
use crate::core::resolver::{TitleResolver, DEFAULT_SEARCH_DELAY};
use crate::core::session::{RequestGuard, RequestRegistry};
use crate::domain::model::EnrichmentBatch;
use crate::domain::ports::{ConfigProvider, MetadataProvider};
use crate::utils::error::{KinolistError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub shorten: bool,
    pub convert_pdf: bool,
    /// Custom template bytes; the built-in layout is used when absent.
    pub template: Option<Vec<u8>>,
}

impl ListOptions {
    /// Derive the flag options from any configuration source. Template bytes
    /// are not part of the configuration contract and stay caller-supplied.
    pub fn from_config(config: &impl ConfigProvider) -> Self {
        Self {
            shorten: config.shorten(),
            convert_pdf: config.convert_pdf(),
            template: None,
        }
    }
}

#[derive(Debug)]
pub struct ListOutcome {
    pub docx_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
    pub record_count: usize,
    /// Tokens that resolved to nothing, reported in aggregate.
    pub unresolved: Vec<String>,
}

pub struct ListPipeline<'a, P: MetadataProvider> {
    provider: &'a P,
    search_delay: Duration,
}

impl<'a, P: MetadataProvider> ListPipeline<'a, P> {
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

    /// Resolve and enrich one batch of raw titles. Structural failures
    /// (credential, provider outage) propagate; per-item failures end up in
    /// the unresolved list or are dropped by the enricher.
    pub async fn enrich_batch(&self, lines: &[String], shorten: bool) -> Result<EnrichmentBatch> {
        self.provider.probe().await?;

        let resolution = TitleResolver::new(self.provider)
            .with_search_delay(self.search_delay)
            .resolve(lines)
            .await?;
        if !resolution.unresolved.is_empty() {
            tracing::info!(
                "Not found ({}): {}",
                resolution.unresolved.len(),
                resolution.unresolved.join(", ")
            );
        }
        if resolution.resolved.is_empty() {
            return Err(KinolistError::NothingResolved);
        }

        let records = BatchEnricher::new(self.provider)
            .enrich(&resolution.resolved, shorten)
            .await;
        if records.is_empty() {
            return Err(KinolistError::NothingEnriched);
        }

        Ok(EnrichmentBatch {
            records,
            unresolved: resolution.unresolved,
        })
    }

    /// Full document generation to a caller-chosen output path.
    pub async fn generate(
        &self,
        lines: &[String],
        opts: &ListOptions,
        out_docx: &Path,
    ) -> Result<ListOutcome> {
        let batch = self.enrich_batch(lines, opts.shorten).await?;

        let template_bytes = match &opts.template {
            Some(bytes) => bytes.clone(),
            None => template::default_template()?,
        };
        docx::assemble(&template_bytes, &batch.records, out_docx)?;

        let pdf_path = if opts.convert_pdf {
            Some(pdf::convert_to_pdf(out_docx).await?)
        } else {
            None
        };

        Ok(ListOutcome {
            docx_path: out_docx.to_path_buf(),
            pdf_path,
            record_count: batch.records.len(),
            unresolved: batch.unresolved,
        })
    }

    /// Registry-guarded generation into the request's scratch directory.
    /// The guard owns the directory; dropping it (also on failure) removes
    /// the scratch files, so the caller must deliver the artifact before
    /// calling [`RequestGuard::finish`].
    pub async fn run_request(
        &self,
        registry: &RequestRegistry,
        key: &str,
        lines: &[String],
        opts: &ListOptions,
    ) -> Result<(RequestGuard, ListOutcome)> {
        let guard = registry.begin(key)?;
        let outcome = self.generate(lines, opts, &guard.docx_path()).await?;
        Ok((guard, outcome))
    }
}
