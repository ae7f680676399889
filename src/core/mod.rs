pub mod cover;
pub mod enrich;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;
pub mod session;

pub use crate::domain::model::{EnrichmentBatch, FilmId, FilmRecord, ResolutionResult};
pub use crate::domain::ports::{ConfigProvider, MetadataProvider};
pub use crate::utils::error::Result;
