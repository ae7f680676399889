pub mod adapters;
#[cfg(feature = "cli")]
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::kinopoisk::KinopoiskClient;
pub use crate::core::pipeline::{ListOptions, ListOutcome, ListPipeline};
pub use crate::core::session::{RequestGuard, RequestRegistry};
pub use crate::domain::model::{Cover, EnrichmentBatch, FilmId, FilmRecord, ResolutionResult};
pub use crate::domain::ports::MetadataProvider;
pub use crate::utils::error::{KinolistError, Result};
