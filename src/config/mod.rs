use crate::domain::ports::ConfigProvider;
use crate::utils::error::{KinolistError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_url, Validate,
};
use clap::Parser;

pub const API_TOKEN_ENV: &str = "KINOPOISK_API_TOKEN";

#[derive(Debug, Clone, Parser)]
#[command(name = "kinolist")]
#[command(about = "Create enriched movie lists in docx/pdf format or write MP4 tags")]
pub struct CliConfig {
    /// Movie titles; a KP~<id> tag in a title pins the catalog id directly
    #[arg(short, long, num_args = 1..)]
    pub movie: Vec<String>,

    /// Text file with one title per line
    #[arg(short, long, conflicts_with = "movie")]
    pub file: Option<String>,

    /// Output document path
    #[arg(short, long, default_value = "list.docx")]
    pub output: String,

    /// Shorten movie descriptions
    #[arg(short, long)]
    pub shorten: bool,

    /// Write tags to an mp4 file (or to every mp4 file in a directory)
    #[arg(short, long, conflicts_with_all = ["movie", "file"])]
    pub tag: Option<String>,

    /// Also render the document to PDF (requires LibreOffice)
    #[arg(long)]
    pub pdf: bool,

    /// Custom docx template containing the prototype table
    #[arg(long)]
    pub template: Option<String>,

    /// Catalog API token; taken from KINOPOISK_API_TOKEN when omitted
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "https://kinopoiskapiunofficial.tech")]
    pub api_endpoint: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Flag value first, environment second.
    pub fn resolved_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_TOKEN_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| KinolistError::MissingConfigError {
                field: format!("api_key (or {API_TOKEN_ENV})"),
            })
    }
}

impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn shorten(&self) -> bool {
        self.shorten
    }

    fn convert_pdf(&self) -> bool {
        self.pdf
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_endpoint", &self.api_endpoint)?;
        validate_path("output", &self.output)?;
        validate_file_extensions("output", &[self.output.clone()], &["docx"])?;

        if let Some(file) = &self.file {
            validate_non_empty_string("file", file)?;
        }
        if let Some(tag) = &self.tag {
            validate_non_empty_string("tag", tag)?;
        }
        if self.movie.is_empty() && self.file.is_none() && self.tag.is_none() {
            return Err(KinolistError::ConfigError {
                message: "nothing to do: pass --movie, --file or --tag".to_string(),
            });
        }
        Ok(())
    }
}
