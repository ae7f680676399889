use thiserror::Error;

#[derive(Error, Debug)]
pub enum KinolistError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Catalog provider returned HTTP {status}")]
    ProviderStatus { status: u16 },

    #[error("Catalog credential was rejected by the provider")]
    CredentialInvalid,

    #[error("Catalog record is missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Image processing failed: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Tag write failed: {0}")]
    TagError(#[from] lofty::error::LoftyError),

    #[error("Template error: {message}")]
    TemplateError { message: String },

    #[error("Cannot save document to {path}: {message}")]
    WriteError { path: String, message: String },

    #[error("PDF conversion failed: {message}")]
    PdfError { message: String },

    #[error("A request with key '{key}' is already running")]
    RequestInProgress { key: String },

    #[error("None of the titles could be resolved")]
    NothingResolved,

    #[error("None of the resolved titles could be loaded")]
    NothingEnriched,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Processing,
    Output,
    Concurrency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl KinolistError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_)
            | Self::ProviderStatus { .. }
            | Self::CredentialInvalid
            | Self::MissingField { .. } => ErrorCategory::Provider,
            Self::ImageError(_)
            | Self::SerializationError(_)
            | Self::NothingResolved
            | Self::NothingEnriched => ErrorCategory::Processing,
            Self::ZipError(_)
            | Self::IoError(_)
            | Self::TagError(_)
            | Self::TemplateError { .. }
            | Self::WriteError { .. }
            | Self::PdfError { .. } => ErrorCategory::Output,
            Self::RequestInProgress { .. } => ErrorCategory::Concurrency,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NothingResolved | Self::NothingEnriched | Self::RequestInProgress { .. } => {
                ErrorSeverity::Low
            }
            Self::ApiError(_) | Self::ProviderStatus { .. } | Self::MissingField { .. } => {
                ErrorSeverity::Medium
            }
            Self::CredentialInvalid
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) | Self::ProviderStatus { .. } => {
                "Check network connectivity and try again later"
            }
            Self::CredentialInvalid => "Verify the KINOPOISK_API_TOKEN value",
            Self::MissingField { .. } => "The catalog record is incomplete; try another title",
            Self::NothingResolved => "Check the spelling of the titles or pin ids with KP~<id>",
            Self::NothingEnriched => "The provider rejected every detail request; retry later",
            Self::TemplateError { .. } => "Point --template at a docx with one prototype table",
            Self::WriteError { .. } => "Close any program holding the output file open",
            Self::PdfError { .. } => "Make sure LibreOffice (soffice) is installed and on PATH",
            Self::RequestInProgress { .. } => "Wait for the previous request to finish",
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Run with --help and fix the flagged option",
            _ => "Check the log for details",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::CredentialInvalid => "The catalog API token was rejected".to_string(),
            Self::NothingResolved => "Nothing found for the given titles".to_string(),
            Self::NothingEnriched => "None of the found films could be loaded".to_string(),
            Self::WriteError { path, .. } => format!("Could not save the list to {path}"),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KinolistError>;
