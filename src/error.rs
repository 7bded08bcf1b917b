use thiserror::Error;

/// Validation failures that block a bulk-upload export
#[derive(Error, Debug, PartialEq)]
pub enum ExportError {
    #[error("A Final URL is required for every ad group before exporting. Missing in: {}", .0.join(", "))]
    MissingFinalUrl(Vec<String>),

    #[error("No campaigns to export")]
    NoCampaigns,

    #[error("Column {column} is not part of the {schema} layout")]
    UnmappedColumn { column: String, schema: &'static str },
}

/// Failures while reading an uploaded product feed
#[derive(Error, Debug, PartialEq)]
pub enum FeedError {
    #[error("Feed file is empty")]
    Empty,

    #[error("No feed loaded")]
    NotLoaded,

    #[error("Unknown feed row: {0}")]
    UnknownRow(String),

    #[error("Unknown feed column: {0}")]
    UnknownColumn(String),
}

/// Errors raised by the generation service adapters
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{provider} API error ({status}): {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    #[error("No content in {provider} response - possibly safety filtered ({detail})")]
    EmptyContent {
        provider: &'static str,
        detail: String,
    },

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Unsupported provider selected: {0}")]
    UnsupportedProvider(String),

    #[error("API connection required. Please enter your key.")]
    MissingCredential,

    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Invalid edits against the campaign tree
#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Pin position {position} is outside 1..={max}")]
    InvalidPin { position: u8, max: u8 },

    #[error("Slot {index} is outside the {len} available slots")]
    InvalidSlot { index: usize, len: usize },

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Ad group not found: {0}")]
    AdGroupNotFound(String),

    #[error("Keyword not found: {0}")]
    KeywordNotFound(String),

    #[error("Unknown match type: {0}")]
    UnknownMatchType(String),

    #[error("{0}")]
    MissingInput(String),
}

/// Errors from the persisted key-value store
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access state: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur anywhere in the builder
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid campaign file: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BuilderError>;
