use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Category not found: {category}")]
    CategoryNotFound {
        category: String,
        suggestions: Vec<String>,
    },

    #[error("Insufficient history for {category}: {count} applicants, need at least {required}")]
    InsufficientHistory {
        category: String,
        count: usize,
        required: usize,
    },

    #[error("Discovery degenerate for {category}: {reason}")]
    DiscoveryDegenerate { category: String, reason: String },

    #[error("Path {path} of {category} has no members")]
    EmptyPath { category: String, path: usize },

    #[error("Profile corrupt: {0}")]
    ProfileCorrupt(String),

    #[error("Matching engine has no profiles loaded")]
    NotReady,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn schema_mismatch(detail: impl Into<String>) -> Self {
        Error::SchemaMismatch(detail.into())
    }

    pub fn corrupt(detail: impl Into<String>) -> Self {
        Error::ProfileCorrupt(detail.into())
    }

    /// Stable machine-readable kind, used in ranking failure records and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SchemaMismatch(_) => "schema_mismatch",
            Error::CategoryNotFound { .. } => "category_not_found",
            Error::InsufficientHistory { .. } => "insufficient_history",
            Error::DiscoveryDegenerate { .. } => "discovery_degenerate",
            Error::EmptyPath { .. } => "empty_path",
            Error::ProfileCorrupt(_) => "profile_corrupt",
            Error::NotReady => "not_ready",
            Error::Cancelled => "cancelled",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
