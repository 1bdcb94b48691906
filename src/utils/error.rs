use thiserror::Error;

/// Record-level validation failures. Never fatal during ingestion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("port ID cannot be empty")]
    EmptyId,

    #[error("port name cannot be empty")]
    EmptyName,

    #[error("coordinates must contain exactly longitude and latitude, got {got} values")]
    BadCoordinateCount { got: usize },

    #[error("{axis} must be between {min} and {max}, got {value}")]
    OutOfRange {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("port must have coordinates")]
    MissingCoordinates,
}

#[derive(Error, Debug)]
pub enum PortError {
    #[error("invalid port: {0}")]
    Validation(#[from] ValidationError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("nil port")]
    NilInput,

    #[error("failed to open source {path}: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read JSON start: {source}")]
    MalformedStart {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode port data{}: {source}", describe_position(.after))]
    MalformedRecord {
        after: Option<String>,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to save port {id}: {source}")]
    StoreFailure {
        id: String,
        #[source]
        source: Box<PortError>,
    },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error in {field}: {message}")]
    Config { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("ingestion task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PortError>;

fn describe_position(after: &Option<String>) -> String {
    match after {
        Some(id) => format!(" at {id}"),
        None => String::new(),
    }
}

impl PortError {
    /// True for a cooperative abort, including one surfaced through a store write.
    pub fn is_cancelled(&self) -> bool {
        match self {
            PortError::Cancelled => true,
            PortError::StoreFailure { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            PortError::Cancelled => 0,
            PortError::Config { .. } | PortError::InvalidConfigValue { .. } | PortError::Toml(_) => 2,
            PortError::SourceUnavailable { .. } => 3,
            _ => 1,
        }
    }
}
