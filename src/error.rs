use std::io;
use thiserror::Error;

/// Error type for detection and metadata operations.
#[derive(Error, Debug)]
pub enum CommaError {
    /// IO error while reading a sample.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// CSV parsing error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// The header is not a sequence of strings, or is structurally invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A primary key was set on metadata that has no header.
    #[error("cannot set the primary key of a table that does not have a header")]
    NoHeader,

    /// The requested primary key is not a column of the header.
    #[error("the requested primary key ({key}) is not one of the headers: {header}")]
    KeyLookup { key: String, header: String },

    /// No dialect could be detected from the sample.
    #[error("Could not detect CSV dialect: {0}")]
    DetectionFailure(String),

    /// Empty file or no data.
    #[error("Empty file or no data to analyze")]
    EmptyData,

    /// The input was classified as binary data.
    #[error("Input looks like binary data, not delimiter-separated text")]
    BinaryData,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CommaError {
    /// Returns true for the errors raised when sniffing cannot produce a dialect.
    pub fn is_detection_failure(&self) -> bool {
        matches!(self, CommaError::DetectionFailure(_) | CommaError::EmptyData)
    }
}

/// Result type alias for detection and metadata operations.
pub type Result<T> = std::result::Result<T, CommaError>;
