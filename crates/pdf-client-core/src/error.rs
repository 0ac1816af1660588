use thiserror::Error;

/// Unified error type for pdf-client-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Local storage operations (opening, reading, writing)
/// - Credential list operations
/// - File intake validation
/// - Submission to the translation service
/// - Configuration operations (loading, validation)
/// - General I/O operations
///
/// The `Display` text of intake and server errors is shown to the user
/// verbatim, so keep those messages short and human-readable.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Storage Errors
    // ==========================================================================
    /// Failed to open the local storage backend
    #[error("failed to open storage: {0}")]
    StorageOpen(String),

    /// Failed to read a storage slot
    #[error("failed to read from storage: {0}")]
    StorageRead(String),

    /// Failed to write a storage slot
    #[error("failed to write to storage: {0}")]
    StorageWrite(String),

    /// Failed to serialize credentials for storage
    #[error("failed to serialize credentials: {0}")]
    Serialize(String),

    // ==========================================================================
    // Credential Errors
    // ==========================================================================
    /// Field name not present on this kind of credential
    #[error("unknown field '{field}' for {kind}")]
    UnknownField { kind: &'static str, field: String },

    // ==========================================================================
    // File Intake Errors
    // ==========================================================================
    /// Selected file is not a PDF
    #[error("please select a PDF file")]
    UnsupportedFileType { name: String },

    /// Selected file exceeds the upload ceiling
    #[error("file size cannot exceed {} MB", limit / (1024 * 1024))]
    FileTooLarge { size: u64, limit: u64 },

    // ==========================================================================
    // Submission Errors
    // ==========================================================================
    /// Transport-level failure while talking to the service
    #[error("request failed: {0}")]
    Request(String),

    /// Service answered with a non-success status
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Response body could not be read or interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to save the translated document
    #[error("failed to save download: {0}")]
    Download(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
