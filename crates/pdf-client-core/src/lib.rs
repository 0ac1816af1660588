//! PDF Client Core Library
//!
//! This library provides everything a front end needs to drive a remote PDF
//! translation service:
//! - Persistent parse/translate API credentials with list selection
//! - Validation of the file to translate
//! - Multipart submission with a cosmetic progress estimate
//! - Saving the translated document
//! - Transient notifications

pub mod app;
pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod intake;
pub mod notify;
pub mod progress;
pub mod service;
pub mod storage;
pub mod store;
pub mod submission;
pub mod util;
pub mod view;

pub use app::ClientApp;
pub use config::{ClientConfig, StorageConfig, DEFAULT_ENDPOINT};
pub use credentials::{
    Confirm, Credential, CredentialKind, CredentialManager, CredentialView, ListView,
    ParseCredential, TranslateCredential,
};
pub use download::{DirectoryDownloads, DownloadSink};
pub use error::{Error, Result};
pub use intake::{FileIntake, SelectedFile, MAX_FILE_SIZE};
pub use notify::{Notification, NotificationCenter, Severity};
pub use progress::{Phase, ProgressEstimator, ProgressSnapshot};
pub use service::{HttpTranslateService, ServiceResponse, SubmissionForm, TranslateService};
pub use storage::{DiskStorage, MemoryStorage, Storage};
pub use store::ConfigStore;
pub use submission::{SubmissionOptions, SubmitOutcome, TranslationMode};
pub use util::format_file_size;
pub use view::ViewState;
