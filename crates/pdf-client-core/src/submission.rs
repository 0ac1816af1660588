//! Translation request options and form assembly.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::credentials::{ParseCredential, TranslateCredential};
use crate::intake::SelectedFile;
use crate::service::SubmissionForm;

/// The only output format the service produces
pub const OUTPUT_FORMAT: &str = "md";

/// Shown when the server gives no usable error message
pub const GENERIC_FAILURE: &str = "Translation failed";

/// How the server translates the parsed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// Machine translation corrected by the AI model
    #[default]
    Hybrid,
    /// AI model only
    Fast,
    /// Machine translation only
    Deeplx,
}

impl TranslationMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::Fast => "fast",
            Self::Deeplx => "deeplx",
        }
    }
}

impl std::fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TranslationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hybrid" => Ok(Self::Hybrid),
            "fast" => Ok(Self::Fast),
            "deeplx" => Ok(Self::Deeplx),
            other => Err(format!("unknown translation mode '{other}'")),
        }
    }
}

/// Per-request parsing and translation flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOptions {
    #[serde(default = "default_true")]
    pub is_ocr: bool,
    #[serde(default = "default_true")]
    pub include_image_base64: bool,
    #[serde(default = "default_true")]
    pub formula_enable: bool,
    #[serde(default = "default_true")]
    pub table_enable: bool,
    #[serde(default = "default_layout_model")]
    pub layout_model: String,
    #[serde(default)]
    pub translation_mode: TranslationMode,
    /// Page range passed through to the parser, e.g. `"10"`
    #[serde(default)]
    pub end_pages: Option<String>,
}

const fn default_true() -> bool {
    true
}

fn default_layout_model() -> String {
    "doclayout_yolo".to_string()
}

impl Default for SubmissionOptions {
    fn default() -> Self {
        Self {
            is_ocr: true,
            include_image_base64: true,
            formula_enable: true,
            table_enable: true,
            layout_model: default_layout_model(),
            translation_mode: TranslationMode::default(),
            end_pages: None,
        }
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub file_name: String,
    pub saved_to: PathBuf,
    pub bytes: usize,
}

/// Assemble the request for `file`.
///
/// The parse token is sent only when a parse credential is selected and its
/// token is non-empty. The translate trio is sent whenever a translate
/// credential is selected, even with empty values.
pub fn build_form(
    file: &SelectedFile,
    file_bytes: Bytes,
    options: &SubmissionOptions,
    parse: Option<&ParseCredential>,
    translate: Option<&TranslateCredential>,
) -> SubmissionForm {
    let mut fields = vec![
        ("is_ocr", options.is_ocr.to_string()),
        ("include_image_base64", options.include_image_base64.to_string()),
        ("formula_enable", options.formula_enable.to_string()),
        ("table_enable", options.table_enable.to_string()),
        ("layout_model", options.layout_model.clone()),
        ("output_format", OUTPUT_FORMAT.to_string()),
        ("translation_mode", options.translation_mode.to_string()),
    ];

    if let Some(end_pages) = options
        .end_pages
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        fields.push(("end_pages", end_pages.to_string()));
    }

    if let Some(parse) = parse.filter(|p| !p.token.is_empty()) {
        fields.push(("parse_api_token", parse.token.clone()));
    }

    if let Some(translate) = translate {
        fields.push(("translate_api_url", translate.url.clone()));
        fields.push(("translate_api_key", translate.api_key.clone()));
        fields.push(("translate_api_model", translate.model.clone()));
    }

    SubmissionForm {
        file_name: file.name.clone(),
        file_bytes,
        fields,
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Extract the server's error message from a failure body
pub fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}
