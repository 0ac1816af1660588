use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Multipart payload of one translation request
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    pub file_name: String,
    pub file_bytes: Bytes,
    /// Text fields in insertion order
    pub fields: Vec<(&'static str, String)>,
}

impl SubmissionForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Raw answer of the service
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ServiceResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Answer of the service health endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Remote PDF translation service
#[async_trait]
pub trait TranslateService: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &'static str {
        "translation service"
    }

    /// Send one translation request. Non-success statuses are not errors
    /// here; only transport failures are.
    async fn translate(&self, form: SubmissionForm) -> Result<ServiceResponse>;
}

/// `TranslateService` over HTTP multipart
pub struct HttpTranslateService {
    client: Client,
    endpoint: Url,
}

impl HttpTranslateService {
    /// `timeout` of `None` lets a request run until the server answers.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| Error::ConfigInvalid {
            field: "endpoint".to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Query `health` next to the translate endpoint
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self
            .endpoint
            .join("health")
            .map_err(|e| Error::Request(e.to_string()))?;
        debug!("Health check at {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Server {
                status: status.as_u16(),
                message: format!("health check returned HTTP {status}"),
            });
        }

        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TranslateService for HttpTranslateService {
    fn name(&self) -> &'static str {
        "HTTP translation service"
    }

    async fn translate(&self, form: SubmissionForm) -> Result<ServiceResponse> {
        let mime = mime_guess::from_path(&form.file_name).first_or_octet_stream();
        let file_part = Part::bytes(form.file_bytes.to_vec())
            .file_name(form.file_name.clone())
            .mime_str(mime.essence_str())
            .map_err(|e| Error::Request(e.to_string()))?;

        let mut multipart = Form::new().part("file", file_part);
        for (name, value) in form.fields {
            multipart = multipart.text(name, value);
        }

        debug!("POST {} ({} bytes)", self.endpoint, form.file_bytes.len());

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| {
                warn!("Request failed: {}", e);
                if e.is_timeout() {
                    Error::Request("request timed out".to_string())
                } else {
                    Error::Request(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(ServiceResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let err = HttpTranslateService::new("not a url", None)
            .err()
            .unwrap();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }

    #[test]
    fn test_success_range() {
        let ok = ServiceResponse { status: 204, body: Bytes::new() };
        let bad = ServiceResponse { status: 500, body: Bytes::new() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
