//! Integration tests for pdf-client-core
//!
//! These tests drive a whole client session:
//! - Credential management persisted through storage
//! - File intake and its notifications
//! - Submission against a mock translation service
//! - Download and view-state handling on success and failure

use async_trait::async_trait;
use bytes::Bytes;
use pdf_client_core::{
    ClientApp, ClientConfig, CredentialKind, DownloadSink, Error, MemoryStorage,
    Phase, ProgressSnapshot, Result, SelectedFile, ServiceResponse, Severity, SubmissionForm,
    SubmissionOptions, TranslateService,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Mock Service and Sink for Testing
// =============================================================================

/// A mock service that answers with a canned response and records requests.
struct MockService {
    status: u16,
    body: Bytes,
    /// Simulated server time
    delay: Duration,
    /// Simulate a transport failure if true
    unreachable: bool,
    requests: Mutex<Vec<SubmissionForm>>,
}

impl MockService {
    fn ok(body: &'static [u8]) -> Self {
        Self {
            status: 200,
            body: Bytes::from_static(body),
            delay: Duration::from_secs(2),
            unreachable: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16, body: &'static [u8]) -> Self {
        Self {
            status,
            ..Self::ok(body)
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok(b"%PDF translated")
        }
    }

    fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::ok(b"")
        }
    }

    fn requests(&self) -> Vec<SubmissionForm> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslateService for MockService {
    async fn translate(&self, form: SubmissionForm) -> Result<ServiceResponse> {
        self.requests.lock().unwrap().push(form);
        tokio::time::sleep(self.delay).await;

        if self.unreachable {
            return Err(Error::Request("connection refused".to_string()));
        }
        Ok(ServiceResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Records saved downloads in memory
#[derive(Default)]
struct RecordingSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSink {
    fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl DownloadSink for RecordingSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

struct Fixture {
    app: ClientApp,
    service: Arc<MockService>,
    sink: Arc<RecordingSink>,
    dir: TempDir,
}

fn fixture(service: MockService) -> Fixture {
    let service = Arc::new(service);
    let sink = Arc::new(RecordingSink::default());
    let app = ClientApp::with_parts(
        ClientConfig::default(),
        Arc::new(MemoryStorage::new()),
        service.clone(),
        sink.clone(),
    );

    Fixture {
        app,
        service,
        sink,
        dir: tempfile::tempdir().unwrap(),
    }
}

fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4 test").unwrap();
    path
}

fn messages(app: &ClientApp, severity: Severity) -> Vec<String> {
    app.notifications()
        .toasts()
        .into_iter()
        .filter(|t| t.severity == severity)
        .map(|t| t.message)
        .collect()
}

// =============================================================================
// Submission Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_successful_submission_downloads_once() {
    let mut f = fixture(MockService::ok(b"%PDF translated"));
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    let outcome = f
        .app
        .submit(&SubmissionOptions::default())
        .await
        .unwrap()
        .expect("submission should run");

    assert_eq!(outcome.file_name, "translated_report.pdf");
    assert_eq!(outcome.bytes, 15);

    let saved = f.sink.saved();
    assert_eq!(saved.len(), 1, "download must be triggered exactly once");
    assert_eq!(saved[0].0, "translated_report.pdf");
    assert_eq!(saved[0].1, b"%PDF translated");

    let view = f.app.view();
    assert_eq!(view.progress, ProgressSnapshot::finished());
    assert_eq!(view.progress.phase, Phase::Generating);
    assert!(!view.progress_visible);
    assert!(view.result_visible);
    assert!(view.submit_enabled);
    assert_eq!(view.submit_label, "Translate again");
}

#[tokio::test(start_paused = true)]
async fn test_server_error_is_surfaced() {
    let mut f = fixture(MockService::failing(500, br#"{"error":"bad token"}"#));
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    let err = f
        .app
        .submit(&SubmissionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server { status: 500, .. }));

    let errors = messages(&f.app, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("bad token"), "got {errors:?}");

    assert_eq!(f.app.current_file().map(|f| f.name.as_str()), Some("report.pdf"));
    assert!(f.app.view().submit_enabled);
    assert!(!f.app.view().progress_visible);
    assert!(f.sink.saved().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_error_body_uses_generic_message() {
    let mut f = fixture(MockService::failing(502, b"<html>Bad Gateway</html>"));
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    let err = f.app.submit(&SubmissionOptions::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "Translation failed");
    assert_eq!(
        messages(&f.app, Severity::Error),
        ["Translation failed: Translation failed"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_leaves_app_resubmittable() {
    let mut f = fixture(MockService::unreachable());
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    let err = f.app.submit(&SubmissionOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Request(_)));
    assert!(f.app.view().submit_enabled);

    // A second attempt goes through the service again
    let _ = f.app.submit(&SubmissionOptions::default()).await;
    assert_eq!(f.service.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_submission_can_be_resubmitted() {
    let mut f = fixture(MockService::slow(Duration::from_secs(100)));
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    let cancelled = tokio::time::timeout(
        Duration::from_secs(10),
        f.app.submit(&SubmissionOptions::default()),
    )
    .await;
    assert!(cancelled.is_err(), "request should still be in flight");
    assert_eq!(f.service.requests().len(), 1);

    let view = f.app.view();
    assert!(view.submit_enabled);
    assert!(!view.progress_visible);
    assert!(!view.result_visible);

    let outcome = f.app.submit(&SubmissionOptions::default()).await.unwrap();
    assert!(outcome.is_some());
    assert_eq!(f.service.requests().len(), 2);
    assert_eq!(f.sink.saved().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_resubmit_delay_keeps_result() {
    let mut f = fixture(MockService::slow(Duration::from_secs(2)));
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    // Response arrives at 2 s; the resubmit delay would end at 3 s
    let cancelled = tokio::time::timeout(
        Duration::from_millis(2500),
        f.app.submit(&SubmissionOptions::default()),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(f.sink.saved().len(), 1);

    let view = f.app.view();
    assert!(view.result_visible);
    assert!(view.submit_enabled);
    assert!(!view.progress_visible);
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_file_is_noop() {
    let mut f = fixture(MockService::ok(b"x"));

    let outcome = f.app.submit(&SubmissionOptions::default()).await.unwrap();
    assert!(outcome.is_none());
    assert!(f.service.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_progress_stays_below_ceiling_until_response() {
    let mut f = fixture(MockService {
        delay: Duration::from_secs(30),
        ..MockService::ok(b"%PDF")
    });
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    let mut rx = f.app.subscribe_progress();
    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let snapshot = *rx.borrow_and_update();
            seen.push(snapshot);
            if snapshot.phase == Phase::Generating {
                break;
            }
        }
        seen
    });

    f.app.submit(&SubmissionOptions::default()).await.unwrap();
    let seen = watcher.await.unwrap();

    let (last, before) = seen.split_last().unwrap();
    assert_eq!(*last, ProgressSnapshot::finished());
    assert!(!before.is_empty());
    assert!(before.iter().all(|s| s.percent <= 90.0));
    assert!(before.windows(2).all(|w| w[0].percent <= w[1].percent));
}

// =============================================================================
// Credential Fields in Requests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_translate_fields_follow_selection() {
    let mut f = fixture(MockService::ok(b"%PDF"));
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    f.app.submit(&SubmissionOptions::default()).await.unwrap();

    f.app.add_credential(CredentialKind::Translate).unwrap();
    let id = f.app.credentials().translate().items()[0].id;
    f.app
        .update_credential(CredentialKind::Translate, id, "url", "https://api.example.com")
        .unwrap();
    f.app.submit(&SubmissionOptions::default()).await.unwrap();

    let requests = f.service.requests();
    assert_eq!(requests.len(), 2);

    let trio = ["translate_api_url", "translate_api_key", "translate_api_model"];
    assert!(trio.iter().all(|name| !requests[0].has_field(name)));
    assert!(trio.iter().all(|name| requests[1].has_field(name)));
    assert_eq!(requests[1].field("translate_api_key"), Some(""));
    assert_eq!(requests[1].field("translate_api_url"), Some("https://api.example.com"));
}

#[tokio::test(start_paused = true)]
async fn test_parse_token_sent_for_selected_credential() {
    let mut f = fixture(MockService::ok(b"%PDF"));
    let path = write_pdf(f.dir.path(), "report.pdf");
    f.app.select_path(&path).unwrap();

    f.app.add_credential(CredentialKind::Parse).unwrap();
    f.app.add_credential(CredentialKind::Parse).unwrap();
    let second = f.app.credentials().parse().items()[1].id;
    f.app
        .update_credential(CredentialKind::Parse, second, "token", "tok-2")
        .unwrap();

    // First record is selected by default and has no token
    f.app.submit(&SubmissionOptions::default()).await.unwrap();

    f.app.select_credential(CredentialKind::Parse, second);
    assert_eq!(messages(&f.app, Severity::Success), ["Parse API selected"]);
    f.app.submit(&SubmissionOptions::default()).await.unwrap();

    let requests = f.service.requests();
    assert!(!requests[0].has_field("parse_api_token"));
    assert_eq!(requests[1].field("parse_api_token"), Some("tok-2"));
}

// =============================================================================
// File Intake Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_rejected_file_posts_error_and_keeps_state() {
    let mut f = fixture(MockService::ok(b"x"));

    assert!(f
        .app
        .select_file(SelectedFile::new("report.docx", "report.docx", 1024))
        .is_err());
    assert!(f
        .app
        .select_file(SelectedFile::new("report.pdf", "report.pdf", 60 * 1024 * 1024))
        .is_err());

    assert!(f.app.current_file().is_none());
    assert!(f.app.view().upload_prompt_visible);
    assert!(!f.app.view().submit_enabled);
    assert_eq!(
        messages(&f.app, Severity::Error),
        ["please select a PDF file", "file size cannot exceed 50 MB"]
    );

    f.app
        .select_file(SelectedFile::new("report.pdf", "report.pdf", 10 * 1024 * 1024))
        .unwrap();
    assert!(f.app.view().submit_enabled);
    assert!(!f.app.view().upload_prompt_visible);
}

#[tokio::test(start_paused = true)]
async fn test_new_file_hides_previous_result_and_clear_resets() {
    let mut f = fixture(MockService::ok(b"%PDF"));
    let first = write_pdf(f.dir.path(), "a.pdf");
    let second = write_pdf(f.dir.path(), "b.pdf");

    f.app.select_path(&first).unwrap();
    f.app.submit(&SubmissionOptions::default()).await.unwrap();
    assert!(f.app.view().result_visible);

    f.app.select_path(&second).unwrap();
    assert!(!f.app.view().result_visible);
    assert_eq!(f.app.current_file().map(|f| f.name.as_str()), Some("b.pdf"));

    f.app.clear_file();
    assert!(f.app.current_file().is_none());
    assert!(f.app.view().upload_prompt_visible);
    assert!(!f.app.view().submit_enabled);

    let outcome = f.app.submit(&SubmissionOptions::default()).await.unwrap();
    assert!(outcome.is_none());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_credentials_survive_restart() {
    let storage = Arc::new(MemoryStorage::new());
    let session = |storage: Arc<MemoryStorage>| {
        ClientApp::with_parts(
            ClientConfig::default(),
            storage,
            Arc::new(MockService::ok(b"")),
            Arc::new(RecordingSink::default()),
        )
    };

    let created = {
        let mut app = session(storage.clone());
        for _ in 0..3 {
            app.add_credential(CredentialKind::Translate).unwrap();
        }
        let id = app.credentials().translate().items()[1].id;
        app.update_credential(CredentialKind::Translate, id, "model", "gpt-4o")
            .unwrap();
        app.credentials().translate().items().to_vec()
    };

    let app = session(storage);

    assert_eq!(app.credentials().translate().items(), created.as_slice());
    assert_eq!(
        app.credentials().translate().selected_id(),
        Some(created[0].id)
    );
    assert_eq!(created[1].model, "gpt-4o");
    let names: Vec<_> = created.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Translate AI 1", "Translate AI 2", "Translate AI 3"]);
}

#[tokio::test]
async fn test_update_of_removed_credential_is_ignored() {
    let mut f = fixture(MockService::ok(b""));
    f.app.add_credential(CredentialKind::Parse).unwrap();
    let id = f.app.credentials().parse().items()[0].id;

    f.app
        .remove_credential(CredentialKind::Parse, id, &|_: &str| true)
        .unwrap();
    assert!(f.app.credentials().parse().selected_id().is_none());

    f.app
        .update_credential(CredentialKind::Parse, id, "token", "late")
        .unwrap();
    assert!(f.app.credentials().parse().is_empty());
    assert!(f.app.notifications().toasts().is_empty());
}
