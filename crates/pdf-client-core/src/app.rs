//! Application root tying the components together.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::credentials::{
    Clock, Confirm, CredentialKind, CredentialManager, ListView, SystemClock,
};
use crate::download::{DirectoryDownloads, DownloadSink};
use crate::error::{Error, Result};
use crate::intake::{FileIntake, SelectedFile};
use crate::notify::NotificationCenter;
use crate::progress::{ProgressEstimator, ProgressSnapshot};
use crate::service::{HttpTranslateService, TranslateService};
use crate::storage::{Storage, open_storage};
use crate::store::ConfigStore;
use crate::submission::{self, SubmissionOptions, SubmitOutcome};
use crate::view::{RESUBMIT_LABEL, SubmitGuard, ViewState};

/// Delay between a successful download and re-enabling submission
pub const RESUBMIT_DELAY: Duration = Duration::from_secs(1);

/// One client session.
///
/// All state is owned here and mutated through `&mut self`; the progress
/// estimator and toast timers are the only background tasks.
pub struct ClientApp {
    config: ClientConfig,
    credentials: CredentialManager,
    intake: FileIntake,
    view: ViewState,
    notifications: NotificationCenter,
    service: Arc<dyn TranslateService>,
    downloads: Arc<dyn DownloadSink>,
    progress: Arc<watch::Sender<ProgressSnapshot>>,
}

impl ClientApp {
    /// Open storage, load persisted credentials and connect to the service
    pub fn init(config: ClientConfig) -> Result<Self> {
        let storage = open_storage(&config.storage)?;
        let service = HttpTranslateService::new(&config.endpoint, config.request_timeout())?;
        let downloads = DirectoryDownloads::new(config.download_dir());

        info!("Using translation endpoint {}", service.endpoint());

        Ok(Self::with_parts(
            config,
            storage,
            Arc::new(service),
            Arc::new(downloads),
        ))
    }

    /// Build from explicit parts, using the wall clock for record ids
    pub fn with_parts(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        service: Arc<dyn TranslateService>,
        downloads: Arc<dyn DownloadSink>,
    ) -> Self {
        Self::with_clock(config, storage, service, downloads, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        service: Arc<dyn TranslateService>,
        downloads: Arc<dyn DownloadSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let credentials = CredentialManager::init(ConfigStore::new(storage), clock);
        let (progress, _) = watch::channel(ProgressSnapshot::start());

        Self {
            config,
            credentials,
            intake: FileIntake::new(),
            view: ViewState::default(),
            notifications: NotificationCenter::new(),
            service,
            downloads,
            progress: Arc::new(progress),
        }
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    pub const fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Live progress of the running submission
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress.subscribe()
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    pub fn add_credential(&mut self, kind: CredentialKind) -> Result<ListView> {
        self.credentials.add(kind)
    }

    /// Set one field; unknown ids are silently ignored
    pub fn update_credential(
        &mut self,
        kind: CredentialKind,
        id: i64,
        field: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        self.credentials.update(kind, id, field, value)?;
        Ok(())
    }

    pub fn remove_credential(
        &mut self,
        kind: CredentialKind,
        id: i64,
        confirm: &dyn Confirm,
    ) -> Result<ListView> {
        self.credentials.remove(kind, id, confirm)
    }

    pub fn select_credential(&mut self, kind: CredentialKind, id: i64) -> ListView {
        let view = self.credentials.select(kind, id);
        self.notifications.success(kind.selected_message());
        view
    }

    pub fn render_credentials(&mut self, kind: CredentialKind) -> ListView {
        self.credentials.render(kind)
    }

    // =========================================================================
    // File intake
    // =========================================================================

    /// Select a file on disk; rejections are posted as error notifications
    pub fn select_path(&mut self, path: impl AsRef<Path>) -> Result<&SelectedFile> {
        match SelectedFile::from_path(path) {
            Ok(file) => self.select_file(file),
            Err(e) => {
                self.notifications.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Make `file` current; rejections are posted as error notifications
    pub fn select_file(&mut self, file: SelectedFile) -> Result<&SelectedFile> {
        if let Err(e) = crate::intake::validate(&file) {
            self.notifications.error(e.to_string());
            return Err(e);
        }

        self.view.show_file();
        self.intake.select(file)
    }

    pub fn clear_file(&mut self) {
        self.intake.clear();
        self.view.show_upload_prompt();
    }

    pub const fn current_file(&self) -> Option<&SelectedFile> {
        self.intake.current()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Translate the current file.
    ///
    /// Returns `Ok(None)` without doing anything when no file is selected or
    /// submission is disabled. Failures are posted as error notifications and
    /// leave the app ready for another attempt; so does dropping the returned
    /// future before it completes.
    pub async fn submit(&mut self, options: &SubmissionOptions) -> Result<Option<SubmitOutcome>> {
        let Some(file) = self.intake.current().cloned() else {
            debug!("Submit ignored: no file selected");
            return Ok(None);
        };
        if !self.view.submit_enabled {
            debug!("Submit ignored: submission disabled");
            return Ok(None);
        }

        let mut guard = SubmitGuard::arm(&mut self.view);
        let pipeline = Pipeline {
            credentials: &self.credentials,
            service: self.service.as_ref(),
            downloads: self.downloads.as_ref(),
            progress: &self.progress,
            tick: self.config.progress_tick(),
        };

        let result = pipeline.run(&file, options).await;
        let view = guard.view();
        view.progress = *self.progress.borrow();
        view.progress_visible = false;

        match result {
            Ok(outcome) => {
                view.result_visible = true;
                info!("Translated {} -> {}", file.name, outcome.saved_to.display());

                tokio::time::sleep(RESUBMIT_DELAY).await;
                let view = guard.view();
                view.submit_enabled = true;
                view.submit_label = RESUBMIT_LABEL;
                guard.disarm();
                Ok(Some(outcome))
            }
            Err(e) => {
                warn!("Translation of {} failed: {}", file.name, e);
                view.submit_enabled = true;
                guard.disarm();
                self.notifications.error(format!("Translation failed: {e}"));
                Err(e)
            }
        }
    }
}

/// Borrowed parts of the app needed for one request
struct Pipeline<'a> {
    credentials: &'a CredentialManager,
    service: &'a dyn TranslateService,
    downloads: &'a dyn DownloadSink,
    progress: &'a Arc<watch::Sender<ProgressSnapshot>>,
    tick: Duration,
}

impl Pipeline<'_> {
    async fn run(&self, file: &SelectedFile, options: &SubmissionOptions) -> Result<SubmitOutcome> {
        let bytes = tokio::fs::read(&file.path).await?;
        let form = submission::build_form(
            file,
            bytes.into(),
            options,
            self.credentials.parse().selected(),
            self.credentials.translate().selected(),
        );

        // Stopped on drop, including when the submit future is cancelled
        let mut estimator = ProgressEstimator::start(Arc::clone(self.progress), self.tick);

        info!(
            "Submitting {} ({} bytes) to {}",
            file.name,
            form.file_bytes.len(),
            self.service.name()
        );
        let response = self.service.translate(form).await;
        estimator.stop();
        let response = response?;

        if !response.is_success() {
            return Err(Error::Server {
                status: response.status,
                message: submission::error_message(&response.body),
            });
        }

        estimator.complete();

        let file_name = file.download_name();
        let saved_to = self.downloads.save(&file_name, &response.body)?;

        Ok(SubmitOutcome {
            file_name,
            saved_to,
            bytes: response.body.len(),
        })
    }
}
