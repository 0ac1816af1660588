use crate::progress::ProgressSnapshot;

/// Label of the submit control before the first translation
pub const SUBMIT_LABEL: &str = "Translate";
/// Label of the submit control after a successful translation
pub const RESUBMIT_LABEL: &str = "Translate again";

/// What a front end should currently show
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Upload prompt shown while no file is selected
    pub upload_prompt_visible: bool,
    pub progress_visible: bool,
    pub result_visible: bool,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    /// Progress as of the last terminal update
    pub progress: ProgressSnapshot,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            upload_prompt_visible: true,
            progress_visible: false,
            result_visible: false,
            submit_enabled: false,
            submit_label: SUBMIT_LABEL,
            progress: ProgressSnapshot::start(),
        }
    }
}

impl ViewState {
    pub(crate) const fn show_file(&mut self) {
        self.upload_prompt_visible = false;
        self.progress_visible = false;
        self.result_visible = false;
        self.submit_enabled = true;
    }

    pub(crate) const fn show_upload_prompt(&mut self) {
        self.upload_prompt_visible = true;
        self.progress_visible = false;
        self.result_visible = false;
        self.submit_enabled = false;
    }
}

/// Holds the view in its "submitting" state.
///
/// Dropping an armed guard (the submit future was cancelled mid-flight)
/// hides progress and re-enables submission so the file can be sent again.
pub(crate) struct SubmitGuard<'a> {
    view: &'a mut ViewState,
    armed: bool,
}

impl<'a> SubmitGuard<'a> {
    pub(crate) fn arm(view: &'a mut ViewState) -> Self {
        view.submit_enabled = false;
        view.progress_visible = true;
        view.result_visible = false;
        Self { view, armed: true }
    }

    pub(crate) fn view(&mut self) -> &mut ViewState {
        &mut *self.view
    }

    /// The submission reached a terminal state; keep the view as it is
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("Submission abandoned, re-enabling submit");
            self.view.progress_visible = false;
            self.view.submit_enabled = true;
        }
    }
}
