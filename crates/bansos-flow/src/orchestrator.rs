//! Onboarding Orchestrator
//!
//! Owns the wizard state and connects the pure reducer to its effects:
//! - Hydration from the Progress Store, at most once per session
//! - Persisting `{ step, ocr }` whenever either changes, and clearing it
//!   instead once the flow reaches `DONE`
//! - Running the verification use cases and recording their results
//!
//! Dispatches are serialized: each one reduces and persists before the next
//! starts, so stored progress always follows the order of actions.

use crate::error::FlowError;
use crate::ports::Usecases;
use crate::reducer::{reduce, Action, WizardState};
use bansos_core::{
    create_applicant, CapturedImage, FaceMatchingScore, LivenessResult, OcrResult, StepKey,
};
use bansos_store::KycRepository;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Session {
    state: WizardState,
    /// Closed by the first hydration attempt or the first dispatch
    latched: bool,
}

/// One citizen's onboarding session
pub struct OnboardingFlow {
    session: Mutex<Session>,
    repo: Arc<dyn KycRepository>,
    usecases: Usecases,
}

impl std::fmt::Debug for OnboardingFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingFlow")
            .field("usecases", &self.usecases)
            .finish_non_exhaustive()
    }
}

impl OnboardingFlow {
    #[must_use]
    pub fn new(repo: Arc<dyn KycRepository>, usecases: Usecases) -> Self {
        Self {
            session: Mutex::new(Session::default()),
            repo,
            usecases,
        }
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> WizardState {
        self.session.lock().await.state.clone()
    }

    /// Resume saved progress
    ///
    /// Returns `true` if stored progress was applied. Does nothing if it
    /// already ran, or if the citizen started interacting while the store was
    /// being read.
    pub async fn mount(&self) -> bool {
        if self.session.lock().await.latched {
            return false;
        }

        let stored = self.repo.load_progress().await;

        let mut session = self.session.lock().await;
        if session.latched {
            debug!("interaction started before progress loaded, skipping hydration");
            return false;
        }
        session.latched = true;

        let Some(progress) = stored else {
            return false;
        };
        if progress.step_key().is_none() {
            warn!(step = %progress.step, "stored progress names an unknown step");
        }
        session.state = reduce(std::mem::take(&mut session.state), Action::Hydrate(progress));
        info!(step = %session.state.step, "onboarding progress restored");
        true
    }

    /// Apply one action and persist the resumable subset if it changed
    pub async fn dispatch(&self, action: Action) -> WizardState {
        let mut session = self.session.lock().await;
        session.latched = true;

        let kind = action.kind();
        let prev_step = session.state.step;
        let prev_ocr = session.state.ocr.clone();
        session.state = reduce(std::mem::take(&mut session.state), action);

        let state = &session.state;
        debug!(action = kind, step = %state.step, "dispatched");
        if state.step != prev_step || state.ocr != prev_ocr {
            if state.step == StepKey::Done {
                self.repo.clear_progress().await;
            } else {
                self.repo.save_progress(&state.progress()).await;
            }
        }
        session.state.clone()
    }

    /// Run OCR on the captured KTP and record the result
    ///
    /// # Errors
    /// `MissingArtifact` without a KTP capture; port failures.
    pub async fn extract_ktp(&self) -> Result<OcrResult, FlowError> {
        let image = self.require(|s| s.artifacts.ktp_image.clone(), "ktpImage").await?;
        let ocr = self.usecases.extract_ktp(&image).await?;
        self.dispatch(Action::SetOcr(ocr.clone())).await;
        Ok(ocr)
    }

    /// Compare the KTP portrait with the selfie and record the score
    ///
    /// # Errors
    /// `MissingArtifact` without both captures; port failures.
    pub async fn compare_face(&self) -> Result<FaceMatchingScore, FlowError> {
        let ktp = self.require(|s| s.artifacts.ktp_image.clone(), "ktpImage").await?;
        let selfie = self
            .require(|s| s.artifacts.selfie_image.clone(), "selfieImage")
            .await?;
        let face = self.usecases.compare_face(&ktp, &selfie).await?;
        self.dispatch(Action::SetFace(face)).await;
        Ok(face)
    }

    /// Check liveness on `sample` and record the verdict
    ///
    /// # Errors
    /// Port failures.
    pub async fn check_liveness(&self, sample: &CapturedImage) -> Result<LivenessResult, FlowError> {
        let live = self.usecases.check_liveness(sample).await?;
        self.dispatch(Action::SetLive(live.clone())).await;
        Ok(live)
    }

    /// Submit the application
    ///
    /// The applicant is built from the draft with OCR fields as fallbacks.
    /// Any failure, including an incomplete applicant, ends in `SUBMIT_FAIL`
    /// with the error message; success moves the flow to `DONE`.
    ///
    /// # Errors
    /// The validation or port error that was reported to the wizard.
    pub async fn submit(&self) -> Result<String, FlowError> {
        let state = self.dispatch(Action::SubmitStart).await;

        let draft = state
            .applicant_draft
            .clone()
            .with_ocr_defaults(state.ocr.as_ref());
        let result = match create_applicant(draft) {
            Ok(applicant) => self
                .usecases
                .submit_kyc(&applicant, &state.artifacts)
                .await
                .map_err(FlowError::from),
            Err(e) => Err(FlowError::from(e)),
        };

        match result {
            Ok(receipt) => {
                info!(submission_id = %receipt.id, "onboarding submitted");
                self.dispatch(Action::SubmitSuccess(receipt.id.clone())).await;
                Ok(receipt.id)
            }
            Err(e) => {
                warn!(error = %e, "onboarding submission failed");
                self.dispatch(Action::SubmitFail(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn require<F>(&self, pick: F, name: &'static str) -> Result<CapturedImage, FlowError>
    where
        F: FnOnce(&WizardState) -> Option<CapturedImage>,
    {
        pick(&self.session.lock().await.state).ok_or(FlowError::MissingArtifact(name))
    }
}
