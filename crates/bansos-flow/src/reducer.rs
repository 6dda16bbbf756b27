//! Flow Reducer
//!
//! Pure transition function for the onboarding wizard. No I/O happens here:
//! [`reduce`] takes the current state and an action and returns the next
//! state. Persisting the result is the orchestrator's job.
//!
//! - Navigation clamps to the fixed step sequence
//! - `Goto` and `Hydrate` do not re-check that earlier steps were completed
//! - Submission leaves the step alone until it succeeds

use bansos_core::{
    ApplicantDraft, CapturedImage, FaceMatchingScore, LivenessResult, OcrPatch, OcrResult,
    StepKey,
};
use bansos_store::KycProgress;

/// Images captured during the current session
///
/// Never persisted: after a reload the citizen captures them again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub ktp_image: Option<CapturedImage>,
    pub selfie_image: Option<CapturedImage>,
}

/// Wizard state held by the orchestrator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    pub step: StepKey,
    pub artifacts: Artifacts,
    pub submitting: bool,
    pub ocr: Option<OcrResult>,
    pub face: Option<FaceMatchingScore>,
    pub live: Option<LivenessResult>,
    pub applicant_draft: ApplicantDraft,
    pub submission_id: Option<String>,
    pub error: Option<String>,
}

impl WizardState {
    /// The resumable subset of this state
    #[must_use]
    pub fn progress(&self) -> KycProgress {
        KycProgress::new(self.step, self.ocr.clone())
    }
}

/// Every input the wizard reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Next,
    Back,
    Goto(StepKey),
    SetKtp(Option<CapturedImage>),
    SetSelfie(Option<CapturedImage>),
    SetOcr(OcrResult),
    PatchOcr(OcrPatch),
    SetFace(FaceMatchingScore),
    SetLive(LivenessResult),
    PatchApplicant(ApplicantDraft),
    SubmitStart,
    SubmitSuccess(String),
    SubmitFail(String),
    Hydrate(KycProgress),
}

impl Action {
    /// Stable name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Next => "NEXT",
            Self::Back => "BACK",
            Self::Goto(_) => "GOTO",
            Self::SetKtp(_) => "SET_KTP",
            Self::SetSelfie(_) => "SET_SELFIE",
            Self::SetOcr(_) => "SET_OCR",
            Self::PatchOcr(_) => "PATCH_OCR",
            Self::SetFace(_) => "SET_FACE",
            Self::SetLive(_) => "SET_LIVE",
            Self::PatchApplicant(_) => "PATCH_APPLICANT",
            Self::SubmitStart => "SUBMIT_START",
            Self::SubmitSuccess(_) => "SUBMIT_SUCCESS",
            Self::SubmitFail(_) => "SUBMIT_FAIL",
            Self::Hydrate(_) => "HYDRATE",
        }
    }
}

/// Stored OCR fields take precedence over what the session already has
fn merge_ocr(current: Option<OcrResult>, stored: OcrResult) -> OcrResult {
    let Some(mut merged) = current else {
        return stored;
    };
    merged.number = stored.number.or(merged.number);
    merged.name = stored.name.or(merged.name);
    merged.birth_date = stored.birth_date.or(merged.birth_date);
    merged.address = stored.address.or(merged.address);
    merged.raw_text = stored.raw_text.or(merged.raw_text);
    merged.confidence = stored.confidence;
    merged
}

/// Apply one action
#[must_use]
pub fn reduce(mut state: WizardState, action: Action) -> WizardState {
    match action {
        Action::Next => state.step = state.step.next(),
        Action::Back => state.step = state.step.back(),
        Action::Goto(step) => state.step = step,
        Action::SetKtp(image) => state.artifacts.ktp_image = image,
        Action::SetSelfie(image) => state.artifacts.selfie_image = image,
        Action::SetOcr(ocr) => state.ocr = Some(ocr),
        Action::PatchOcr(patch) => {
            state.ocr.get_or_insert_with(OcrResult::default).apply(patch);
        }
        Action::SetFace(face) => state.face = Some(face),
        Action::SetLive(live) => state.live = Some(live),
        Action::PatchApplicant(patch) => state.applicant_draft.merge(patch),
        Action::SubmitStart => {
            state.submitting = true;
            state.error = None;
        }
        Action::SubmitSuccess(id) => {
            state.submitting = false;
            state.submission_id = Some(id);
            state.step = StepKey::Done;
        }
        Action::SubmitFail(message) => {
            state.submitting = false;
            state.error = Some(message);
        }
        Action::Hydrate(progress) => {
            if let Some(step) = progress.step_key() {
                state.step = step;
            }
            if let Some(stored) = progress.ocr {
                state.ocr = Some(merge_ocr(state.ocr.take(), stored));
            }
        }
    }
    state
}
