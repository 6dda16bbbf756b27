//! Resuming an onboarding session across restarts

use bansos_core::{OcrPatch, StepKey};
use bansos_flow::{mock_usecases, Action, OnboardingFlow};
use bansos_store::{LocalKycRepository, SharedStore};
use bansos_test_utils::{
    file_store, instant_config, sample_contact, sample_ktp_image, sample_selfie_image,
};
use std::sync::Arc;

fn open(store: &SharedStore) -> OnboardingFlow {
    OnboardingFlow::new(
        Arc::new(LocalKycRepository::new(store.clone())),
        mock_usecases(&instant_config()),
    )
}

#[tokio::test]
async fn progress_survives_restart_but_captures_do_not() {
    let (_dir, store) = file_store();
    let store: SharedStore = store;

    {
        let flow = open(&store);
        assert!(!flow.mount().await);
        flow.dispatch(Action::SetKtp(Some(sample_ktp_image()))).await;
        flow.extract_ktp().await.unwrap();
        flow.dispatch(Action::Next).await;
        flow.dispatch(Action::PatchOcr(OcrPatch::name("Ivan Dohan"))).await;
        flow.dispatch(Action::Next).await;
    }

    let flow = open(&store);
    assert!(flow.mount().await);
    let state = flow.state().await;
    assert_eq!(state.step, StepKey::Selfie);
    assert_eq!(state.ocr.unwrap().name.as_deref(), Some("Ivan Dohan"));
    assert!(state.artifacts.ktp_image.is_none());
}

#[tokio::test]
async fn resumed_session_recaptures_and_finishes() {
    let (_dir, store) = file_store();
    let store: SharedStore = store;

    {
        let flow = open(&store);
        flow.dispatch(Action::SetKtp(Some(sample_ktp_image()))).await;
        flow.extract_ktp().await.unwrap();
        flow.dispatch(Action::Goto(StepKey::Selfie)).await;
    }

    let flow = open(&store);
    assert!(flow.mount().await);
    assert!(flow.compare_face().await.is_err());

    flow.dispatch(Action::SetKtp(Some(sample_ktp_image()))).await;
    flow.dispatch(Action::SetSelfie(Some(sample_selfie_image()))).await;
    flow.compare_face().await.unwrap();
    flow.check_liveness(&sample_selfie_image()).await.unwrap();
    flow.dispatch(Action::Goto(StepKey::ReviewSubmit)).await;
    flow.dispatch(Action::PatchApplicant(sample_contact())).await;
    let id = flow.submit().await.unwrap();

    assert!(id.starts_with("KYC-"));
    let reopened = open(&store);
    assert!(!reopened.mount().await);
    assert_eq!(reopened.state().await.step, StepKey::UploadKtp);
}
