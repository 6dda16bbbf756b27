//! In-process stand-ins for the verification services
//!
//! Every mock sleeps for its configured latency and then succeeds with a
//! fixed result. Submission ids are random.

use crate::error::PortError;
use crate::ports::{
    FaceMatchPort, KtpOcrPort, KycSubmissionPort, LivenessPort, SubmissionReceipt, Usecases,
};
use crate::reducer::Artifacts;
use async_trait::async_trait;
use bansos_core::{
    Applicant, CapturedImage, FaceMatchingScore, LivenessResult, OcrResult, PortalConfig,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Score every mock face comparison returns
pub const MOCK_FACE_SCORE: f64 = 0.8;

/// `KYC-` followed by six uppercase base-36 characters
#[must_use]
pub fn mock_submission_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("KYC-{suffix}")
}

#[derive(Debug, Clone)]
pub struct MockOcr {
    latency: Duration,
}

impl MockOcr {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// The sample KTP every extraction returns
    #[must_use]
    pub fn sample() -> OcrResult {
        OcrResult {
            number: Some("1275 9901 2025 0001".to_string()),
            name: Some("IVANDOHAN".to_string()),
            birth_date: Some("2001-05-22".to_string()),
            address: Some("Batam, Kepulauan Riau".to_string()),
            confidence: 0.93,
            raw_text: Some(
                "NIK 1275990120250001\nNama: IVAN DOHAN\nTTL: 22-05-2001\nAlamat: Batam, Kepri"
                    .to_string(),
            ),
        }
    }
}

#[async_trait]
impl KtpOcrPort for MockOcr {
    async fn extract(&self, image: &CapturedImage) -> Result<OcrResult, PortError> {
        tokio::time::sleep(self.latency).await;
        debug!(file = %image.file_name, bytes = image.len(), "mock OCR extraction");
        Ok(Self::sample())
    }
}

#[derive(Debug, Clone)]
pub struct MockFaceMatch {
    latency: Duration,
    threshold: f64,
}

impl MockFaceMatch {
    #[must_use]
    pub fn new(latency: Duration, threshold: f64) -> Self {
        Self { latency, threshold }
    }
}

#[async_trait]
impl FaceMatchPort for MockFaceMatch {
    async fn compare(
        &self,
        _ktp_image: &CapturedImage,
        _selfie_image: &CapturedImage,
    ) -> Result<FaceMatchingScore, PortError> {
        tokio::time::sleep(self.latency).await;
        Ok(FaceMatchingScore {
            score: MOCK_FACE_SCORE,
            threshold: self.threshold,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MockLiveness {
    latency: Duration,
}

impl MockLiveness {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl LivenessPort for MockLiveness {
    async fn check(&self, _sample: &CapturedImage) -> Result<LivenessResult, PortError> {
        tokio::time::sleep(self.latency).await;
        Ok(LivenessResult {
            passed: true,
            signal: Some("blink + yaw detected".to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MockSubmitter {
    latency: Duration,
    fail_with: Option<String>,
}

impl MockSubmitter {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            fail_with: None,
        }
    }

    /// Submitter that always reports a network failure with `message`
    #[must_use]
    pub fn failing(latency: Duration, message: impl Into<String>) -> Self {
        Self {
            latency,
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl KycSubmissionPort for MockSubmitter {
    async fn submit(
        &self,
        applicant: &Applicant,
        _artifacts: &Artifacts,
    ) -> Result<SubmissionReceipt, PortError> {
        tokio::time::sleep(self.latency).await;
        if let Some(message) = &self.fail_with {
            return Err(PortError::Network(message.clone()));
        }
        let id = mock_submission_id();
        debug!(id = %id, name = %applicant.identity.name, "mock submission accepted");
        Ok(SubmissionReceipt { id })
    }
}

/// Use cases wired to the mocks, timed by `config`
#[must_use]
pub fn mock_usecases(config: &PortalConfig) -> Usecases {
    let latency = &config.latency;
    Usecases::new(
        Arc::new(MockOcr::new(latency.ocr())),
        Arc::new(MockFaceMatch::new(latency.face_match(), config.face_threshold)),
        Arc::new(MockLiveness::new(latency.liveness())),
        Arc::new(MockSubmitter::new(latency.submit())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bansos_core::MockLatency;
    use std::time::Instant;

    fn image() -> CapturedImage {
        CapturedImage::new("ktp.jpg", "image/jpeg", vec![0xFF, 0xD8])
    }

    #[test]
    fn submission_id_shape() {
        for _ in 0..50 {
            let id = mock_submission_id();
            assert_eq!(id.len(), 10);
            assert!(id.starts_with("KYC-"));
            assert!(id[4..]
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn mocks_wait_their_latency() {
        let config = PortalConfig::default();
        let uc = mock_usecases(&config);

        let started = tokio::time::Instant::now();
        let ocr = uc.extract_ktp(&image()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(ocr, MockOcr::sample());

        let face = uc.compare_face(&image(), &image()).await.unwrap();
        assert_eq!(face.threshold, config.face_threshold);
        assert!(face.passed());
    }

    #[tokio::test]
    async fn failing_submitter_reports_network_error() {
        let uc = mock_usecases(&PortalConfig::default().with_latency(MockLatency::zero()))
            .with_submitter(Arc::new(MockSubmitter::failing(Duration::ZERO, "NetworkError")));
        let applicant = bansos_core::create_applicant(bansos_core::ApplicantDraft {
            phone: Some("0812".into()),
            email: Some("a@contoh.id".into()),
            ..bansos_core::ApplicantDraft::default()
        }
        .with_ocr_defaults(Some(&MockOcr::sample())))
        .unwrap();
        let err = uc.submit_kyc(&applicant, &Artifacts::default()).await.unwrap_err();
        assert_eq!(err, PortError::Network("NetworkError".into()));
    }

    #[tokio::test]
    async fn zero_latency_returns_promptly() {
        let config = PortalConfig::default().with_latency(MockLatency::zero());
        let uc = mock_usecases(&config);
        let started = Instant::now();
        let live = uc.check_liveness(&image()).await.unwrap();
        assert!(live.passed);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
