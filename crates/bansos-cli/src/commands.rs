//! Subcommand handlers
//!
//! Every handler writes its report to `out` so tests can read it back.

use anyhow::{bail, Context as _, Result};
use bansos_bridge::{BridgeConfig, Location, LogHost, StorageBridge};
use bansos_core::{ApplicantDraft, CapturedImage, PortalConfig, StepKey};
use bansos_flow::{mock_usecases, Action, MockSubmitter, OnboardingFlow};
use bansos_mockdb::SharedDb;
use bansos_store::{LocalKycRepository, NoSync, PortalSessionStore, SharedStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

/// What every handler runs against
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub(crate) config: PortalConfig,
    pub(crate) store: SharedStore,
}

impl Context {
    fn shared_db(&self) -> SharedDb {
        SharedDb::new(self.store.clone(), Arc::new(NoSync))
    }
}

pub(crate) fn db_init(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let db = ctx.shared_db().load().context("loading shared database")?;
    writeln!(out, "shared database ready: {} applications", db.applications.len())?;
    Ok(())
}

pub(crate) fn db_reset(ctx: &Context, out: &mut impl Write) -> Result<()> {
    ctx.shared_db().reset();
    writeln!(out, "shared database and portal state removed")?;
    Ok(())
}

pub(crate) fn db_summary(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let shared = ctx.shared_db();
    let db = shared.load().context("loading shared database")?;
    let overrides = shared.load_portal_state();

    let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
    for app in &db.applications {
        *by_status.entry(app.status.as_str()).or_default() += 1;
    }

    writeln!(out, "applications: {}", db.applications.len())?;
    for (status, count) in by_status {
        writeln!(out, "  {status}: {count}")?;
    }
    writeln!(out, "users: {}", db.users.len())?;
    let items: usize = db.batches.iter().map(|b| b.items.len()).sum();
    writeln!(out, "batches: {} ({items} items)", db.batches.len())?;
    writeln!(out, "audit entries: {}", db.audit.len())?;
    match db.clustering_runs.first() {
        Some(run) => writeln!(
            out,
            "clustering runs: {} (latest {}: tinggi {}, sedang {}, rendah {})",
            db.clustering_runs.len(),
            run.id,
            run.summary.tinggi,
            run.summary.sedang,
            run.summary.rendah
        )?,
        None => writeln!(out, "clustering runs: 0")?,
    }
    writeln!(out, "distributions: {}", db.distributions.len())?;
    writeln!(out, "portal overrides: {}", overrides.len())?;
    Ok(())
}

pub(crate) fn accounts(ctx: &Context, phone: Option<&str>, out: &mut impl Write) -> Result<()> {
    let shared = ctx.shared_db();
    let accounts = match phone {
        Some(phone) => match shared.find_account(phone)? {
            Some(account) => vec![account],
            None => bail!("no account with phone {phone}"),
        },
        None => shared.accounts()?,
    };

    for account in accounts {
        writeln!(
            out,
            "{}  {}  {}  {}  pin:{}  face:{}  liveness:{}",
            account.submission_id,
            account.phone,
            account.applicant.identity.name,
            account.verification_status.as_str(),
            if account.pin_set { "set" } else { "none" },
            account.face_match_passed,
            account.liveness_passed,
        )?;
    }
    Ok(())
}

fn ktp_capture() -> CapturedImage {
    CapturedImage::new("ktp.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

fn selfie_capture() -> CapturedImage {
    CapturedImage::new("selfie.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE1])
}

/// Options for [`onboard`]
#[derive(Debug, Clone)]
pub(crate) struct OnboardOptions {
    pub(crate) phone: String,
    pub(crate) email: String,
    pub(crate) fail_submit: bool,
}

/// Drive the wizard from wherever it stands to `DONE`
///
/// Captures are never persisted, so a resumed run takes them again before
/// the face match.
pub(crate) async fn onboard(
    ctx: &Context,
    options: &OnboardOptions,
    out: &mut impl Write,
) -> Result<()> {
    let mut usecases = mock_usecases(&ctx.config);
    if options.fail_submit {
        usecases = usecases.with_submitter(Arc::new(MockSubmitter::failing(
            ctx.config.latency.submit(),
            "NetworkError",
        )));
    }
    let repo = Arc::new(LocalKycRepository::new(ctx.store.clone()));
    let flow = OnboardingFlow::new(repo, usecases);

    if flow.mount().await {
        writeln!(out, "resuming at {}", flow.state().await.step.label())?;
    }

    let contact = ApplicantDraft {
        phone: Some(options.phone.clone()),
        email: Some(options.email.clone()),
        ..ApplicantDraft::default()
    };

    loop {
        let state = flow.state().await;
        let step = state.step;
        match step {
            StepKey::UploadKtp => {
                flow.dispatch(Action::SetKtp(Some(ktp_capture()))).await;
                let ocr = flow.extract_ktp().await?;
                writeln!(
                    out,
                    "  OCR: {} ({:.0}%)",
                    ocr.name.as_deref().unwrap_or("-"),
                    ocr.confidence * 100.0
                )?;
            }
            StepKey::OcrReview => {}
            StepKey::Selfie => {
                flow.dispatch(Action::SetSelfie(Some(selfie_capture()))).await;
            }
            StepKey::FaceMatch => {
                if state.artifacts.ktp_image.is_none() {
                    flow.dispatch(Action::SetKtp(Some(ktp_capture()))).await;
                }
                if state.artifacts.selfie_image.is_none() {
                    flow.dispatch(Action::SetSelfie(Some(selfie_capture()))).await;
                }
                let face = flow.compare_face().await?;
                writeln!(
                    out,
                    "  face score {:.2} / {:.2}: {}",
                    face.score,
                    face.threshold,
                    if face.passed() { "match" } else { "no match" }
                )?;
            }
            StepKey::Liveness => {
                let live = flow.check_liveness(&selfie_capture()).await?;
                writeln!(
                    out,
                    "  liveness: {}",
                    live.signal.as_deref().unwrap_or(if live.passed { "passed" } else { "failed" })
                )?;
            }
            StepKey::DataEntry => {
                flow.dispatch(Action::PatchApplicant(contact.clone())).await;
            }
            StepKey::ReviewSubmit if state.ocr.is_none() => {
                writeln!(out, "  no KTP data on record, capturing again")?;
                flow.dispatch(Action::Goto(StepKey::UploadKtp)).await;
                continue;
            }
            StepKey::ReviewSubmit => {
                flow.dispatch(Action::PatchApplicant(contact.clone())).await;
                match flow.submit().await {
                    Ok(id) => {
                        writeln!(out, "[ok] {}", step.label())?;
                        writeln!(out, "submitted as {id}")?;
                        continue;
                    }
                    Err(e) => {
                        writeln!(out, "submission failed: {e}; progress kept at {}", step.label())?;
                        return Err(e).context("onboarding submission failed");
                    }
                }
            }
            StepKey::Done => return Ok(()),
        }
        writeln!(out, "[ok] {}", step.label())?;
        flow.dispatch(Action::Next).await;
    }
}

pub(crate) fn peers(
    ctx: &Context,
    origin: &str,
    extra: &[String],
    out: &mut impl Write,
) -> Result<()> {
    let location = Location::parse(origin)?;
    let mut config = BridgeConfig::from(&ctx.config);
    config.peers.extend(extra.iter().cloned());

    let bridge = StorageBridge::new(location, config, ctx.store.clone(), Arc::new(LogHost));
    bridge.ensure_initialised();
    let peers = bridge.peers();
    if peers.is_empty() {
        writeln!(out, "no peers for {origin}")?;
    }
    for peer in peers {
        writeln!(out, "{}  {}", peer.origin, bridge.frame_src(&peer.origin))?;
    }
    Ok(())
}

fn session_store(ctx: &Context) -> PortalSessionStore {
    PortalSessionStore::new(ctx.store.clone(), ctx.config.session_ttl())
}

fn format_expiry(expires_at: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(expires_at)
        .map_or_else(|| expires_at.to_string(), |at| at.to_rfc3339())
}

pub(crate) fn session_create(ctx: &Context, phone: &str, out: &mut impl Write) -> Result<()> {
    let session = session_store(ctx).create(phone)?;
    writeln!(out, "token {}", session.token)?;
    writeln!(out, "phone {} until {}", session.phone, format_expiry(session.expires_at))?;
    Ok(())
}

pub(crate) fn session_show(ctx: &Context, out: &mut impl Write) -> Result<()> {
    match session_store(ctx).load() {
        Some(session) => writeln!(
            out,
            "{} signed in until {}",
            session.phone,
            format_expiry(session.expires_at)
        )?,
        None => writeln!(out, "no active session")?,
    }
    Ok(())
}

pub(crate) fn session_clear(ctx: &Context, out: &mut impl Write) -> Result<()> {
    session_store(ctx).clear();
    writeln!(out, "signed out")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bansos_core::MockLatency;
    use bansos_store::FileStore;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> Context {
        Context {
            config: PortalConfig::default()
                .with_latency(MockLatency::zero())
                .with_data_dir(dir.path()),
            store: Arc::new(FileStore::new(dir.path())),
        }
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    fn options(fail_submit: bool) -> OnboardOptions {
        OnboardOptions {
            phone: "08123450009".into(),
            email: "warga@contoh.id".into(),
            fail_submit,
        }
    }

    #[test]
    fn summary_of_a_fresh_database() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        db_summary(&context(&dir), &mut out).unwrap();
        let report = text(out);
        assert!(report.starts_with("applications: 4\n"));
        assert!(report.contains("batches: 1 (2 items)"));
        assert!(report.contains("latest CLUST-SEED: tinggi 2, sedang 1, rendah 1"));
        assert!(report.contains("portal overrides: 0"));
    }

    #[test]
    fn accounts_lookup_by_phone() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut out = Vec::new();
        accounts(&ctx, Some("0812-345-0001"), &mut out).unwrap();
        let line = text(out);
        assert!(line.starts_with("APP-2025-0001  08123450001  Siti Aminah"));
        assert!(line.contains("pin:set"));

        assert!(accounts(&ctx, Some("0899"), &mut Vec::new()).is_err());

        let mut out = Vec::new();
        accounts(&ctx, None, &mut out).unwrap();
        assert_eq!(text(out).lines().count(), 4);
    }

    #[tokio::test]
    async fn onboard_runs_to_done_and_clears_progress() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut out = Vec::new();
        onboard(&ctx, &options(false), &mut out).await.unwrap();
        let report = text(out);
        assert!(report.contains("[ok] Review & Submit"));
        assert!(report.contains("submitted as KYC-"));

        let mut again = Vec::new();
        onboard(&ctx, &options(true), &mut again).await.unwrap_err();
        assert!(!text(again).contains("resuming"));
    }

    #[tokio::test]
    async fn failed_submit_keeps_progress_for_next_run() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut out = Vec::new();
        let err = onboard(&ctx, &options(true), &mut out).await.unwrap_err();
        assert!(format!("{err:#}").contains("NetworkError"));

        let mut out = Vec::new();
        onboard(&ctx, &options(false), &mut out).await.unwrap();
        let report = text(out);
        assert!(report.starts_with("resuming at Review & Submit\n"));
        assert!(report.contains("submitted as KYC-"));
    }

    #[tokio::test]
    async fn resumed_face_match_recaptures() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        {
            let repo = Arc::new(LocalKycRepository::new(ctx.store.clone()));
            let flow = OnboardingFlow::new(repo, mock_usecases(&ctx.config));
            flow.dispatch(Action::Goto(StepKey::FaceMatch)).await;
        }
        let mut out = Vec::new();
        onboard(&ctx, &options(false), &mut out).await.unwrap();
        let report = text(out);
        assert!(report.starts_with("resuming at Komparasi Wajah\n"));
        assert!(report.contains("face score 0.80"));
    }

    #[test]
    fn peers_for_localhost_portal() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        peers(
            &context(&dir),
            "http://localhost:3000",
            &["http://localhost:5173".to_string()],
            &mut out,
        )
        .unwrap();
        let report = text(out);
        let origins: Vec<&str> = report
            .lines()
            .filter_map(|l| l.split_whitespace().next())
            .collect();
        assert_eq!(
            origins,
            [
                "http://localhost:3001",
                "http://127.0.0.1:3000",
                "http://127.0.0.1:3001",
                "http://localhost:5173",
            ]
        );
        assert!(report.contains("/storage-bridge.html?origin=http%3A%2F%2Flocalhost%3A3000"));
        assert!(peers(&context(&dir), "localhost", &[], &mut Vec::new()).is_err());
    }

    #[test]
    fn session_lifecycle() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut out = Vec::new();
        session_create(&ctx, "08123450001", &mut out).unwrap();
        session_show(&ctx, &mut out).unwrap();
        session_clear(&ctx, &mut out).unwrap();
        session_show(&ctx, &mut out).unwrap();
        let report = text(out);
        let lines: Vec<&str> = report.lines().collect();
        assert!(lines[0].starts_with("token "));
        assert!(lines[2].starts_with("08123450001 signed in until "));
        assert_eq!(lines[3..], ["signed out", "no active session"]);
    }
}
