/*!
 * End-to-end tests for the batch orchestrator
 */

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;

use chaptrans::app_config::{CredentialStore, ProviderCatalog};
use chaptrans::file_utils::FileManager;
use chaptrans::ledger::Ledger;
use chaptrans::providers::mock::MockGateway;
use chaptrans::providers::{HttpGateway, ProviderGateway, ProviderRoute};
use chaptrans::translation::{BatchEvent, BatchJob, BatchOrchestrator};

use crate::common;

fn make_orchestrator(
    gateway: Arc<dyn ProviderGateway>,
    config_dir: &Path,
    project_dir: &Path,
) -> Result<(Arc<BatchOrchestrator>, Arc<Ledger>)> {
    let engine = Arc::new(common::make_engine(gateway, config_dir));
    let ledger = Arc::new(Ledger::open(project_dir)?);
    let orchestrator = Arc::new(BatchOrchestrator::new(
        engine,
        Arc::clone(&ledger),
        Arc::new(chaptrans::session_log::SessionLogger::disabled()),
    ));
    Ok((orchestrator, ledger))
}

fn job_for(files: Vec<std::path::PathBuf>, output_dir: &Path) -> BatchJob {
    BatchJob {
        files,
        output_dir: output_dir.to_path_buf(),
        request: common::base_request(false, false),
        allow_retranslation: false,
    }
}

/// Two chapters translate successfully: both outputs exist, both are
/// recorded in the ledger, and the event stream ends with a 2/2 summary.
#[tokio::test]
async fn test_batch_twoFiles_shouldTranslateAndRecordBoth() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let project = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let ch1 = common::create_chapter(project.path(), "ch_01.txt", "first chapter.")?;
    let ch2 = common::create_chapter(project.path(), "ch_02.txt", "second chapter.")?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Ok("Check response: yes".to_string())
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let (orchestrator, ledger) =
        make_orchestrator(gateway, config_dir.path(), project.path())?;

    let mut job = job_for(vec![ch1, ch2], project.path());
    job.request.enable_check = true;
    let (handle, mut events) = orchestrator.start(job);

    let mut completed = Vec::new();
    let mut all_completed = None;
    while let Some(event) = events.recv().await {
        match event {
            BatchEvent::FileCompleted { filename, success } => completed.push((filename, success)),
            BatchEvent::AllCompleted { succeeded, total } => all_completed = Some((succeeded, total)),
            _ => {}
        }
    }

    let summary = handle.await?;
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.total, 2);
    assert!(!summary.cancelled);
    assert_eq!(all_completed, Some((2, 2)));
    assert_eq!(
        completed,
        vec![
            ("ch_01.txt".to_string(), true),
            ("ch_02.txt".to_string(), true)
        ]
    );

    let out1 = FileManager::generate_output_path(project.path().join("ch_01.txt"), project.path(), "fr");
    let out2 = FileManager::generate_output_path(project.path().join("ch_02.txt"), project.path(), "fr");
    assert_eq!(std::fs::read_to_string(&out1)?, "FIRST CHAPTER.");
    assert_eq!(std::fs::read_to_string(&out2)?, "SECOND CHAPTER.");

    assert!(ledger.is_translated("ch_01.txt", &out1));
    assert!(ledger.is_translated("ch_02.txt", &out2));
    Ok(())
}

/// A file whose quality check keeps failing is marked failed, leaves no
/// output, gets no ledger record, and does not abort the batch.
#[tokio::test]
async fn test_batch_checkFails_shouldFailFileWithoutOutputOrRecord() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let project = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let ch1 = common::create_chapter(project.path(), "ch_01.txt", "first chapter.")?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Ok("Check response: no\nCause: mistranslated".to_string())
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let (orchestrator, ledger) =
        make_orchestrator(gateway, config_dir.path(), project.path())?;

    let mut job = job_for(vec![ch1], project.path());
    job.request.enable_check = true;

    let (handle, mut events) = orchestrator.start(job);

    let mut saw_error = false;
    let mut completed = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            BatchEvent::Error(message) => {
                saw_error = true;
                assert!(message.contains("mistranslated"));
            }
            BatchEvent::FileCompleted { filename, success } => completed.push((filename, success)),
            _ => {}
        }
    }

    let summary = handle.await?;
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.total, 1);
    assert!(saw_error);
    assert_eq!(completed, vec![("ch_01.txt".to_string(), false)]);

    let out = FileManager::generate_output_path(project.path().join("ch_01.txt"), project.path(), "fr");
    assert!(!out.exists(), "failed file must not leave an output");
    assert!(!ledger.is_translated("ch_01.txt", &out));
    Ok(())
}

/// One failing file does not stop the rest of the batch.
#[tokio::test]
async fn test_batch_oneFileFails_shouldContinueWithRemaining() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let project = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let ch1 = common::create_chapter(project.path(), "ch_01.txt", "poison")?;
    let ch2 = common::create_chapter(project.path(), "ch_02.txt", "fine chapter.")?;

    let gateway = Arc::new(MockGateway::new(|_, prompt| {
        if prompt.contains("poison") {
            Err(chaptrans::errors::ProviderError::RequestFailed(
                "simulated outage".to_string(),
            ))
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let (orchestrator, _ledger) =
        make_orchestrator(gateway, config_dir.path(), project.path())?;

    let (handle, mut events) = orchestrator.start(job_for(vec![ch1, ch2], project.path()));
    while events.recv().await.is_some() {}

    let summary = handle.await?;
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.total, 2);

    let out2 = FileManager::generate_output_path(project.path().join("ch_02.txt"), project.path(), "fr");
    assert!(out2.exists());
    Ok(())
}

/// A file the ledger already marks translated (with its artifact on disk)
/// is skipped unless retranslation is requested.
#[tokio::test]
async fn test_batch_alreadyTranslated_shouldSkipUnlessRetranslate() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let project = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let ch1 = common::create_chapter(project.path(), "ch_01.txt", "already done.")?;
    let out = FileManager::generate_output_path(&ch1, project.path(), "fr");
    std::fs::write(&out, "DEJA FAIT.")?;

    let gateway = Arc::new(MockGateway::uppercase());
    let (orchestrator, ledger) =
        make_orchestrator(gateway.clone(), config_dir.path(), project.path())?;
    ledger.record("ch_01.txt", "en", "fr")?;

    let (handle, mut events) = orchestrator.start(job_for(vec![ch1.clone()], project.path()));

    let mut skipped = Vec::new();
    while let Some(event) = events.recv().await {
        if let BatchEvent::FileSkipped(filename) = event {
            skipped.push(filename);
        }
    }
    handle.await?;

    assert_eq!(skipped, vec!["ch_01.txt".to_string()]);
    assert_eq!(gateway.call_count(), 0, "skipped file must not hit the provider");
    assert_eq!(std::fs::read_to_string(&out)?, "DEJA FAIT.");

    // With retranslation allowed, the file is processed again.
    let mut job = job_for(vec![ch1], project.path());
    job.allow_retranslation = true;
    let (handle, mut events) = orchestrator.start(job);
    while events.recv().await.is_some() {}
    let summary = handle.await?;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(std::fs::read_to_string(&out)?, "ALREADY DONE.");
    Ok(())
}

/// A stop raised while a file is in flight discards its result: no output
/// is written and the summary reports a cancellation.
#[tokio::test]
async fn test_batch_stopMidFile_shouldLeaveNoPartialOutput() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let project = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let ch1 = common::create_chapter(project.path(), "ch_01.txt", "first chapter.")?;
    let ch2 = common::create_chapter(project.path(), "ch_02.txt", "second chapter.")?;

    // The gateway raises the stop flag from inside the first provider
    // call, simulating a user interrupt while a request is in flight.
    let stop_hook: Arc<Mutex<Option<Arc<BatchOrchestrator>>>> = Arc::new(Mutex::new(None));
    let hook = Arc::clone(&stop_hook);
    let gateway = Arc::new(MockGateway::new(move |_, prompt| {
        if let Some(orchestrator) = hook.lock().as_ref() {
            orchestrator.stop();
        }
        Ok(prompt.to_uppercase())
    }));

    let (orchestrator, ledger) =
        make_orchestrator(gateway, config_dir.path(), project.path())?;
    *stop_hook.lock() = Some(Arc::clone(&orchestrator));

    let (handle, mut events) = orchestrator.start(job_for(vec![ch1, ch2], project.path()));
    while events.recv().await.is_some() {}

    let summary = handle.await?;
    assert!(summary.cancelled);
    assert_eq!(summary.succeeded, 0);

    let out1 = FileManager::generate_output_path(project.path().join("ch_01.txt"), project.path(), "fr");
    let out2 = FileManager::generate_output_path(project.path().join("ch_02.txt"), project.path(), "fr");
    assert!(!out1.exists(), "cancelled file must not be committed");
    assert!(!out2.exists(), "later files must not start after a stop");
    assert!(!ledger.is_translated("ch_01.txt", &out1));
    Ok(())
}

/// An unknown provider/model pair fails the batch before any file is
/// touched.
#[tokio::test]
async fn test_batch_unknownModel_shouldFailFastBeforeAnyFile() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let project = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let ch1 = common::create_chapter(project.path(), "ch_01.txt", "first chapter.")?;

    // The HTTP gateway validates routes against the catalog; the mock
    // route does not exist there.
    let gateway = Arc::new(HttpGateway::new(
        ProviderCatalog::default(),
        CredentialStore::new(),
        Duration::from_secs(5),
    )?);
    let (orchestrator, _ledger) =
        make_orchestrator(gateway, config_dir.path(), project.path())?;

    let mut job = job_for(vec![ch1], project.path());
    job.request.route = ProviderRoute::new("gemini", "not-a-model");

    let (handle, mut events) = orchestrator.start(job);

    let mut saw_abort = false;
    while let Some(event) = events.recv().await {
        if let BatchEvent::Error(message) = event {
            saw_abort = message.contains("Batch aborted");
        }
    }

    let summary = handle.await?;
    assert!(saw_abort);
    assert_eq!(summary.succeeded, 0);

    let out = FileManager::generate_output_path(project.path().join("ch_01.txt"), project.path(), "fr");
    assert!(!out.exists());
    Ok(())
}

/// The single-file convenience call runs the same pipeline and records
/// the ledger entry.
#[tokio::test]
async fn test_translateSingle_shouldWriteOutputAndRecord() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let project = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let ch1 = common::create_chapter(project.path(), "ch_01.txt", "one shot.")?;

    let gateway = Arc::new(MockGateway::uppercase());
    let (orchestrator, ledger) =
        make_orchestrator(gateway, config_dir.path(), project.path())?;

    let output = orchestrator
        .translate_single(&ch1, project.path(), &common::base_request(false, false))
        .await?;

    assert_eq!(std::fs::read_to_string(&output)?, "ONE SHOT.");
    assert!(ledger.is_translated("ch_01.txt", &output));
    Ok(())
}
