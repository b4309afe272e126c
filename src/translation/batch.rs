/*!
 * Batch orchestration across files.
 *
 * The orchestrator drives the engine over an ordered list of chapter
 * files on a background tokio task, one file at a time, streaming
 * progress events back to the caller. Cancellation is cooperative: the
 * stop flag is polled before each file and again before committing an
 * output file, so an interrupted run never leaves a partial output.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::ledger::Ledger;
use crate::session_log::SessionLogger;
use crate::translation::engine::{CheckRefineSettings, TranslationEngine, TranslationRequest};

/// Event streamed back to the caller during a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Free-form progress message
    Progress(String),
    /// File skipped because the ledger already marks it translated
    FileSkipped(String),
    /// A file finished, successfully or not
    FileCompleted {
        /// Source file name
        filename: String,
        /// Whether translation succeeded and the output was committed
        success: bool,
    },
    /// Human-readable error for one file or for batch validation
    Error(String),
    /// The batch finished
    AllCompleted {
        /// Number of files translated successfully
        succeeded: usize,
        /// Number of files in the batch
        total: usize,
    },
}

/// Final result of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of files translated successfully
    pub succeeded: usize,
    /// Number of files in the batch
    pub total: usize,
    /// Whether the run stopped early on user request
    pub cancelled: bool,
}

/// One batch of files to translate
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Ordered source file paths; processed strictly in this order
    pub files: Vec<PathBuf>,
    /// Directory receiving the translated outputs
    pub output_dir: PathBuf,
    /// Pipeline parameters shared by every file
    pub request: TranslationRequest,
    /// Whether to re-translate files the ledger already marks done
    pub allow_retranslation: bool,
}

/// Outcome of processing one file
enum FileOutcome {
    /// Output written and recorded
    Committed,
    /// Stop was requested before the commit; output left untouched
    CancelledBeforeCommit,
}

/// Drives the translation engine across a batch of files
pub struct BatchOrchestrator {
    /// Per-text translation pipeline
    engine: Arc<TranslationEngine>,
    /// Completion ledger
    ledger: Arc<Ledger>,
    /// Session log collaborator
    logger: Arc<SessionLogger>,
    /// Cooperative stop flag
    stop: Arc<AtomicBool>,
}

impl BatchOrchestrator {
    /// Create an orchestrator
    pub fn new(
        engine: Arc<TranslationEngine>,
        ledger: Arc<Ledger>,
        logger: Arc<SessionLogger>,
    ) -> Self {
        Self {
            engine,
            ledger,
            logger,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation; takes effect at the next poll point
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Start a batch on a background task.
    ///
    /// Returns the task handle resolving to the final summary, and the
    /// receiving end of the event stream. The caller's context is never
    /// blocked by the run itself.
    pub fn start(&self, job: BatchJob) -> (JoinHandle<BatchSummary>, UnboundedReceiver<BatchEvent>) {
        let (tx, rx) = unbounded_channel();

        self.stop.store(false, Ordering::SeqCst);

        let engine = Arc::clone(&self.engine);
        let ledger = Arc::clone(&self.ledger);
        let logger = Arc::clone(&self.logger);
        let stop = Arc::clone(&self.stop);

        let handle =
            tokio::spawn(async move { run_batch(engine, ledger, logger, stop, job, tx).await });

        (handle, rx)
    }

    /// Translate one file through the same pipeline, recording the
    /// ledger entry on success. Used for one-off retranslation.
    pub async fn translate_single(
        &self,
        source_path: &Path,
        output_dir: &Path,
        request: &TranslationRequest,
    ) -> Result<PathBuf, AppError> {
        let output_path =
            FileManager::generate_output_path(source_path, output_dir, &request.target_lang);

        let outcome = process_file(
            &self.engine,
            &self.ledger,
            &self.logger,
            &AtomicBool::new(false),
            source_path,
            &output_path,
            request,
        )
        .await?;

        match outcome {
            FileOutcome::Committed => Ok(output_path),
            // Unreachable with a fresh stop flag, but keep the contract.
            FileOutcome::CancelledBeforeCommit => {
                Err(AppError::Unknown("Translation cancelled".to_string()))
            }
        }
    }
}

/// The batch loop running on the background task
async fn run_batch(
    engine: Arc<TranslationEngine>,
    ledger: Arc<Ledger>,
    logger: Arc<SessionLogger>,
    stop: Arc<AtomicBool>,
    job: BatchJob,
    tx: UnboundedSender<BatchEvent>,
) -> BatchSummary {
    let total = job.files.len();
    let mut succeeded = 0usize;
    let mut cancelled = false;

    // Fail fast on routes the catalog does not know, before any file.
    if let Err(e) = validate_job(&engine, &job.request) {
        let message = format!("Batch aborted: {}", e);
        error!("{}", message);
        logger.error(&message);
        let _ = tx.send(BatchEvent::Error(message));
        let _ = tx.send(BatchEvent::AllCompleted { succeeded: 0, total });
        return BatchSummary {
            succeeded: 0,
            total,
            cancelled: false,
        };
    }

    logger.info(&format!(
        "Batch started: {} file(s), {} -> {}",
        total, job.request.source_lang, job.request.target_lang
    ));

    let mut processed_any = false;
    for source_path in &job.files {
        if stop.load(Ordering::SeqCst) {
            cancelled = true;
            break;
        }

        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source_path.to_string_lossy().to_string());
        let output_path =
            FileManager::generate_output_path(source_path, &job.output_dir, &job.request.target_lang);

        if !job.allow_retranslation && ledger.is_translated(&filename, &output_path) {
            info!("Skipping {} (already translated)", filename);
            let _ = tx.send(BatchEvent::FileSkipped(filename));
            continue;
        }

        // Pace between files the same way the engine paces segments.
        if processed_any {
            tokio::time::sleep(engine.pacing()).await;
        }
        processed_any = true;

        let _ = tx.send(BatchEvent::Progress(format!("Processing {}", filename)));

        match process_file(
            &engine,
            &ledger,
            &logger,
            &stop,
            source_path,
            &output_path,
            &job.request,
        )
        .await
        {
            Ok(FileOutcome::Committed) => {
                succeeded += 1;
                let _ = tx.send(BatchEvent::FileCompleted {
                    filename,
                    success: true,
                });
            }
            Ok(FileOutcome::CancelledBeforeCommit) => {
                cancelled = true;
                let _ = tx.send(BatchEvent::FileCompleted {
                    filename,
                    success: false,
                });
                break;
            }
            Err(e) => {
                // Per-file failures never abort the batch.
                let message = format!("Failed to translate {}: {}", filename, e);
                error!("{}", message);
                logger.error(&message);
                let _ = tx.send(BatchEvent::Error(message));
                let _ = tx.send(BatchEvent::FileCompleted {
                    filename,
                    success: false,
                });
            }
        }
    }

    logger.info(&format!(
        "Batch finished: {}/{} succeeded{}",
        succeeded,
        total,
        if cancelled { " (cancelled)" } else { "" }
    ));
    logger.flush();

    let _ = tx.send(BatchEvent::AllCompleted { succeeded, total });

    BatchSummary {
        succeeded,
        total,
        cancelled,
    }
}

/// Validate the main and check/refine routes against the catalog
fn validate_job(
    engine: &TranslationEngine,
    request: &TranslationRequest,
) -> Result<(), crate::errors::ProviderError> {
    engine.gateway().validate_route(&request.route)?;

    let stage_route = CheckRefineSettings::resolve(request.check_refine.as_ref(), &request.route);
    if stage_route != request.route {
        engine.gateway().validate_route(&stage_route)?;
    }

    Ok(())
}

/// Translate one file: read, run the engine, commit atomically, record.
async fn process_file(
    engine: &TranslationEngine,
    ledger: &Ledger,
    logger: &SessionLogger,
    stop: &AtomicBool,
    source_path: &Path,
    output_path: &Path,
    request: &TranslationRequest,
) -> Result<FileOutcome, AppError> {
    let text = FileManager::read_to_string(source_path)
        .map_err(|e| AppError::File(e.to_string()))?;

    let translated = engine.translate(&text, request).await?;

    // Poll the stop flag before the commit so a cancellation mid-file
    // discards the result instead of writing it.
    if stop.load(Ordering::SeqCst) {
        warn!(
            "Stop requested, discarding translation of {:?}",
            source_path.file_name().unwrap_or_default()
        );
        return Ok(FileOutcome::CancelledBeforeCommit);
    }

    FileManager::write_atomic(output_path, &translated)
        .map_err(|e| AppError::File(e.to_string()))?;

    if let Err(e) = ledger.record(
        &source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source_path.to_string_lossy().to_string()),
        &request.source_lang,
        &request.target_lang,
    ) {
        // The output exists; a ledger failure only costs skip detection.
        warn!("Failed to record ledger entry: {}", e);
        logger.warning(&format!("Ledger record failed: {}", e));
    }

    Ok(FileOutcome::Committed)
}
