// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};

use chaptrans::app_config::{Config, CredentialStore, LogLevel};
use chaptrans::errors::AppError;
use chaptrans::file_utils::FileManager;
use chaptrans::language_utils::{get_language_name, validate_language_code};
use chaptrans::ledger::Ledger;
use chaptrans::prompts::PromptResolver;
use chaptrans::providers::{HttpGateway, ProviderRoute};
use chaptrans::session_log::SessionLogger;
use chaptrans::translation::{
    BatchEvent, BatchJob, BatchOrchestrator, CheckRefineSettings, TranslationEngine,
    TranslationRequest,
};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// chaptrans - AI chapter translator
///
/// Translates novel chapters (plain text or markdown) between languages
/// using LLM providers.
#[derive(Parser, Debug)]
#[command(name = "chaptrans")]
#[command(version = "0.3.0")]
#[command(about = "AI-powered novel chapter translation tool")]
#[command(long_about = "chaptrans translates novel chapters using LLM providers.

EXAMPLES:
    chaptrans -s ja -t en chapters/                 # Translate a whole directory
    chaptrans -s ja -t en chapter_01.txt            # Translate one file
    chaptrans -p openai -m gpt-4o -s ja -t en ch.txt
    chaptrans --check --refine -s ja -t en chapters/
    chaptrans --terms glossary.txt -s ja -t en chapters/
    chaptrans --list chapters/                      # Show translated files

CONFIGURATION:
    Configuration lives in the platform config directory by default
    (e.g. ~/.config/chaptrans/config.json). Pass --config to use a
    different file. A default config is created on first run.")]
struct CommandLineOptions {
    /// Input chapter file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Source language code (e.g., 'ja', 'en', 'zh')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'fr', 'es')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Provider identifier from the catalog
    #[arg(short, long, default_value = "gemini")]
    provider: String,

    /// Model identifier for translation
    #[arg(short, long, default_value = "gemini-2.0-flash")]
    model: String,

    /// Separate provider for check/refine calls
    #[arg(long, requires = "check_model")]
    check_provider: Option<String>,

    /// Separate model for check/refine calls
    #[arg(long)]
    check_model: Option<String>,

    /// Verify each translation with a quality check, retrying once on failure
    #[arg(long)]
    check: bool,

    /// Refine each translated segment with a second pass
    #[arg(long)]
    refine: bool,

    /// Soft segment size in characters (overrides the config heuristics)
    #[arg(long)]
    segment_size: Option<usize>,

    /// File with custom terminology, one term mapping per line
    #[arg(long, value_name = "FILE")]
    terms: Option<PathBuf>,

    /// Re-translate files the ledger already marks as done
    #[arg(short, long)]
    retranslate: bool,

    /// API key for the selected provider (overrides the config key)
    #[arg(long, env = "CHAPTRANS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output directory for translated files (defaults to the input directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List ledger records for the project directory and exit
    #[arg(long)]
    list: bool,

    /// Provider request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let color = match record.level() {
                Level::Error => "\x1B[1;31m",
                Level::Warn => "\x1B[1;33m",
                Level::Info => "\x1B[1;32m",
                Level::Debug => "\x1B[1;36m",
                Level::Trace => "\x1B[1;35m",
            };
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default;
    // the level is updated after loading the config.
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(level) = &cli.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };

    let mut config = if config_path.is_file() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        warn!(
            "Config file not found at {:?}, creating default config.",
            config_path
        );
        let config = Config::default();
        config.save(&config_path)?;
        config
    };

    // CLI options override the persisted configuration.
    if let Some(source) = &cli.source_language {
        config.source_language = source.clone();
    }
    if let Some(target) = &cli.target_language {
        config.target_language = target.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = LogLevel::from(level.clone());
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    config.validate().context("Configuration validation failed")?;
    validate_language_code(&config.source_language)?;
    validate_language_code(&config.target_language)?;

    run(cli, config, &config_path).await
}

async fn run(cli: CommandLineOptions, config: Config, config_path: &Path) -> Result<()> {
    if !cli.input_path.exists() {
        return Err(anyhow!("Input path does not exist: {:?}", cli.input_path));
    }

    // The project directory anchors the ledger and default output location.
    let project_dir = if cli.input_path.is_dir() {
        cli.input_path.clone()
    } else {
        cli.input_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf()
    };

    let ledger = Ledger::open(&project_dir).map_err(AppError::Ledger)?;

    if cli.list {
        return list_records(&ledger);
    }

    let files = if cli.input_path.is_file() {
        vec![cli.input_path.clone()]
    } else {
        FileManager::find_chapter_files(&cli.input_path)?
    };
    if files.is_empty() {
        return Err(anyhow!("No chapter files found in {:?}", cli.input_path));
    }

    let output_dir = cli.output_dir.clone().unwrap_or_else(|| project_dir.clone());

    let custom_terms = match &cli.terms {
        Some(path) => Some(
            FileManager::read_to_string(path)
                .with_context(|| format!("Failed to read terminology file {:?}", path))?,
        ),
        None => None,
    };

    let mut credentials = CredentialStore::new();
    if let Some(key) = &cli.api_key {
        credentials.set_override(&cli.provider, key);
    }

    let config_dir = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let prompts = PromptResolver::new(&config_dir);
    prompts.ensure_default_prompts()?;

    let logger = match SessionLogger::create(config_dir.join("logs")) {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            warn!("Session log unavailable: {}", e);
            Arc::new(SessionLogger::disabled())
        }
    };

    let gateway = Arc::new(HttpGateway::new(
        config.providers.clone(),
        credentials,
        Duration::from_secs(config.timeout_secs),
    )?);

    let engine = Arc::new(
        TranslationEngine::new(gateway, prompts, Arc::clone(&logger))
            .with_pacing(Duration::from_secs(config.pacing_secs)),
    );

    let check_refine = cli.check_model.as_ref().map(|model| CheckRefineSettings {
        use_separate_model: true,
        provider: cli
            .check_provider
            .clone()
            .unwrap_or_else(|| cli.provider.clone()),
        model: model.clone(),
    });

    let request = TranslationRequest {
        source_lang: config.source_language.clone(),
        target_lang: config.target_language.clone(),
        route: ProviderRoute::new(&cli.provider, &cli.model),
        check_refine,
        custom_terms,
        enable_check: cli.check,
        enable_refine: cli.refine,
        segment_size: effective_segment_size(&cli, &config, &files),
    };

    info!(
        "Translating {} file(s) from {} to {} via {}",
        files.len(),
        get_language_name(&config.source_language)
            .unwrap_or_else(|_| config.source_language.clone()),
        get_language_name(&config.target_language)
            .unwrap_or_else(|_| config.target_language.clone()),
        request.route
    );

    let orchestrator = Arc::new(BatchOrchestrator::new(
        engine,
        Arc::new(ledger),
        Arc::clone(&logger),
    ));

    let total = files.len();
    let (handle, mut events) = orchestrator.start(BatchJob {
        files,
        output_dir,
        request,
        allow_retranslation: cli.retranslate,
    });

    // Ctrl-c requests a cooperative stop; the current file is discarded.
    {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current file");
                orchestrator.stop();
            }
        });
    }

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut failed = 0usize;
    while let Some(event) = events.recv().await {
        match event {
            BatchEvent::Progress(message) => progress.set_message(message),
            BatchEvent::FileSkipped(filename) => {
                progress.inc(1);
                progress.set_message(format!("skipped {}", filename));
            }
            BatchEvent::FileCompleted { filename, success } => {
                progress.inc(1);
                if !success {
                    failed += 1;
                }
                progress.set_message(format!(
                    "{} {}",
                    if success { "done" } else { "failed" },
                    filename
                ));
            }
            BatchEvent::Error(message) => warn!("{}", message),
            BatchEvent::AllCompleted { succeeded, total } => {
                progress.finish_with_message(format!("{}/{} translated", succeeded, total));
            }
        }
    }

    let summary = handle.await.context("Batch task panicked")?;
    logger.shutdown(false);

    if summary.cancelled {
        warn!("Cancelled: {}/{} files translated", summary.succeeded, summary.total);
        return Ok(());
    }

    info!("Finished: {}/{} files translated", summary.succeeded, summary.total);
    if failed > 0 {
        return Err(anyhow!("{} file(s) failed to translate", failed));
    }
    Ok(())
}

/// Segment size for this run: an explicit flag wins; otherwise the config
/// heuristics, keyed on the largest selected chapter.
fn effective_segment_size(
    cli: &CommandLineOptions,
    config: &Config,
    files: &[PathBuf],
) -> Option<usize> {
    if let Some(size) = cli.segment_size {
        return Some(size);
    }

    let largest = files
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len() as usize)
        .max()
        .unwrap_or(0);

    config.segmentation.effective_segment_size(largest)
}

fn list_records(ledger: &Ledger) -> Result<()> {
    let records = ledger.list_all().map_err(AppError::Ledger)?;
    if records.is_empty() {
        println!("No translated files recorded.");
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {} -> {}  {}  {}",
            record.filename, record.source_lang, record.target_lang, record.status, record.timestamp
        );
    }
    Ok(())
}
