/*!
 * Common test utilities for the chaptrans test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;

use chaptrans::prompts::PromptResolver;
use chaptrans::providers::{ProviderGateway, ProviderRoute};
use chaptrans::session_log::SessionLogger;
use chaptrans::translation::{CheckRefineSettings, TranslationEngine, TranslationRequest};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a chapter file with the given content in the specified directory
pub fn create_chapter(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Installs minimal prompt templates that render to the bare text, so a
/// scripted gateway sees exactly the pipeline input.
pub fn install_passthrough_prompts(config_dir: &Path) -> Result<()> {
    let default_dir = config_dir.join("prompts").join("default");
    fs::create_dir_all(&default_dir)?;
    fs::write(default_dir.join("translation.txt"), "{text_to_translate}")?;
    fs::write(default_dir.join("check.txt"), "{translated_text}")?;
    fs::write(default_dir.join("refine.txt"), "{translated_text}")?;
    Ok(())
}

/// Builds an engine with zero pacing and a disabled session log, so tests
/// run without sleeping or touching the filesystem for logs.
pub fn make_engine(gateway: Arc<dyn ProviderGateway>, config_dir: &Path) -> TranslationEngine {
    TranslationEngine::new(
        gateway,
        PromptResolver::new(config_dir),
        Arc::new(SessionLogger::disabled()),
    )
    .with_pacing(Duration::ZERO)
}

/// The main route used by scripted gateways
pub fn mock_route() -> ProviderRoute {
    ProviderRoute::new("mock", "mock-model")
}

/// A baseline request: mock main route, check/refine routed to a separate
/// "checker" model so scripted gateways can tell the stages apart.
pub fn base_request(enable_check: bool, enable_refine: bool) -> TranslationRequest {
    TranslationRequest {
        source_lang: "en".to_string(),
        target_lang: "fr".to_string(),
        route: mock_route(),
        check_refine: Some(CheckRefineSettings {
            use_separate_model: true,
            provider: "mock".to_string(),
            model: "checker".to_string(),
        }),
        custom_terms: None,
        enable_check,
        enable_refine,
        segment_size: None,
    }
}
