/*!
 * # chaptrans - AI chapter translator
 *
 * A Rust library for translating novel chapters with LLM providers.
 *
 * ## Features
 *
 * - Sentence-aware segmentation of long chapters
 * - Translation through multiple provider API shapes:
 *   - Gemini-style generation endpoints
 *   - OpenAI-chat-style endpoints
 * - Optional per-segment refinement pass
 * - Optional whole-text quality check with one automatic retry
 * - Layered prompt templates per language pair
 * - Batch processing with progress events and cooperative cancellation
 * - Completion ledger with a JSON fallback store
 * - ISO 639-1 and ISO 639-3 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration, provider catalog and credentials
 * - `segmenter`: Sentence-aware text segmentation
 * - `prompts`: Prompt template resolution and rendering
 * - `translation`: The translation pipeline:
 *   - `translation::engine`: Per-text segment/translate/refine/check pipeline
 *   - `translation::batch`: Batch orchestration across files
 *   - `translation::check`: Quality-check response parsing
 * - `providers`: Provider gateway and per-shape HTTP clients
 * - `ledger`: Durable completion records
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `session_log`: Per-session request/response log file
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod ledger;
pub mod prompts;
pub mod providers;
pub mod segmenter;
pub mod session_log;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, CredentialStore, ProviderCatalog};
pub use errors::{AppError, LedgerError, PromptError, ProviderError, TranslationError};
pub use ledger::{Ledger, TranslationRecord};
pub use prompts::{PromptKind, PromptResolver};
pub use providers::{HttpGateway, ProviderGateway, ProviderRoute};
pub use segmenter::Segmenter;
pub use translation::{
    BatchEvent, BatchJob, BatchOrchestrator, BatchSummary, CheckRefineSettings, TranslationEngine,
    TranslationRequest,
};
