/*!
 * Translation pipeline: check parsing, the per-text engine, and the
 * batch orchestrator that drives it across files.
 */

pub mod batch;
pub mod check;
pub mod engine;

pub use batch::{BatchEvent, BatchJob, BatchOrchestrator, BatchSummary};
pub use check::{CheckVerdict, parse_check_response};
pub use engine::{CheckRefineSettings, TranslationEngine, TranslationRequest};
