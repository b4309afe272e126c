/*!
 * Core translation engine.
 *
 * Runs the per-text pipeline: segment, translate each segment in order,
 * optionally refine each segment, join, optionally check the whole text,
 * and retry the full translation once if the check definitively fails.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::errors::TranslationError;
use crate::prompts::{PromptKind, PromptResolver, PromptVars, render};
use crate::providers::{ProviderGateway, ProviderRoute};
use crate::segmenter::Segmenter;
use crate::session_log::SessionLogger;
use crate::translation::check::{CheckVerdict, parse_check_response};

/// Full pipeline attempts: the initial translation plus one retry when
/// the quality check definitively fails.
const MAX_TRANSLATION_ATTEMPTS: usize = 2;

/// Calls made to the checking model per pipeline attempt: the initial
/// check plus one internal retry of the check call itself.
const CHECK_CALL_ATTEMPTS: usize = 2;

/// Separator used to join translated segments back into one text
const SEGMENT_SEPARATOR: &str = "\n\n";

/// Override routing for the check and refine stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRefineSettings {
    /// Whether check/refine use their own provider and model
    pub use_separate_model: bool,
    /// Provider identifier for the separate model
    pub provider: String,
    /// Model identifier for the separate model
    pub model: String,
}

impl CheckRefineSettings {
    /// Route for check/refine calls: the separate model when configured,
    /// otherwise the main translation route.
    pub fn resolve(settings: Option<&Self>, main: &ProviderRoute) -> ProviderRoute {
        match settings {
            Some(s) if s.use_separate_model => ProviderRoute::new(&s.provider, &s.model),
            _ => main.clone(),
        }
    }
}

/// Parameters for translating one text
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// Main translation route
    pub route: ProviderRoute,
    /// Optional separate routing for check/refine
    pub check_refine: Option<CheckRefineSettings>,
    /// Freeform terminology list, newline separated
    pub custom_terms: Option<String>,
    /// Whether to run the whole-text quality check
    pub enable_check: bool,
    /// Whether to refine each translated segment
    pub enable_refine: bool,
    /// Soft segment size; `None` keeps the text whole
    pub segment_size: Option<usize>,
}

/// Translation engine driving the per-text pipeline
pub struct TranslationEngine {
    /// Provider gateway
    gateway: Arc<dyn ProviderGateway>,
    /// Prompt resolution
    prompts: PromptResolver,
    /// Session log collaborator
    logger: Arc<SessionLogger>,
    /// Delay between sequential provider calls
    pacing: Duration,
}

impl TranslationEngine {
    /// Create an engine with the default 5 second pacing delay
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        prompts: PromptResolver,
        logger: Arc<SessionLogger>,
    ) -> Self {
        Self {
            gateway,
            prompts,
            logger,
            pacing: Duration::from_secs(5),
        }
    }

    /// Override the pacing delay between provider calls
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// The pacing delay this engine applies between provider calls
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// The gateway this engine sends requests through
    pub fn gateway(&self) -> &Arc<dyn ProviderGateway> {
        &self.gateway
    }

    /// Translate one text through the full pipeline.
    ///
    /// Returns the translated text, or an error when a segment
    /// translation fails or the quality check fails twice. No partial
    /// output is ever returned.
    pub async fn translate(
        &self,
        text: &str,
        request: &TranslationRequest,
    ) -> Result<String, TranslationError> {
        // Resolve the check template up front: a missing prompt is a
        // configuration error and must fail the text before any provider
        // call is spent on it.
        let check_template = if request.enable_check {
            Some(self.prompts.resolve(
                PromptKind::Check,
                &request.source_lang,
                &request.target_lang,
            )?)
        } else {
            None
        };

        let mut last_cause: Option<String> = None;

        for attempt in 1..=MAX_TRANSLATION_ATTEMPTS {
            if attempt > 1 {
                info!("Quality check failed, retrying full translation");
                self.logger.warning("Check failed, starting full re-translation");
                tokio::time::sleep(self.pacing).await;
            }

            let translated = self.translate_once(text, request).await?;

            let Some(template) = check_template.as_deref() else {
                return Ok(translated);
            };

            match self.run_check(text, &translated, template, request).await {
                CheckVerdict::Passed => {
                    self.logger.info("Quality check passed");
                    return Ok(translated);
                }
                CheckVerdict::Failed { cause } => {
                    warn!(
                        "Quality check failed (attempt {}/{}){}",
                        attempt,
                        MAX_TRANSLATION_ATTEMPTS,
                        cause.as_deref().map(|c| format!(": {c}")).unwrap_or_default()
                    );
                    last_cause = cause;
                }
            }
        }

        Err(TranslationError::CheckFailed { cause: last_cause })
    }

    /// One pass of segment + translate + refine + join
    async fn translate_once(
        &self,
        text: &str,
        request: &TranslationRequest,
    ) -> Result<String, TranslationError> {
        let segments = Segmenter::segment(text, request.segment_size);
        if segments.is_empty() {
            return Ok(String::new());
        }

        let template = self.prompts.resolve(
            PromptKind::Translation,
            &request.source_lang,
            &request.target_lang,
        )?;

        debug!(
            "Translating {} segment(s) via {}",
            segments.len(),
            request.route
        );

        let mut translated_segments = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }

            let vars = PromptVars {
                source_lang: &request.source_lang,
                target_lang: &request.target_lang,
                text: segment,
                terminology: request.custom_terms.as_deref(),
                ..Default::default()
            };
            let prompt = render(&template, &vars);

            let translated = self.send_logged(&request.route, &prompt).await?;

            let final_segment = if request.enable_refine {
                tokio::time::sleep(self.pacing).await;
                match self.refine_segment(segment, &translated, request).await {
                    Ok(refined) => refined,
                    Err(e) => {
                        // Refinement is best-effort: keep the unrefined
                        // segment instead of failing the whole text.
                        warn!("Refine failed for segment {}: {}", index + 1, e);
                        self.logger
                            .warning(&format!("Refine failed for segment {}: {}", index + 1, e));
                        translated
                    }
                }
            } else {
                translated
            };

            translated_segments.push(final_segment);
        }

        Ok(translated_segments.join(SEGMENT_SEPARATOR))
    }

    /// Refine one translated segment against its source
    async fn refine_segment(
        &self,
        original: &str,
        translated: &str,
        request: &TranslationRequest,
    ) -> Result<String, TranslationError> {
        let template = self.prompts.resolve(
            PromptKind::Refine,
            &request.source_lang,
            &request.target_lang,
        )?;

        let vars = PromptVars {
            source_lang: &request.source_lang,
            target_lang: &request.target_lang,
            original_text: original,
            translated_text: translated,
            terminology: request.custom_terms.as_deref(),
            ..Default::default()
        };
        let prompt = render(&template, &vars);

        let route = CheckRefineSettings::resolve(request.check_refine.as_ref(), &request.route);
        let refined = self.send_logged(&route, &prompt).await?;
        Ok(refined)
    }

    /// Run the whole-text quality check, retrying the check call itself
    /// once after a pacing delay.
    ///
    /// A provider failure on the check call counts as a failed check for
    /// that call, not as an immediate abort; the pipeline-level retry
    /// decides the final outcome.
    async fn run_check(
        &self,
        original: &str,
        translated: &str,
        template: &str,
        request: &TranslationRequest,
    ) -> CheckVerdict {
        let vars = PromptVars {
            source_lang: &request.source_lang,
            target_lang: &request.target_lang,
            original_text: original,
            translated_text: translated,
            ..Default::default()
        };
        let prompt = render(template, &vars);
        let route = CheckRefineSettings::resolve(request.check_refine.as_ref(), &request.route);

        let mut last = CheckVerdict::Failed { cause: None };
        for call in 1..=CHECK_CALL_ATTEMPTS {
            if call > 1 {
                debug!("Retrying check call after pacing delay");
                tokio::time::sleep(self.pacing).await;
            }

            match self.send_logged(&route, &prompt).await {
                Ok(response) => {
                    let verdict = parse_check_response(&response);
                    if verdict.passed() {
                        return verdict;
                    }
                    last = verdict;
                }
                Err(e) => {
                    warn!("Check call failed: {}", e);
                    last = CheckVerdict::Failed { cause: Some(e.to_string()) };
                }
            }
        }

        last
    }

    /// Send a prompt through the gateway with session-log bookkeeping
    async fn send_logged(
        &self,
        route: &ProviderRoute,
        prompt: &str,
    ) -> Result<String, crate::errors::ProviderError> {
        self.logger.request(&route.provider, &route.model, prompt.len());
        let started = Instant::now();

        let result = self.gateway.send(route, prompt).await;

        match &result {
            Ok(text) => self
                .logger
                .response(&route.provider, started.elapsed(), text.len()),
            Err(e) => self
                .logger
                .error(&format!("Request to {} failed: {}", route, e)),
        }

        result
    }
}
