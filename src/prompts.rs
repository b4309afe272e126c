/*!
 * Prompt resolution and rendering.
 *
 * Prompt templates live on disk and resolve through three layers, first
 * hit wins: a session-temporary override directory, a per-language-pair
 * directory under the config root, and a base default directory. Rendering
 * is literal placeholder substitution; no templating engine is involved.
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::errors::PromptError;

/// The three pipeline stages that carry their own prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Main translation prompt
    Translation,
    /// Whole-text quality check prompt
    Check,
    /// Per-segment refinement prompt
    Refine,
}

impl PromptKind {
    /// File name of the template within a prompt directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Translation => "translation.txt",
            Self::Check => "check.txt",
            Self::Refine => "refine.txt",
        }
    }

    /// Short label used in log lines and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Check => "check",
            Self::Refine => "refine",
        }
    }
}

/// Built-in default translation template, written to the base directory
/// on first run.
pub const DEFAULT_TRANSLATION_PROMPT: &str = "\
You are a professional literary translator working from {source_lang} to {target_lang}.

Requirements:
- Translate the text below from {source_lang} to {target_lang}.
- Preserve paragraph breaks, dialogue punctuation, and narrative tone.
- Do not summarize, omit, or add content.
- Respond with the translated text only, no explanations.
{terminology_reference}
Text to translate:
{text_to_translate}";

/// Built-in default quality-check template.
pub const DEFAULT_CHECK_PROMPT: &str = "\
You are reviewing a {source_lang} to {target_lang} translation for fidelity.

Compare the original text and the translation. Decide whether the translation
is complete and faithful. Answer in exactly this format:

Check response: yes
or
Check response: no
Cause: <one short line naming the problem>

Original text:
{original_text}

Translated text:
{translated_text}";

/// Built-in default refinement template.
pub const DEFAULT_REFINE_PROMPT: &str = "\
You are polishing a {target_lang} translation of a {source_lang} passage.

Requirements:
- Improve fluency and naturalness without changing the meaning.
- Keep paragraph breaks and punctuation style.
- Respond with the refined translation only.
{terminology_reference}
Original text:
{original_text}

Current translation:
{translated_text}";

/// Values substituted into a prompt template.
#[derive(Debug, Default, Clone)]
pub struct PromptVars<'a> {
    /// Source language code
    pub source_lang: &'a str,
    /// Target language code
    pub target_lang: &'a str,
    /// Text for `{text_to_translate}`
    pub text: &'a str,
    /// Text for `{original_text}` (check/refine stages)
    pub original_text: &'a str,
    /// Text for `{translated_text}` (check/refine stages)
    pub translated_text: &'a str,
    /// Raw custom terminology, newline separated
    pub terminology: Option<&'a str>,
}

/// Resolves prompt templates from the layered directory structure.
#[derive(Debug, Clone)]
pub struct PromptResolver {
    /// Session-temporary override directory, highest priority
    session_dir: Option<PathBuf>,
    /// Config root holding `prompts/{pair}/` and `prompts/default/`
    config_dir: PathBuf,
}

impl PromptResolver {
    /// Create a resolver rooted at the given config directory.
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            session_dir: None,
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Attach a session-temporary override directory.
    pub fn with_session_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.session_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Resolve the template text for a prompt kind and language pair.
    ///
    /// Checks the session override directory, then the language-pair
    /// directory, then the base default directory. Returns
    /// `PromptError::NotFound` when no layer has the file.
    pub fn resolve(
        &self,
        kind: PromptKind,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, PromptError> {
        let pair = format!("{}_{}", source_lang, target_lang);

        let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);
        if let Some(session) = &self.session_dir {
            candidates.push(session.join(&pair).join(kind.file_name()));
        }
        candidates.push(self.prompts_root().join(&pair).join(kind.file_name()));
        candidates.push(self.prompts_root().join("default").join(kind.file_name()));

        for path in candidates {
            if path.is_file() {
                debug!("Resolved {} prompt from {:?}", kind.label(), path);
                return fs::read_to_string(&path).map_err(|e| PromptError::ReadFailed {
                    path,
                    message: e.to_string(),
                });
            }
        }

        Err(PromptError::NotFound {
            kind: kind.label().to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        })
    }

    /// Write the built-in default templates into the base directory,
    /// leaving any existing files untouched.
    pub fn ensure_default_prompts(&self) -> Result<()> {
        let default_dir = self.prompts_root().join("default");
        fs::create_dir_all(&default_dir)
            .with_context(|| format!("Failed to create prompt directory {:?}", default_dir))?;

        let defaults = [
            (PromptKind::Translation, DEFAULT_TRANSLATION_PROMPT),
            (PromptKind::Check, DEFAULT_CHECK_PROMPT),
            (PromptKind::Refine, DEFAULT_REFINE_PROMPT),
        ];

        for (kind, template) in defaults {
            let path = default_dir.join(kind.file_name());
            if !path.exists() {
                fs::write(&path, template)
                    .with_context(|| format!("Failed to write default prompt {:?}", path))?;
            }
        }

        Ok(())
    }

    fn prompts_root(&self) -> PathBuf {
        self.config_dir.join("prompts")
    }
}

/// Render a template by literal placeholder substitution.
///
/// An empty terminology list substitutes the empty string so the
/// placeholder never leaks into the rendered prompt.
pub fn render(template: &str, vars: &PromptVars) -> String {
    let terminology = vars
        .terminology
        .map(format_terminology)
        .unwrap_or_default();

    template
        .replace("{source_lang}", vars.source_lang)
        .replace("{target_lang}", vars.target_lang)
        .replace("{text_to_translate}", vars.text)
        .replace("{original_text}", vars.original_text)
        .replace("{translated_text}", vars.translated_text)
        .replace("{terminology_reference}", &terminology)
}

/// Normalize a freeform terminology list into `- ` bullet lines.
fn format_terminology(raw: &str) -> String {
    let bullets: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with("- ") {
                line.to_string()
            } else {
                format!("- {}", line)
            }
        })
        .collect();

    if bullets.is_empty() {
        String::new()
    } else {
        format!("\nTerminology reference:\n{}\n", bullets.join("\n"))
    }
}
