/*!
 * Quality-check response parsing.
 *
 * The checking model is instructed to answer with a `Check response:
 * yes|no` line and an optional `Cause:` line. Anything that does not
 * match that shape counts as a failed check.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static VERDICT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*check\s+response\s*:\s*(yes|no)\s*$").unwrap());

static CAUSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*cause\s*:\s*(.+)$").unwrap());

/// Outcome of one quality-check call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckVerdict {
    /// The model judged the translation faithful
    Passed,
    /// The model judged it unfaithful, or the response was unparseable
    Failed {
        /// Cause line reported by the model, if any
        cause: Option<String>,
    },
}

impl CheckVerdict {
    /// Whether the verdict is a pass
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Parse a raw check-model response into a verdict
pub fn parse_check_response(text: &str) -> CheckVerdict {
    let Some(captures) = VERDICT_RE.captures(text) else {
        return CheckVerdict::Failed { cause: None };
    };

    let answer = captures[1].to_lowercase();
    if answer == "yes" {
        return CheckVerdict::Passed;
    }

    let cause = CAUSE_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|c| !c.is_empty());

    CheckVerdict::Failed { cause }
}
