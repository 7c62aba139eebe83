//! Request orchestration.
//!
//! [`CodeService`] validates a snippet, detects its language and answers
//! each operation. When a generator is configured its reply is tried first;
//! on any failure, or a reply too short to be useful, the heuristics answer
//! instead. Heuristics run on the blocking pool.

use actix_web::web;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::analysis::{
    self, detector, explain, AnalysisResult, AnswerLanguage, ComplexityReport, ImprovementResult,
    LineExplanation,
};
use crate::config::Config;
use crate::generator::{self, prompt, Generator};

/// Replies at or below this many characters are ignored by default.
pub const DEFAULT_MIN_RESPONSE_CHARS: usize = 10;

/// The three operations, named as they appear in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analyze,
    Complexity,
    Improve,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Analyze => "Analysis",
            Operation::Complexity => "Complexity analysis",
            Operation::Improve => "Improve",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced to callers of the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No code provided")]
    EmptyCode,
    #[error("{operation} failed: {message}")]
    Internal {
        operation: Operation,
        message: String,
    },
}

impl ServiceError {
    pub fn internal(operation: Operation, err: impl fmt::Display) -> Self {
        ServiceError::Internal {
            operation,
            message: err.to_string(),
        }
    }
}

/// Summary used instead of the overview when Hinglish is requested but the
/// answer comes from heuristics.
pub fn hinglish_summary(language: &str) -> String {
    format!(
        "<h3>Short Summary (Hinglish)</h3> Yeh {} code kuch operations karta hai aur logical \
steps follow karta hai. Neeche line-by-line basic breakdown diya hai.",
        language
    )
}

/// Lines listed alongside a generated explanation, each with an empty gloss.
fn echo_lines(code: &str) -> Vec<LineExplanation> {
    explain::code_lines(code)
        .map(|(line_number, line)| LineExplanation {
            line_number,
            code: line.to_string(),
            explanation: String::new(),
        })
        .collect()
}

/// Trimmed code, or [`ServiceError::EmptyCode`].
fn require_code(code: &str) -> Result<&str, ServiceError> {
    let code = code.trim();
    if code.is_empty() {
        Err(ServiceError::EmptyCode)
    } else {
        Ok(code)
    }
}

/// Answers analysis requests. Immutable once built; share it behind an `Arc`.
#[derive(Clone)]
pub struct CodeService {
    generator: Option<Arc<dyn Generator>>,
    min_response_chars: usize,
}

impl Default for CodeService {
    fn default() -> Self {
        Self::heuristic()
    }
}

impl CodeService {
    pub fn new(generator: Option<Arc<dyn Generator>>) -> Self {
        Self {
            generator,
            min_response_chars: DEFAULT_MIN_RESPONSE_CHARS,
        }
    }

    /// A service that never consults a generator.
    pub fn heuristic() -> Self {
        Self::new(None)
    }

    /// Build from configuration. `use_ai = false` forces heuristics.
    pub fn from_config(config: &Config, use_ai: bool) -> Self {
        let generator = if use_ai {
            generator::from_config(&config.generator)
        } else {
            None
        };
        Self::new(generator).with_min_response_chars(config.generator.min_response_chars)
    }

    pub fn with_min_response_chars(mut self, chars: usize) -> Self {
        self.min_response_chars = chars;
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// A usable generator reply for `prompt`, if any.
    async fn ask(&self, prompt: &str) -> Option<String> {
        let generator = self.generator.as_ref()?;

        match generator.generate(prompt).await {
            Ok(reply) => {
                let reply = reply.trim();
                if reply.chars().count() > self.min_response_chars {
                    debug!(generator = generator.name(), chars = reply.len(), "using generated reply");
                    Some(reply.to_string())
                } else {
                    warn!(
                        generator = generator.name(),
                        chars = reply.len(),
                        "generated reply too short; falling back to heuristics"
                    );
                    None
                }
            }
            Err(e) => {
                warn!(generator = generator.name(), error = %e, "generator failed; falling back to heuristics");
                None
            }
        }
    }

    /// Explain a snippet.
    #[instrument(skip(self, code), fields(chars = code.len()))]
    pub async fn analyze(
        &self,
        code: &str,
        answer: AnswerLanguage,
    ) -> Result<AnalysisResult, ServiceError> {
        let code = require_code(code)?;
        let language = detector::detect(code);
        debug!(language, "detected language");

        if let Some(reply) = self
            .ask(&prompt::explanation_prompt(language, answer, code))
            .await
        {
            return Ok(AnalysisResult {
                language: language.to_string(),
                overall_explanation: reply,
                line_explanations: echo_lines(code),
                potential_issues: Vec::new(),
            });
        }

        let source = code.to_string();
        let mut result = web::block(move || explain::explain(&source, language))
            .await
            .map_err(|e| ServiceError::internal(Operation::Analyze, e))?;

        if answer == AnswerLanguage::Hinglish {
            result.overall_explanation = hinglish_summary(language);
        }
        Ok(result)
    }

    /// Estimate complexity. Never consults the generator.
    #[instrument(skip(self, code), fields(chars = code.len()))]
    pub async fn complexity(&self, code: &str) -> Result<ComplexityReport, ServiceError> {
        let code = require_code(code)?;
        let source = code.to_string();

        web::block(move || analysis::complexity_report(&source))
            .await
            .map_err(|e| ServiceError::internal(Operation::Complexity, e))
    }

    /// Suggest improvements.
    #[instrument(skip(self, code), fields(chars = code.len()))]
    pub async fn improve(
        &self,
        code: &str,
        answer: AnswerLanguage,
    ) -> Result<ImprovementResult, ServiceError> {
        let code = require_code(code)?;
        let language = detector::detect(code);
        debug!(language, "detected language");

        if let Some(reply) = self
            .ask(&prompt::improvement_prompt(language, answer, code))
            .await
        {
            return Ok(ImprovementResult {
                language: language.to_string(),
                improved_code: prompt::extract_fenced_code(&reply)
                    .unwrap_or_else(|| code.to_string()),
                tips: prompt::strip_fenced_blocks(&reply),
            });
        }

        let source = code.to_string();
        web::block(move || analysis::improve(&source, language))
            .await
            .map_err(|e| ServiceError::internal(Operation::Improve, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_code() {
        assert!(matches!(require_code("  \n\t"), Err(ServiceError::EmptyCode)));
        assert_eq!(require_code("  x = 1\n").unwrap(), "x = 1");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ServiceError::EmptyCode.to_string(), "No code provided");
        assert_eq!(
            ServiceError::internal(Operation::Complexity, "boom").to_string(),
            "Complexity analysis failed: boom"
        );
        assert_eq!(
            ServiceError::internal(Operation::Analyze, "x").to_string(),
            "Analysis failed: x"
        );
    }

    #[test]
    fn test_echo_lines_skip_blank_and_comments() {
        let lines = echo_lines("# note\nx = 1\n\n// js note\ny = 2");
        let numbers: Vec<usize> = lines.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![2, 5]);
        assert!(lines.iter().all(|l| l.explanation.is_empty()));
    }

    #[test]
    fn test_hinglish_summary_names_language() {
        let summary = hinglish_summary("go");
        assert!(summary.starts_with("<h3>Short Summary (Hinglish)</h3>"));
        assert!(summary.contains("Yeh go code"));
    }

    #[tokio::test]
    async fn test_heuristic_service_answers() {
        let service = CodeService::heuristic();
        assert!(!service.has_generator());

        let result = service
            .analyze("def add(a, b):\n    return a + b", AnswerLanguage::English)
            .await
            .unwrap();
        assert_eq!(result.language, "python");
        assert_eq!(result.line_explanations.len(), 2);

        assert!(matches!(
            service.complexity("   ").await,
            Err(ServiceError::EmptyCode)
        ));
    }
}
