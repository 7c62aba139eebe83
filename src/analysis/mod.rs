//! Heuristic code analysis.
//!
//! Everything here works on raw text: language detection by signature
//! scoring, per-line glosses for Python and JavaScript, Big-O estimation
//! from loop and call patterns, and rule-based improvement tips. No source
//! is ever parsed into a tree.
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌────────────────┐
//! │ Snippet  │────▶│ detector │────▶│ language label │
//! └──────────┘     └──────────┘     └────────────────┘
//!                                           │
//!                 ┌─────────────────────────┼──────────────────┐
//!                 ▼                         ▼                  ▼
//!           ┌──────────┐            ┌────────────┐      ┌──────────┐
//!           │ explain  │            │ complexity │      │ improve  │
//!           └──────────┘            └────────────┘      └──────────┘
//! ```
//!
//! All functions are total: they never fail on arbitrary input.

pub mod complexity;
pub mod detector;
pub mod explain;
pub mod improve;
pub mod types;

pub use complexity::estimate;
pub use detector::{detect, known_languages, LanguageSignature};
pub use explain::{explain, explain_generic, explain_lines, Dialect};
pub use improve::improve;
pub use types::{
    AnalysisResult, AnswerLanguage, ComplexityReport, ComplexityResult, ImprovementResult,
    LineExplanation, SpaceComplexity, TimeComplexity, UNKNOWN_LANGUAGE,
};

/// Detect the language and estimate complexity in one step.
pub fn complexity_report(source: &str) -> ComplexityReport {
    let language = detect(source);
    ComplexityReport {
        language: language.to_string(),
        result: estimate(source, language),
    }
}
