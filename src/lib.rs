//! codexplain - heuristic code explanation service.
//!
//! Submit a source snippet and get back its language, a line-by-line
//! explanation, a Big-O estimate, and improvement tips. Everything is derived
//! from textual patterns; nothing is parsed or executed. An optional
//! chat-completions model can supply richer explanations, with the
//! heuristics as the fallback.
//!
//! # Architecture
//!
//! - `analysis`: language detection, line explainers, complexity estimator,
//!   improvement advisor
//! - `generator`: the optional model behind a narrow trait
//! - `service`: validates input and picks model or heuristics per request
//! - `server`: actix-web routes
//! - `scan`: parallel complexity scan of a directory tree
//! - `config`, `cli`, `report`: YAML settings, commands, output formatting

pub mod analysis;
pub mod cli;
pub mod config;
pub mod generator;
pub mod report;
pub mod scan;
pub mod server;
pub mod service;

pub use analysis::{
    AnalysisResult, AnswerLanguage, ComplexityReport, ComplexityResult, ImprovementResult,
    LineExplanation, SpaceComplexity, TimeComplexity,
};
pub use config::Config;
pub use generator::{ChatClient, Generator, GeneratorError};
pub use service::{CodeService, Operation, ServiceError};
