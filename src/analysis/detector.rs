//! Heuristic language detection.
//!
//! Every language owns a signature: an ordered list of regular expressions.
//! A source scores one point per signature pattern that matches anywhere in
//! it. The highest score wins; ties go to the language registered first, so
//! the table below is an ordered slice and never a map.

use regex::{Regex, RegexBuilder};

use super::types::UNKNOWN_LANGUAGE;

/// Signature patterns in registration (tie-break) order.
const SIGNATURES: &[(&str, &[&str])] = &[
    (
        "python",
        &[
            r"def\s+\w+\s*\(",
            r"import\s+\w+",
            r"from\s+\w+\s+import",
            r#"if\s+__name__\s*==\s*["']__main__["']"#,
            r"print\s*\(",
        ],
    ),
    (
        "javascript",
        &[
            r"function\s+\w+\s*\(",
            r"const\s+\w+\s*=",
            r"let\s+\w+\s*=",
            r"var\s+\w+\s*=",
            r"console\.log\s*\(",
            r"=>\s*\{",
        ],
    ),
    (
        "typescript",
        &[
            r"interface\s+\w+",
            r"type\s+\w+\s*=",
            r"\w+<\w+>",
            r":\s*\w+",
            r"private\s+\w+",
            r"public\s+\w+",
        ],
    ),
    (
        "java",
        &[
            r"public\s+(class|static|void)",
            r"package\s+[\w\.]+;",
            r"import\s+[\w\.\*]+;",
            r"new\s+\w+\s*\(",
        ],
    ),
    (
        "csharp",
        &[
            r"using\s+\w+(\.\w+)*;",
            r"namespace\s+\w+",
            r"class\s+\w+\s*\{",
            r"public\s+(class|static|void)",
        ],
    ),
    (
        "cpp",
        &[
            r"#include\s+<\w+\.h?>",
            r"std::\w+",
            r"int\s+main\s*\(",
            r"cout\s*<<",
        ],
    ),
    (
        "c",
        &[r"#include\s+<\w+\.h>", r"int\s+main\s*\(", r"printf\s*\("],
    ),
    (
        "go",
        &[
            r"package\s+\w+",
            r"func\s+\w+\s*\(",
            r"import\s*\(",
            r"fmt\.Print",
        ],
    ),
    (
        "ruby",
        &[r"def\s+\w+", r"end\s*$", r#"puts\s+""#, r"module\s+\w+"],
    ),
    (
        "php",
        &[
            r"<\?php",
            r"echo\s+\$\w+",
            r"function\s+\w+\s*\(",
            r"\$\w+\s*=",
        ],
    ),
    (
        "rust",
        &[
            r"fn\s+\w+\s*\(",
            r"let\s+mut\s+\w+",
            r"println!\s*!?\s*\(",
            r"pub\s+\w+",
        ],
    ),
    (
        "kotlin",
        &[
            r"fun\s+\w+\s*\(",
            r"val\s+\w+\s*:",
            r"var\s+\w+\s*:",
            r"data\s+class\s+\w+",
        ],
    ),
    (
        "swift",
        &[
            r"func\s+\w+\s*\(",
            r"let\s+\w+\s*=",
            r"var\s+\w+\s*=",
            r"import\s+\w+",
        ],
    ),
    (
        "sql",
        &[
            r"SELECT\s+\*?\s*FROM",
            r"INSERT\s+INTO",
            r"UPDATE\s+\w+\s+SET",
            r"DELETE\s+FROM",
        ],
    ),
    (
        "bash",
        &[
            r"^#!/bin/bash",
            r"\becho\b",
            r"\bif\s+\[",
            r"\bfor\s+\w+\s+in\b",
        ],
    ),
    (
        "html",
        &[r"<html", r"<div", r"<span", r"<script", r"<!DOCTYPE"],
    ),
    (
        "css",
        &[
            r"\.[\w-]+\s*\{",
            r"#[\w-]+\s*\{",
            r"@media\s+",
            r"@keyframes\s+",
        ],
    ),
];

/// A compiled language signature.
pub struct LanguageSignature {
    pub language: &'static str,
    pub patterns: Vec<Regex>,
}

impl LanguageSignature {
    /// Number of signature patterns found anywhere in `source`.
    pub fn score(&self, source: &str) -> usize {
        self.patterns.iter().filter(|p| p.is_match(source)).count()
    }
}

lazy_static::lazy_static! {
    /// Compiled signatures, case-insensitive and multi-line, in table order.
    static ref COMPILED: Vec<LanguageSignature> = SIGNATURES
        .iter()
        .map(|(language, patterns)| LanguageSignature {
            language,
            patterns: patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .multi_line(true)
                        .build()
                        .unwrap()
                })
                .collect(),
        })
        .collect();
}

/// All signatures in tie-break order.
pub fn signatures() -> &'static [LanguageSignature] {
    &COMPILED
}

/// Language labels in tie-break order.
pub fn known_languages() -> Vec<&'static str> {
    SIGNATURES.iter().map(|(language, _)| *language).collect()
}

/// Whether `label` is a signature key or the unknown sentinel.
pub fn is_known_label(label: &str) -> bool {
    label == UNKNOWN_LANGUAGE || SIGNATURES.iter().any(|(language, _)| *language == label)
}

/// Detect the language of `source`.
///
/// Returns `"unknown"` when no pattern of any language matches.
pub fn detect(source: &str) -> &'static str {
    let source = source.trim();
    let mut best = UNKNOWN_LANGUAGE;
    let mut best_score = 0;

    for signature in signatures() {
        let score = signature.score(source);
        if score > best_score {
            best = signature.language;
            best_score = score;
        }
    }

    best
}
