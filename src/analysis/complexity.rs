//! Big-O estimation from textual patterns.
//!
//! Nothing here parses the source. Loop nesting is approximated by textual
//! adjacency (a loop keyword, a line break, indentation, another loop
//! keyword) and recursion by a declared function name reappearing as a call,
//! so the labels are estimates for typical code rather than proofs.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

use super::types::{ComplexityResult, SpaceComplexity, TimeComplexity};

lazy_static! {
    /// Triple-quoted blocks, then single/double-quoted literals.
    static ref STRING_LITERAL: Regex =
        Regex::new(r#""""[\s\S]*?"""|'''[\s\S]*?'''|"[^"]*"|'[^']*'"#).unwrap();

    static ref LOOP_KEYWORD: Regex = Regex::new(r"\bfor\b|\bwhile\b").unwrap();

    static ref NESTED_TWO: Regex =
        Regex::new(r"\b(for|while)\b[\s\S]*?\n[\t ]+.*\b(for|while)\b").unwrap();

    static ref NESTED_THREE: Regex =
        Regex::new(r"(\b(for|while)\b[\s\S]*?\n[\t ]+.*){2}\b(for|while)\b").unwrap();

    static ref SORT_CALL: Regex = Regex::new(r"\bsort(ed)?\s*\(").unwrap();

    /// Matched against the lowercased source.
    static ref COLLECTION_BUILD: Regex = Regex::new(
        r"\bappend\(|\bextend\(|\bpush\(|\bmap\(|\bfilter\(|\bnew\s+array\b|\[[^\]]*\]"
    ).unwrap();

    static ref PYTHON_DEF: Regex = Regex::new(r"\bdef\s+(\w+)\s*\(").unwrap();

    static ref JS_FUNCTION: Regex = Regex::new(r"\bfunction\s+(\w+)\s*\(").unwrap();

    static ref BRACE_FUNCTION: Regex = Regex::new(r"\b(\w+)\s*\([^;{)]*\)\s*\{").unwrap();

    static ref WORD: Regex = Regex::new(r"\w+").unwrap();

    /// A whole word followed by an opening parenthesis.
    static ref CALL: Regex = Regex::new(r"\b(\w+)\s*\(").unwrap();
}

/// Languages whose functions are recognised by `name(...) {`.
const BRACE_LANGUAGES: &[&str] = &[
    "c", "cpp", "java", "csharp", "go", "rust", "kotlin", "swift",
];

/// Words the brace pattern captures that never name a function.
const CONTROL_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "else", "return"];

pub const NOTE_SORTING: &str = "Detected sorting; typical time O(n log n)";
pub const NOTE_TRIPLE_NESTED: &str = "Detected triple-nested loops (heuristic)";
pub const NOTE_NESTED: &str = "Detected nested loops (heuristic)";
pub const NOTE_RECURSION: &str = "Detected possible recursion; assuming linear for typical cases";

/// Signals extracted from a snippet before labelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub loop_count: usize,
    pub nested_two: bool,
    pub nested_three: bool,
    pub recursive: bool,
    pub sorts: bool,
    pub builds_collection: bool,
}

/// Remove string literals so keywords inside them are not counted.
pub fn strip_string_literals(source: &str) -> String {
    STRING_LITERAL.replace_all(source, "").into_owned()
}

/// Declared function names in order of first appearance.
pub fn declared_functions(source: &str, language: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    if language == "python" {
        for cap in PYTHON_DEF.captures_iter(source) {
            push(&cap[1]);
        }
    }
    if matches!(language, "javascript" | "typescript") {
        for cap in JS_FUNCTION.captures_iter(source) {
            push(&cap[1]);
        }
    }
    if BRACE_LANGUAGES.contains(&language) {
        for cap in BRACE_FUNCTION.captures_iter(source) {
            if !CONTROL_KEYWORDS.contains(&&cap[1]) {
                push(&cap[1]);
            }
        }
    }

    names
}

/// Byte offset of each name's first occurrence in `source`, including
/// occurrences inside longer words.
///
/// Names are made of word characters, so every occurrence lies within one
/// `\w+` run. Each distinct run is checked once, at its first position.
fn first_occurrences<'a>(source: &str, names: &'a [String]) -> HashMap<&'a str, usize> {
    let mut pending: HashSet<&'a str> = names.iter().map(String::as_str).collect();
    let mut lengths: Vec<usize> = names.iter().map(String::len).collect();
    lengths.sort_unstable();
    lengths.dedup();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut first = HashMap::new();

    for word in WORD.find_iter(source) {
        if pending.is_empty() {
            break;
        }
        let text = word.as_str();
        if !seen.insert(text) {
            continue;
        }
        for (i, _) in text.char_indices() {
            for &len in &lengths {
                if i + len > text.len() {
                    break;
                }
                let Some(candidate) = text.get(i..i + len) else {
                    continue;
                };
                if let Some(name) = pending.take(candidate) {
                    first.insert(name, word.start() + i);
                }
            }
        }
    }

    first
}

/// Whether any declared name is called again after its first occurrence.
///
/// The first occurrence may sit inside a longer word (`f` in `def`), and a
/// call starting right where it ends counts (`ff(` for `f`). Repeated plain
/// calls are indistinguishable from self-calls here, and mutual recursion
/// goes unnoticed. Runs in one pass over the source.
pub fn detect_recursion(source: &str, language: &str) -> bool {
    let names = declared_functions(source, language);
    if names.is_empty() {
        return false;
    }
    let first = first_occurrences(source, &names);

    let adjacent = first.iter().any(|(name, &start)| {
        source[start + name.len()..]
            .strip_prefix(name)
            .map_or(false, |after| after.trim_start().starts_with('('))
    });

    adjacent
        || CALL.captures_iter(source).any(|cap| {
            let called = &cap[1];
            let at = cap.get(1).map_or(0, |m| m.start());
            first.get(called).map_or(false, |&start| at > start)
        })
}

/// Collect the estimation signals for `source`.
pub fn collect_signals(source: &str, language: &str) -> Signals {
    let normalized = strip_string_literals(source);
    let lower = normalized.to_lowercase();

    Signals {
        loop_count: LOOP_KEYWORD.find_iter(&lower).count(),
        nested_two: NESTED_TWO.is_match(&normalized),
        nested_three: NESTED_THREE.is_match(&normalized),
        recursive: detect_recursion(&normalized, language),
        sorts: SORT_CALL.is_match(&lower) || lower.contains(".sort("),
        builds_collection: COLLECTION_BUILD.is_match(&lower),
    }
}

/// Map signals to labels. Exactly one time rule applies, in priority order.
pub fn classify(signals: &Signals) -> ComplexityResult {
    let mut notes = Vec::new();

    let time = if signals.sorts {
        notes.push(NOTE_SORTING.to_string());
        TimeComplexity::Linearithmic
    } else if signals.nested_three {
        notes.push(NOTE_TRIPLE_NESTED.to_string());
        TimeComplexity::Cubic
    } else if signals.nested_two {
        notes.push(NOTE_NESTED.to_string());
        TimeComplexity::Quadratic
    } else if signals.loop_count >= 1 || signals.recursive {
        if signals.recursive {
            notes.push(NOTE_RECURSION.to_string());
        }
        TimeComplexity::Linear
    } else {
        TimeComplexity::Constant
    };

    let space = if signals.builds_collection {
        SpaceComplexity::Linear
    } else {
        SpaceComplexity::Constant
    };

    ComplexityResult { time, space, notes }
}

/// Estimate time and space complexity of `source`. Total on any input.
#[instrument(level = "trace", skip(source), fields(chars = source.len()))]
pub fn estimate(source: &str, language: &str) -> ComplexityResult {
    classify(&collect_signals(source, language))
}
