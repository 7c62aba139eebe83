//! Heuristic improvement tips.
//!
//! Unlike the line explainers, every applicable rule fires; the tips are
//! concatenated in table order.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::ImprovementResult;

static VAR_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvar\s+").unwrap());

pub const TIP_LOGGING: &str = "Use the logging module instead of print() for production code.";
pub const TIP_FSTRINGS: &str = "Prefer f-strings for string formatting (Python 3.6+).";
pub const TIP_LET_CONST: &str = "Prefer let/const over var.";
pub const TIP_STRICT_EQUALITY: &str = "Use strict equality (===) when appropriate.";
pub const TIP_BOUNDS: &str = "Avoid gets(), prefer fgets(); check all return values.";
pub const TIP_GENERIC: &str = "Apply consistent formatting and naming conventions.";

/// A tip with the languages it applies to and its trigger.
struct TipRule {
    languages: &'static [&'static str],
    applies: fn(&str) -> bool,
    tip: &'static str,
}

fn prints_without_logging(code: &str) -> bool {
    code.contains("print(") && !code.contains("logging")
}

fn concatenates_strings(code: &str) -> bool {
    code.contains(" + ") && (code.contains('"') || code.contains('\''))
}

fn uses_var(code: &str) -> bool {
    VAR_KEYWORD.is_match(code)
}

fn uses_loose_equality(code: &str) -> bool {
    code.contains("==") && !code.contains("===")
}

fn always(_: &str) -> bool {
    true
}

static RULES: &[TipRule] = &[
    TipRule {
        languages: &["python"],
        applies: prints_without_logging,
        tip: TIP_LOGGING,
    },
    TipRule {
        languages: &["python"],
        applies: concatenates_strings,
        tip: TIP_FSTRINGS,
    },
    TipRule {
        languages: &["javascript", "typescript"],
        applies: uses_var,
        tip: TIP_LET_CONST,
    },
    TipRule {
        languages: &["javascript", "typescript"],
        applies: uses_loose_equality,
        tip: TIP_STRICT_EQUALITY,
    },
    TipRule {
        languages: &["c", "cpp"],
        applies: always,
        tip: TIP_BOUNDS,
    },
];

/// Tips whose rule applies to `code` in `language`, in table order.
pub fn tips_for(code: &str, language: &str) -> Vec<&'static str> {
    let tips: Vec<&'static str> = RULES
        .iter()
        .filter(|rule| rule.languages.contains(&language) && (rule.applies)(code))
        .map(|rule| rule.tip)
        .collect();

    if tips.is_empty() {
        vec![TIP_GENERIC]
    } else {
        tips
    }
}

/// Render tips as a leading-newline bullet list.
pub fn format_tips(tips: &[&str]) -> String {
    format!("\n- {}", tips.join("\n- "))
}

/// Heuristic improvement: tips only, code passed through unchanged.
pub fn improve(code: &str, language: &str) -> ImprovementResult {
    ImprovementResult {
        language: language.to_string(),
        improved_code: code.to_string(),
        tips: format_tips(&tips_for(code, language)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_suggests_let_const() {
        let result = improve("var x = 1;", "javascript");
        assert!(result.tips.contains(TIP_LET_CONST));
        assert_eq!(result.improved_code, "var x = 1;");
        assert_eq!(result.language, "javascript");
    }

    #[test]
    fn test_all_applicable_rules_fire() {
        let code = "var x = 1;\nif (x == 1) { x = 2; }";
        assert_eq!(
            tips_for(code, "typescript"),
            vec![TIP_LET_CONST, TIP_STRICT_EQUALITY]
        );
    }

    #[test]
    fn test_strict_equality_suppresses_tip() {
        assert_eq!(tips_for("if (a === b) {}", "javascript"), vec![TIP_GENERIC]);
    }

    #[test]
    fn test_python_rules() {
        let code = "name = 'x'\nprint('hi ' + name)";
        assert_eq!(tips_for(code, "python"), vec![TIP_LOGGING, TIP_FSTRINGS]);

        let code = "import logging\nprint(1)";
        assert_eq!(tips_for(code, "python"), vec![TIP_GENERIC]);
    }

    #[test]
    fn test_c_always_gets_bounds_tip() {
        assert_eq!(tips_for("int main() { return 0; }", "cpp"), vec![TIP_BOUNDS]);
    }

    #[test]
    fn test_rules_are_language_scoped() {
        // var in python source is not a javascript concern
        assert_eq!(tips_for("var = 1", "python"), vec![TIP_GENERIC]);
        assert_eq!(tips_for("anything", "unknown"), vec![TIP_GENERIC]);
    }

    #[test]
    fn test_tip_formatting() {
        assert_eq!(format_tips(&["a", "b"]), "\n- a\n- b");
        assert_eq!(improve("x", "go").tips, format!("\n- {}", TIP_GENERIC));
    }
}
