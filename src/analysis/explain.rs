//! Line-by-line explanations.
//!
//! Python and JavaScript lines are classified by an ordered rule list: the
//! first rule whose matcher accepts a line decides its gloss. A rule that
//! matches but cannot extract the name it needs yields no gloss, and the
//! line is left out. Every other language gets the generic explainer, which
//! glosses each statement uniformly and collects potential issues instead.

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;

use super::types::{AnalysisResult, LineExplanation};

/// Comment prefixes for the languages with dedicated rule lists.
static COMMENT_PREFIX: phf::Map<&'static str, &'static str> = phf_map! {
    "python" => "#",
    "javascript" => "//",
};

/// Languages with a dedicated line rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Python,
    JavaScript,
}

impl Dialect {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "python" => Some(Dialect::Python),
            "javascript" => Some(Dialect::JavaScript),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dialect::Python => "python",
            Dialect::JavaScript => "javascript",
        }
    }

    fn comment_prefix(&self) -> &'static str {
        COMMENT_PREFIX.get(self.label()).copied().unwrap_or("#")
    }

    fn rules(&self) -> &'static [LineRule] {
        match self {
            Dialect::Python => PYTHON_RULES,
            Dialect::JavaScript => JAVASCRIPT_RULES,
        }
    }

    fn overview_rules(&self) -> &'static [(&'static [&'static str], &'static str)] {
        match self {
            Dialect::Python => PYTHON_OVERVIEW,
            Dialect::JavaScript => JAVASCRIPT_OVERVIEW,
        }
    }

    fn default_overview(&self) -> &'static str {
        match self {
            Dialect::Python => "This Python code performs a series of operations and calculations.",
            Dialect::JavaScript => {
                "This JavaScript code performs a series of operations and calculations."
            }
        }
    }
}

/// Decides whether a rule applies to a trimmed line.
enum Matcher {
    Prefix(&'static str),
    AnyPrefix(&'static [&'static str]),
    Contains(&'static str),
    Pattern(&'static Lazy<Regex>),
    Assignment,
    Always,
}

impl Matcher {
    fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Prefix(p) => line.starts_with(p),
            Matcher::AnyPrefix(ps) => ps.iter().any(|p| line.starts_with(p)),
            Matcher::Contains(needle) => line.contains(needle),
            Matcher::Pattern(re) => re.is_match(line),
            Matcher::Assignment => is_plain_assignment(line),
            Matcher::Always => true,
        }
    }
}

/// Produces the gloss once a rule matched.
enum Gloss {
    Fixed(&'static str),
    /// Template with one `{}` filled from capture group 1.
    Named {
        pattern: &'static Lazy<Regex>,
        template: &'static str,
    },
    AssignedName,
}

impl Gloss {
    fn render(&self, line: &str) -> Option<String> {
        match self {
            Gloss::Fixed(text) => Some((*text).to_string()),
            Gloss::Named { pattern, template } => pattern
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|name| template.replace("{}", name.as_str())),
            Gloss::AssignedName => {
                let name = line.split('=').next().unwrap_or("").trim();
                Some(format!("Assigns a value to variable '{}'", name))
            }
        }
    }
}

struct LineRule {
    matcher: Matcher,
    gloss: Gloss,
}

static PY_DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"def\s+(\w+)").unwrap());
static PY_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"class\s+(\w+)").unwrap());
static JS_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"function\s+(\w+)").unwrap());
static JS_CONST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^const\s+(\w+)\s*=").unwrap());
static JS_LET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^let\s+(\w+)\s*=").unwrap());
static JS_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^var\s+(\w+)\s*=").unwrap());

const IF_NOTE: &str = "Conditional statement - executes code if condition is true";
const ELIF_NOTE: &str = "Alternative condition - checks this if previous conditions were false";
const ELSE_NOTE: &str = "Default case - executes if all previous conditions were false";
const WHILE_NOTE: &str = "Loop statement - repeats code while condition is true";
const RETURN_NOTE: &str = "Returns a value from the function";
const STATEMENT_NOTE: &str = "Executes a statement or expression";

static PYTHON_RULES: &[LineRule] = &[
    LineRule {
        matcher: Matcher::Prefix("def "),
        gloss: Gloss::Named {
            pattern: &PY_DEF,
            template: "Defines a function named '{}'",
        },
    },
    LineRule {
        matcher: Matcher::Prefix("class "),
        gloss: Gloss::Named {
            pattern: &PY_CLASS,
            template: "Defines a class named '{}'",
        },
    },
    LineRule {
        matcher: Matcher::AnyPrefix(&["import ", "from "]),
        gloss: Gloss::Fixed("Imports external libraries or modules"),
    },
    LineRule {
        matcher: Matcher::Prefix("if "),
        gloss: Gloss::Fixed(IF_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("elif "),
        gloss: Gloss::Fixed(ELIF_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("else:"),
        gloss: Gloss::Fixed(ELSE_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("for "),
        gloss: Gloss::Fixed("Loop statement - repeats code for each item in a sequence"),
    },
    LineRule {
        matcher: Matcher::Prefix("while "),
        gloss: Gloss::Fixed(WHILE_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("return "),
        gloss: Gloss::Fixed(RETURN_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("print("),
        gloss: Gloss::Fixed("Outputs text or values to the console"),
    },
    LineRule {
        matcher: Matcher::Assignment,
        gloss: Gloss::AssignedName,
    },
    LineRule {
        matcher: Matcher::Always,
        gloss: Gloss::Fixed(STATEMENT_NOTE),
    },
];

static JAVASCRIPT_RULES: &[LineRule] = &[
    LineRule {
        matcher: Matcher::Prefix("function "),
        gloss: Gloss::Named {
            pattern: &JS_FUNCTION,
            template: "Defines a function named '{}'",
        },
    },
    LineRule {
        matcher: Matcher::Pattern(&JS_CONST),
        gloss: Gloss::Named {
            pattern: &JS_CONST,
            template: "Declares a constant variable '{}'",
        },
    },
    LineRule {
        matcher: Matcher::Pattern(&JS_LET),
        gloss: Gloss::Named {
            pattern: &JS_LET,
            template: "Declares a block-scoped variable '{}'",
        },
    },
    LineRule {
        matcher: Matcher::Pattern(&JS_VAR),
        gloss: Gloss::Named {
            pattern: &JS_VAR,
            template: "Declares a variable '{}'",
        },
    },
    LineRule {
        matcher: Matcher::Prefix("if "),
        gloss: Gloss::Fixed(IF_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("else if "),
        gloss: Gloss::Fixed(ELIF_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("else"),
        gloss: Gloss::Fixed(ELSE_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("for "),
        gloss: Gloss::Fixed("Loop statement - repeats code for each iteration"),
    },
    LineRule {
        matcher: Matcher::Prefix("while "),
        gloss: Gloss::Fixed(WHILE_NOTE),
    },
    LineRule {
        matcher: Matcher::Prefix("return "),
        gloss: Gloss::Fixed(RETURN_NOTE),
    },
    LineRule {
        matcher: Matcher::Contains("console.log("),
        gloss: Gloss::Fixed("Outputs text or values to the browser console"),
    },
    LineRule {
        matcher: Matcher::Contains("=>"),
        gloss: Gloss::Fixed("Arrow function - a concise way to write functions"),
    },
    LineRule {
        matcher: Matcher::Always,
        gloss: Gloss::Fixed(STATEMENT_NOTE),
    },
];

static PYTHON_OVERVIEW: &[(&[&str], &str)] = &[
    (
        &["def "],
        "This Python code defines one or more functions with specific functionality.",
    ),
    (
        &["class "],
        "This Python code defines a class with methods and properties.",
    ),
    (
        &["for ", "while "],
        "This Python code contains loops to repeat operations.",
    ),
];

static JAVASCRIPT_OVERVIEW: &[(&[&str], &str)] = &[
    (
        &["function ", "=>"],
        "This JavaScript code defines one or more functions with specific functionality.",
    ),
    (
        &["document."],
        "This JavaScript code manipulates HTML elements on a web page.",
    ),
    (
        &["async", "await"],
        "This JavaScript code handles asynchronous operations.",
    ),
];

/// `=` present and no comparison operator containing it.
fn is_plain_assignment(line: &str) -> bool {
    line.contains('=') && !["==", "!=", "<=", ">="].iter().any(|op| line.contains(op))
}

/// Gloss a single trimmed line, or `None` if the deciding rule cannot name it.
pub fn explain_line(line: &str, dialect: Dialect) -> Option<String> {
    let line = line.trim();
    dialect
        .rules()
        .iter()
        .find(|rule| rule.matcher.matches(line))
        .and_then(|rule| rule.gloss.render(line))
}

/// Gloss every non-blank, non-comment line of `source`.
pub fn explain_lines(source: &str, dialect: Dialect) -> Vec<LineExplanation> {
    let prefix = dialect.comment_prefix();

    source
        .split('\n')
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(prefix) {
                return None;
            }
            explain_line(line, dialect).map(|explanation| LineExplanation {
                line_number: idx + 1,
                code: line.to_string(),
                explanation,
            })
        })
        .collect()
}

/// One-sentence summary chosen by whole-source substrings.
pub fn overview(source: &str, dialect: Dialect) -> &'static str {
    dialect
        .overview_rules()
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| source.contains(n)))
        .map(|(_, sentence)| *sentence)
        .unwrap_or_else(|| dialect.default_overview())
}

/// Heuristic explanation for a Python or JavaScript snippet.
pub fn explain_dialect(source: &str, dialect: Dialect) -> AnalysisResult {
    AnalysisResult {
        language: dialect.label().to_string(),
        overall_explanation: overview(source, dialect).to_string(),
        line_explanations: explain_lines(source, dialect),
        potential_issues: Vec::new(),
    }
}

/// Lines of `source` that carry code under any common comment convention.
///
/// Yields `(line_number, trimmed_line)`.
pub fn code_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source.split('\n').enumerate().filter_map(|(idx, raw)| {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            None
        } else {
            Some((idx + 1, line))
        }
    })
}

/// Per-line issue checks for the generic explainer.
fn line_issues(line_number: usize, line: &str, language: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if line.contains("TODO") || line.contains("FIXME") {
        issues.push(format!(
            "Line {}: Contains TODO/FIXME; might be incomplete work.",
            line_number
        ));
    }
    if matches!(language, "c" | "cpp") && line.contains("gets(") {
        issues.push(format!(
            "Line {}: uses gets(), which is unsafe; prefer fgets().",
            line_number
        ));
    }
    if language == "python" && line.contains("eval(") {
        issues.push(format!(
            "Line {}: uses eval(); security risk if inputs are untrusted.",
            line_number
        ));
    }
    if language == "javascript" && line.contains("innerHTML") && line.contains('=') {
        issues.push(format!(
            "Line {}: assigning to innerHTML may cause XSS if input is untrusted.",
            line_number
        ));
    }

    issues
}

/// Heuristic explanation for languages without a dedicated rule list.
pub fn explain_generic(source: &str, language: &str) -> AnalysisResult {
    let mut line_explanations = Vec::new();
    let mut potential_issues = Vec::new();

    for (line_number, line) in code_lines(source) {
        line_explanations.push(LineExplanation {
            line_number,
            code: line.to_string(),
            explanation: "Code statement".to_string(),
        });
        potential_issues.extend(line_issues(line_number, line, language));
    }

    AnalysisResult {
        language: language.to_string(),
        overall_explanation: format!("This {} code performs a series of operations.", language),
        line_explanations,
        potential_issues,
    }
}

/// Heuristic explanation for any detected language.
pub fn explain(source: &str, language: &str) -> AnalysisResult {
    match Dialect::from_label(language) {
        Some(dialect) => explain_dialect(source, dialect),
        None => explain_generic(source, language),
    }
}
