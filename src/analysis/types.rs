//! Core types for analysis results.

use serde::{Deserialize, Serialize};

/// Sentinel label for sources no signature matched.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Big-O labels for estimated running time, ordered by growth.
///
/// `Unknown` sorts last so that it never passes a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeComplexity {
    #[serde(rename = "O(1)")]
    Constant,
    #[serde(rename = "O(n)")]
    Linear,
    #[serde(rename = "O(n log n)")]
    Linearithmic,
    #[serde(rename = "O(n^2)")]
    Quadratic,
    #[serde(rename = "O(n^3)")]
    Cubic,
    #[serde(rename = "O(?)")]
    Unknown,
}

impl TimeComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeComplexity::Constant => "O(1)",
            TimeComplexity::Linear => "O(n)",
            TimeComplexity::Linearithmic => "O(n log n)",
            TimeComplexity::Quadratic => "O(n^2)",
            TimeComplexity::Cubic => "O(n^3)",
            TimeComplexity::Unknown => "O(?)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_lowercase().as_str() {
            "o(1)" | "constant" => Some(TimeComplexity::Constant),
            "o(n)" | "linear" => Some(TimeComplexity::Linear),
            "o(n log n)" | "linearithmic" => Some(TimeComplexity::Linearithmic),
            "o(n^2)" | "quadratic" => Some(TimeComplexity::Quadratic),
            "o(n^3)" | "cubic" => Some(TimeComplexity::Cubic),
            "o(?)" | "unknown" => Some(TimeComplexity::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimeComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeComplexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown complexity label: {}", s))
    }
}

/// Big-O labels for estimated auxiliary space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpaceComplexity {
    #[serde(rename = "O(1)")]
    Constant,
    #[serde(rename = "O(n)")]
    Linear,
    #[serde(rename = "O(?)")]
    Unknown,
}

impl SpaceComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceComplexity::Constant => "O(1)",
            SpaceComplexity::Linear => "O(n)",
            SpaceComplexity::Unknown => "O(?)",
        }
    }
}

impl std::fmt::Display for SpaceComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A gloss for one source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineExplanation {
    /// 1-based position in the submitted source
    pub line_number: usize,
    pub code: String,
    pub explanation: String,
}

/// Explanation of a whole snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub language: String,
    pub overall_explanation: String,
    pub line_explanations: Vec<LineExplanation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub potential_issues: Vec<String>,
}

/// Estimated time and space bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityResult {
    pub time: TimeComplexity,
    pub space: SpaceComplexity,
    pub notes: Vec<String>,
}

/// Complexity estimate tagged with the detected language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub language: String,
    #[serde(flatten)]
    pub result: ComplexityResult,
}

/// Suggested improvements for a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementResult {
    pub language: String,
    pub improved_code: String,
    pub tips: String,
}

/// Language requested for natural-language answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerLanguage {
    #[default]
    English,
    Hinglish,
}

impl AnswerLanguage {
    /// Lenient parse: anything unrecognised falls back to English.
    pub fn from_request(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("hinglish") => AnswerLanguage::Hinglish,
            _ => AnswerLanguage::English,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerLanguage::English => "english",
            AnswerLanguage::Hinglish => "hinglish",
        }
    }
}

impl std::fmt::Display for AnswerLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_labels_serialize_as_big_o() {
        let json = serde_json::to_string(&TimeComplexity::Linearithmic).unwrap();
        assert_eq!(json, "\"O(n log n)\"");
        let parsed: TimeComplexity = serde_json::from_str("\"O(n^2)\"").unwrap();
        assert_eq!(parsed, TimeComplexity::Quadratic);
    }

    #[test]
    fn test_time_ordering() {
        assert!(TimeComplexity::Constant < TimeComplexity::Linear);
        assert!(TimeComplexity::Linearithmic < TimeComplexity::Quadratic);
        assert!(TimeComplexity::Cubic < TimeComplexity::Unknown);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(TimeComplexity::parse("O(n log n)"), Some(TimeComplexity::Linearithmic));
        assert_eq!(TimeComplexity::parse("o(N^2)"), Some(TimeComplexity::Quadratic));
        assert_eq!(TimeComplexity::parse("linear"), Some(TimeComplexity::Linear));
        assert_eq!(TimeComplexity::parse("O(2^n)"), None);
    }

    #[test]
    fn test_potential_issues_omitted_when_empty() {
        let result = AnalysisResult {
            language: "python".to_string(),
            overall_explanation: "x".to_string(),
            line_explanations: vec![],
            potential_issues: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("potential_issues").is_none());
    }

    #[test]
    fn test_complexity_report_is_flat() {
        let report = ComplexityReport {
            language: "python".to_string(),
            result: ComplexityResult {
                time: TimeComplexity::Unknown,
                space: SpaceComplexity::Unknown,
                notes: vec!["estimate unavailable".to_string()],
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["language"], "python");
        assert_eq!(json["time"], "O(?)");
        assert_eq!(json["space"], "O(?)");
        assert_eq!(json["notes"][0], "estimate unavailable");
    }

    #[test]
    fn test_answer_language_is_lenient() {
        assert_eq!(AnswerLanguage::from_request(None), AnswerLanguage::English);
        assert_eq!(AnswerLanguage::from_request(Some(" HINGLISH ")), AnswerLanguage::Hinglish);
        assert_eq!(AnswerLanguage::from_request(Some("french")), AnswerLanguage::English);
    }
}
