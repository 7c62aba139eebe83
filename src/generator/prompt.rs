//! Prompt construction and reply post-processing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::AnswerLanguage;

lazy_static! {
    /// First fenced block with an optional language tag; group 1 is the body.
    static ref FIRST_FENCE: Regex = Regex::new(r"```[a-zA-Z0-9_+\-]*\n([\s\S]*?)```").unwrap();

    static ref ANY_FENCE: Regex = Regex::new(r"```[\s\S]*?```").unwrap();
}

/// System message sent with every chat request.
pub const SYSTEM_PROMPT: &str = "You are a helpful code explanation assistant. \
Explain code clearly and simply for beginners. Also review the code and list likely bugs, \
errors, edge cases, and performance issues. Use HTML formatting with <h1> to <h6> tags and \
<b> tags. Include a <h2>Potential Issues / Bugs</h2> section if any.";

/// User message wrapping an operation prompt.
pub fn user_message(prompt: &str) -> String {
    format!(
        "Explain this code step by step in detail. Break down each part and explain what it does. \
Detect bugs and risks. Use HTML (<h1>-<h6>, <b>). Provide a <h2>Potential Issues / Bugs</h2> \
list if found.\n\nCode:\n```\n{}\n```",
        prompt
    )
}

fn explanation_instruction(answer: AnswerLanguage) -> &'static str {
    match answer {
        AnswerLanguage::English => "Write the explanation in clear, simple English.",
        AnswerLanguage::Hinglish => {
            "Write the explanation in Hinglish (mix Hindi + English), simple and friendly."
        }
    }
}

fn tips_instruction(answer: AnswerLanguage) -> &'static str {
    match answer {
        AnswerLanguage::English => "Write tips in clear, simple English.",
        AnswerLanguage::Hinglish => "Write tips in simple and friendly Hinglish.",
    }
}

/// Prompt asking for an explanation of `code`.
pub fn explanation_prompt(language: &str, answer: AnswerLanguage, code: &str) -> String {
    format!(
        "Analyze this {} code and provide a detailed explanation. {} \
Use HTML headings (<h1>-<h6>) and <b> for emphasis.\n\nCode:\n{}",
        language,
        explanation_instruction(answer),
        code
    )
}

/// Prompt asking for tips followed by one fenced, improved version of `code`.
pub fn improvement_prompt(language: &str, answer: AnswerLanguage, code: &str) -> String {
    let label = if language.is_empty() { "code" } else { language };
    format!(
        "Improve the following {} for readability, performance, and best practices. \
{} Keep functionality identical.\n\
Return concise bullet tips first, then the improved code in a fenced block with the correct \
language tag.\n\nCode:\n```{}\n{}\n```",
        label,
        tips_instruction(answer),
        language,
        code
    )
}

/// Body of the first fenced code block, trimmed.
pub fn extract_fenced_code(reply: &str) -> Option<String> {
    FIRST_FENCE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|body| body.as_str().trim().to_string())
}

/// `reply` with every fenced block removed, trimmed.
pub fn strip_fenced_blocks(reply: &str) -> String {
    ANY_FENCE.replace_all(reply, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explanation_prompt_carries_language_and_code() {
        let prompt = explanation_prompt("python", AnswerLanguage::Hinglish, "x = 1");
        assert!(prompt.starts_with("Analyze this python code"));
        assert!(prompt.contains("Hinglish (mix Hindi + English)"));
        assert!(prompt.ends_with("Code:\nx = 1"));

        let prompt = explanation_prompt("go", AnswerLanguage::English, "package main");
        assert!(prompt.contains("clear, simple English"));
    }

    #[test]
    fn test_improvement_prompt_fences_code() {
        let prompt = improvement_prompt("javascript", AnswerLanguage::English, "var x = 1;");
        assert!(prompt.contains("Improve the following javascript"));
        assert!(prompt.contains("Keep functionality identical."));
        assert!(prompt.ends_with("```javascript\nvar x = 1;\n```"));
    }

    #[test]
    fn test_user_message_fences_prompt() {
        let message = user_message("Analyze this python code");
        assert!(message.starts_with("Explain this code step by step in detail."));
        assert!(message.contains("Detect bugs and risks."));
        assert!(message.contains("<h2>Potential Issues / Bugs</h2>"));
        assert!(message.ends_with("\n\nCode:\n```\nAnalyze this python code\n```"));
    }

    #[test]
    fn test_extract_first_block() {
        let reply = "- use let\n```js\nlet x = 1;\n```\nmore\n```\nsecond\n```";
        assert_eq!(extract_fenced_code(reply).as_deref(), Some("let x = 1;"));
        assert_eq!(strip_fenced_blocks(reply), "- use let\n\nmore");
    }

    #[test]
    fn test_reply_without_fence() {
        assert_eq!(extract_fenced_code("just tips"), None);
        assert_eq!(strip_fenced_blocks("  just tips \n"), "just tips");
    }

    #[test]
    fn test_fence_tag_with_symbols() {
        let reply = "```c++\nint x;\n```";
        assert_eq!(extract_fenced_code(reply).as_deref(), Some("int x;"));
        assert_eq!(strip_fenced_blocks(reply), "");
    }
}
