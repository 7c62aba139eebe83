//! Output formatting for CLI results.
//!
//! Two formats:
//! - Pretty: colored terminal output for reading
//! - JSON: the same payloads the HTTP endpoints return

use colored::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    AnalysisResult, ComplexityReport, ImprovementResult, SpaceComplexity, TimeComplexity,
};
use crate::scan::ScanEntry;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref BLANK_RUN: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pretty" => Some(Format::Pretty),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Render HTML-flavoured explanation text for a terminal.
///
/// Block-level tags become line breaks; every other tag is dropped.
pub fn html_to_text(html: &str) -> String {
    let spaced = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<li>", "\n  - ");
    let with_breaks = ["</h1>", "</h2>", "</h3>", "</h4>", "</h5>", "</h6>", "</p>", "</ul>"]
        .iter()
        .fold(spaced, |text, tag| text.replace(tag, "\n"));
    let stripped = HTML_TAG.replace_all(&with_breaks, "");
    BLANK_RUN.replace_all(stripped.trim(), "\n\n").into_owned()
}

// =============================================================================
// JSON Format
// =============================================================================

/// Write any result as pretty-printed JSON on stdout.
pub fn write_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// JSON document produced by `scan`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanReport {
    pub version: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<TimeComplexity>,
    pub passed: bool,
    pub files_scanned: usize,
    pub files: Vec<ScanEntry>,
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header(source: &str, language: &str) {
    println!();
    print!("  ");
    print!("{}", "codexplain".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Source:   ".dimmed());
    println!("{}", source);
    print!("  {}", "Language: ".dimmed());
    println!("{}", language.bold());
    println!();
}

/// Color `text` by the growth of `label`.
fn paint_time(text: &str, label: TimeComplexity) -> ColoredString {
    match label {
        TimeComplexity::Constant => text.green().bold(),
        TimeComplexity::Linear => text.green(),
        TimeComplexity::Linearithmic => text.yellow(),
        TimeComplexity::Quadratic => text.yellow().bold(),
        TimeComplexity::Cubic | TimeComplexity::Unknown => text.red(),
    }
}

fn colored_space(label: SpaceComplexity) -> ColoredString {
    match label {
        SpaceComplexity::Constant => label.as_str().green(),
        SpaceComplexity::Linear => label.as_str().yellow(),
        SpaceComplexity::Unknown => label.as_str().red(),
    }
}

/// Write an explanation in pretty format.
pub fn write_analysis_pretty(source: &str, result: &AnalysisResult) {
    write_header(source, &result.language);

    println!("  {}", "Overview:".bold());
    for line in html_to_text(&result.overall_explanation).lines() {
        println!("    {}", line);
    }
    println!();

    let glossed: Vec<_> = result
        .line_explanations
        .iter()
        .filter(|l| !l.explanation.is_empty())
        .collect();
    if !glossed.is_empty() {
        println!("  {} ({}):", "Lines".bold(), glossed.len());
        println!();
        for l in glossed {
            print!("    {}", format!("{:>4}", l.line_number).dimmed());
            println!("  {}", l.code.blue());
            println!("          {}", l.explanation);
        }
        println!();
    }

    if !result.potential_issues.is_empty() {
        println!(
            "  {} ({}):",
            "Potential issues".bold(),
            result.potential_issues.len()
        );
        for issue in &result.potential_issues {
            println!("    {} {}", "WARN".yellow(), issue);
        }
        println!();
    }
}

/// Write a complexity estimate in pretty format.
pub fn write_complexity_pretty(source: &str, report: &ComplexityReport) {
    write_header(source, &report.language);

    print!("  Time: ");
    print!("{}", paint_time(report.result.time.as_str(), report.result.time));
    print!("  Space: ");
    println!("{}", colored_space(report.result.space));

    if !report.result.notes.is_empty() {
        println!();
        for note in &report.result.notes {
            println!("    {}", note.dimmed());
        }
    }
    println!();
}

/// Write improvement tips and code in pretty format.
pub fn write_improvement_pretty(source: &str, result: &ImprovementResult) {
    write_header(source, &result.language);

    println!("  {}", "Tips:".bold());
    for line in result.tips.trim().lines() {
        println!("    {}", line);
    }
    println!();

    println!("  {}", "Code:".bold());
    println!();
    for line in result.improved_code.lines() {
        println!("    {}", line);
    }
    println!();
}

/// Write a scan table in pretty format.
pub fn write_scan_pretty(report: &ScanReport) {
    println!();
    print!("  ");
    print!("{}", "codexplain".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Scanning: ".dimmed());
    println!("{}", report.path);
    println!();

    for entry in &report.files {
        let over = report.max.map(|max| entry.time > max).unwrap_or(false);
        let marker = if over { "✗".red() } else { "✓".green() };
        let time = format!("{:<11}", entry.time.as_str());
        let time = if over { time.red() } else { paint_time(&time, entry.time) };
        print!("  {} ", marker);
        print!("{} ", time);
        print!("{:<6}", entry.space.as_str().dimmed());
        print!("{:<12}", entry.language.dimmed());
        println!("{}", entry.file.blue());
    }
    println!();

    print!(
        "  {}",
        format!("Files: {}", report.files_scanned).dimmed()
    );
    if let Some(max) = report.max {
        print!("  {}", format!("Max: {}", max).dimmed());
    }
    print!("  ");
    if report.passed {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", "FAILED".red());
    }
    println!();
    println!();
}
