//! Command-line interface for codexplain.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::analysis::{AnswerLanguage, TimeComplexity};
use crate::config::Config;
use crate::report::{self, Format, ScanReport};
use crate::scan;
use crate::server;
use crate::service::CodeService;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Explain code snippets, estimate their complexity, and suggest improvements.
///
/// Language detection, explanations and Big-O estimates come from textual
/// heuristics. When an API key is configured, explanations and improvements
/// are requested from a chat-completions model first.
#[derive(Parser)]
#[command(name = "codexplain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Explain a snippet line by line
    Explain(ExplainArgs),
    /// Estimate time and space complexity of a snippet
    Complexity(ComplexityArgs),
    /// Suggest improvements for a snippet
    Improve(ExplainArgs),
    /// Estimate complexity for every source file under a path
    Scan(ScanArgs),
}

#[derive(Parser)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Answer from heuristics only
    #[arg(long)]
    pub no_ai: bool,
}

/// Arguments shared by explain and improve.
#[derive(Parser)]
pub struct ExplainArgs {
    /// Source file, or - for stdin
    pub file: PathBuf,

    /// Answer language: english or hinglish
    #[arg(short = 'l', long, default_value = "english")]
    pub answer_language: String,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Answer from heuristics only
    #[arg(long)]
    pub no_ai: bool,
}

#[derive(Parser)]
pub struct ComplexityArgs {
    /// Source file, or - for stdin
    pub file: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Parser)]
pub struct ScanArgs {
    /// File or directory to scan
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Highest acceptable time label, e.g. "O(n^2)" or "quadratic"
    #[arg(short, long)]
    pub max: Option<String>,
}

/// Load configuration, printing the error on failure.
pub fn load_config(explicit: Option<&Path>) -> Option<(Config, Option<PathBuf>)> {
    match Config::load(explicit) {
        Ok(loaded) => Some(loaded),
        Err(e) => {
            eprintln!("Error: {}", e);
            None
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_format(s: &str) -> Option<Format> {
    let format = Format::parse(s);
    if format.is_none() {
        eprintln!("Error: invalid format {:?}, must be 'pretty' or 'json'", s);
    }
    format
}

/// Read a snippet from `path`, or stdin for `-`. Returns a display name too.
fn read_source(path: &Path) -> anyhow::Result<(String, String)> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        return Ok(("<stdin>".to_string(), source));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
    Ok((
        path.display().to_string(),
        String::from_utf8_lossy(&bytes).into_owned(),
    ))
}

/// Spinner on stderr while a generator request is in flight.
fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the serve command.
pub async fn run_serve(args: &ServeArgs, config: Config) -> anyhow::Result<i32> {
    let mut server_config = config.server.clone();
    if let Some(host) = &args.host {
        server_config.host = host.clone();
    }
    if let Some(port) = args.port {
        if port == 0 {
            eprintln!("Error: --port must be non-zero");
            return Ok(EXIT_ERROR);
        }
        server_config.port = port;
    }

    let service = CodeService::from_config(&config, !args.no_ai);
    server::run(&server_config, service).await?;

    Ok(EXIT_SUCCESS)
}

/// Run the explain command.
pub async fn run_explain(args: &ExplainArgs, config: &Config) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Some(f) => f,
        None => return Ok(EXIT_ERROR),
    };
    let (name, source) = read_source(&args.file)?;
    let service = CodeService::from_config(config, !args.no_ai);
    let answer = AnswerLanguage::from_request(Some(args.answer_language.as_str()));

    let progress = service.has_generator().then(|| spinner("Asking the model..."));
    let outcome = service.analyze(&source, answer).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = match outcome {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match format {
        Format::Json => report::write_json(&result)?,
        Format::Pretty => report::write_analysis_pretty(&name, &result),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the complexity command.
pub async fn run_complexity(args: &ComplexityArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Some(f) => f,
        None => return Ok(EXIT_ERROR),
    };
    let (name, source) = read_source(&args.file)?;

    let result = match CodeService::heuristic().complexity(&source).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match format {
        Format::Json => report::write_json(&result)?,
        Format::Pretty => report::write_complexity_pretty(&name, &result),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the improve command.
pub async fn run_improve(args: &ExplainArgs, config: &Config) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Some(f) => f,
        None => return Ok(EXIT_ERROR),
    };
    let (name, source) = read_source(&args.file)?;
    let service = CodeService::from_config(config, !args.no_ai);
    let answer = AnswerLanguage::from_request(Some(args.answer_language.as_str()));

    let progress = service.has_generator().then(|| spinner("Asking the model..."));
    let outcome = service.improve(&source, answer).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = match outcome {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match format {
        Format::Json => report::write_json(&result)?,
        Format::Pretty => report::write_improvement_pretty(&name, &result),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Some(f) => f,
        None => return Ok(EXIT_ERROR),
    };

    let max = match args.max.as_deref().map(TimeComplexity::parse) {
        None => None,
        Some(Some(label)) => Some(label),
        Some(None) => {
            eprintln!(
                "Error: invalid --max {:?}, expected a label such as \"O(n^2)\"",
                args.max.as_deref().unwrap_or_default()
            );
            return Ok(EXIT_ERROR);
        }
    };

    let root = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = scan::collect_files(&root)?;
    if files.is_empty() {
        eprintln!("Warning: no files to scan");
        return Ok(EXIT_SUCCESS);
    }

    let entries = scan::scan_files(&files, &root);
    let passed = max
        .map(|m| scan::over_limit(&entries, m).is_empty())
        .unwrap_or(true);

    let report = ScanReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: args.path.to_string_lossy().to_string(),
        max,
        passed,
        files_scanned: entries.len(),
        files: entries,
    };

    match format {
        Format::Json => report::write_json(&report)?,
        Format::Pretty => report::write_scan_pretty(&report),
    }

    if passed {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}
