//! codexplain CLI entry point.

use clap::Parser;
use codexplain::cli::{self, Cli, Commands, EXIT_ERROR};

fn report(result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    }
}

#[actix_web::main]
async fn main() {
    let cli = Cli::parse();

    let (config, config_path) = match cli::load_config(cli.config.as_deref()) {
        Some(loaded) => loaded,
        None => std::process::exit(EXIT_ERROR),
    };
    cli::init_logging(&config.logging.filter);
    if let Some(path) = &config_path {
        tracing::info!(path = %path.display(), "loaded config");
    }

    let exit_code = match cli.command {
        Commands::Serve(args) => report(cli::run_serve(&args, config).await),
        Commands::Explain(args) => report(cli::run_explain(&args, &config).await),
        Commands::Complexity(args) => report(cli::run_complexity(&args).await),
        Commands::Improve(args) => report(cli::run_improve(&args, &config).await),
        Commands::Scan(args) => report(cli::run_scan(&args)),
    };

    std::process::exit(exit_code);
}
