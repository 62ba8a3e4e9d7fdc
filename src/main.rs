//! gotgen CLI
//!
//! Usage:
//!   gotgen generate [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>         Config with the inventory and delimiters [default: gg.conf.json]
//!       --file <FILE>           Render only this template instead of every .gg file
//!       --out-file-path <FILE>  Output path for --file
//!       --keep-going            Write every template that renders; report failures at the end
//!   -h, --help                  Print help

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gotgen::batch::{self, BatchError, FailurePolicy};
use gotgen::config::DEFAULT_CONFIG_FILE;
use gotgen::{GenConfig, RenderConfig, RenderError};

#[derive(Parser)]
#[command(name = "gotgen")]
#[command(about = "Generate files from Go-style templates and an inventory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render .gg templates into their output files
    Generate(GenerateArgs),
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Config file with the inventory and delimiters (JSON, or TOML by extension)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// .gg file path; if given, only this template is rendered instead of
    /// scanning the working directory
    #[arg(long)]
    file: Option<PathBuf>,

    /// Output file path for --file
    #[arg(long, requires = "file")]
    out_file_path: Option<PathBuf>,

    /// Keep rendering after a failure and report all failures at the end
    #[arg(long)]
    keep_going: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate(args) => generate(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn generate(args: &GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %args.config.display(), "reading config");
    let config = GenConfig::from_file(&args.config)?;

    let jobs = match &args.file {
        Some(file) => {
            info!(template = %file.display(), "using only the specified template");
            vec![batch::single_job(file, args.out_file_path.as_deref())?]
        }
        None => batch::discover_jobs(Path::new("."))?,
    };

    let policy = if args.keep_going {
        FailurePolicy::BestEffort
    } else {
        FailurePolicy::FailFast
    };
    let render_config = RenderConfig::new().with_delimiters(config.delimiter.clone());
    let inventory = config.inventory_value();

    let report = batch::run_batch(&jobs, &inventory, &render_config, policy).map_err(|e| {
        report_syntax_error(&e);
        e
    })?;
    for failure in &report.failures {
        report_syntax_error(failure);
    }

    if !report.is_success() {
        return Err(format!(
            "{} of {} templates failed",
            report.failures.len(),
            jobs.len()
        )
        .into());
    }
    info!(count = report.written.len(), "done");
    Ok(())
}

/// Print syntax errors with their source context
fn report_syntax_error(err: &BatchError) {
    if let BatchError::Render {
        path,
        source: RenderError::TemplateSyntax(syntax),
    } = err
    {
        if let Ok(source) = std::fs::read_to_string(path) {
            eprintln!("{}", syntax.format(&source, path));
        }
    }
}
