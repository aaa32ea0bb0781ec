//! pdoc: generate API reference pages from PDoc-style documentation comments.
//!
//! Two modes:
//!
//! - **stdin mode**: `pdoc < tty.js` renders every page to stdout
//! - **file mode**: `pdoc -o docs/api lib/ src/**/*.js` writes one page per
//!   top-level entity plus an index

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use pdoc::build::{self, BuildConfig};
use pdoc::render::{self, Renderer};
use pdoc::BuildReport;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "PDOC_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "pdoc",
    version,
    about = "Generate API reference pages from PDoc-style documentation comments"
)]
struct Cli {
    /// Input files, directories or glob patterns. If omitted, reads from stdin.
    inputs: Vec<String>,

    /// Output directory (required when inputs are given)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: markdown (default), html, json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Extensions picked up when walking directories, comma separated
    #[arg(long = "ext", default_value = "js", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Number of parser threads (default: one per core)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Write the build report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Exit with an error when the build produced warnings
    #[arg(long)]
    deny_warnings: bool,

    /// Do not write the index page
    #[arg(long)]
    no_index: bool,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn build_config(&self) -> BuildConfig {
        let config = BuildConfig::default().with_extensions(self.extensions.clone());
        match self.jobs {
            Some(jobs) => config.with_jobs(jobs),
            None => config,
        }
    }

    /// Filter directive from the flags; `None` defers to the environment.
    fn log_directive(&self) -> Option<&'static str> {
        match (self.quiet, self.verbose) {
            (true, _) => Some("error"),
            (false, 0) => None,
            (false, 1) => Some("info"),
            (false, _) => Some("debug"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let renderer = render::create_renderer(&cli.format)?;
    let report = if cli.inputs.is_empty() {
        stdin_mode(renderer.as_ref())?
    } else {
        file_mode(&cli, renderer.as_ref())?
    };

    finish(&cli, &report)
}

fn init_logging(cli: &Cli) {
    let filter = match cli.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // a second init (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}

/// stdin mode: parse stdin as one file, write all pages to stdout.
fn stdin_mode(renderer: &dyn Renderer) -> Result<BuildReport> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let build = build::build_sources(&[(PathBuf::from("stdin"), input)]);
    print!("{}", renderer.render_all(&build.corpus)?);
    Ok(build.report)
}

/// file mode: build the corpus from all inputs, write one page per root.
fn file_mode(cli: &Cli, renderer: &dyn Renderer) -> Result<BuildReport> {
    let output_dir = cli
        .output
        .as_deref()
        .context("--output is required when inputs are given")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let config = cli.build_config();
    let files = build::discover(&cli.inputs, &config)?;
    tracing::info!(files = files.len(), "building");
    let build = build::build_files(&files, &config)?;

    let ext = renderer.file_extension();
    for root in build.corpus.roots() {
        let out_path = output_dir.join(format!("{}.{}", render::page_name(root), ext));
        let page = renderer.render(&build.corpus, root)?;
        write(&out_path, &page)?;
    }
    if !cli.no_index && !build.corpus.is_empty() {
        let out_path = output_dir.join(format!("index.{}", ext));
        write(&out_path, &renderer.render_index(&build.corpus)?)?;
    }

    Ok(build.report)
}

fn write(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "wrote");
    Ok(())
}

/// Write the report if asked and apply `--deny-warnings`.
fn finish(cli: &Cli, report: &BuildReport) -> Result<()> {
    tracing::info!("{}", report.summary());

    if let Some(ref path) = cli.report {
        let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        write(path, &json)?;
    }

    if cli.deny_warnings && !report.is_clean() {
        bail!("{} (denied by --deny-warnings)", report.summary());
    }
    Ok(())
}
