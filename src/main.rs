use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process;
use svn_churn::config::Config;
use svn_churn::error::{self, EXIT_INTERRUPTED, EXIT_SUCCESS};
use svn_churn::filter::MatchMode;
use svn_churn::timestamp_parser::TimestampParser;
use svn_churn::{interrupt, logging, AnalyzerError, LogAnalyzer, ReportFormat, ReportRenderer};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "svn-churn")]
#[command(about = "Rank files in an SVN XML log by how often they changed")]
#[command(version)]
struct Cli {
    /// Path to the SVN XML log file (svn log --xml --verbose)
    input_file: PathBuf,

    /// Max entries to display
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Exclude dirs (e.g. /tags)
    #[arg(short = 'e', long, num_args = 1..)]
    exclude: Vec<String>,

    /// Filter extensions (e.g. .py)
    #[arg(short = 'x', long = "extension", visible_alias = "ext", num_args = 1..)]
    extensions: Vec<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(short = 's', long, value_parser = parse_day)]
    start: Option<DateTime<Utc>>,

    /// End date (YYYY-MM-DD)
    #[arg(short = 'd', long, value_parser = parse_day)]
    end: Option<DateTime<Utc>>,

    /// How exclusion rules match paths
    #[arg(long, value_parser = parse_match_mode)]
    match_mode: Option<MatchMode>,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Configuration file (defaults to svn-churn.toml lookup)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_day(s: &str) -> Result<DateTime<Utc>, String> {
    TimestampParser::parse_day(s).map_err(|e| e.to_string())
}

fn parse_match_mode(s: &str) -> Result<MatchMode, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => report_error(&err),
    };
    process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    let _log_guard = logging::init_logging(&config.logging, &config.paths.log_directory);
    if let Some(path) = &config.source {
        info!(config_file = %path.display(), "Loaded configuration from file");
    }

    // Command-line values win over configuration.
    if !cli.exclude.is_empty() {
        config.filter.exclude = cli.exclude;
    }
    if !cli.extensions.is_empty() {
        config.filter.extensions = cli.extensions;
    }
    if let Some(mode) = cli.match_mode {
        config.filter.match_mode = mode;
    }
    let limit = cli.limit.unwrap_or(config.report.limit);
    if limit == 0 {
        warn!("Report limit is 0, no rows will be printed");
    }
    let format = if cli.json || config.report.json {
        ReportFormat::Json {
            pretty: config.report.json_pretty,
        }
    } else {
        ReportFormat::Text
    };

    let criteria = config.filter.criteria(cli.start, cli.end);
    let flag = interrupt::install_handler()?;

    let analyzer = LogAnalyzer::new(criteria)
        .with_buffer_size(config.parser.buffer_size_bytes())
        .with_interrupt(flag);
    let result = analyzer.analyze_file(&cli.input_file)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    ReportRenderer::new(analyzer.criteria(), limit).write_to(&mut out, &result, format)
}

fn report_error(err: &anyhow::Error) -> i32 {
    let code = error::exit_code_for(err);
    match err.downcast_ref::<AnalyzerError>() {
        Some(cancelled) if code == EXIT_INTERRUPTED => eprintln!("\n{}", cancelled),
        Some(analyzer_err) => eprintln!("{} {}", "Error:".red().bold(), analyzer_err),
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
    code
}
