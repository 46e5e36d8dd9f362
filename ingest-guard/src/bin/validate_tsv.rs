//! Validate TSV metadata files against a schema.
//!
//! Exit status: 0 when every file is valid, 1 on an unexpected failure,
//! 2 for bad arguments or unreadable inputs, 3 when issues were found.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ingest_guard::cache::{clear_cache_files, UrlStatusCache};
use ingest_guard::config::ValidatorConfig;
use ingest_guard::core::{Schema, Validator};
use ingest_guard::error::IngestError;
use ingest_guard::formatters::{FormatterConfig, HumanFormatter, JsonFormatter, ResultFormatter};
use ingest_guard::logging::setup::{init_logging, LoggingConfig};
use ingest_guard::logging::LogConfig;
use ingest_guard::sources::load_tsv_files;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info};

const VALID_STATUS: i32 = 0;
const BUG_STATUS: i32 = 1;
const USER_ERROR_STATUS: i32 = 2;
const INVALID_STATUS: i32 = 3;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per issue
    Text,
    /// The full report as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Schema describing the TSV columns (YAML, or JSON with a .json extension)
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,

    /// Paths of metadata.tsv files
    #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
    tsv_paths: Vec<PathBuf>,

    /// The listed fields may be missing; if supplied they are still validated
    #[arg(long, value_name = "FIELD", num_args = 1..)]
    optional_fields: Vec<String>,

    /// Skip checks that require network access
    #[arg(long)]
    offline: bool,

    /// Clear the cache of network check responses before validating
    #[arg(long)]
    clear_cache: bool,

    /// Location of the URL status cache (default: $INGEST_GUARD_CACHE, then the platform cache dir)
    #[arg(long, value_name = "PATH")]
    cache_path: Option<PathBuf>,

    /// Seconds to wait for each URL lookup
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    http_timeout: u64,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Show at most this many issues
    #[arg(long, value_name = "N", default_value_t = -1, allow_negative_numbers = true)]
    max_issues: i32,

    /// Append a context note to the report
    #[arg(long)]
    add_notes: bool,

    /// Log debug details, including each checked row
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    }
    .with_json_format(args.json_logs);
    if let Err(e) = init_logging(logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let status = match run(&args) {
        Ok(status) => status,
        Err(e) => {
            let status = exit_status(&e);
            error!(error = %e, status, "Validation did not complete");
            eprintln!("Error: {e:#}");
            status
        }
    };
    process::exit(status);
}

fn run(args: &Args) -> Result<i32> {
    let mut config = ValidatorConfig::new()
        .with_offline(args.offline)
        .with_optional_fields(args.optional_fields.iter().cloned())
        .with_http_timeout(Duration::from_secs(args.http_timeout))
        .with_add_notes(args.add_notes)
        .with_log_config(if args.verbose {
            LogConfig::verbose()
        } else {
            LogConfig::default()
        });
    if let Some(path) = &args.cache_path {
        config = config.with_cache_path(path);
    }

    if args.clear_cache {
        let path = match config.cache_path() {
            Some(path) => path.to_path_buf(),
            None => UrlStatusCache::default_path()?,
        };
        let removed = clear_cache_files(&path)?;
        info!(removed, path = %path.display(), "Cleared cache");
    }

    let schema = Schema::from_path(&args.schema)?;
    let validator = Validator::new(schema, config)?.with_name(args.schema.display().to_string());

    // Loading finishes before any check runs, so blocking URL lookups never
    // happen on the runtime.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let tables = runtime.block_on(load_tsv_files(&args.tsv_paths))?;
    drop(runtime);

    let result = validator.validate(&tables)?;

    let formatter_config = FormatterConfig::default()
        .with_colors(false)
        .with_metrics(args.verbose)
        .with_max_issues(args.max_issues)
        .with_add_notes(validator.config().add_notes());
    let rendered = match args.output {
        OutputFormat::Text => HumanFormatter::with_config(formatter_config).format(&result)?,
        OutputFormat::Json => JsonFormatter::with_config(formatter_config).format(&result)?,
    };
    print!("{rendered}");

    Ok(if result.is_success() {
        VALID_STATUS
    } else {
        INVALID_STATUS
    })
}

fn exit_status(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<IngestError>() {
        Some(e) if e.is_user_error() => USER_ERROR_STATUS,
        _ => BUG_STATUS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "validate-tsv",
            "--schema",
            "schema.yaml",
            "--tsv-paths",
            "a.tsv",
            "b.tsv",
            "--optional-fields",
            "x",
            "--offline",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(args.tsv_paths.len(), 2);
        assert_eq!(args.optional_fields, vec!["x"]);
        assert!(args.offline);
        assert!(matches!(args.output, OutputFormat::Json));
        assert_eq!(args.max_issues, -1);
    }

    #[test]
    fn test_tsv_paths_required() {
        assert!(Args::try_parse_from(["validate-tsv", "--schema", "s.yaml"]).is_err());
    }

    #[test]
    fn test_exit_status_classification() {
        let user: anyhow::Error = IngestError::Schema("bad".to_string()).into();
        assert_eq!(exit_status(&user), USER_ERROR_STATUS);
        let bug: anyhow::Error = IngestError::Internal("boom".to_string()).into();
        assert_eq!(exit_status(&bug), BUG_STATUS);
        assert_eq!(exit_status(&anyhow::anyhow!("other")), BUG_STATUS);
    }
}
