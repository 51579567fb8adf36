//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Validate phone numbers in bulk against phone-number-api.com.
///
/// Reads the `Phone_Number` column of the input CSV, looks each number up
/// (one request every 12 seconds by default), and appends one row per number
/// to the output CSV. Re-running with the same output skips numbers already
/// recorded there.
///
/// Only one phonecheck process may write a given output file at a time.
#[derive(Parser, Debug)]
#[command(name = "phonecheck")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Input CSV file with a Phone_Number column
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output CSV file; created if absent, appended to if present
    #[arg(short, long)]
    pub output: PathBuf,

    /// Config file (default: $XDG_CONFIG_HOME/phonecheck/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Completed lookups per checkpoint (1-1000) [default: 5]
    #[arg(short = 'b', long, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub batch_size: Option<u16>,

    /// Per-request timeout in seconds (1-300) [default: 10]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout_secs: Option<u64>,

    /// Minimum delay between lookups in milliseconds (0 to disable, max 600000) [default: 12000]
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=600_000))]
    pub interval_ms: Option<u64>,

    /// Attempts per lookup for transient failures, including the first (1-10) [default: 1]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: Option<u32>,

    /// Look up again numbers previously recorded as API_ERROR or REQUEST_FAILED
    #[arg(long)]
    pub retry_failed: bool,

    /// Show what would be looked up without sending requests or writing output
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub summary_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["phonecheck", "-i", "in.csv", "-o", "out.csv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.input, PathBuf::from("in.csv"));
        assert_eq!(args.output, PathBuf::from("out.csv"));
        assert!(args.config.is_none());
        assert!(args.batch_size.is_none());
        assert!(args.interval_ms.is_none());
        assert!(!args.retry_failed);
        assert!(!args.dry_run);
        assert!(!args.summary_json);
    }

    #[test]
    fn test_cli_input_and_output_are_required() {
        let err = Args::try_parse_from(["phonecheck"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = Args::try_parse_from(["phonecheck", "--input", "in.csv"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse(&["-v"]).unwrap().verbose, 1);
        assert_eq!(parse(&["-vv"]).unwrap().verbose, 2);
        assert_eq!(parse(&["--verbose", "--verbose"]).unwrap().verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        assert!(parse(&["-q"]).unwrap().quiet);
        assert!(parse(&["--quiet"]).unwrap().quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["phonecheck", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["phonecheck", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = parse(&["--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    // ==================== Batch Size Tests ====================

    #[test]
    fn test_cli_batch_size_short_and_long_flag() {
        assert_eq!(parse(&["-b", "2"]).unwrap().batch_size, Some(2));
        assert_eq!(parse(&["--batch-size", "1000"]).unwrap().batch_size, Some(1000));
    }

    #[test]
    fn test_cli_batch_size_out_of_range_rejected() {
        for value in ["0", "1001"] {
            let err = parse(&["-b", value]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    // ==================== Rate Limit and Retry Tests ====================

    #[test]
    fn test_cli_interval_zero_disables() {
        assert_eq!(parse(&["--interval-ms", "0"]).unwrap().interval_ms, Some(0));
    }

    #[test]
    fn test_cli_interval_over_max_rejected() {
        let err = parse(&["--interval-ms", "600001"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_timeout_range() {
        assert_eq!(parse(&["--timeout-secs", "30"]).unwrap().timeout_secs, Some(30));
        let err = parse(&["--timeout-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_max_attempts_range() {
        assert_eq!(parse(&["--max-attempts", "3"]).unwrap().max_attempts, Some(3));
        let err = parse(&["--max-attempts", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = parse(&["--max-attempts", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_combined_flags() {
        let args = parse(&[
            "-b",
            "10",
            "--interval-ms",
            "500",
            "--retry-failed",
            "--dry-run",
            "--summary-json",
            "--config",
            "phonecheck.toml",
        ])
        .unwrap();
        assert_eq!(args.batch_size, Some(10));
        assert_eq!(args.interval_ms, Some(500));
        assert!(args.retry_failed);
        assert!(args.dry_run);
        assert!(args.summary_json);
        assert_eq!(args.config, Some(PathBuf::from("phonecheck.toml")));
    }
}
