use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use underdoc_core::batch::{BatchExecutionMode, FailurePolicy};
use underdoc_core::config::{
    ENV_API_ENDPOINT, ENV_API_KEY, ENV_BATCH_TIMEOUT_SECS, ENV_MAX_CONCURRENCY, ENV_TIMEOUT_SECS,
};

#[derive(Debug, Parser)]
#[command(name = "underdoc", version, about = "Extract expense data from receipt and invoice images")]
pub struct Cli {
    #[arg(long, global = true, env = ENV_API_KEY, hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = ENV_API_ENDPOINT)]
    pub endpoint: Option<String>,

    /// Seconds allowed for a single extraction call.
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    pub timeout_secs: Option<u64>,

    /// Seconds allowed for each extraction inside a batch.
    #[arg(long, global = true, env = ENV_BATCH_TIMEOUT_SECS)]
    pub batch_timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract expense data from a single image.
    Extract(ExtractArgs),
    /// Extract expense data from every image matching a pattern or stored in a bucket.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "url", "s3_bucket"])))]
pub struct ExtractArgs {
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long, requires = "s3_key")]
    pub s3_bucket: Option<String>,

    #[arg(long, requires = "s3_bucket")]
    pub s3_key: Option<String>,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["pattern", "s3_bucket"])))]
pub struct BatchArgs {
    /// Glob pattern, e.g. "sample_expense_images/*.*".
    #[arg(long)]
    pub pattern: Option<String>,

    #[arg(long)]
    pub s3_bucket: Option<String>,

    #[arg(long, default_value = "parallel")]
    pub mode: BatchExecutionMode,

    /// drop, surface or fail.
    #[arg(long, default_value = "surface")]
    pub on_failure: FailurePolicy,

    /// Parallel worker limit.
    #[arg(long, env = ENV_MAX_CONCURRENCY)]
    pub max_concurrency: Option<usize>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["underdoc", "extract"]).is_err());
        assert!(Cli::try_parse_from(["underdoc", "extract", "--file", "a.jpg", "--url", "https://x/a.jpg"]).is_err());
        assert!(Cli::try_parse_from(["underdoc", "extract", "--s3-bucket", "b"]).is_err());

        let cli = Cli::try_parse_from(["underdoc", "extract", "--s3-bucket", "b", "--s3-key", "k.jpg"]).unwrap();
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.s3_bucket.as_deref(), Some("b"));
                assert_eq!(args.s3_key.as_deref(), Some("k.jpg"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_batch_defaults() {
        let cli = Cli::try_parse_from(["underdoc", "batch", "--pattern", "images/*.*"]).unwrap();
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.mode, BatchExecutionMode::Parallel);
                assert_eq!(args.on_failure, FailurePolicy::Surface);
                assert!(args.max_concurrency.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_settings_fall_back_to_environment() {
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|name| name.to_string_lossy().into_owned())
        };

        assert_eq!(env_of("api_key").as_deref(), Some("UNDERDOC_API_KEY"));
        assert_eq!(env_of("endpoint").as_deref(), Some("UNDERDOC_API_ENDPOINT"));
        assert_eq!(env_of("timeout_secs").as_deref(), Some("UNDERDOC_TIMEOUT_SECS"));
        assert_eq!(
            env_of("batch_timeout_secs").as_deref(),
            Some("UNDERDOC_BATCH_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_timeout_flags_parse() {
        let cli = Cli::try_parse_from([
            "underdoc",
            "--timeout-secs",
            "5",
            "--batch-timeout-secs",
            "30",
            "extract",
            "--file",
            "a.jpg",
        ])
        .unwrap();
        assert_eq!(cli.timeout_secs, Some(5));
        assert_eq!(cli.batch_timeout_secs, Some(30));
    }

    #[test]
    fn test_batch_mode_and_policy_parse() {
        let cli = Cli::try_parse_from([
            "underdoc",
            "--api-key",
            "k",
            "batch",
            "--s3-bucket",
            "receipts",
            "--mode",
            "sequential",
            "--on-failure",
            "drop",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.mode, BatchExecutionMode::Sequential);
                assert_eq!(args.on_failure, FailurePolicy::Drop);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
