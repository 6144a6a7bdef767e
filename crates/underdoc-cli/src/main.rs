use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use underdoc_batch::BatchOrchestrator;
use underdoc_client::UnderDocClient;
use underdoc_core::config::ClientConfig;
use underdoc_core::extractor::Extractor;
use underdoc_core::image::ImageReference;
use underdoc_sources::{BatchSource, SourceResolver};

mod cli;

use cli::{BatchArgs, Cli, Command, ExtractArgs};

const DEFAULT_LOG_FILTER: &str =
    "underdoc=info,underdoc_core=info,underdoc_sources=info,underdoc_client=info,underdoc_batch=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(error) = run(Cli::parse()).await {
        tracing::error!(error = %error, "underdoc terminated with error");
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        ClientConfig::from_env_with_key(cli.api_key).context("failed to load configuration")?;
    if let Some(endpoint) = cli.endpoint {
        config = config.with_endpoint(endpoint);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.batch_timeout_secs {
        config = config.with_batch_timeout(Duration::from_secs(secs));
    }

    let resolver = SourceResolver::from_config(&config)?;
    let client = UnderDocClient::with_resolver(config, Arc::new(resolver.clone()))
        .context("failed to create UnderDoc client")?;

    match cli.command {
        Command::Extract(args) => extract(&client, args).await,
        Command::Batch(args) => batch(client, &resolver, args).await,
    }
}

async fn extract(client: &UnderDocClient, args: ExtractArgs) -> anyhow::Result<()> {
    let reference = match (args.file, args.url, args.s3_bucket, args.s3_key) {
        (Some(path), _, _, _) => ImageReference::path(path),
        (_, Some(url), _, _) => ImageReference::url(&url)?,
        (_, _, Some(bucket), Some(key)) => ImageReference::object(bucket, key)?,
        _ => anyhow::bail!("one of --file, --url or --s3-bucket/--s3-key is required"),
    };

    let started = Instant::now();
    let response = client
        .extract(&reference)
        .await
        .with_context(|| format!("failed to extract expense data from {reference}"))?;
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Time taken");

    println!("{}", serde_json::to_string_pretty(&response.receipt_data)?);
    Ok(())
}

async fn batch(client: UnderDocClient, resolver: &SourceResolver, args: BatchArgs) -> anyhow::Result<()> {
    let source = match (args.pattern, args.s3_bucket) {
        (Some(pattern), _) => BatchSource::Glob(pattern),
        (_, Some(bucket)) => BatchSource::Bucket(bucket),
        _ => anyhow::bail!("one of --pattern or --s3-bucket is required"),
    };

    let max_concurrency = args
        .max_concurrency
        .unwrap_or(client.config().max_concurrency);
    let orchestrator = BatchOrchestrator::new(Arc::new(client))
        .with_max_concurrency(max_concurrency)
        .with_failure_policy(args.on_failure);

    let started = Instant::now();
    let report = orchestrator
        .run(&source, resolver.objects(), args.mode)
        .await
        .with_context(|| format!("batch extraction over {source} failed"))?;

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        succeeded = report.succeeded(),
        total = report.total,
        "Extracted {} expense data from {} images",
        report.succeeded(),
        report.total
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
