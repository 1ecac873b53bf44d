//! sentiment-annotator: split messages into per-company mentions with an LLM
//! and score each mention's sentiment on a 0..5 scale.
//!
//! Usage:
//!   cargo run -p sentiment-annotator
//!   cargo run -p sentiment-annotator -- --limit 200 --concurrency 10
//!   cargo run -p sentiment-annotator -- --output scores.csv --json scores.json

use annotation_core::{load_reference_table, DirectoryIndex, DirectoryLayout, ResponseParser};
use annotation_pipeline::{
    dedup_messages, group_by_message, load_messages, read_records, save_grouped_json,
    write_records, Dispatcher, RecordSink,
};
use anyhow::{Context, Result};
use chrono::Utc;
use llm_client::{CredentialPool, HttpCompletionClient, ProxySettings};
use std::sync::Arc;

mod config;

use config::AnnotatorConfig;

const USAGE: &str = "\
Usage: sentiment-annotator [options]

Options:
  --messages PATH     Message CSV (MessageID, ChannelID, issuerid, MessageText)
  --directory PATH    Issuer reference CSV
  --keys PATH         API keys, one per line
  --proxy PATH        Proxy config (key=value lines)
  --output PATH       Output CSV
  --json PATH         Also write per-message [issuer_id, score] groups as JSON
  --limit N           Process the first N unique messages (default 1000)
  --concurrency N     Max in-flight requests (default 20)
  --host-limit N      Max requests per host (default 10)
  --timeout SECS      Per-request timeout (default 60)
  --retries N         Retries for transient failures (default 0)";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "sentiment_annotator=info,annotation_pipeline=info,llm_client=warn,annotation_core=warn".into()
    });

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_directory(config: &AnnotatorConfig) -> DirectoryIndex {
    match load_reference_table(&config.directory_path, &DirectoryLayout::default()) {
        Ok(entries) => DirectoryIndex::build(&entries),
        Err(e) => {
            tracing::error!(
                "Could not load issuer directory {}: {}; no mentions will resolve",
                config.directory_path.display(),
                e
            );
            DirectoryIndex::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = AnnotatorConfig::from_env()?;
    config.apply_args(&args)?;
    let started = Utc::now();

    let messages = load_messages(&config.messages_path)
        .with_context(|| format!("reading messages from {}", config.messages_path.display()))?;
    let loaded = messages.len();
    let mut messages = dedup_messages(messages);
    let unique = messages.len();
    messages.truncate(config.limit);
    tracing::info!(
        "Messages: {} rows, {} unique, processing {}",
        loaded,
        unique,
        messages.len()
    );

    let directory = load_directory(&config);
    tracing::info!(
        "Directory: {} names across {} issuers",
        directory.len(),
        directory.issuer_count()
    );

    let credentials = CredentialPool::load(&config.keys_path)
        .await
        .with_context(|| format!("reading API keys from {}", config.keys_path.display()))?;
    let proxy = ProxySettings::load(&config.proxy_path)
        .await
        .with_context(|| format!("reading proxy config from {}", config.proxy_path.display()))?;
    match &proxy {
        Some(proxy) => tracing::info!("Using proxy {}", proxy.redacted_url()),
        None => tracing::info!("No proxy configured, connecting directly"),
    }

    let llm_config = config.llm_config();
    let client = Arc::new(HttpCompletionClient::new(&llm_config, proxy.as_ref())?);
    let dispatcher = Dispatcher::new(client, credentials, llm_config.model.clone())
        .with_max_in_flight(config.max_in_flight)
        .with_retry(config.retry_policy());

    let results = dispatcher.dispatch(messages).await;

    let parser = ResponseParser::new(&directory);
    let mut sink = RecordSink::create(&config.output_path)
        .with_context(|| format!("creating {}", config.output_path.display()))?;
    let stats = write_records(&results, &parser, &mut sink)?;
    sink.finish()?;

    if let Some(json_path) = &config.json_path {
        let records = read_records(&config.output_path)?;
        let groups = group_by_message(&records);
        save_grouped_json(json_path, &groups)
            .with_context(|| format!("writing {}", json_path.display()))?;
        tracing::info!("Wrote {} message groups to {}", groups.len(), json_path.display());
    }

    let elapsed = Utc::now() - started;
    tracing::info!(
        "Done! {} records from {} results ({} without usable answer) in {}s -> {}",
        stats.records,
        stats.results,
        stats.skipped,
        elapsed.num_seconds(),
        config.output_path.display()
    );
    Ok(())
}
