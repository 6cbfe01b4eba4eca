//! Command-line harness for exercising execution log storage against a real bucket
//!
//! ```text
//! execlog-store --bucket my-logs store ./run.rdlog
//! execlog-store --bucket my-logs state
//! execlog-store --bucket my-logs retrieve ./copy.rdlog
//! ```
//!
//! Bucket and path default to `EXECLOG_BUCKET` and `EXECLOG_PATH`. S3
//! credentials are read from `S3_ENDPOINT_URL`, `S3_ACCESS_KEY_ID` and
//! `S3_SECRET_ACCESS_KEY`, optionally via a `.env` file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use execlog_store::{ExecutionContext, LogFileStorage, RDLOG, Retrieved, S3Storage, StorageConfig};
use time::OffsetDateTime;
use tracing::info;

/// Store, inspect and retrieve an execution log in S3-compatible storage
#[derive(Parser)]
#[command(name = "execlog-store")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Bucket to store files in (overrides EXECLOG_BUCKET)
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Path template for the stored file (overrides EXECLOG_PATH)
    #[arg(long, global = true)]
    path: Option<String>,

    /// Execution id used to expand ${job.execid}
    #[arg(long, global = true, default_value = "testexecid")]
    execid: String,

    /// Project name used to expand ${job.project}
    #[arg(long, global = true, default_value = "testproject")]
    project: String,

    /// JSON file with the full execution context; overrides --execid and --project
    #[arg(long, global = true)]
    context: Option<PathBuf>,

    /// File type suffix of the stored object
    #[arg(long, global = true, default_value = RDLOG)]
    file_type: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a local file
    Store {
        /// File to upload
        file: PathBuf,
    },

    /// Report whether the file is available in the bucket
    State,

    /// Download the stored file
    Retrieve {
        /// Destination file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "execlog_store=debug,execlog_store_cli=info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let context = load_context(&cli)?;
    let config = load_config(&cli)?;

    let storage = S3Storage::from_env().context("failed to create S3 client")?;
    let logs = LogFileStorage::initialize(storage, &config, &context)?;
    let file_type = cli.file_type.as_str();

    match cli.command {
        Command::Store { file } => store(&logs, file_type, &file).await?,
        Command::State => {
            let available = logs.is_available(file_type).await?;
            info!("available? {}", available);
        }
        Command::Retrieve { file } => retrieve(&logs, file_type, &file).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<StorageConfig> {
    let mut config = StorageConfig::from_env()?;
    if let Some(bucket) = &cli.bucket {
        config = config.with_bucket(bucket);
    }
    if let Some(path) = &cli.path {
        config = config.with_path(path);
    }
    Ok(config)
}

fn load_context(cli: &Cli) -> Result<ExecutionContext> {
    match &cli.context {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read context file {}", path.display()))?;
            ExecutionContext::from_json(&json)
                .with_context(|| format!("invalid context file {}", path.display()))
        }
        None => Ok(ExecutionContext::new()
            .with_execid(&cli.execid)
            .with_project(&cli.project)),
    }
}

async fn store(logs: &LogFileStorage<S3Storage>, file_type: &str, path: &Path) -> Result<()> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    let metadata = file.metadata().await?;
    let last_modified = metadata.modified().ok().map(OffsetDateTime::from);

    logs.store(file_type, file, metadata.len(), last_modified).await?;
    info!(key = %logs.storage_key(file_type), bytes = metadata.len(), "stored");

    Ok(())
}

async fn retrieve(logs: &LogFileStorage<S3Storage>, file_type: &str, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;

    match logs.retrieve(file_type, &mut file).await? {
        Retrieved::Written { bytes } => info!(bytes, "retrieved to {}", path.display()),
        Retrieved::NotFound => info!(key = %logs.storage_key(file_type), "nothing stored yet"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::parse_from([
            "execlog-store",
            "--bucket",
            "cli-bucket",
            "--path",
            "runs/${job.execid}",
            "state",
        ]);

        let config = load_config(&cli).unwrap();
        assert_eq!(config.bucket.as_deref(), Some("cli-bucket"));
        assert_eq!(config.path.as_deref(), Some("runs/${job.execid}"));
    }

    #[test]
    fn test_default_context() {
        let cli = Cli::parse_from(["execlog-store", "--execid", "42", "state"]);

        let context = load_context(&cli).unwrap();
        assert_eq!(context.execid.as_deref(), Some("42"));
        assert_eq!(context.project.as_deref(), Some("testproject"));
    }
}
