use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    api::{HttpProcessingApi, ImageProcessingApi},
    feed::{save_decoded, FeedView, ProcessedFeed, FEED_EMPTY_MESSAGE},
    selection::{FileCandidate, BMP_MIME},
    workflow::SubmissionController,
};
use shared::domain::{CipherMode, Operation};
use uuid::Uuid;

mod config;

#[derive(Parser, Debug)]
#[command(name = "cryptoflow", about = "Client for the Cryptoflow image encryption service")]
struct Args {
    /// Overrides the configured service origin.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a BMP image for encryption.
    Encrypt(SubmitArgs),
    /// Submit a BMP image for decryption.
    Decrypt(SubmitArgs),
    /// Poll the processed listing and print every update.
    Watch,
    /// Decode a processed record and save it locally.
    Fetch {
        #[arg(long)]
        id: Uuid,
        /// Target directory; defaults to the configured download_dir.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    file: PathBuf,
    #[arg(long)]
    key: String,
    #[arg(long, default_value_t = CipherMode::Ecb)]
    mode: CipherMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    config::validate(&settings)?;
    tracing::info!(server_url = %settings.server_url, "using processing service");

    let api = Arc::new(HttpProcessingApi::new(settings.server_url.clone()));

    match args.command {
        Command::Encrypt(submit_args) => submit(api, submit_args, Operation::Encrypt).await,
        Command::Decrypt(submit_args) => submit(api, submit_args, Operation::Decrypt).await,
        Command::Watch => watch(api, settings.poll_interval()).await,
        Command::Fetch { id, out } => {
            let dir = out.unwrap_or_else(|| PathBuf::from(&settings.download_dir));
            fetch(api, id, dir).await
        }
    }
}

async fn submit(
    api: Arc<HttpProcessingApi>,
    args: SubmitArgs,
    operation: Operation,
) -> Result<()> {
    let content = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("file path has no usable name"))?
        .to_string();

    let mut controller = SubmissionController::new(api);
    controller.select_files(vec![FileCandidate {
        name,
        content,
        mime_type: Some(BMP_MIME.to_string()),
    }])?;
    controller.set_key(args.key);
    controller.set_mode(args.mode);

    let receipt = controller.submit(operation).await?;
    match receipt.id {
        Some(id) => println!("Accepted as job {id}"),
        None => println!("Accepted"),
    }
    println!("The result will appear under `cryptoflow watch` once processed.");
    Ok(())
}

async fn watch(api: Arc<HttpProcessingApi>, interval: Duration) -> Result<()> {
    let feed = ProcessedFeed::spawn_with_interval(api, interval);
    let mut view = feed.subscribe();

    println!("Watching processed images (ctrl-c to stop)");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow_and_update().clone();
                render(&current);
            }
        }
    }

    feed.shutdown();
    Ok(())
}

fn render(view: &FeedView) {
    match view {
        FeedView::Loading => println!("Loading..."),
        FeedView::Unavailable { message } => println!("{message}"),
        FeedView::Ready { records } if records.is_empty() => println!("{FEED_EMPTY_MESSAGE}"),
        FeedView::Ready { records } => {
            for record in records {
                println!(
                    "{}  {}  {}  {}",
                    record.id,
                    record.image_name,
                    record.operation,
                    record.mode_label()
                );
            }
        }
    }
}

async fn fetch(api: Arc<HttpProcessingApi>, id: Uuid, dir: PathBuf) -> Result<()> {
    let records = api
        .list_processed()
        .await
        .context("failed to fetch the processed listing")?;
    let record = records
        .into_iter()
        .find(|record| record.id == id)
        .ok_or_else(|| anyhow!("no processed record with id {id}"))?;

    let path = save_decoded(&record, &dir)?;
    println!("Saved {}", path.display());
    Ok(())
}
