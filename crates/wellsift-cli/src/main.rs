use std::path::PathBuf;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

use wellsift_core::{Config, config_file};
use wellsift_ingest::{IngestPool, RunSummary, list_pdfs};
use wellsift_store::WellStore;

/// Wellsift - extract structured well data from completion report PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a directory of completion report PDFs into the database
    Ingest {
        /// Directory of PDFs to ingest (default: configured pdf_dir)
        dir: Option<PathBuf>,

        /// Path to the SQLite database
        #[arg(long)]
        db: Option<PathBuf>,

        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Per-document processing budget in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// OCR rendering resolution in dots per inch
        #[arg(long)]
        dpi: Option<u32>,

        /// Initial OCR batch size in pages
        #[arg(long)]
        batch_pages: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List stored wells with their QC status
    Wells {
        /// Path to the SQLite database
        #[arg(long)]
        db: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ingest {
            dir,
            db,
            workers,
            timeout_secs,
            dpi,
            batch_pages,
            no_color,
        } => ingest(dir, db, workers, timeout_secs, dpi, batch_pages, no_color).await,
        Command::Wells { db, no_color } => wells(db, no_color),
    }
}

/// Resolve configuration: CLI flags > config files > defaults
fn resolved_config() -> Config {
    config_file::load_config().apply(Config::default())
}

async fn ingest(
    dir: Option<PathBuf>,
    db: Option<PathBuf>,
    workers: Option<usize>,
    timeout_secs: Option<u64>,
    dpi: Option<u32>,
    batch_pages: Option<usize>,
    no_color: bool,
) -> anyhow::Result<()> {
    let mut config = resolved_config();
    if let Some(dir) = dir {
        config.pdf_dir = dir;
    }
    if let Some(db) = db {
        config.db_path = db;
    }
    if let Some(workers) = workers {
        config.num_workers = workers;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.document_timeout_secs = timeout_secs;
    }
    if let Some(dpi) = dpi {
        config.ocr_dpi = dpi;
    }
    if let Some(batch_pages) = batch_pages {
        config.ocr_batch_pages = batch_pages;
    }

    if !config.pdf_dir.is_dir() {
        anyhow::bail!("PDF directory not found: {}", config.pdf_dir.display());
    }
    let paths = list_pdfs(&config.pdf_dir)?;
    if paths.is_empty() {
        println!("No PDF files in {}", config.pdf_dir.display());
        return Ok(());
    }

    let color = ColorMode(!no_color);
    println!(
        "Ingesting {} documents from {} into {}",
        paths.len(),
        config.pdf_dir.display(),
        config.db_path.display()
    );

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let (source, ocr) = wellsift_ingest::default_backends();
    let pool = IngestPool::new(source, ocr, &config, cancel.clone())?;

    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} (eta {eta})")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut receivers = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        receivers.push((name, pool.submit(path).await?));
    }

    let mut summary = RunSummary::default();
    for (name, rx) in receivers {
        match rx.await {
            Ok(outcome) => {
                bar.println(output::outcome_line(&name, &outcome, color));
                summary.record(&outcome);
            }
            // Sender dropped: the worker shut down before taking the job.
            Err(_) => {}
        }
        bar.inc(1);
    }
    pool.shutdown().await;
    bar.finish_and_clear();

    let mut stdout = std::io::stdout();
    output::print_run_summary(&mut stdout, &summary, color)?;
    if cancel.is_cancelled() {
        println!("Interrupted; documents already stored were kept.");
    }

    Ok(())
}

fn wells(db: Option<PathBuf>, no_color: bool) -> anyhow::Result<()> {
    let mut config = resolved_config();
    if let Some(db) = db {
        config.db_path = db;
    }
    if !config.db_path.exists() {
        anyhow::bail!("Database not found: {}", config.db_path.display());
    }

    let store = WellStore::open(&config.db_path)?;
    let wells = store.list_wells()?;
    let counts = store.status_counts()?;

    let mut stdout = std::io::stdout();
    output::print_wells(&mut stdout, &wells, counts, ColorMode(!no_color))?;
    Ok(())
}
