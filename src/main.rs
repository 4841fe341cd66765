use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use flatshard::{DatasetExtractor, ExtractConfig, IndexScope, shard_row_count};
use tracing::error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Extract data from Parquet dataset shards into a single CSV file.
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Directory containing the parquet files
    #[arg(long, env = "FLATSHARD_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Output CSV file
    #[arg(long, default_value = "extracted_dataset.csv")]
    output: PathBuf,

    /// Only list the shards without extracting
    #[arg(long)]
    info_only: bool,

    /// Save images to a local directory
    #[arg(long)]
    save_images: bool,

    /// Directory to save images to
    #[arg(long, env = "FLATSHARD_IMAGES_DIR", default_value = "images")]
    images_dir: PathBuf,

    /// Column holding the image payload
    #[arg(long, default_value = flatshard::config::DEFAULT_IMAGE_COLUMN)]
    image_column: String,

    /// Number image files across all shards instead of restarting per shard
    #[arg(long)]
    global_index: bool,

    /// Decode image payloads (saved images are re-encoded as PNG)
    #[arg(long)]
    decode_images: bool,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "FLATSHARD_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Opts {
    fn config(&self) -> ExtractConfig {
        ExtractConfig {
            data_dir: self.data_dir.clone(),
            output_file: self.output.clone(),
            save_images: self.save_images,
            images_dir: self.images_dir.clone(),
            image_column: self.image_column.clone(),
            index_scope: if self.global_index {
                IndexScope::Global
            } else {
                IndexScope::PerShard
            },
            decode_images: self.decode_images,
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let writer = match log_file {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("create {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .init();
    Ok(())
}

fn print_shard_listing(extractor: &DatasetExtractor) -> Result<()> {
    let shards = extractor.find_shards()?;
    println!("\nDataset Information:");
    println!("Data directory: {}", extractor.config().data_dir.display());
    println!("Number of parquet files: {}", shards.len());
    println!("Parquet files found:");
    for shard in shards.iter().take(5) {
        match shard_row_count(&shard.path) {
            Ok(rows) => println!("  {}. {} ({rows} rows)", shard.ordinal + 1, shard.file_name()),
            Err(_) => println!("  {}. {} (unreadable)", shard.ordinal + 1, shard.file_name()),
        }
    }
    if shards.len() > 5 {
        println!("  ... and {} more files", shards.len() - 5);
    }
    Ok(())
}

fn print_preview(extractor: &DatasetExtractor) {
    let table = extractor.table();
    if table.is_empty() {
        return;
    }
    println!("\nSample data (first 3 rows):");
    println!("{}", table.columns().join(" | "));
    for row in table.rows().take(3) {
        println!("{}", row.join(" | "));
    }
}

fn count_png_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, |entries| {
        entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
            .count()
    })
}

fn run(opts: &Opts) -> Result<()> {
    let mut extractor = DatasetExtractor::new(opts.config())?;
    if opts.info_only {
        return print_shard_listing(&extractor);
    }

    extractor.extract_all()?;
    extractor.save_csv()?;
    print_preview(&extractor);

    let summary = extractor.summary()?;
    summary.print();
    if opts.save_images {
        println!("Images saved to: {}", opts.images_dir.display());
        println!("Images saved: {}", count_png_files(&opts.images_dir));
    }
    if let Some(path) = &opts.summary_json {
        summary.save_to_file(path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    if let Err(e) = init_logging(opts.log_file.as_deref()) {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("extraction failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
