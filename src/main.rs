//! CLI tool for renaming Bukti Potong PPh 21 PDFs from their own contents.
//!
//! Reads one or more slips, extracts their fields, and writes a zip archive
//! holding every original file under a name built from the chosen fields.

use anyhow::{Context, Result};
use bp21rename::{
    plan_entries, write_archive, Compression, DocumentBatch, DuplicatePolicy, Extraction, Field,
    FieldExtractor, FieldSelection, LopdfTextSource, RenameConfig, DEFAULT_ARCHIVE_NAME,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bp21rename", about = "Rename Bukti Potong PPh 21 PDFs from their contents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields and write renamed copies into a zip archive
    Rename {
        /// PDF files, processed in the given order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Comma-separated fields forming the name, e.g. "nomor,nama-penerima"
        #[arg(short, long, default_value = "")]
        fields: String,
        /// Archive to write
        #[arg(short, long, default_value = DEFAULT_ARCHIVE_NAME)]
        output: PathBuf,
        /// Token placed at the start of every filename
        #[arg(long, default_value = "BP21")]
        prefix: String,
        /// What to do when two documents get the same name
        #[arg(long, value_enum, default_value_t = OnDuplicate::Number)]
        on_duplicate: OnDuplicate,
        /// Store entries without compression
        #[arg(long)]
        store: bool,
        /// Skip documents larger than this many bytes
        #[arg(long)]
        max_size: Option<usize>,
    },
    /// List the field catalog
    Fields,
    /// Print the fields extracted from each PDF
    Inspect {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OnDuplicate {
    Number,
    Reject,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fields => {
            for field in Field::ALL {
                println!("{:<18} {}", field.slug(), field.key());
            }
            Ok(())
        }
        Commands::Inspect { inputs, json } => {
            let config = RenameConfig::default();
            let batch = load_batch(&inputs, &config)?;
            if json {
                print_json(&batch)
            } else {
                print_records(&batch);
                Ok(())
            }
        }
        Commands::Rename {
            inputs,
            fields,
            output,
            prefix,
            on_duplicate,
            store,
            max_size,
        } => {
            let selection: FieldSelection = fields.parse()?;
            let config = RenameConfig {
                prefix,
                duplicates: match on_duplicate {
                    OnDuplicate::Number => DuplicatePolicy::Number,
                    OnDuplicate::Reject => DuplicatePolicy::Reject,
                },
                compression: if store {
                    Compression::Stored
                } else {
                    Compression::Deflated
                },
                max_document_size: max_size,
                ..Default::default()
            };
            run_rename(&inputs, &selection, &output, &config)
        }
    }
}

fn run_rename(
    inputs: &[PathBuf],
    selection: &FieldSelection,
    output: &Path,
    config: &RenameConfig,
) -> Result<()> {
    let batch = load_batch(inputs, config)?;
    let entries = plan_entries(&batch, selection, config)?;

    println!("{}", "─".repeat(72));
    let mut names = entries.iter().map(|e| e.name.as_str());
    for (i, item) in batch.iter().enumerate() {
        let target = if item.archivable() {
            names.next().unwrap_or("-")
        } else {
            "(not archived)"
        };
        println!(
            "{:>3}. [{:<7}] {} → {}",
            i + 1,
            item.outcome.label(),
            item.original_name,
            target
        );
        if let Extraction::Failed { reason } = &item.outcome {
            println!("       {reason}");
        }
    }
    println!("{}", "─".repeat(72));

    let file = File::create(output)
        .with_context(|| format!("cannot create archive '{}'", output.display()))?;
    write_archive(&entries, file, config)
        .with_context(|| format!("failed to write archive '{}'", output.display()))?;

    let summary = batch.summary();
    let total_size: usize = entries.iter().map(|e| e.bytes.len()).sum();
    println!(
        "{} file(s), {} archived, {} ({} ok, {} without text, {} failed) → {}",
        summary.total(),
        entries.len(),
        format_bytes(total_size),
        summary.extracted,
        summary.unreadable,
        summary.failed,
        output.display()
    );
    Ok(())
}

/// Read every input and run extraction. A file that cannot be read stays in
/// the batch as a failed item.
fn load_batch(inputs: &[PathBuf], config: &RenameConfig) -> Result<DocumentBatch> {
    let documents = inputs.iter().map(|path| (display_name(path), fs::read(path)));

    let batch = DocumentBatch::process_loaded(
        documents,
        &LopdfTextSource,
        &FieldExtractor::new(),
        config,
    )?;
    Ok(batch)
}

fn print_records(batch: &DocumentBatch) {
    for item in batch {
        println!("📄 {} [{}]", item.original_name, item.outcome.label());
        match &item.outcome {
            Extraction::Failed { reason } => println!("   {reason}"),
            Extraction::Extracted(record) | Extraction::Unreadable(record) => {
                for (field, value) in record.iter() {
                    println!("   {:<30} {}", field.key(), value);
                }
            }
        }
        println!();
    }
}

fn print_json(batch: &DocumentBatch) -> Result<()> {
    let rows: Vec<serde_json::Value> = batch
        .iter()
        .map(|item| -> Result<serde_json::Value> {
            let mut row = serde_json::json!({
                "file": item.original_name,
                "status": item.outcome.label(),
            });
            match &item.outcome {
                Extraction::Failed { reason } => row["error"] = reason.as_str().into(),
                Extraction::Extracted(record) | Extraction::Unreadable(record) => {
                    row["fields"] = serde_json::to_value(record)?;
                }
            }
            Ok(row)
        })
        .collect::<Result<_>>()?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
