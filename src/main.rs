//! cover-forge – command-line cover page composer and PDF merger.
//!
//! Usage:
//!   cover-forge <note.html> [docs.pdf...] [-o out.pdf] [--order '["b.pdf","a.pdf"]']
//!
//! Without documents only the cover page is written. If `-o` is omitted the
//! result is written to `merged-document-YYYY-MM-DD.pdf` in the current
//! directory.

use std::fs;
use std::path::PathBuf;
use std::process;

use chrono::Local;
use clap::Parser;

use cover_forge::cover::ConversionRequest;
use cover_forge::error::Result;
use cover_forge::pipeline::{
    compose_cover_page, compute_layout_config, merge_documents, output_file_name, parse_order,
    read_documents, MergeRequest, PipelineConfig,
};

#[derive(Parser)]
#[command(name = "cover-forge")]
#[command(version)]
#[command(about = "Render a rich-text cover note and merge it with PDF documents", long_about = None)]
struct Cli {
    /// Cover note markup (HTML as emitted by a rich-text editor)
    #[arg(value_name = "NOTE")]
    note: PathBuf,

    /// PDF documents to append after the cover page
    #[arg(value_name = "PDF")]
    documents: Vec<PathBuf>,

    /// Output file (default: merged-document-<date>.pdf)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Merge order as a JSON array of document file names
    #[arg(long, value_name = "JSON")]
    order: Option<String>,

    /// Document title in PDF metadata
    #[arg(short, long)]
    title: Option<String>,

    /// Footer timestamp (default: local time, dd.mm.yyyy HH:MM UTC+hh:mm)
    #[arg(long)]
    timestamp: Option<String>,

    /// Directory holding the DejaVu Sans font family
    #[arg(long, value_name = "DIR")]
    font_dir: Option<PathBuf>,

    /// Print the cover page layout as JSON instead of writing a PDF
    #[arg(long)]
    dump_layout: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let markup = fs::read_to_string(&cli.note)?;

    let mut config = PipelineConfig {
        timestamp: cli.timestamp,
        ..PipelineConfig::default()
    };
    if let Some(title) = cli.title {
        config.title = title;
    }
    if let Some(dir) = cli.font_dir {
        config.font_dir = dir;
    }
    let fonts = config.load_fonts();

    let (documents, unreadable) = read_documents(&cli.documents);
    let order = match &cli.order {
        Some(json) => Some(parse_order(json)?),
        None => None,
    };

    if cli.dump_layout {
        let names = match &order {
            Some(order) if !order.is_empty() => order.clone(),
            _ => documents.iter().map(|d| d.name.clone()).collect(),
        };
        let request = ConversionRequest::new(markup, names);
        let layout = compute_layout_config(&request, &config, &fonts)?;
        println!("{}", layout.to_json());
        return Ok(());
    }

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(output_file_name(Local::now().date_naive())));

    let (bytes, pages, mut failed) = if documents.is_empty() && order.is_none() {
        let request = ConversionRequest::new(markup, Vec::new());
        let (bytes, layout) = compose_cover_page(&request, &config, &fonts)?;
        let pages = layout.pages.len();
        (bytes, pages, Vec::new())
    } else {
        let request = MergeRequest {
            markup,
            documents,
            order,
        };
        let outcome = merge_documents(&request, &config, &fonts)?;
        (outcome.pdf, outcome.page_count, outcome.failed)
    };

    failed.extend(unreadable);

    // Create output directory if necessary.
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output, &bytes)?;

    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
    if !failed.is_empty() {
        eprintln!("Skipped unreadable documents: {}", failed.join(", "));
    }
    Ok(())
}
