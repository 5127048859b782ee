//! Pagepatch CLI - offline page editing for local PDF files.
//!
//! Mirrors the service's core operations without the blob store: render
//! page previews, replace a page from an edited image, and merge documents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use pagepatch_core::{
    AppConfig, PageIndex, PageRenderer, PdfDocument, build_replacement_page, merge_documents,
    reconstruct,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pagepatch")]
#[command(author, version, about = "Edit PDF pages from the command line", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every page of a PDF to numbered PNG images
    Render {
        /// Input PDF file
        input: PathBuf,

        /// Output directory for page images
        #[arg(short, long, default_value = "pages")]
        out_dir: PathBuf,

        /// Display width in pixels (defaults to the configured width)
        #[arg(short, long)]
        width: Option<u32>,
    },

    /// Replace one page with an edited image
    Replace {
        /// Input PDF file
        input: PathBuf,

        /// Page to replace (1-based)
        #[arg(short, long)]
        page: usize,

        /// Edited page image (PNG, JPEG, ...)
        #[arg(short, long)]
        image: PathBuf,

        /// Output PDF file (default: <input>_edited.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate PDFs into one document, in argument order
    Merge {
        /// Input PDF files
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Output PDF file
        #[arg(short, long, default_value = "merged.pdf")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    match args.command {
        Command::Render {
            input,
            out_dir,
            width,
        } => render(&config, &input, &out_dir, width),
        Command::Replace {
            input,
            page,
            image,
            output,
        } => replace(&input, page, &image, output),
        Command::Merge { inputs, output } => merge(&inputs, &output),
    }
}

fn render(config: &AppConfig, input: &Path, out_dir: &Path, width: Option<u32>) -> Result<()> {
    let document = PdfDocument::from_file(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let mut render_config = config.render;
    if let Some(width) = width {
        render_config.target_width = width;
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let renderer = PageRenderer::new(&document, render_config);
    let total = document.page_count();
    let progress = ProgressBar::new(total as u64);

    for page_num in 0..total {
        let rendered = renderer
            .render_page_png(page_num)
            .with_context(|| format!("Failed to render page {}", page_num + 1))?;

        let path = out_dir.join(format!("page_{}.png", page_num + 1));
        std::fs::write(&path, &rendered.png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        progress.inc(1);
    }

    progress.finish();
    info!("Rendered {} pages to {}", total, out_dir.display());
    Ok(())
}

fn replace(input: &Path, page: usize, image: &Path, output: Option<PathBuf>) -> Result<()> {
    let document = PdfDocument::from_file(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let page_index = PageIndex::from_page_number(page, document.page_count())
        .with_context(|| format!("Page {} is out of range", page))?;
    let geometry = document.page_geometry(page_index.as_usize())?;

    let image_bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let replacement = build_replacement_page(&image_bytes, geometry)
        .context("Failed to build replacement page")?;

    let result = reconstruct(
        document.bytes(),
        &BTreeMap::from([(page_index.as_usize(), replacement)]),
    )
    .context("Failed to reconstruct document")?;

    let output = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        input.with_file_name(format!("{stem}_edited.pdf"))
    });
    std::fs::write(&output, &result)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Replaced page {} -> {}", page, output.display());
    Ok(())
}

fn merge(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let mut documents = Vec::with_capacity(inputs.len());
    for input in inputs {
        let bytes = std::fs::read(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        documents.push(bytes);
    }

    let merged = merge_documents(&documents).context("Failed to merge documents")?;

    std::fs::write(output, &merged)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Merged {} documents into {}",
        inputs.len(),
        output.display()
    );
    Ok(())
}
