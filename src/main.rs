//! # Proforma CLI
//!
//! Command-line interface for invoice template rendering.
//!
//! ## Usage
//!
//! ```bash
//! # List available presets
//! proforma presets
//!
//! # PNG preview of the built-in sample with a preset
//! proforma preview --preset modern --png preview.png
//!
//! # Thumbnail of your own document with stored settings
//! proforma preview --invoice doc.json --settings settings.json --thumbnail --png thumb.png
//!
//! # Export a PDF (file name derived from the document number)
//! proforma render --invoice doc.json --preset classic
//!
//! # Export as base64 JSON
//! proforma render --base64 --out export.json
//!
//! # Run the HTTP server
//! proforma serve --listen 0.0.0.0:8080
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use proforma::{
    ProformaError,
    export::{ExportConfig, ExportOutput, Exporter, OutputEncoding, Stage, View},
    invoice::InvoiceDocument,
    layout,
    presets,
    raster::{PreviewSize, preview_png},
    server::{self, ServerConfig},
    settings::{PartialSettings, TemplateSettings, resolve},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Proforma - Invoice template rendering and PDF export
#[derive(Parser, Debug)]
#[command(name = "proforma")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the document and its settings come from.
#[derive(Args, Debug)]
struct DocumentArgs {
    /// Invoice document JSON (defaults to the built-in sample)
    #[arg(long, value_name = "FILE")]
    invoice: Option<PathBuf>,

    /// Stored settings JSON; missing or invalid fields fall back to defaults
    #[arg(long, value_name = "FILE", conflicts_with = "preset")]
    settings: Option<PathBuf>,

    /// Start from a named preset instead of stored settings
    #[arg(long)]
    preset: Option<String>,
}

/// Export tuning flags.
#[derive(Args, Debug)]
struct ExportArgs {
    /// Capture oversampling factor
    #[arg(long, default_value = "2.0")]
    oversample: f32,

    /// Per-image preload timeout in seconds
    #[arg(long, default_value = "30")]
    image_timeout_secs: u64,
}

impl ExportArgs {
    fn config(&self) -> ExportConfig {
        ExportConfig {
            oversample: self.oversample,
            image_timeout: Duration::from_secs(self.image_timeout_secs),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available presets
    Presets,

    /// Render a PNG preview
    Preview {
        #[command(flatten)]
        document: DocumentArgs,

        /// Render at thumbnail scale
        #[arg(long)]
        thumbnail: bool,

        /// Output PNG file
        #[arg(long, value_name = "FILE", default_value = "preview.png")]
        png: PathBuf,

        /// Per-image preload timeout in seconds
        #[arg(long, default_value = "30")]
        image_timeout_secs: u64,
    },

    /// Export a paginated PDF
    Render {
        #[command(flatten)]
        document: DocumentArgs,

        #[command(flatten)]
        export: ExportArgs,

        /// Output file (defaults to the derived artifact name)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Write base64 JSON instead of raw PDF bytes
        #[arg(long)]
        base64: bool,
    },

    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        #[command(flatten)]
        export: ExportArgs,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ProformaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Presets => {
            println!("Available presets:");
            for preset in presets::catalog() {
                println!("  {:<10} {}", preset.name, preset.description);
            }
        }

        Commands::Preview {
            document,
            thumbnail,
            png,
            image_timeout_secs,
        } => {
            let (doc, settings) = load_inputs(&document)?;
            let rendered = layout::render(&doc, &settings);

            let config = ExportConfig {
                image_timeout: Duration::from_secs(image_timeout_secs),
                ..Default::default()
            };
            let exporter = Exporter::with_defaults(config)?;
            let assets = exporter.preload(&rendered).await;

            let size = if thumbnail { PreviewSize::Thumbnail } else { PreviewSize::Full };
            let bytes = preview_png(&rendered, size, &assets)?;
            std::fs::write(&png, bytes)?;
            println!("Saved to {}", png.display());
        }

        Commands::Render {
            document,
            export,
            out,
            base64,
        } => {
            let (doc, settings) = load_inputs(&document)?;
            let rendered = layout::render(&doc, &settings);
            let id = doc.meta.number.clone();

            let mut stage = Stage::new();
            stage.mount(View::new(id.as_str(), rendered));

            let exporter = Exporter::with_defaults(export.config())?;
            let artifact = exporter.export_to_pdf(&mut stage, &id).await?;
            let pages = artifact.page_count;

            let encoding = if base64 { OutputEncoding::Base64 } else { OutputEncoding::File };
            let path = match artifact.encode(encoding) {
                ExportOutput::File { file_name, bytes } => {
                    let path = out.unwrap_or_else(|| PathBuf::from(file_name));
                    std::fs::write(&path, bytes)?;
                    path
                }
                output @ ExportOutput::Base64 { .. } => {
                    let path = out.unwrap_or_else(|| PathBuf::from("export.json"));
                    std::fs::write(&path, serde_json::to_vec_pretty(&output)?)?;
                    path
                }
            };
            println!("Exported {} page(s) to {}", pages, path.display());
        }

        Commands::Serve { listen, export } => {
            server::serve(ServerConfig {
                listen_addr: listen,
                export: export.config(),
            })
            .await?;
        }
    }

    Ok(())
}

/// Read the document and resolve its settings.
fn load_inputs(args: &DocumentArgs) -> Result<(InvoiceDocument, TemplateSettings), ProformaError> {
    let doc = match &args.invoice {
        Some(path) => serde_json::from_str::<InvoiceDocument>(&read(path)?)?,
        None => InvoiceDocument::sample(),
    };
    doc.validate()?;
    doc.reconcile();

    let settings = if let Some(name) = &args.preset {
        let preset = presets::by_name(name).ok_or_else(|| ProformaError::UnknownPreset(name.clone()))?;
        presets::apply_preset(preset)
    } else if let Some(path) = &args.settings {
        resolve(Some(&PartialSettings::from_json(&read(path)?)?))
    } else {
        TemplateSettings::default()
    };

    Ok((doc, settings))
}

fn read(path: &Path) -> Result<String, ProformaError> {
    Ok(std::fs::read_to_string(path)?)
}
