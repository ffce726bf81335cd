//! line-ocr CLI and server
//!
//! Recognizes single-line text images from the command line or over HTTP.
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! line-ocr recognize line.png lines/ --model models/common.onnx --charset models/charset.json
//! line-ocr recognize lines/ --output json --device cuda:0
//! ```
//!
//! ## Server Mode
//! ```bash
//! line-ocr serve --model models/common.onnx --charset models/charset.json --port 8080
//! ```

mod cli;
mod config;
mod ocr;
mod server;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "line-ocr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Single-line text recognition via CLI or HTTP server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand
#[derive(Args)]
struct ModelArgs {
    /// Path to the recognition model (ONNX)
    #[arg(long, env = "LINE_OCR_MODEL")]
    model: PathBuf,

    /// Path to the charset (.json array or one entry per line)
    #[arg(long, env = "LINE_OCR_CHARSET")]
    charset: PathBuf,

    /// Insert a blank entry at index 0 of the charset
    #[arg(long, env = "LINE_OCR_PREPEND_BLANK")]
    prepend_blank: bool,

    /// JSON file with recognizer settings
    #[arg(long, env = "LINE_OCR_CONFIG")]
    config: Option<PathBuf>,

    /// Device to use (cpu, cuda, cuda:0, directml, coreml)
    #[arg(long, default_value = "cpu", env = "LINE_OCR_DEVICE")]
    device: String,
}

impl From<ModelArgs> for config::OcrConfig {
    fn from(args: ModelArgs) -> Self {
        Self {
            model: args.model,
            charset: args.charset,
            prepend_blank: args.prepend_blank,
            device: args.device,
            recognizer_config: args.config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize image files and directories of images
    Recognize {
        /// Image files or directories (png, jpg, jpeg)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = cli::OutputFormat::Pretty)]
        output: cli::OutputFormat,
    },
    /// Start the HTTP server
    Serve {
        #[command(flatten)]
        model: ModelArgs,

        /// Port to listen on
        #[arg(long, short, default_value = "8080", env = "LINE_OCR_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "LINE_OCR_HOST")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    line_ocr::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recognize {
            inputs,
            model,
            output,
        } => {
            let config = config::OcrConfig::from(model);
            info!("Processing {} input path(s)", inputs.len());
            let summary =
                tokio::task::spawn_blocking(move || cli::process_inputs(&inputs, &config, output))
                    .await?;
            if let Err(e) = summary {
                error!(error = %e, "Recognition failed");
                std::process::exit(1);
            }
        }
        Commands::Serve { model, port, host } => {
            let config = config::ServerConfig {
                ocr: config::OcrConfig::from(model),
                host,
                port,
            };

            info!("Starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
    }

    Ok(())
}
