//! CLI mode for line recognition.

use crate::config::OcrConfig;
use crate::ocr::{AppError, BatchOcrResponse, OcrEngine};
use clap::ValueEnum;
use line_ocr::pipeline::{BatchSummary, LineOutcome, sources_from_paths};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
    #[default]
    Pretty,
}

/// Recognize files and directories of line images
pub fn process_inputs(
    inputs: &[PathBuf],
    config: &OcrConfig,
    format: OutputFormat,
) -> Result<BatchSummary, AppError> {
    let start = Instant::now();

    let sources = sources_from_paths(inputs).map_err(AppError::Input)?;
    info!("Collected {} images", sources.len());

    info!("Initializing recognizer...");
    let engine = OcrEngine::new(config)?;
    let init_time = start.elapsed();
    info!("Recognizer initialized in {:.2}ms", init_time.as_secs_f64() * 1000.0);

    let ocr_start = Instant::now();
    let (outcomes, summary) = engine.process(&sources);
    let processing_time_ms = ocr_start.elapsed().as_secs_f64() * 1000.0;

    output_results(&outcomes, summary, format, processing_time_ms)?;
    Ok(summary)
}

/// Print outcomes in the requested format
fn output_results(
    outcomes: &[LineOutcome],
    summary: BatchSummary,
    format: OutputFormat,
    processing_time_ms: f64,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            let response = BatchOcrResponse::from_outcomes(outcomes, summary, processing_time_ms);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            for outcome in outcomes {
                match &outcome.result {
                    Ok(line) => println!("{}\t{}", outcome.identifier, line.text),
                    Err(err) => eprintln!("{}\terror: {}", outcome.identifier, err),
                }
            }
        }
        OutputFormat::Pretty => {
            println!("\n=== Line OCR Results ===");
            println!("Images: {}", summary.total);
            println!("Recognized: {}", summary.succeeded);
            println!("Failed: {}", summary.failed);
            println!("Processing time: {:.2}ms", processing_time_ms);
            println!();

            for (idx, outcome) in outcomes.iter().enumerate() {
                match &outcome.result {
                    Ok(line) => {
                        println!("[{}] {}", idx + 1, outcome.identifier);
                        println!("    \"{}\"", line.text);
                        println!(
                            "    Tensor width: {}, frames: {}",
                            line.tensor_width, line.sequence_length
                        );
                    }
                    Err(err) => {
                        println!("[{}] {}", idx + 1, outcome.identifier);
                        println!("    Error: {}", err);
                    }
                }
            }
        }
    }

    Ok(())
}
