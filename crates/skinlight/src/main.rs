//! skinlight: estimate redness, blemish, and tone-uniformity indices
//! for a facial photograph.
//!
//! Writes a heatmap visualization with a gauge panel and, optionally,
//! a JSON metrics document.
//!
//! # Usage
//!
//! ```text
//! skinlight [OPTIONS] <IMAGE>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use skinlight_io::{AnalysisResult, AnalyzeOptions, DEFAULT_SAVE_PATH, analyze};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Skin-condition indices for a facial photograph.
///
/// Locates the face, segments skin, and scores redness, blemish, and
/// tone uniformity, each in [0, 1].
#[derive(Parser)]
#[command(name = "skinlight", version)]
struct Cli {
    /// Path to the input photo (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Where to write the visualization PNG.
    #[arg(short, long, default_value = DEFAULT_SAVE_PATH)]
    output: PathBuf,

    /// Analyse the whole image instead of the face region.
    #[arg(long)]
    no_auto_face: bool,

    /// Equalize local brightness before segmentation.
    #[arg(long)]
    light_comp: bool,

    /// Also write the metrics JSON document to this path.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// SeetaFace frontal model for face detection.
    ///
    /// Defaults to `seeta_fd_frontal_v1.0.bin` in the working directory.
    /// If that file is absent, detection is skipped with a warning and
    /// the centred fallback region is analysed.
    #[arg(long, value_name = "PATH")]
    face_model: Option<PathBuf>,

    /// Full analysis options as a JSON string.
    ///
    /// When provided, `--no-auto-face`, `--light-comp`, `--json`, and
    /// `--face-model` are ignored. The JSON must be a valid
    /// `AnalyzeOptions` serialization; missing fields take defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print per-stage timings to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print per-stage timings to stderr as JSON.
    #[arg(long, conflicts_with = "diagnostics")]
    diagnostics_json: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Build [`AnalyzeOptions`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual option flags are ignored.
fn options_from_cli(cli: &Cli) -> Result<AnalyzeOptions, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(AnalyzeOptions {
        auto_face: !cli.no_auto_face,
        light_comp: cli.light_comp,
        export_json: cli.json.clone(),
        return_image: false,
        face_model: cli.face_model.clone(),
    })
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_diagnostics(cli: &Cli, result: &AnalysisResult) -> Result<(), String> {
    if cli.diagnostics_json {
        let json = serde_json::to_string_pretty(&result.diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        eprintln!("{json}");
    } else if cli.diagnostics {
        eprintln!("{}", result.diagnostics.report());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = match options_from_cli(&cli) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let result = match analyze(&cli.image_path, &cli.output, &options) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let s = result.scores;
    println!(
        "Redness={:.3}, Blemish={:.3}, Tone={:.3}",
        s.redness, s.blemish, s.tone_uniformity
    );
    println!("Saved → {}", result.result_image.display());
    if let Some(ref json) = result.json_path {
        println!("Metrics → {}", json.display());
    }

    if let Err(msg) = print_diagnostics(&cli, &result) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
