// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use pairprep::{
    Error, Settings,
    labels::{MaskConverter, Progress},
    pairs::{ManifestReader, PairValidator, write_manifest},
};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (TOML). Defaults to pairprep.toml in the user config
    /// directory when present.
    #[clap(long, global = true, env = "PAIRPREP_CONFIG")]
    config: Option<PathBuf>,

    /// Pairprep Command
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Validate a thermal/RGB pairing manifest against the frame directories.
    /// Missing frames are reported but do not fail the command; a malformed
    /// manifest does.
    CheckPairs {
        /// Pairing manifest (JSON)
        #[clap(long, env = "PAIRPREP_MANIFEST")]
        manifest: PathBuf,

        /// Directory of thermal frames
        #[clap(long, env = "PAIRPREP_THERMAL_DIR")]
        thermal_dir: PathBuf,

        /// Directory of RGB frames
        #[clap(long, env = "PAIRPREP_RGB_DIR")]
        rgb_dir: PathBuf,

        /// Number of leading pairs to inspect in detail
        #[clap(long)]
        window: Option<usize>,
    },
    /// Select the pairs whose timing error is below a threshold.
    FilterPairs {
        /// Pairing manifest (JSON)
        #[clap(long, env = "PAIRPREP_MANIFEST")]
        manifest: PathBuf,

        /// Keep pairs with an error strictly below this value in
        /// milliseconds
        #[clap(long)]
        max_error_ms: Option<f64>,

        /// Write the selected pairs to this manifest file
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Convert LabelMe annotations into per-region masks and a pose label
    /// table.
    ConvertLabels {
        /// Directory of LabelMe annotation files
        #[clap(long, env = "PAIRPREP_ANNOTATIONS")]
        annotations: PathBuf,

        /// Image metadata table (CSV)
        #[clap(long, env = "PAIRPREP_METADATA")]
        metadata: PathBuf,

        /// Output dataset directory
        #[clap(long, short, env = "PAIRPREP_OUTPUT")]
        output: PathBuf,
    },
}

fn handle_check_pairs(
    settings: &Settings,
    manifest: PathBuf,
    thermal_dir: PathBuf,
    rgb_dir: PathBuf,
    window: Option<usize>,
) -> Result<(), Error> {
    let manifest = ManifestReader::new().read_json(&manifest)?;

    let mut options = settings.validator_options();
    if let Some(window) = window {
        options.inspection_window = window;
    }

    let report = PairValidator::with_options(thermal_dir, rgb_dir, options).validate(&manifest);
    print!("{}", report);

    let threshold = settings.validator.high_quality_ms;
    let high_quality = manifest.below_error(threshold);
    println!(
        "High-quality pairs (< {:.1} ms): {} of {}",
        threshold,
        high_quality.len(),
        manifest.len()
    );
    Ok(())
}

fn handle_filter_pairs(
    settings: &Settings,
    manifest: PathBuf,
    max_error_ms: Option<f64>,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let threshold = max_error_ms.unwrap_or(settings.validator.high_quality_ms);
    if !threshold.is_finite() {
        return Err(Error::InvalidParameters(format!(
            "max error must be finite: {}",
            threshold
        )));
    }

    let manifest = ManifestReader::new().read_json(&manifest)?;
    let selected = manifest.below_error(threshold);
    println!(
        "Selected {} of {} pairs below {:.1} ms",
        selected.len(),
        manifest.len(),
        threshold
    );

    match output {
        Some(output) => {
            write_manifest(&output, &selected)?;
            println!("Wrote {}", output.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&selected)?),
    }
    Ok(())
}

fn handle_convert_labels(
    settings: &Settings,
    annotations: PathBuf,
    metadata: PathBuf,
    output: PathBuf,
) -> Result<(), Error> {
    use indicatif::{ProgressBar, ProgressStyle};

    let converter =
        MaskConverter::with_options(annotations, metadata, output, settings.convert_options());

    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise} ETA: {eta}] {msg}: {wide_bar:.yellow} {human_pos}/{human_len}",
    ) {
        bar.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
    }
    bar.set_message("Converting");

    let summary = converter.convert_with_progress(|progress: Progress| {
        if progress.total > 0 {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.current as u64);
        }
    });
    bar.finish_and_clear();

    print!("{}", summary?);
    Ok(())
}

#[cfg(feature = "profiling")]
fn init_profiling() {
    use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("pairprep=trace"))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        log::warn!("Profiling disabled: {}", e);
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    #[cfg(feature = "profiling")]
    init_profiling();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    log::debug!("Settings: {:?}", settings);

    match args.cmd {
        Command::CheckPairs {
            manifest,
            thermal_dir,
            rgb_dir,
            window,
        } => handle_check_pairs(&settings, manifest, thermal_dir, rgb_dir, window),
        Command::FilterPairs {
            manifest,
            max_error_ms,
            output,
        } => handle_filter_pairs(&settings, manifest, max_error_ms, output),
        Command::ConvertLabels {
            annotations,
            metadata,
            output,
        } => handle_convert_labels(&settings, annotations, metadata, output),
    }
}
