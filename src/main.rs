use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray_npy::WriteNpyExt;
use rayon::prelude::*;
use tracing::{error, info};

use speech_pitch::f0::F0Series;
use speech_pitch::{init_logging, AnalysisResult, AnalyzerConfig, PitchAnalyzer};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// input wav file paths.
    #[clap(required = true)]
    input: Vec<PathBuf>,

    /// TOML file with analyzer settings. [default: $SPEECH_PITCH_CONFIG, or built-in defaults]
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// gap between adjacent f0 estimates in milliseconds.
    #[clap(long)]
    frame_period_ms: Option<f64>,

    /// lowest f0 searched in Hz.
    #[clap(long)]
    f0_floor: Option<f64>,

    /// highest f0 searched in Hz.
    #[clap(long)]
    f0_ceil: Option<f64>,

    /// directory to write each f0 contour to as `<stem>.npy`.
    #[clap(long)]
    f0_out: Option<PathBuf>,

    /// print debug logs to stderr.
    #[clap(short, long)]
    verbose: bool,
}

impl Cli {
    fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config \"{}\"", path.display()))?,
            None => AnalyzerConfig::from_env(),
        };
        if let Some(x) = self.frame_period_ms {
            config.frame_period_ms = x;
        }
        if let Some(x) = self.f0_floor {
            config.f0_floor = x;
        }
        if let Some(x) = self.f0_ceil {
            config.f0_ceil = x;
        }
        config.validate()?;
        Ok(config)
    }
}

/// `<stem>.npy`, keeping every dot of the stem.
fn npy_file_name(input: &Path) -> OsString {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".npy");
    name
}

fn write_contour(series: &F0Series, input: &Path, out_dir: &Path) -> Result<()> {
    let out_path = out_dir.join(npy_file_name(input));
    let writer = BufWriter::new(
        File::create(&out_path)
            .with_context(|| format!("Could not create output file \"{}\"", out_path.display()))?,
    );
    series.f0().write_npy(writer)?;
    info!(path = %out_path.display(), "f0 contour written");
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "warn" });

    let analyzer = PitchAnalyzer::new(cli.analyzer_config()?);
    if let Some(out_dir) = &cli.f0_out {
        std::fs::create_dir_all(out_dir)?;
    }

    let results: Vec<AnalysisResult> = cli
        .input
        .par_iter()
        .map(|input| {
            analyzer.report_with(input, |series| {
                let Some(out_dir) = &cli.f0_out else {
                    return;
                };
                if let Err(e) = write_contour(series, input, out_dir) {
                    error!(path = %input.display(), "{e:#}");
                }
            })
        })
        .collect();

    let mut stdout = io::stdout().lock();
    for result in &results {
        writeln!(stdout, "{}", result.to_json())?;
    }

    Ok(if results.iter().all(AnalysisResult::is_success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
