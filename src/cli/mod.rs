//! Command-line parsing for the KID resonance finder.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! **command dispatch** (`app`) and from the segmentation/fitting code.
//! Conversions into validated configuration live here too, so every
//! subcommand builds its settings the same way.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::SynthConfig;
use crate::domain::{BaselineConfig, FilterKind, RunConfig, SegmentConfig};
use crate::error::AppError;
use crate::slice::Lookaround;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "kids", version, about = "KID resonance finder and fitter")]
pub struct Cli {
    /// Log filter when `RUST_LOG` is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find resonances: baseline removal, thresholding, windows.
    Find(FindArgs),
    /// Find resonances, then fit the IQ and magnitude models to each.
    Fit(FitArgs),
    /// Re-centre resonator indices on the deepest nearby sample.
    Retune(RetuneArgs),
    /// Write filtered dI/dQ of a sweep.
    Deriv(DerivArgs),
    /// Write a synthetic multi-resonator sweep.
    Synth(SynthArgs),
    /// Print the fit table of a saved fit JSON.
    Report(ReportArgs),
}

/// Options shared by `find` and `fit`.
#[derive(Debug, Args, Clone)]
pub struct FindArgs {
    /// Sweep CSV (`freq_hz,i,q[,std_i,std_q]`, or `sweep_hz` with `i@<bb_hz>,q@<bb_hz>` channel pairs).
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Samples deeper than `-threshold` dB (after baseline removal) form dip regions.
    #[arg(short = 't', long, default_value_t = 1.5)]
    pub threshold: f64,

    /// Minimum spacing between two resonances (Hz).
    #[arg(long, default_value_t = 1.0e5)]
    pub spacing: f64,

    /// Window pad as a multiple of the dip half-width.
    #[arg(long, default_value_t = 1.2)]
    pub window_pad: f64,

    /// Fitter pad as a multiple of the dip half-width.
    #[arg(long, default_value_t = 5.0)]
    pub fitter_pad: f64,

    /// Features narrower than this (Hz) survive baseline removal.
    #[arg(long, default_value_t = 5.0e6)]
    pub smoothing: f64,

    /// Derivative filter for the IQ speed: gradient (or none), sg, sggrad.
    #[arg(long, default_value = "sg")]
    pub filter: String,

    /// Render an ASCII plot of the high-pass trace.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the windows to CSV.
    #[arg(long = "export-windows", value_name = "CSV")]
    pub export_windows: Option<PathBuf>,

    /// Write a markdown debug bundle into this directory.
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = "debug")]
    pub debug: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub find: FindArgs,

    /// JSON fit settings (bounds, guesses, toggles); flags below override it.
    #[arg(long = "fit-config", value_name = "JSON")]
    pub fit_config: Option<PathBuf>,

    /// Divide out the off-resonance gain before fitting.
    #[arg(long)]
    pub amp_norm: bool,

    /// Report parameter standard errors.
    #[arg(long)]
    pub errors: bool,

    /// Solver budget per fit (model evaluations).
    #[arg(long)]
    pub max_evals: Option<usize>,

    /// Slice a fixed-Q span around each resonance instead of its window.
    #[arg(long, value_name = "Q")]
    pub q_slice: Option<f64>,

    /// Export every fit to JSON.
    #[arg(long = "export-fits", value_name = "JSON")]
    pub export_fits: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RetuneArgs {
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Resonator sample indices, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub indices: Vec<usize>,

    /// Samples searched on both sides.
    #[arg(long, default_value_t = 10)]
    pub look_around: usize,

    /// Samples searched below (overrides `--look-around`).
    #[arg(long)]
    pub look_low: Option<usize>,

    /// Samples searched above (overrides `--look-around`).
    #[arg(long)]
    pub look_high: Option<usize>,
}

impl RetuneArgs {
    pub fn lookaround(&self) -> Lookaround {
        Lookaround {
            low: self.look_low.unwrap_or(self.look_around),
            high: self.look_high.unwrap_or(self.look_around),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DerivArgs {
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Output CSV (`freq_hz,di,dq,speed`).
    #[arg(short, long, value_name = "CSV")]
    pub output: PathBuf,

    /// gradient (or none), sg, sggrad.
    #[arg(long, default_value = "sg")]
    pub filter: String,

    /// Write the smoothed I/Q instead of their derivatives (`sg` only).
    #[arg(long)]
    pub smooth_only: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    #[arg(short, long, value_name = "CSV")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 3.0e8)]
    pub start: f64,

    #[arg(long, default_value_t = 3.4e8)]
    pub stop: f64,

    #[arg(long, default_value_t = 8000)]
    pub points: usize,

    #[arg(long, default_value_t = 8)]
    pub resonators: usize,

    /// I/Q noise standard deviation.
    #[arg(long, default_value_t = 1.0e-3)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl SynthArgs {
    pub fn synth_config(&self) -> SynthConfig {
        SynthConfig {
            start_hz: self.start,
            stop_hz: self.stop,
            points: self.points,
            resonators: self.resonators,
            noise: self.noise,
            seed: self.seed,
            ..SynthConfig::default()
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Fit JSON produced by `kids fit --export-fits`.
    #[arg(value_name = "JSON")]
    pub fits: PathBuf,

    /// Print every parameter with its start value and standard error.
    #[arg(long)]
    pub params: bool,

    /// Plot every successful fit.
    #[arg(long)]
    pub plot: bool,

    #[arg(long, default_value_t = 80)]
    pub width: usize,

    #[arg(long, default_value_t = 16)]
    pub height: usize,
}

impl FindArgs {
    /// Build and validate the run configuration (fit settings at their defaults).
    pub fn run_config(&self) -> Result<RunConfig, AppError> {
        let config = RunConfig {
            segment: SegmentConfig {
                peak_threshold_db: self.threshold,
                spacing_threshold_hz: self.spacing,
                window_pad_factor: self.window_pad,
                fitter_pad_factor: self.fitter_pad,
            },
            baseline: BaselineConfig {
                smoothing_scale_hz: self.smoothing,
            },
            filter: self.filter.parse::<FilterKind>()?,
            plot: self.plot,
            plot_width: self.width,
            plot_height: self.height,
            export_windows: self.export_windows.clone(),
            debug_dir: self.debug.clone(),
            ..RunConfig::for_input(self.input.clone())
        };
        config.validate()?;
        Ok(config)
    }
}
