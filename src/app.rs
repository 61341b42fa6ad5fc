//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initialises logging
//! - loads sweeps and runs the find/fit pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, DerivArgs, FindArgs, FitArgs, ReportArgs, RetuneArgs, SynthArgs};
use crate::domain::{FilterKind, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `kids` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Find(args) => handle_find(args),
        Command::Fit(args) => handle_fit(args),
        Command::Retune(args) => handle_retune(args),
        Command::Deriv(args) => handle_deriv(args),
        Command::Synth(args) => handle_synth(args),
        Command::Report(args) => handle_report(args),
    }
}

/// Logs go to stderr so stdout stays clean for reports.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_find(args: FindArgs) -> Result<(), AppError> {
    let config = args.run_config()?;
    let ingest = pipeline::load_input(&config)?;
    let out = pipeline::find_resonances(ingest.sweep, &config)?;
    print_find(&config, &out)?;
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let ingest = pipeline::load_input(&config)?;
    let out = pipeline::fit_resonances(ingest.sweep, &config)?;
    print_find(&config, &out.find)?;

    let fits: Vec<_> = out.fits.values().cloned().collect();
    println!("{}", crate::report::format_fit_table(&fits));

    if let Some(path) = &config.export_fits {
        let file = crate::io::build_fit_file(&config.segment, &out.find.segmentation.windows, &out.fits);
        crate::io::write_fits_json(path, &file)?;
        info!(path = %path.display(), "fits exported");
    }
    Ok(())
}

/// Summary, optional plot, windows export and debug bundle shared by `find` and `fit`.
fn print_find(config: &RunConfig, out: &pipeline::FindOutput) -> Result<(), AppError> {
    let source = config.input.display().to_string();
    println!(
        "{}",
        crate::report::format_find_summary(
            &source,
            out.sweep.len(),
            &config.segment,
            &config.baseline,
            &out.segmentation,
            &out.rows,
        )
    );

    if config.plot {
        let plot = crate::plot::render_trace_plot(
            &out.highpass.residual,
            &out.segmentation.resonator_indices(),
            config.segment.peak_threshold_db,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_windows {
        crate::io::write_windows_csv(path, &out.segmentation.windows, &out.sweep.freqs_hz)?;
        info!(path = %path.display(), "windows exported");
    }
    if let Some(dir) = &config.debug_dir {
        let path = crate::debug::write_debug_bundle(
            dir,
            &source,
            &out.highpass.residual,
            &out.segmentation,
            &config.segment,
            &config.baseline,
        )?;
        info!(path = %path.display(), "debug bundle written");
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<RunConfig, AppError> {
    let mut config = args.find.run_config()?;
    if let Some(path) = &args.fit_config {
        config.fit = crate::io::read_fit_settings(path)?;
    }
    config.fit.amp_norm |= args.amp_norm;
    config.fit.estimate_errors |= args.errors;
    if args.max_evals.is_some() {
        config.fit.max_evaluations = args.max_evals;
    }
    config.q_slice = args.q_slice;
    config.export_fits = args.export_fits.clone();
    config.validate()?;
    Ok(config)
}

fn handle_retune(args: RetuneArgs) -> Result<(), AppError> {
    let ingest = crate::io::load_sweep(&args.input)?;
    let mags = ingest.sweep.magnitude_db();
    let retuned = crate::slice::retune(&mags, &args.indices, args.lookaround())?;

    println!("{:>8} {:>8} {:>16} {:>9}", "before", "after", "freq_hz", "mag_db");
    for (before, after) in args.indices.iter().zip(&retuned) {
        println!(
            "{before:>8} {after:>8} {:>16.1} {:>9.2}",
            ingest.sweep.freqs_hz[*after], mags[*after]
        );
    }
    Ok(())
}

fn handle_deriv(args: DerivArgs) -> Result<(), AppError> {
    let kind: FilterKind = args.filter.parse()?;
    let ingest = crate::io::load_sweep(&args.input)?;
    let sweep = &ingest.sweep;

    let i: Vec<f64> = sweep.z.iter().map(|v| v.re).collect();
    let q: Vec<f64> = sweep.z.iter().map(|v| v.im).collect();
    let (di, dq) = crate::signal::compute_di_dq(&i, &q, Some(&sweep.freqs_hz), kind, !args.smooth_only)?;
    crate::io::write_derivative_csv(&args.output, &sweep.freqs_hz, &di, &dq)?;
    info!(path = %args.output.display(), filter = %kind, samples = sweep.len(), "derivatives written");
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let synth = crate::data::generate_sweep(&args.synth_config())?;
    crate::io::write_sweep_csv(&args.output, &synth.sweep)?;

    println!("{:>4} {:>16} {:>10} {:>6} {:>6}", "#", "fr_hz", "Qr", "amp", "a");
    for (k, p) in synth.truth.iter().enumerate() {
        println!("{k:>4} {:>16.1} {:>10.0} {:>6.3} {:>6.3}", p.fr, p.qr, p.amp, p.a);
    }
    info!(path = %args.output.display(), samples = synth.sweep.len(), "synthetic sweep written");
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let file = crate::io::read_fits_json(&args.fits)?;
    println!("=== kids fit report ({}, {}) ===", file.tool, file.generated);
    println!(
        "Threshold: {:.2} dB | resonators: {}\n",
        file.segment.peak_threshold_db,
        file.fits.len()
    );
    println!("{}", crate::report::format_fit_table(&file.fits));

    for r in &file.fits {
        let fitted: Vec<_> = [&r.iq, &r.magnitude].into_iter().filter_map(|o| o.fitted()).collect();
        if fitted.is_empty() || !(args.params || args.plot) {
            continue;
        }
        println!("--- resonator #{} (index {}) ---", r.resonator, r.minima);
        for fit in fitted {
            if args.params {
                println!("{}", crate::report::format_fit_params(fit));
            }
            if args.plot {
                println!("{}", crate::plot::render_fit_plot(fit, args.width, args.height));
            }
        }
    }
    Ok(())
}
