//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during segmentation and fitting
//! - exported to JSON/CSV
//! - reloaded later for reporting or comparisons

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{IQ_PARAM_NAMES, MAG_PARAM_NAMES};

/// A complex S21 frequency sweep.
///
/// Frequencies are in Hz and strictly increasing. `z` holds `I + jQ` per sample.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub freqs_hz: Vec<f64>,
    pub z: Vec<Complex64>,
    pub std_i: Option<Vec<f64>>,
    pub std_q: Option<Vec<f64>>,
}

impl Sweep {
    pub fn new(freqs_hz: Vec<f64>, z: Vec<Complex64>) -> Result<Self, AppError> {
        if freqs_hz.len() != z.len() {
            return Err(AppError::input(format!(
                "Sweep has {} frequencies but {} IQ samples.",
                freqs_hz.len(),
                z.len()
            )));
        }
        if freqs_hz.len() < 2 {
            return Err(AppError::input("Sweep needs at least two samples."));
        }
        if freqs_hz.iter().any(|f| !f.is_finite()) {
            return Err(AppError::input("Sweep frequencies must be finite."));
        }
        if let Some(pos) = freqs_hz.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AppError::input(format!(
                "Sweep frequencies must be strictly increasing (sample {} -> {}).",
                pos,
                pos + 1
            )));
        }
        Ok(Self {
            freqs_hz,
            z,
            std_i: None,
            std_q: None,
        })
    }

    /// Attach per-sample standard deviations of I and Q.
    pub fn with_std(mut self, std_i: Vec<f64>, std_q: Vec<f64>) -> Result<Self, AppError> {
        if std_i.len() != self.len() || std_q.len() != self.len() {
            return Err(AppError::input("Standard deviation arrays must match the sweep length."));
        }
        self.std_i = Some(std_i);
        self.std_q = Some(std_q);
        Ok(self)
    }

    /// Concatenate a multi-channel sweep onto one frequency axis.
    ///
    /// `i[sample][channel]` / `q[sample][channel]`; channel `c` sits at
    /// `sweep_freqs + baseband_freqs[c]`.
    pub fn stitch_channels(
        sweep_freqs: &[f64],
        baseband_freqs: &[f64],
        i: &[Vec<f64>],
        q: &[Vec<f64>],
    ) -> Result<Self, AppError> {
        if i.len() != sweep_freqs.len() || q.len() != sweep_freqs.len() {
            return Err(AppError::input("I/Q arrays must have one row per sweep point."));
        }
        let n_chan = baseband_freqs.len();
        if i.iter().chain(q.iter()).any(|row| row.len() != n_chan) {
            return Err(AppError::input(format!(
                "Every I/Q row must carry {n_chan} channels."
            )));
        }

        let mut freqs = Vec::with_capacity(n_chan * sweep_freqs.len());
        let mut z = Vec::with_capacity(n_chan * sweep_freqs.len());
        for (chan, &bb) in baseband_freqs.iter().enumerate() {
            for (k, &sf) in sweep_freqs.iter().enumerate() {
                freqs.push(sf + bb);
                z.push(Complex64::new(i[k][chan], q[k][chan]));
            }
        }
        Self::new(freqs, z)
    }

    pub fn len(&self) -> usize {
        self.freqs_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs_hz.is_empty()
    }

    /// Sample spacing Δf (Hz), taken from the first two samples.
    pub fn sample_spacing(&self) -> f64 {
        self.freqs_hz[1] - self.freqs_hz[0]
    }

    /// `20·log10|z|` per sample.
    pub fn magnitude_db(&self) -> Vec<f64> {
        self.z.iter().map(|v| 20.0 * v.norm().log10()).collect()
    }

    pub fn trace(&self) -> Trace {
        Trace {
            freqs_hz: self.freqs_hz.clone(),
            mags_db: self.magnitude_db(),
        }
    }

    /// Keep only the first `len` samples.
    pub fn truncate(&mut self, len: usize) {
        self.freqs_hz.truncate(len);
        self.z.truncate(len);
        if let Some(s) = self.std_i.as_mut() {
            s.truncate(len);
        }
        if let Some(s) = self.std_q.as_mut() {
            s.truncate(len);
        }
    }
}

/// A magnitude trace in dB over a frequency axis in Hz.
#[derive(Debug, Clone)]
pub struct Trace {
    pub freqs_hz: Vec<f64>,
    pub mags_db: Vec<f64>,
}

impl Trace {
    pub fn new(freqs_hz: Vec<f64>, mags_db: Vec<f64>) -> Result<Self, AppError> {
        if freqs_hz.len() != mags_db.len() {
            return Err(AppError::input(format!(
                "Trace has {} frequencies but {} magnitudes.",
                freqs_hz.len(),
                mags_db.len()
            )));
        }
        if let Some(pos) = freqs_hz.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(AppError::input(format!(
                "Trace frequencies must be strictly increasing (sample {} -> {}).",
                pos,
                pos + 1
            )));
        }
        Ok(Self { freqs_hz, mags_db })
    }

    pub fn len(&self) -> usize {
        self.freqs_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs_hz.is_empty()
    }
}

/// Anything that sits at a sample index of the trace.
///
/// The spacing-conflict resolver is generic over this so it can carry bare
/// indices or minima.
pub trait DataIndex {
    fn data_index(&self) -> usize;
}

impl DataIndex for usize {
    fn data_index(&self) -> usize {
        *self
    }
}

/// A maximal run of samples below the threshold (`start..=end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: usize,
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A local minimum inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minimum {
    /// Sample index in the trace.
    pub index: usize,
    /// Id of the enclosing region.
    pub region: usize,
    /// Position within the region (`index - region.start`).
    pub offset: usize,
}

impl DataIndex for Minimum {
    fn data_index(&self) -> usize {
        self.index
    }
}

/// Per-resonator partition of the frequency axis.
///
/// Ordering invariant:
/// `left_max <= left_fitter_pad <= left_pad <= left_window <= minima
///  <= right_window <= right_pad <= right_fitter_pad <= right_max`.
///
/// Read as the half-open range `[left_max, right_max)`, consecutive windows
/// tile the trace without gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub left_max: usize,
    pub left_fitter_pad: usize,
    pub left_pad: usize,
    pub left_window: usize,
    pub minima: usize,
    pub right_window: usize,
    pub right_pad: usize,
    pub right_fitter_pad: usize,
    pub right_max: usize,
}

impl Window {
    pub const FIELD_NAMES: [&'static str; 9] = [
        "left_max",
        "left_fitter_pad",
        "left_pad",
        "left_window",
        "minima",
        "right_window",
        "right_pad",
        "right_fitter_pad",
        "right_max",
    ];

    pub fn as_array(&self) -> [usize; 9] {
        [
            self.left_max,
            self.left_fitter_pad,
            self.left_pad,
            self.left_window,
            self.minima,
            self.right_window,
            self.right_pad,
            self.right_fitter_pad,
            self.right_max,
        ]
    }

    pub fn is_ordered(&self) -> bool {
        self.as_array().windows(2).all(|w| w[0] <= w[1])
    }
}

/// Settings of the segmentation pipeline (threshold → windows).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Samples with `mag < -peak_threshold_db` are inside a region.
    pub peak_threshold_db: f64,
    /// Minimum allowed spacing between two resonances.
    pub spacing_threshold_hz: f64,
    pub window_pad_factor: f64,
    pub fitter_pad_factor: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            peak_threshold_db: 1.5,
            spacing_threshold_hz: 1.0e5,
            window_pad_factor: 1.2,
            fitter_pad_factor: 5.0,
        }
    }
}

impl SegmentConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.peak_threshold_db.is_finite() {
            return Err(AppError::config("Peak threshold must be finite."));
        }
        if !(self.spacing_threshold_hz.is_finite() && self.spacing_threshold_hz >= 0.0) {
            return Err(AppError::config("Spacing threshold must be finite and >= 0."));
        }
        for (name, v) in [
            ("window pad factor", self.window_pad_factor),
            ("fitter pad factor", self.fitter_pad_factor),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(AppError::config(format!("The {name} must be finite and >= 0 (got {v}).")));
            }
        }
        Ok(())
    }
}

/// Settings of the low-pass baseline extractor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Features narrower than this survive the high-pass residual.
    pub smoothing_scale_hz: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            smoothing_scale_hz: 5.0e6,
        }
    }
}

impl BaselineConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.smoothing_scale_hz.is_finite() && self.smoothing_scale_hz > 0.0) {
            return Err(AppError::config("Smoothing scale must be finite and > 0."));
        }
        Ok(())
    }
}

/// Filter applied before differentiating I and Q.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Plain central differences.
    Gradient,
    /// Savitzky–Golay with built-in derivative.
    Sg,
    /// Savitzky–Golay smoothing, then central differences.
    SgGrad,
}

impl FromStr for FilterKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "gradient" => Ok(Self::Gradient),
            "sg" => Ok(Self::Sg),
            "sggrad" => Ok(Self::SgGrad),
            other => Err(AppError::config(format!("filtertype: {other} is not recognized."))),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gradient => "gradient",
            Self::Sg => "sg",
            Self::SgGrad => "sggrad",
        };
        f.write_str(name)
    }
}

/// Box constraints for a parameter vector.
///
/// Deserialized bounds go through [`Bounds::new`], so every interval read from
/// a settings file is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

#[derive(Deserialize)]
struct RawBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl TryFrom<RawBounds> for Bounds {
    type Error = AppError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Bounds::new(raw.lower, raw.upper)
    }
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, AppError> {
        if lower.len() != upper.len() {
            return Err(AppError::config("Lower and upper bounds differ in length."));
        }
        if let Some(j) = (0..lower.len()).find(|&j| !(lower[j] < upper[j])) {
            return Err(AppError::config(format!(
                "Bound {j} is empty: lower={} upper={}.",
                lower[j], upper[j]
            )));
        }
        Ok(Self { lower, upper })
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn contains(&self, p: &[f64]) -> bool {
        p.len() == self.len()
            && p
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }
}

/// User-facing fit settings (all optional overrides of data-derived defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    pub iq_bounds: Option<Bounds>,
    pub iq_guess: Option<Vec<f64>>,
    pub mag_bounds: Option<Bounds>,
    pub mag_guess: Option<Vec<f64>>,
    /// Divide out the off-resonance gain curve before fitting.
    pub amp_norm: bool,
    /// Estimate parameter covariance and standard errors.
    pub estimate_errors: bool,
    /// Solver budget; `None` uses `100 * n_params` evaluations per fit.
    pub max_evaluations: Option<usize>,
}

impl FitSettings {
    /// Check overrides against the parameter counts of the IQ and magnitude models.
    pub fn validate(&self) -> Result<(), AppError> {
        check_overrides("IQ", IQ_PARAM_NAMES.len(), self.iq_bounds.as_ref(), self.iq_guess.as_deref())?;
        check_overrides(
            "magnitude",
            MAG_PARAM_NAMES.len(),
            self.mag_bounds.as_ref(),
            self.mag_guess.as_deref(),
        )?;
        if self.max_evaluations == Some(0) {
            return Err(AppError::config("Solver budget must allow at least one evaluation."));
        }
        Ok(())
    }
}

fn check_overrides(model: &str, k: usize, bounds: Option<&Bounds>, guess: Option<&[f64]>) -> Result<(), AppError> {
    if let Some(b) = bounds {
        if b.len() != k {
            return Err(AppError::config(format!(
                "The {model} model takes {k} bounds (got {}).",
                b.len()
            )));
        }
        if let Some(j) = (0..k).find(|&j| !(b.lower[j] < b.upper[j])) {
            return Err(AppError::config(format!(
                "{model} bound {j} is empty: lower={} upper={}.",
                b.lower[j], b.upper[j]
            )));
        }
    }
    if let Some(g) = guess {
        if g.len() != k {
            return Err(AppError::config(format!(
                "The {model} model takes {k} guess values (got {}).",
                g.len()
            )));
        }
        if g.iter().any(|v| !v.is_finite()) {
            return Err(AppError::config(format!("The {model} guess must be finite.")));
        }
    }
    Ok(())
}

/// Which resonator model a fit used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Iq,
    Magnitude,
}

impl ModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Iq => "IQ",
            ModelKind::Magnitude => "|S21|^2",
        }
    }
}

/// One fitted parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParam {
    pub name: String,
    pub value: f64,
    pub initial: f64,
    pub stderr: Option<f64>,
}

/// Residual statistics of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    /// `sse / (n - k)`.
    pub reduced_chi2: f64,
    pub n: usize,
    pub iterations: usize,
}

/// Model curve samples; complex for the IQ model, real `|S21|^2` for the magnitude model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum Curve {
    Complex(Vec<Complex64>),
    Real(Vec<f64>),
}

impl Curve {
    pub fn len(&self) -> usize {
        match self {
            Curve::Complex(v) => v.len(),
            Curve::Real(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A successful single-resonator fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonatorFit {
    pub model: ModelKind,
    pub params: Vec<FitParam>,
    pub quality: FitQuality,
    pub freqs_hz: Vec<f64>,
    /// Data actually fitted (after optional amplitude normalization).
    pub data: Vec<Complex64>,
    pub fit_curve: Curve,
    pub guess_curve: Curve,
}

impl ResonatorFit {
    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value)
    }

    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }
}

/// Outcome of fitting one resonator; failures stay local to that resonator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FitOutcome {
    Fitted(Box<ResonatorFit>),
    Failed { reason: String },
}

impl FitOutcome {
    pub fn fitted(&self) -> Option<&ResonatorFit> {
        match self {
            FitOutcome::Fitted(fit) => Some(fit),
            FitOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FitOutcome::Failed { .. })
    }
}

impl From<Result<ResonatorFit, AppError>> for FitOutcome {
    fn from(value: Result<ResonatorFit, AppError>) -> Self {
        match value {
            Ok(fit) => FitOutcome::Fitted(Box::new(fit)),
            Err(e) => FitOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Both fits of one resonator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonatorFits {
    /// Resonator number (position in the window list).
    pub resonator: usize,
    /// Sample index of the resonance minimum.
    pub minima: usize,
    pub iq: FitOutcome,
    pub magnitude: FitOutcome,
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated: String,
    pub segment: SegmentConfig,
    pub windows: Vec<Window>,
    pub fits: Vec<ResonatorFits>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and an optional fit-settings file).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub segment: SegmentConfig,
    pub baseline: BaselineConfig,
    pub filter: FilterKind,
    pub fit: FitSettings,
    /// Slice a fixed-Q span around each resonance instead of its window.
    pub q_slice: Option<f64>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_windows: Option<PathBuf>,
    pub export_fits: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Defaults for everything but the input path.
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            segment: SegmentConfig::default(),
            baseline: BaselineConfig::default(),
            filter: FilterKind::Sg,
            fit: FitSettings::default(),
            q_slice: None,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            export_windows: None,
            export_fits: None,
            debug_dir: None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.segment.validate()?;
        self.baseline.validate()?;
        self.fit.validate()?;
        if let Some(q) = self.q_slice.filter(|q| !(q.is_finite() && *q > 0.0)) {
            return Err(AppError::config(format!("Slice quality factor must be > 0 (got {q}).")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_kind_parses_known_names() {
        assert_eq!("SG".parse::<FilterKind>().unwrap(), FilterKind::Sg);
        assert_eq!("sggrad".parse::<FilterKind>().unwrap(), FilterKind::SgGrad);
        assert_eq!("none".parse::<FilterKind>().unwrap(), FilterKind::Gradient);
    }

    #[test]
    fn unknown_filter_kind_is_a_config_error() {
        let err = "boxcar".parse::<FilterKind>().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn sweep_rejects_non_increasing_frequencies() {
        let z = vec![Complex64::new(1.0, 0.0); 3];
        assert!(Sweep::new(vec![1.0, 2.0, 2.0], z).is_err());
    }

    #[test]
    fn trace_rejects_non_increasing_frequencies() {
        assert!(matches!(
            Trace::new(vec![1.0, 3.0, 2.0], vec![0.0; 3]),
            Err(AppError::Input(_))
        ));
        assert!(Trace::new(vec![1.0, f64::NAN], vec![0.0; 2]).is_err());
        assert!(Trace::new(vec![1.0], vec![0.0]).is_ok());
    }

    #[test]
    fn stitch_channels_concatenates_in_channel_order() {
        let sweep = [0.0, 10.0];
        let bb = [100.0, 200.0];
        let i = vec![vec![1.0, 3.0], vec![2.0, 4.0]];
        let q = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let s = Sweep::stitch_channels(&sweep, &bb, &i, &q).unwrap();
        assert_eq!(s.freqs_hz, vec![100.0, 110.0, 200.0, 210.0]);
        let re: Vec<f64> = s.z.iter().map(|v| v.re).collect();
        assert_eq!(re, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn bounds_reject_empty_interval() {
        assert!(Bounds::new(vec![0.0, 1.0], vec![1.0, 1.0]).is_err());
        let b = Bounds::new(vec![0.0], vec![2.0]).unwrap();
        assert!(b.contains(&[2.0]));
        assert!(!b.contains(&[2.1]));
    }

    #[test]
    fn deserialized_bounds_must_be_non_empty() {
        let ok: Bounds = serde_json::from_str(r#"{"lower": [0.0, -1.0], "upper": [1.0, 1.0]}"#).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<Bounds>(r#"{"lower": [0.0], "upper": [0.0]}"#).is_err());
        assert!(serde_json::from_str::<Bounds>(r#"{"lower": [0.0, 0.0], "upper": [1.0]}"#).is_err());
    }

    #[test]
    fn run_config_checks_fit_overrides() {
        let mut cfg = RunConfig::for_input("sweep.csv");
        cfg.fit.iq_guess = Some(vec![3.0e8; 3]);
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        cfg.fit.iq_guess = None;
        cfg.fit.mag_bounds = Some(Bounds {
            lower: vec![0.0; 8],
            upper: vec![0.0; 8],
        });
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        cfg.fit.mag_bounds = Some(Bounds::new(vec![0.0; 8], vec![1.0; 8]).unwrap());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn run_config_rejects_bad_slice_q() {
        let mut cfg = RunConfig::for_input("sweep.csv");
        assert!(cfg.validate().is_ok());
        cfg.q_slice = Some(0.0);
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn window_ordering_check() {
        let w = Window {
            left_max: 0,
            left_fitter_pad: 1,
            left_pad: 2,
            left_window: 3,
            minima: 4,
            right_window: 5,
            right_pad: 6,
            right_fitter_pad: 7,
            right_max: 8,
        };
        assert!(w.is_ordered());
        assert!(!Window { left_pad: 9, ..w }.is_ordered());
    }
}
