//! CSV exports: windows, sweeps and derivatives.
//!
//! Every export has a path-based entry point and a writer-based one; the
//! latter is what the tests drive.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Sweep, Window};
use crate::error::AppError;

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::io(format!("Failed to create {what} CSV '{}': {e}", path.display())))
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::io(format!("Failed to write CSV: {e}"))
}

/// Write one row per window: resonator number, the nine boundaries and the
/// frequency of the minimum.
pub fn write_windows_csv(path: &Path, windows: &[Window], freqs_hz: &[f64]) -> Result<(), AppError> {
    write_windows(create(path, "windows")?, windows, freqs_hz)
}

pub fn write_windows<W: Write>(out: W, windows: &[Window], freqs_hz: &[f64]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec!["resonator"];
    header.extend(Window::FIELD_NAMES);
    header.push("freq_hz");
    wtr.write_record(&header).map_err(csv_err)?;

    for (r, w) in windows.iter().enumerate() {
        let freq = freqs_hz
            .get(w.minima)
            .map(|f| format!("{f:.3}"))
            .unwrap_or_default();
        let mut row = vec![r.to_string()];
        row.extend(w.as_array().iter().map(|v| v.to_string()));
        row.push(freq);
        wtr.write_record(&row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))?;
    Ok(())
}

/// Write a sweep in the same layout `ingest` reads.
pub fn write_sweep_csv(path: &Path, sweep: &Sweep) -> Result<(), AppError> {
    write_sweep(create(path, "sweep")?, sweep)
}

pub fn write_sweep<W: Write>(out: W, sweep: &Sweep) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);
    let with_std = sweep.std_i.is_some() && sweep.std_q.is_some();

    if with_std {
        wtr.write_record(["freq_hz", "i", "q", "std_i", "std_q"])
    } else {
        wtr.write_record(["freq_hz", "i", "q"])
    }
    .map_err(csv_err)?;

    for k in 0..sweep.len() {
        let mut row = vec![
            sweep.freqs_hz[k].to_string(),
            sweep.z[k].re.to_string(),
            sweep.z[k].im.to_string(),
        ];
        if let (Some(si), Some(sq)) = (&sweep.std_i, &sweep.std_q) {
            row.push(si[k].to_string());
            row.push(sq[k].to_string());
        }
        wtr.write_record(&row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))?;
    Ok(())
}

/// Write `dI`, `dQ` and the IQ speed per sample.
pub fn write_derivative_csv(path: &Path, freqs_hz: &[f64], di: &[f64], dq: &[f64]) -> Result<(), AppError> {
    write_derivative(create(path, "derivative")?, freqs_hz, di, dq)
}

pub fn write_derivative<W: Write>(out: W, freqs_hz: &[f64], di: &[f64], dq: &[f64]) -> Result<(), AppError> {
    if di.len() != freqs_hz.len() || dq.len() != freqs_hz.len() {
        return Err(AppError::input("Derivative arrays must match the frequency axis."));
    }
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["freq_hz", "di", "dq", "speed"]).map_err(csv_err)?;
    for k in 0..freqs_hz.len() {
        let speed = di[k].hypot(dq[k]);
        wtr.write_record([
            freqs_hz[k].to_string(),
            di[k].to_string(),
            dq[k].to_string(),
            speed.to_string(),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))?;
    Ok(())
}
