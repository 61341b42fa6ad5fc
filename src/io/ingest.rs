//! CSV sweep ingest.
//!
//! Turns a CSV with one row per frequency point into a validated [`Sweep`].
//!
//! - Required columns: `freq_hz`, `i`, `q` (case-insensitive; `freq` and
//!   `frequency` are accepted for `freq_hz`)
//! - Optional columns: `std_i`, `std_q` (used only when both are present)
//! - Multi-channel sweeps replace `i`/`q` with `i@<baseband_hz>` and
//!   `q@<baseband_hz>` pairs; channels are stitched onto one frequency axis
//! - Bad rows are skipped and reported; an input with no usable rows is an error

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use num_complex::Complex64;

use crate::domain::Sweep;
use crate::error::AppError;

const FREQ_ALIASES: [&str; 4] = ["freq_hz", "freq", "frequency", "sweep_hz"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the sweep plus what happened to every row.
#[derive(Debug, Clone)]
pub struct IngestedSweep {
    pub sweep: Sweep,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a sweep CSV from disk.
pub fn load_sweep(path: &Path) -> Result<IngestedSweep, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open sweep CSV '{}': {e}", path.display())))?;
    read_sweep(file)
}

/// Parse a sweep CSV from any reader.
pub fn read_sweep<R: Read>(input: R) -> Result<IngestedSweep, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let freq_col = FREQ_ALIASES
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| AppError::input("Missing required column: `freq_hz`"))?;
    if !header_map.contains_key("i") {
        let channels = channel_columns(&headers, &header_map)?;
        if !channels.is_empty() {
            return read_channels(reader, freq_col, &channels);
        }
    }
    for name in ["i", "q"] {
        if !header_map.contains_key(name) {
            return Err(AppError::input(format!("Missing required column: `{name}`")));
        }
    }
    let with_std = header_map.contains_key("std_i") && header_map.contains_key("std_q");

    let mut freqs = Vec::new();
    let mut z = Vec::new();
    let mut std_i = Vec::new();
    let mut std_q = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = (|| -> Result<(f64, Complex64, Option<(f64, f64)>), String> {
            let f = parse_f64(record.get(freq_col), "freq_hz")?;
            let i = parse_f64(get(&record, &header_map, "i"), "i")?;
            let q = parse_f64(get(&record, &header_map, "q"), "q")?;
            let std = if with_std {
                Some((
                    parse_f64(get(&record, &header_map, "std_i"), "std_i")?,
                    parse_f64(get(&record, &header_map, "std_q"), "std_q")?,
                ))
            } else {
                None
            };
            Ok((f, Complex64::new(i, q), std))
        })();

        match parsed {
            Ok((f, v, std)) => {
                freqs.push(f);
                z.push(v);
                if let Some((si, sq)) = std {
                    std_i.push(si);
                    std_q.push(sq);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = freqs.len();
    if rows_used == 0 {
        return Err(AppError::input("No valid rows in the sweep CSV."));
    }

    let mut sweep = Sweep::new(freqs, z)?;
    if with_std {
        sweep = sweep.with_std(std_i, std_q)?;
    }

    Ok(IngestedSweep {
        sweep,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// One `i@<baseband_hz>` / `q@<baseband_hz>` column pair.
#[derive(Debug, Clone, Copy)]
struct Channel {
    baseband_hz: f64,
    i_col: usize,
    q_col: usize,
}

/// Channel column pairs in header order.
fn channel_columns(headers: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Vec<Channel>, AppError> {
    let mut channels = Vec::new();
    for (i_col, name) in headers.iter().enumerate() {
        let name = normalize_header_name(name);
        let Some(suffix) = name.strip_prefix("i@") else {
            continue;
        };
        let baseband_hz = suffix
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::input(format!("Invalid baseband frequency in column `{name}`.")))?;
        let q_col = header_map
            .get(&format!("q@{suffix}"))
            .copied()
            .ok_or_else(|| AppError::input(format!("Missing required column: `q@{suffix}`")))?;
        channels.push(Channel {
            baseband_hz,
            i_col,
            q_col,
        });
    }
    Ok(channels)
}

fn read_channels<R: Read>(
    mut reader: csv::Reader<R>,
    freq_col: usize,
    channels: &[Channel],
) -> Result<IngestedSweep, AppError> {
    let mut sweep_freqs = Vec::new();
    let mut i_rows = Vec::new();
    let mut q_rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let f = parse_f64(record.get(freq_col), "sweep_hz")?;
                let mut i = Vec::with_capacity(channels.len());
                let mut q = Vec::with_capacity(channels.len());
                for c in channels {
                    i.push(parse_f64(record.get(c.i_col), "i")?);
                    q.push(parse_f64(record.get(c.q_col), "q")?);
                }
                Ok((f, i, q))
            });

        match parsed {
            Ok((f, i, q)) => {
                sweep_freqs.push(f);
                i_rows.push(i);
                q_rows.push(q);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = sweep_freqs.len();
    if rows_used == 0 {
        return Err(AppError::input("No valid rows in the sweep CSV."));
    }

    let baseband: Vec<f64> = channels.iter().map(|c| c.baseband_hz).collect();
    let sweep = Sweep::stitch_channels(&sweep_freqs, &baseband, &i_rows, &q_rows)?;
    Ok(IngestedSweep {
        sweep,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx)
}

fn parse_f64(s: Option<&str>, name: &str) -> Result<f64, String> {
    let s = s
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))?;
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid number for `{name}`: '{s}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value for `{name}`."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_required_columns_in_any_order() {
        let csv = "Q,\u{feff}I,Freq_Hz\n0.5,1.0,100\n0.25,0.75,200\n";
        let out = read_sweep(csv.as_bytes()).unwrap();
        assert_eq!(out.sweep.freqs_hz, vec![100.0, 200.0]);
        assert_eq!(out.sweep.z[1], Complex64::new(0.75, 0.25));
        assert!(out.sweep.std_i.is_none());
        assert_eq!((out.rows_read, out.rows_used), (2, 2));
    }

    #[test]
    fn bad_rows_are_reported_and_skipped() {
        let csv = "freq_hz,i,q\n1,1,0\n2,abc,0\n3,1\n4,1,0\n";
        let out = read_sweep(csv.as_bytes()).unwrap();
        assert_eq!(out.sweep.len(), 2);
        assert_eq!(out.row_errors.len(), 2);
        assert_eq!(out.row_errors[0].line, 3);
    }

    #[test]
    fn std_columns_are_attached() {
        let csv = "freq_hz,i,q,std_i,std_q\n1,1,0,0.1,0.2\n2,1,0,0.1,0.2\n";
        let out = read_sweep(csv.as_bytes()).unwrap();
        assert_eq!(out.sweep.std_q, Some(vec![0.2, 0.2]));
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let err = read_sweep("freq_hz,i\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[test]
    fn channel_columns_are_stitched_in_baseband_order() {
        let csv = "sweep_hz,i@0,q@0,i@1000,q@1000\n0,1,0,3,0.5\n10,2,0,4,0.5\n20,x,0,5,0.5\n";
        let out = read_sweep(csv.as_bytes()).unwrap();
        assert_eq!(out.sweep.freqs_hz, vec![0.0, 10.0, 1000.0, 1010.0]);
        let re: Vec<f64> = out.sweep.z.iter().map(|v| v.re).collect();
        assert_eq!(re, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.sweep.z[2], Complex64::new(3.0, 0.5));
        assert_eq!((out.rows_read, out.rows_used), (3, 2));
        assert_eq!(out.row_errors[0].line, 4);
    }

    #[test]
    fn channel_without_quadrature_is_an_input_error() {
        let err = read_sweep("sweep_hz,i@0,q@5\n0,1,0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[test]
    fn empty_body_is_an_input_error() {
        assert!(read_sweep("freq_hz,i,q\n".as_bytes()).is_err());
    }
}
