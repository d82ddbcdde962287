//! Flat CSV export/import of a sample series.
//!
//! Format: header `Temps,Température`, then one `timestamp,temperature` row per
//! sample. Floats are written with Rust's shortest round-trip formatting, so a
//! re-import reproduces every value exactly.

use std::io::{Read, Write};
use std::path::Path;

use super::series::{Sample, SampleSeries};
use crate::error::ExportError;

pub const HEADER_TIME: &str = "Temps";
pub const HEADER_TEMPERATURE: &str = "Température";

/// Write samples as CSV to any writer.
pub fn write_csv<W: Write>(writer: W, samples: &[Sample]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([HEADER_TIME, HEADER_TEMPERATURE])?;
    for s in samples {
        wtr.write_record([s.timestamp.to_string(), s.temperature.to_string()])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Export to `path`, all-or-nothing.
///
/// Rows go to a temporary file next to `path` which is then renamed over it.
/// On failure the temporary file is removed and `path` is left as it was.
pub fn export_csv<P: AsRef<Path>>(path: P, samples: &[Sample]) -> Result<(), ExportError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".hotwire-export-")
        .suffix(".csv.tmp")
        .tempfile_in(dir)
        .map_err(io_err)?;
    write_csv(tmp.as_file_mut(), samples)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| ExportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    log::info!("exported {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Parse CSV produced by [`write_csv`]. The header row is required; every data
/// row must be a pair of finite numbers.
pub fn read_csv<R: Read>(reader: R) -> Result<SampleSeries, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() != 2 || &headers[0] != HEADER_TIME || &headers[1] != HEADER_TEMPERATURE {
        return Err(ExportError::MissingHeader);
    }

    let mut series = SampleSeries::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        if record.len() != 2 {
            return Err(ExportError::InvalidRow { row });
        }
        let field = |i: usize| {
            record[i]
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(ExportError::InvalidRow { row })
        };
        series.push(Sample::new(field(0)?, field(1)?));
    }
    Ok(series)
}

pub fn import_csv<P: AsRef<Path>>(path: P) -> Result<SampleSeries, ExportError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(std::io::BufReader::new(file))
}

/// Default export file name, e.g. `hotwire_20240131_142501.csv`.
pub fn default_export_file_name() -> String {
    format!("hotwire_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}
