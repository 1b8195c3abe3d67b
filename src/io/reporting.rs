// src/io/reporting.rs

use crate::simulation::engine::TimeseriesRow;
use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Writes the daily trajectory to a CSV file, one row per simulated day.
///
/// # Arguments
/// * `file_path` - The path to save the file (e.g., "results/run_1.csv").
/// * `rows` - The timeseries recorded by the simulation engine.
pub fn write_timeseries_csv<P: AsRef<Path>>(file_path: P, rows: &[TimeseriesRow]) -> Result<(), Box<dyn Error>> {
    let path = file_path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    for row in rows {
        wtr.serialize(row)?;
    }

    // Flush the buffer to ensure all data is written
    wtr.flush()?;

    info!(rows = rows.len(), path = %path.display(), "timeseries exported");
    Ok(())
}

/// Writes any serializable result (KPIs, Monte Carlo summary, job status) as pretty JSON.
pub fn write_json<P: AsRef<Path>, T: Serialize>(file_path: P, value: &T) -> Result<(), Box<dyn Error>> {
    let path = file_path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;

    info!(path = %path.display(), "result exported");
    Ok(())
}
