//! Export utilities for selection results.

use crate::error::Result;
use crate::types::{DailyReturn, SelectionResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a daily return sequence to a `date,return` CSV file.
pub fn write_daily_returns_csv(path: impl AsRef<Path>, returns: &[DailyReturn]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "date,return")?;
    for point in returns {
        writeln!(writer, "{},{:.10}", point.date, point.value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the weight mapping to a `symbol,weight` CSV file, heaviest first.
pub fn write_weights_csv(path: impl AsRef<Path>, result: &SelectionResult) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "symbol,weight")?;
    for symbol in &result.symbols {
        let weight = result.weights.get(symbol).copied().unwrap_or(0.0);
        writeln!(writer, "{symbol},{weight:.10}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize the full result to pretty-printed JSON.
pub fn write_result_json(path: impl AsRef<Path>, result: &SelectionResult) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}
