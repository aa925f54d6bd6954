use std::io::Write;

use super::error::Result;
use super::pivot::PivotedTable;
use super::stats::RatioStatistics;

/// Write a pivot with two header rows (channel, replicate), then one row per
/// concentration. Missing readings are left blank.
pub fn pivot_to_csv<W: Write>(pivot: &PivotedTable, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    let mut channels = vec![String::new()];
    channels.extend(pivot.columns.iter().map(|c| c.channel.clone()));
    wtr.write_record(&channels)?;

    let mut replicates = vec!["Concentration (M)".to_string()];
    replicates.extend(pivot.columns.iter().map(|c| c.replicate.to_string()));
    wtr.write_record(&replicates)?;

    for (conc, row) in pivot.concentrations.iter().zip(&pivot.values) {
        let mut record = vec![format_number(*conc)];
        record.extend(row.iter().map(|v| format_number(*v)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn statistics_to_csv<W: Write>(stats: &RatioStatistics, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    wtr.write_record(["Concentration (M)", "Mean ratio", "Standard error", "n"])?;
    for p in &stats.points {
        wtr.write_record([
            format_number(p.concentration),
            format_number(p.mean_ratio),
            format_number(p.standard_error),
            p.n.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Tab-separated text for pasting into a spreadsheet.
pub fn pivot_to_tsv(pivot: &PivotedTable) -> Result<String> {
    let mut buf = Vec::new();
    pivot_to_csv(pivot, &mut buf, b'\t')?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn format_number(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}
