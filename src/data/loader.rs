use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, bail};

use super::error::{Result, WranglerError};
use super::model::{ColumnKey, MeasurementTable, ParsedPlate, Timepoint, WellId};

/// Banner lines the plate reader writes before the header row.
pub const DEFAULT_HEADER_SKIP_ROWS: usize = 4;

const WELL_COLUMN: &str = "Well";
const CONTENT_COLUMN: &str = "Content";
/// Header text of the trailing empty column produced by a trailing comma.
const ARTIFACT_MARKER: &str = "Unnamed";
const TIME_ROW_PREFIX: &str = "Time";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a plate reader export from disk.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – the instrument's comma-separated table export
pub fn load_file(path: &Path, header_skip_rows: usize) -> anyhow::Result<ParsedPlate> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => {}
        other => bail!("Unsupported file extension: .{other}"),
    }

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let plate = parse_export(&bytes, header_skip_rows)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(plate)
}

/// Parse the raw bytes of an export.
///
/// Layout:
/// ```text
/// <header_skip_rows banner lines>
/// Well,Content,<channel>,<channel>.1,...,[trailing empty column]
/// ,Time [s],0,60,...                     <- time-series exports only
/// A1,<content>,<reading>,<reading>,...
/// ```
pub fn parse_export(bytes: &[u8], header_skip_rows: usize) -> Result<ParsedPlate> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');
    let body = skip_banner(text, header_skip_rows);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        records.push(record);
    }

    let mut rows = records.into_iter();
    let header = rows.next().ok_or_else(|| {
        WranglerError::UnrecognizedFormat(format!(
            "no header row after {header_skip_rows} banner lines"
        ))
    })?;
    let mut headers: Vec<String> = header.iter().map(str::to_string).collect();

    if headers
        .last()
        .is_some_and(|h| h.is_empty() || h.contains(ARTIFACT_MARKER))
    {
        let dropped = headers.pop();
        log::debug!("Dropping artifact column {dropped:?}");
    }

    let well_idx = find_column(&headers, WELL_COLUMN)?;
    let content_idx = find_column(&headers, CONTENT_COLUMN)?;

    let data_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != well_idx && *i != content_idx)
        .map(|(i, h)| parse_channel_header(h).map(|channel| (i, channel)))
        .collect::<Result<_>>()?;

    let mut body_rows: Vec<csv::StringRecord> = rows.collect();
    if body_rows.is_empty() {
        return Err(WranglerError::UnrecognizedFormat(
            "export contains no well rows".to_string(),
        ));
    }

    let first_content = body_rows[0].get(content_idx).unwrap_or("");
    let timepoints: Vec<Timepoint> = if first_content.starts_with(TIME_ROW_PREFIX) {
        let time_row = body_rows.remove(0);
        data_cols
            .iter()
            .map(|(idx, _)| parse_offset(&time_row, *idx, &headers[*idx]))
            .collect::<Result<_>>()?
    } else {
        vec![Timepoint::Endpoint; data_cols.len()]
    };

    let columns: Vec<ColumnKey> = data_cols
        .iter()
        .zip(&timepoints)
        .map(|((_, channel), timepoint)| ColumnKey {
            channel: channel.clone(),
            timepoint: *timepoint,
        })
        .collect();
    check_rectangular(&columns)?;

    let mut seen = BTreeSet::new();
    let mut wells = Vec::with_capacity(body_rows.len());
    let mut values = Vec::with_capacity(body_rows.len());
    let mut unreadable = 0usize;

    for record in &body_rows {
        let well = parse_well_id(record.get(well_idx).unwrap_or(""))?;
        if !seen.insert(well) {
            return Err(WranglerError::DuplicateWell(well.to_string()));
        }

        let row: Vec<f64> = data_cols
            .iter()
            .map(|(idx, _)| {
                let cell = record.get(*idx).unwrap_or("");
                parse_reading(cell).unwrap_or_else(|| {
                    unreadable += 1;
                    f64::NAN
                })
            })
            .collect();

        wells.push(well);
        values.push(row);
    }

    if unreadable > 0 {
        log::warn!("{unreadable} non-numeric reading(s) treated as missing");
    }

    let table = MeasurementTable {
        wells,
        columns,
        values,
    };
    let plate = ParsedPlate::from_table(table);

    log::info!(
        "Parsed {} wells, {} channels, {} ({} timepoints)",
        plate.table.len(),
        plate.table.channel_names().len(),
        if plate.is_time_series() { "time series" } else { "endpoint" },
        plate.timepoints.len()
    );

    Ok(plate)
}

// ---------------------------------------------------------------------------
// Field-level parsers
// ---------------------------------------------------------------------------

/// Split a well identifier such as `"H12"` into row letter and column number.
pub fn parse_well_id(cell: &str) -> Result<WellId> {
    let malformed = || WranglerError::MalformedWellIdentifier {
        cell: cell.to_string(),
    };

    let mut chars = cell.chars();
    let row = chars
        .next()
        .filter(char::is_ascii_alphabetic)
        .ok_or_else(malformed)?
        .to_ascii_uppercase();

    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let column: u32 = digits.parse().map_err(|_| malformed())?;
    if column == 0 {
        return Err(malformed());
    }

    Ok(WellId::new(row, column))
}

/// Recover the channel name from a data column header.
///
/// The export repeats each channel once per timepoint, suffixing the
/// repeats with `.<n>`; anything else after a `.` is rejected.
pub fn parse_channel_header(header: &str) -> Result<String> {
    let malformed = || WranglerError::MalformedChannelHeader {
        header: header.to_string(),
    };

    let channel = match header.split_once('.') {
        Some((name, suffix))
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        Some(_) => return Err(malformed()),
        None => header,
    };

    let channel = channel.trim();
    if channel.is_empty() {
        return Err(malformed());
    }
    Ok(channel.to_string())
}

fn parse_reading(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}

fn parse_offset(record: &csv::StringRecord, idx: usize, header: &str) -> Result<Timepoint> {
    let cell = record.get(idx).unwrap_or("");
    cell.parse::<f64>()
        .map(Timepoint::Offset)
        .map_err(|_| {
            WranglerError::UnrecognizedFormat(format!(
                "timepoint '{cell}' under column '{header}' is not numeric"
            ))
        })
}

// -- Structural helpers --

/// Return the remainder of `text` after `n` non-blank lines.
fn skip_banner(text: &str, n: usize) -> &str {
    let mut skipped = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if skipped == n {
            break;
        }
        if !line.trim().is_empty() {
            skipped += 1;
        }
        offset += line.len();
    }
    &text[offset..]
}

fn find_column(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| WranglerError::UnrecognizedFormat(format!("missing '{name}' column")))
}

/// Every channel must carry the same timepoints, each exactly once.
fn check_rectangular(columns: &[ColumnKey]) -> Result<()> {
    let mut per_channel: BTreeMap<&str, BTreeSet<Timepoint>> = BTreeMap::new();
    for col in columns {
        if !per_channel
            .entry(col.channel.as_str())
            .or_default()
            .insert(col.timepoint)
        {
            return Err(WranglerError::UnrecognizedFormat(format!(
                "channel '{}' repeats timepoint {}",
                col.channel, col.timepoint
            )));
        }
    }

    let mut sets = per_channel.iter();
    if let Some((_, reference)) = sets.next() {
        if let Some((channel, _)) = sets.find(|(_, set)| *set != reference) {
            return Err(WranglerError::UnrecognizedFormat(format!(
                "channel '{channel}' does not share the time axis of the other channels"
            )));
        }
    }
    Ok(())
}
