use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// WellId – physical plate coordinate
// ---------------------------------------------------------------------------

/// One physical well: a row letter and a 1-based column number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WellId {
    pub row: char,
    pub column: u32,
}

impl WellId {
    pub fn new(row: char, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

// ---------------------------------------------------------------------------
// Timepoint – one offset of a kinetic read, or the endpoint marker
// ---------------------------------------------------------------------------

/// Second level of the column key.
///
/// Endpoint exports carry no time axis at all; they are keyed on
/// [`Timepoint::Endpoint`] rather than on a numeric zero so that a genuine
/// `0 s` read stays distinguishable.
#[derive(Debug, Clone, Copy)]
pub enum Timepoint {
    Endpoint,
    Offset(f64),
}

// -- Manual Eq/Ord so Timepoint can live in BTreeSet / BTreeMap keys --

impl PartialEq for Timepoint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Timepoint {}

impl PartialOrd for Timepoint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timepoint {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Timepoint::Endpoint, Timepoint::Endpoint) => Ordering::Equal,
            (Timepoint::Endpoint, Timepoint::Offset(_)) => Ordering::Less,
            (Timepoint::Offset(_), Timepoint::Endpoint) => Ordering::Greater,
            (Timepoint::Offset(a), Timepoint::Offset(b)) => a.total_cmp(b),
        }
    }
}

impl std::hash::Hash for Timepoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let Timepoint::Offset(t) = self {
            t.to_bits().hash(state);
        }
    }
}

impl Timepoint {
    /// Presentation label with the user's delay and unit applied.
    pub fn label(&self, time_delay: f64, unit: TimeUnit) -> String {
        match self {
            Timepoint::Endpoint => "Endpoint".to_string(),
            Timepoint::Offset(t) => format!("{} {}", t + time_delay, unit),
        }
    }
}

impl fmt::Display for Timepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timepoint::Endpoint => write!(f, "endpoint"),
            Timepoint::Offset(t) => write!(f, "{t}"),
        }
    }
}

/// Unit label attached to timepoints at presentation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 3] = [TimeUnit::Seconds, TimeUnit::Minutes, TimeUnit::Hours];
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ColumnKey – (channel, timepoint)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKey {
    pub channel: String,
    pub timepoint: Timepoint,
}

// ---------------------------------------------------------------------------
// MeasurementTable – the parsed export
// ---------------------------------------------------------------------------

/// Wells × (channel, timepoint) readings, row-major.
///
/// Invariants upheld by the parser:
/// * `wells` holds no duplicates,
/// * every `values[i]` has `columns.len()` entries,
/// * every channel carries the same set of timepoints.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTable {
    pub wells: Vec<WellId>,
    pub columns: Vec<ColumnKey>,
    /// Missing readings are `NaN`.
    pub values: Vec<Vec<f64>>,
}

impl MeasurementTable {
    /// Number of wells (rows).
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Channel names in first-seen column order.
    pub fn channel_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.columns
            .iter()
            .filter(|c| seen.insert(c.channel.as_str()))
            .map(|c| c.channel.clone())
            .collect()
    }

    /// Distinct timepoints, ascending.
    pub fn timepoints(&self) -> BTreeSet<Timepoint> {
        self.columns.iter().map(|c| c.timepoint).collect()
    }

    /// Cross-section at one timepoint: wells × channels.
    pub fn at(&self, timepoint: Timepoint) -> TimeSlice {
        let picked: Vec<(usize, &ColumnKey)> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.timepoint == timepoint)
            .collect();

        let channels = picked.iter().map(|(_, c)| c.channel.clone()).collect();
        let values = self
            .values
            .iter()
            .map(|row| picked.iter().map(|(j, _)| row[*j]).collect())
            .collect();

        TimeSlice {
            timepoint,
            wells: self.wells.clone(),
            channels,
            values,
        }
    }
}

/// [`MeasurementTable`] projected onto a single timepoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlice {
    pub timepoint: Timepoint,
    pub wells: Vec<WellId>,
    pub channels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// ParsedPlate – everything the parser hands back
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPlate {
    pub table: MeasurementTable,
    pub timepoints: BTreeSet<Timepoint>,
    /// Row letters present in the export, for the assignment widgets.
    pub row_labels: BTreeSet<char>,
    /// Column numbers present in the export.
    pub column_numbers: BTreeSet<u32>,
}

impl ParsedPlate {
    pub fn from_table(table: MeasurementTable) -> Self {
        let timepoints = table.timepoints();
        let row_labels = table.wells.iter().map(|w| w.row).collect();
        let column_numbers = table.wells.iter().map(|w| w.column).collect();
        Self {
            table,
            timepoints,
            row_labels,
            column_numbers,
        }
    }

    /// True when the export carried a kinetic time axis.
    pub fn is_time_series(&self) -> bool {
        !self.timepoints.contains(&Timepoint::Endpoint)
    }

    /// Display labels in ascending timepoint order.
    pub fn timepoint_labels(&self, time_delay: f64, unit: TimeUnit) -> BTreeMap<Timepoint, String> {
        self.timepoints
            .iter()
            .map(|t| (*t, t.label(time_delay, unit)))
            .collect()
    }
}
