use std::collections::BTreeSet;

use super::assignment::{ReadyAssignment, Replicate};
use super::model::{MeasurementTable, TimeSlice, TimeUnit, Timepoint};

// ---------------------------------------------------------------------------
// PivotedTable – Concentration × (Channel, Replicate)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PivotColumn {
    pub channel: String,
    pub replicate: Replicate,
}

/// One compound at one timepoint, indexed by concentration.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotedTable {
    pub timepoint: Timepoint,
    /// Molar concentrations, ascending.
    pub concentrations: Vec<f64>,
    /// Channel-major, replicates ascending within each channel.
    pub columns: Vec<PivotColumn>,
    /// `values[concentration][column]`; `NaN` where no well was read.
    pub values: Vec<Vec<f64>>,
    /// Wells on the plate outside this compound's concentration rows or
    /// replicate columns.
    pub excluded_wells: usize,
}

impl PivotedTable {
    pub fn has_channel(&self, channel: &str) -> bool {
        self.columns.iter().any(|c| c.channel == channel)
    }

    pub fn replicates(&self) -> BTreeSet<Replicate> {
        self.columns.iter().map(|c| c.replicate).collect()
    }

    /// Column of readings for one channel and replicate, aligned on
    /// `concentrations`.
    pub fn series(&self, channel: &str, replicate: Replicate) -> Option<Vec<f64>> {
        let j = self
            .columns
            .iter()
            .position(|c| c.channel == channel && c.replicate == replicate)?;
        Some(self.values.iter().map(|row| row[j]).collect())
    }
}

/// Join a time slice against a compound's row and column maps and pivot it.
///
/// Only concentrations and replicates that matched at least one well make it
/// into the index and columns.
pub fn build_pivot(slice: &TimeSlice, assignment: &ReadyAssignment) -> PivotedTable {
    let mut matched = Vec::new();
    let mut excluded_wells = 0;

    for (well, readings) in slice.wells.iter().zip(&slice.values) {
        let conc = assignment.concentration_by_row.get(&well.row);
        let replicate = assignment.replicate_by_column.get(&well.column);
        match (conc, replicate) {
            (Some(conc), Some(replicate)) => matched.push((*conc, *replicate, readings)),
            _ => excluded_wells += 1,
        }
    }

    let mut concentrations: Vec<f64> = matched.iter().map(|(c, _, _)| *c).collect();
    concentrations.sort_by(f64::total_cmp);
    concentrations.dedup_by(|a, b| a.total_cmp(b).is_eq());

    let replicates: Vec<Replicate> = matched
        .iter()
        .map(|(_, rep, _)| *rep)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let n_reps = replicates.len();

    let columns: Vec<PivotColumn> = slice
        .channels
        .iter()
        .flat_map(|channel| {
            replicates.iter().map(move |replicate| PivotColumn {
                channel: channel.clone(),
                replicate: *replicate,
            })
        })
        .collect();

    let mut values = vec![vec![f64::NAN; columns.len()]; concentrations.len()];

    for (conc, replicate, readings) in matched {
        let (Some(r), Some(k)) = (
            concentrations.iter().position(|c| c.total_cmp(&conc).is_eq()),
            replicates.iter().position(|rep| *rep == replicate),
        ) else {
            continue;
        };

        for (ch, reading) in readings.iter().enumerate() {
            values[r][ch * n_reps + k] = *reading;
        }
    }

    log::debug!(
        "Pivoted '{}' at {}: {} concentrations × {} columns, {} wells excluded",
        assignment.name,
        slice.timepoint,
        concentrations.len(),
        columns.len(),
        excluded_wells
    );

    PivotedTable {
        timepoint: slice.timepoint,
        concentrations,
        columns,
        values,
        excluded_wells,
    }
}

// ---------------------------------------------------------------------------
// PivotSeries – one pivot per timepoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TimepointPivot {
    pub timepoint: Timepoint,
    /// `"{timepoint + delay} {unit}"`, or `"Endpoint"`.
    pub label: String,
    pub table: PivotedTable,
}

/// Pivots for every timepoint, ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotSeries {
    pub entries: Vec<TimepointPivot>,
}

impl PivotSeries {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&TimepointPivot> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// The entry for `label`, or the earliest timepoint when the label is
    /// unset or stale.
    pub fn select(&self, label: Option<&str>) -> Option<&TimepointPivot> {
        label
            .and_then(|l| self.get(l))
            .or_else(|| self.entries.first())
    }
}

/// Build the pivot for every timepoint in `table`.
pub fn pivot_timepoints(
    table: &MeasurementTable,
    assignment: &ReadyAssignment,
    time_delay: f64,
    unit: TimeUnit,
) -> PivotSeries {
    let entries = table
        .timepoints()
        .into_iter()
        .map(|timepoint| TimepointPivot {
            timepoint,
            label: timepoint.label(time_delay, unit),
            table: build_pivot(&table.at(timepoint), assignment),
        })
        .collect();
    PivotSeries { entries }
}
