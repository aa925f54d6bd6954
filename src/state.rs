use fret_wrangler::config::Settings;
use fret_wrangler::data::assignment::CompoundAssignment;
use fret_wrangler::data::model::{ParsedPlate, TimeUnit};
use fret_wrangler::data::pivot::{PivotSeries, TimepointPivot, pivot_timepoints};
use fret_wrangler::data::stats::{RatioStatistics, ratio_statistics};
use fret_wrangler::data::units::ConcentrationUnit;

// ---------------------------------------------------------------------------
// Per-compound state
// ---------------------------------------------------------------------------

/// Pivots and statistics for one compound, recomputed on every edit.
#[derive(Debug, Clone)]
pub struct CompoundResult {
    pub series: PivotSeries,
    /// Label of the timepoint shown in the grid and plot.
    pub selected: String,
    /// Missing channels only block the plot, not the grid.
    pub statistics: Result<RatioStatistics, String>,
}

impl CompoundResult {
    pub fn selected_pivot(&self) -> Option<&TimepointPivot> {
        self.series.get(&self.selected)
    }
}

#[derive(Debug, Clone)]
pub struct CompoundState {
    pub assignment: CompoundAssignment,
    /// Text buffer bound to the concentration input.
    pub concentration_input: String,
    pub input_error: Option<String>,
    pub display_label: Option<String>,
    /// `None` until a plate is loaded; `Err` holds a corrective message.
    pub result: Option<Result<CompoundResult, String>>,
}

impl CompoundState {
    fn new(name: &str, units: ConcentrationUnit) -> Self {
        Self {
            assignment: CompoundAssignment::new(name, units),
            concentration_input: String::new(),
            input_error: None,
            display_label: None,
            result: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.assignment.name
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Parsed export (None until user loads a file).
    pub plate: Option<ParsedPlate>,

    /// File name of the loaded export.
    pub source_name: Option<String>,

    /// Offset added to every timepoint label.
    pub time_delay: f64,

    pub time_unit: TimeUnit,

    /// Comma-separated compound names as typed.
    pub compound_input: String,

    pub compounds: Vec<CompoundState>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            time_unit: settings.default_time_unit,
            settings,
            plate: None,
            source_name: None,
            time_delay: 0.0,
            compound_input: String::new(),
            compounds: Vec::new(),
            status_message: None,
        }
    }

    /// Ingest a newly parsed export and recompute every compound.
    pub fn set_plate(&mut self, plate: ParsedPlate, source_name: String) {
        self.plate = Some(plate);
        self.source_name = Some(source_name);
        self.status_message = None;
        for c in &mut self.compounds {
            c.display_label = None;
        }
        self.recompute_all();
    }

    /// Drop the current export after a failed load.
    pub fn clear_plate(&mut self, message: String) {
        self.plate = None;
        self.source_name = None;
        self.status_message = Some(message);
        for c in &mut self.compounds {
            c.result = None;
        }
    }

    /// Sync the compound list with `compound_input`, keeping the
    /// assignments of compounds that are still listed.
    pub fn sync_compounds(&mut self) {
        let names: Vec<&str> = self
            .compound_input
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();

        let mut previous = std::mem::take(&mut self.compounds);
        for name in names {
            if self.compounds.iter().any(|c| c.name() == name) {
                continue;
            }
            let state = match previous.iter().position(|c| c.name() == name) {
                Some(i) => previous.swap_remove(i),
                None => CompoundState::new(name, self.settings.default_concentration_unit),
            };
            self.compounds.push(state);
        }
        self.recompute_all();
    }

    pub fn set_time_delay(&mut self, delay: f64) {
        self.time_delay = delay.max(0.0);
        self.relabel();
    }

    pub fn set_time_unit(&mut self, unit: TimeUnit) {
        self.time_unit = unit;
        self.relabel();
    }

    /// Labels embed delay and unit; map each compound's selection onto the
    /// same timepoint under the new labels.
    fn relabel(&mut self) {
        for c in &mut self.compounds {
            let selected = c
                .result
                .as_ref()
                .and_then(|r| r.as_ref().ok())
                .and_then(|r| r.selected_pivot())
                .map(|p| p.timepoint);
            c.display_label = selected.map(|t| t.label(self.time_delay, self.time_unit));
        }
        self.recompute_all();
    }

    pub fn set_concentrations(&mut self, idx: usize, text: String) {
        let Some(c) = self.compounds.get_mut(idx) else {
            return;
        };
        c.input_error = c
            .assignment
            .set_concentration_text(&text)
            .err()
            .map(|e| e.to_string());
        c.concentration_input = text;
        self.recompute(idx);
    }

    pub fn set_units(&mut self, idx: usize, units: ConcentrationUnit) {
        let Some(c) = self.compounds.get_mut(idx) else {
            return;
        };
        c.input_error = c.assignment.set_units(units).err().map(|e| e.to_string());
        self.recompute(idx);
    }

    pub fn toggle_row(&mut self, idx: usize, row: char) {
        let Some(c) = self.compounds.get_mut(idx) else {
            return;
        };
        if c.assignment.conc_rows().contains(&row) {
            c.assignment.deselect_row(row);
        } else {
            c.assignment.select_row(row);
        }
        self.recompute(idx);
    }

    pub fn toggle_column(&mut self, idx: usize, column: u32) {
        let Some(c) = self.compounds.get_mut(idx) else {
            return;
        };
        if c.assignment.replicate_cols().contains(&column) {
            c.assignment.deselect_column(column);
        } else {
            c.assignment.select_column(column);
        }
        self.recompute(idx);
    }

    pub fn select_timepoint(&mut self, idx: usize, label: String) {
        let Some(c) = self.compounds.get_mut(idx) else {
            return;
        };
        c.display_label = Some(label);
        self.recompute(idx);
    }

    pub fn recompute_all(&mut self) {
        for idx in 0..self.compounds.len() {
            self.recompute(idx);
        }
    }

    /// Rebuild pivots and statistics for one compound from scratch.
    fn recompute(&mut self, idx: usize) {
        let Some(plate) = self.plate.as_ref() else {
            return;
        };
        let Some(c) = self.compounds.get_mut(idx) else {
            return;
        };

        let result = match &c.input_error {
            Some(err) => Err(format!("{}: {err}", c.assignment.name)),
            None => compute(plate, c, self.time_delay, self.time_unit, &self.settings),
        };
        if let Err(msg) = &result {
            log::debug!("Compound not ready: {msg}");
        }
        c.result = Some(result);
    }
}

fn compute(
    plate: &ParsedPlate,
    compound: &CompoundState,
    time_delay: f64,
    time_unit: TimeUnit,
    settings: &Settings,
) -> Result<CompoundResult, String> {
    let name = &compound.assignment.name;
    let ready = compound
        .assignment
        .ready()
        .map_err(|e| format!("{name}: {e}"))?;

    let series = pivot_timepoints(&plate.table, &ready, time_delay, time_unit);
    let entry = series
        .select(compound.display_label.as_deref())
        .ok_or_else(|| format!("{name}: the export contains no timepoints"))?;

    let statistics = ratio_statistics(&entry.table, &settings.ratio_channels).map_err(|e| {
        log::warn!("Cannot plot '{name}': {e}");
        format!("{name}: {e}")
    });

    Ok(CompoundResult {
        selected: entry.label.clone(),
        statistics,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fret_wrangler::data::loader::parse_export;

    const EXPORT: &str = "\
User: LAB
Path: C:\\Data
Test ID: 7
Test Name: TR-FRET
Well,Content,Raw Data (337/665 A),Raw Data (337/665 A).1,Raw Data (337/620 B),Raw Data (337/620 B).1
,Time [s],0,60,0,60
A1,S,100,120,50,60
A2,S,110,130,50,60
B1,S,200,240,50,60
B2,S,210,250,50,60
C1,S,1,1,1,1
";

    fn loaded() -> AppState {
        let mut state = AppState::default();
        let plate = parse_export(EXPORT.as_bytes(), 4).unwrap();
        state.set_plate(plate, "plate.csv".to_string());
        state.compound_input = "Cmpd-1, Cmpd-2".to_string();
        state.sync_compounds();
        state
    }

    fn ready_result(state: &AppState, idx: usize) -> &CompoundResult {
        state.compounds[idx].result.as_ref().unwrap().as_ref().unwrap()
    }

    #[test]
    fn compound_list_keeps_existing_assignments() {
        let mut state = loaded();
        state.toggle_row(0, 'A');
        state.compound_input = "Cmpd-3, Cmpd-1,Cmpd-1".to_string();
        state.sync_compounds();

        let names: Vec<&str> = state.compounds.iter().map(CompoundState::name).collect();
        assert_eq!(names, vec!["Cmpd-3", "Cmpd-1"]);
        assert_eq!(state.compounds[1].assignment.conc_rows(), &['A']);
    }

    #[test]
    fn full_assignment_produces_pivot_and_statistics() {
        let mut state = loaded();
        state.set_concentrations(0, "1, 10".to_string());
        state.toggle_row(0, 'A');
        state.toggle_row(0, 'B');
        state.toggle_column(0, 1);
        state.toggle_column(0, 2);

        let result = ready_result(&state, 0);
        assert_eq!(result.selected, "0 seconds");
        assert_eq!(result.series.entries.len(), 2);

        let pivot = result.selected_pivot().unwrap();
        assert_eq!(pivot.table.concentrations.len(), 2);
        assert_eq!(pivot.table.excluded_wells, 1);

        let stats = result.statistics.as_ref().unwrap();
        assert_relative_eq!(stats.points[0].mean_ratio, 2.1, epsilon = 1e-12);
        assert_relative_eq!(stats.points[1].mean_ratio, 4.1, epsilon = 1e-12);
    }

    #[test]
    fn errors_stay_scoped_to_one_compound() {
        let mut state = loaded();
        state.set_concentrations(0, "1, x".to_string());
        state.set_concentrations(1, "1".to_string());
        state.toggle_row(1, 'A');
        state.toggle_column(1, 1);

        let first = state.compounds[0].result.as_ref().unwrap();
        assert!(first.as_ref().unwrap_err().contains("'x' is not a number"));
        assert!(state.compounds[1].result.as_ref().unwrap().is_ok());
    }

    #[test]
    fn row_mismatch_is_reported() {
        let mut state = loaded();
        state.set_concentrations(0, "1, 10, 100".to_string());
        state.toggle_row(0, 'A');
        state.toggle_column(0, 1);

        let msg = state.compounds[0].result.as_ref().unwrap().as_ref().unwrap_err();
        assert!(msg.contains("Select 2 more row(s)"), "{msg}");
    }

    #[test]
    fn timepoint_selection_survives_relabelling() {
        let mut state = loaded();
        state.set_concentrations(0, "1".to_string());
        state.toggle_row(0, 'A');
        state.toggle_column(0, 1);
        state.select_timepoint(0, "60 seconds".to_string());
        assert_eq!(ready_result(&state, 0).selected, "60 seconds");

        state.set_time_delay(5.0);
        state.set_time_unit(TimeUnit::Minutes);
        let result = ready_result(&state, 0);
        assert_eq!(result.selected, "65 minutes");
        let stats = result.statistics.as_ref().unwrap();
        assert_relative_eq!(stats.points[0].mean_ratio, 2.0);
    }

    #[test]
    fn missing_channel_blocks_only_the_plot() {
        let mut state = loaded();
        state.settings.ratio_channels.denominator = "Raw Data (337/615 B)".to_string();
        state.set_concentrations(0, "1".to_string());
        state.toggle_row(0, 'A');
        state.toggle_column(0, 1);

        let result = ready_result(&state, 0);
        assert!(result.selected_pivot().is_some());
        assert!(result.statistics.as_ref().unwrap_err().contains("Raw Data (337/615 B)"));
    }
}
