use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use fret_wrangler::data::assignment::AssignmentStatus;
use fret_wrangler::data::export;
use fret_wrangler::data::model::TimeUnit;
use fret_wrangler::data::units::ConcentrationUnit;

use crate::state::{AppState, CompoundResult};

// ---------------------------------------------------------------------------
// Left side panel – experiment and per-compound inputs
// ---------------------------------------------------------------------------

/// Render the left options panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Experiment");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            experiment_inputs(ui, state);
            ui.separator();

            if state.plate.is_none() {
                ui.label("No export loaded.");
                return;
            }

            ui.label(
                "Specify concentrations in the same order as the rows they were \
                 dispensed into. Replicates are numbered in the order columns are ticked.",
            );
            for idx in 0..state.compounds.len() {
                compound_inputs(ui, state, idx);
            }
        });
}

fn experiment_inputs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("First time point");
        let mut delay = state.time_delay;
        if ui
            .add(egui::DragValue::new(&mut delay).range(0.0..=f64::MAX).speed(1.0))
            .changed()
        {
            state.set_time_delay(delay);
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Time units");
        let current = state.time_unit;
        egui::ComboBox::from_id_salt("time_units")
            .selected_text(current.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for unit in TimeUnit::ALL {
                    if ui.selectable_label(current == unit, unit.to_string()).clicked() {
                        state.set_time_unit(unit);
                    }
                }
            });
    });

    ui.label("Test compounds (separate with commas)");
    if ui.text_edit_singleline(&mut state.compound_input).changed() {
        state.sync_compounds();
    }
}

fn compound_inputs(ui: &mut Ui, state: &mut AppState, idx: usize) {
    let Some(plate) = &state.plate else {
        return;
    };
    let rows: Vec<char> = plate.row_labels.iter().copied().collect();
    let columns: Vec<u32> = plate.column_numbers.iter().copied().collect();

    // Clone what we need so we can mutate state inside the widgets.
    let c = &state.compounds[idx];
    let name = c.name().to_string();
    let units = c.assignment.units();
    let mut conc_text = c.concentration_input.clone();
    let selected_rows = c.assignment.conc_rows().to_vec();
    let selected_cols = c.assignment.replicate_cols().to_vec();
    let message = c
        .input_error
        .clone()
        .or_else(|| status_message(c.assignment.status()));
    let timepoints = match &c.result {
        Some(Ok(r)) => Some(timepoint_choices(r)),
        _ => None,
    };

    egui::CollapsingHeader::new(RichText::new(format!("{name} options")).strong())
        .id_salt(("compound", &name))
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Concentration units");
                egui::ComboBox::from_id_salt(("units", &name))
                    .selected_text(units.to_string())
                    .show_ui(ui, |ui: &mut Ui| {
                        for unit in ConcentrationUnit::ALL {
                            if ui.selectable_label(units == unit, unit.to_string()).clicked() {
                                state.set_units(idx, unit);
                            }
                        }
                    });
            });

            ui.label("Concentrations (separate with commas)");
            if ui.text_edit_singleline(&mut conc_text).changed() {
                state.set_concentrations(idx, conc_text);
            }

            ui.label("Columns containing replicates");
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for col in &columns {
                    let mut checked = selected_cols.contains(col);
                    if ui.checkbox(&mut checked, col.to_string()).changed() {
                        state.toggle_column(idx, *col);
                    }
                }
            });
            if !selected_cols.is_empty() {
                ui.small(format!("Replicate order: {}", join(&selected_cols)));
            }

            ui.label("Rows containing concentrations");
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for row in &rows {
                    let mut checked = selected_rows.contains(row);
                    if ui.checkbox(&mut checked, row.to_string()).changed() {
                        state.toggle_row(idx, *row);
                    }
                }
            });
            if !selected_rows.is_empty() {
                ui.small(format!("Concentration order: {}", join(&selected_rows)));
            }

            if let Some(msg) = &message {
                ui.label(RichText::new(msg).color(Color32::DARK_RED));
            }

            if let Some((labels, current)) = &timepoints {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("Time point to display");
                    egui::ComboBox::from_id_salt(("timepoint", &name))
                        .selected_text(current.as_str())
                        .show_ui(ui, |ui: &mut Ui| {
                            for label in labels {
                                if ui.selectable_label(label == current, label.as_str()).clicked() {
                                    state.select_timepoint(idx, label.clone());
                                }
                            }
                        });
                });
            }
        });
}

fn status_message(status: AssignmentStatus) -> Option<String> {
    match status {
        AssignmentStatus::Ready => None,
        other => Some(other.to_string()),
    }
}

fn timepoint_choices(result: &CompoundResult) -> (Vec<String>, String) {
    let labels = result.series.labels().map(str::to_string).collect();
    (labels, result.selected.clone())
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(plate), Some(name)) = (&state.plate, &state.source_name) {
            let labels: Vec<String> = plate
                .timepoint_labels(state.time_delay, state.time_unit)
                .into_values()
                .collect();
            ui.label(format!(
                "{name}: {} wells, {} time point(s): {}",
                plate.table.len(),
                labels.len(),
                labels.join(", ")
            ));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open plate reader export")
        .add_filter("Plate reader export", &["csv", "txt"])
        .pick_file();

    if let Some(path) = file {
        match fret_wrangler::data::loader::load_file(&path, state.settings.header_skip_rows) {
            Ok(plate) => {
                log::info!(
                    "Loaded {} wells with channels {:?}",
                    plate.table.len(),
                    plate.table.channel_names()
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                state.set_plate(plate, name);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.clear_plate(format!("Error: {e:#}"));
            }
        }
    }
}

/// Ask for a destination and write the selected pivot and its statistics.
///
/// Returns a status message on failure.
pub fn save_csv_dialog(compound: &str, result: &CompoundResult) -> Option<String> {
    let pivot = result.selected_pivot()?;
    let path = rfd::FileDialog::new()
        .set_title("Save table as CSV")
        .set_file_name(format!("{compound} {}.csv", pivot.label))
        .add_filter("CSV", &["csv"])
        .save_file()?;

    write_csv(&path, result).err().map(|e| {
        log::error!("Failed to save {}: {e:#}", path.display());
        format!("Error: {e:#}")
    })
}

fn write_csv(path: &Path, result: &CompoundResult) -> anyhow::Result<()> {
    use anyhow::Context;

    let Some(pivot) = result.selected_pivot() else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    export::pivot_to_csv(&pivot.table, file, b',').context("writing table")?;

    if let Ok(stats) = &result.statistics {
        let stats_file = stats_path(path);
        let file = std::fs::File::create(&stats_file)
            .with_context(|| format!("creating {}", stats_file.display()))?;
        export::statistics_to_csv(stats, file, b',').context("writing statistics")?;
    }
    log::info!("Saved {}", path.display());
    Ok(())
}

/// `plate 1.5 hours.csv` → `plate 1.5 hours.stats.csv`. Only a trailing
/// `.csv` is replaced; other dots belong to the name.
fn stats_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.len().checked_sub(4) {
        Some(i) if name.is_char_boundary(i) && name[i..].eq_ignore_ascii_case(".csv") => &name[..i],
        _ => name.as_str(),
    };
    path.with_file_name(format!("{stem}.stats.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_file_sits_next_to_the_table() {
        assert_eq!(
            stats_path(Path::new("/data/Cmpd-1 60 seconds.csv")),
            PathBuf::from("/data/Cmpd-1 60 seconds.stats.csv")
        );
        assert_eq!(
            stats_path(Path::new("out/X 1.5 hours")),
            PathBuf::from("out/X 1.5 hours.stats.csv")
        );
        assert_eq!(
            stats_path(Path::new("X 1.5 hours.CSV")),
            PathBuf::from("X 1.5 hours.stats.csv")
        );
    }
}
