use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use fret_wrangler::config::Settings;
use fret_wrangler::data::export;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct FretWranglerApp {
    pub state: AppState,
}

impl FretWranglerApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl eframe::App for FretWranglerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: experiment options ----
        egui::SidePanel::left("options_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tables and plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(msg) = compound_results(ui, &self.state) {
                self.state.status_message = Some(msg);
            }
        });
    }
}

/// One section per compound: pivot grid, export buttons, ratio plot.
///
/// Returns a status message when an export fails.
fn compound_results(ui: &mut Ui, state: &AppState) -> Option<String> {
    if state.plate.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a plate reader export to begin  (File → Open…)");
        });
        return None;
    }

    let mut status = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for compound in &state.compounds {
                let name = compound.name();
                ui.heading(name);

                let result = match &compound.result {
                    Some(Ok(result)) => result,
                    Some(Err(msg)) => {
                        ui.label(RichText::new(msg).color(Color32::DARK_RED));
                        ui.separator();
                        continue;
                    }
                    None => continue,
                };
                let Some(pivot) = result.selected_pivot() else {
                    continue;
                };

                ui.horizontal(|ui: &mut Ui| {
                    ui.label(format!("Time point: {}", pivot.label));
                    if pivot.table.excluded_wells > 0 {
                        ui.weak(format!(
                            "{} well(s) not assigned to {name}",
                            pivot.table.excluded_wells
                        ));
                    }
                    if ui.button("Copy table").clicked() {
                        match export::pivot_to_tsv(&pivot.table) {
                            Ok(text) => ui.ctx().copy_text(text),
                            Err(e) => status = Some(format!("Error: {e}")),
                        }
                    }
                    if ui.button("Save CSV…").clicked() {
                        status = panels::save_csv_dialog(name, result);
                    }
                });

                table::pivot_grid(ui, &format!("{name}_grid"), &pivot.table);
                ui.add_space(8.0);

                match &result.statistics {
                    Ok(stats) => plot::response_plot(ui, &format!("{name}_plot"), name, stats),
                    Err(msg) => {
                        ui.label(RichText::new(msg).color(Color32::DARK_RED));
                    }
                }
                ui.separator();
            }
        });
    status
}
