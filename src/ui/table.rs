use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use fret_wrangler::data::pivot::PivotedTable;

/// Render a pivot as a grid: concentrations down, (channel, replicate) across.
pub fn pivot_grid(ui: &mut Ui, id: &str, pivot: &PivotedTable) {
    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .column(Column::auto().at_least(120.0))
                .columns(Column::auto().at_least(90.0), pivot.columns.len())
                .header(36.0, |mut header| {
                    header.col(|ui: &mut Ui| {
                        ui.strong("Concentration (M)");
                    });
                    for column in &pivot.columns {
                        header.col(|ui: &mut Ui| {
                            ui.vertical(|ui: &mut Ui| {
                                ui.small(column.channel.as_str());
                                ui.strong(column.replicate.to_string());
                            });
                        });
                    }
                })
                .body(|mut body| {
                    for (conc, row) in pivot.concentrations.iter().zip(&pivot.values) {
                        body.row(18.0, |mut cells| {
                            cells.col(|ui: &mut Ui| {
                                ui.label(format!("{conc:.3e}"));
                            });
                            for value in row {
                                cells.col(|ui: &mut Ui| {
                                    ui.label(format_reading(*value));
                                });
                            }
                        });
                    }
                });
        });
    });
}

fn format_reading(v: f64) -> String {
    if v.is_nan() { "–".to_string() } else { format!("{v}") }
}
