use eframe::egui::{Color32, Ui};
use egui_plot::{GridInput, GridMark, Line, MarkerShape, Plot, PlotPoints, Points};

use fret_wrangler::data::stats::RatioStatistics;

/// Half-width of an error bar cap, in decades.
const CAP_HALF_WIDTH: f64 = 0.04;
const MARKER_COLOR: Color32 = Color32::BLACK;
/// Widest x span, in decades, that still gets per-decade grid marks.
const MAX_LOG_DECADES: f64 = 30.0;

// ---------------------------------------------------------------------------
// Concentration-response plot
// ---------------------------------------------------------------------------

/// Mean FRET ratio ± SEM against log10 concentration.
///
/// egui_plot has no log axis, so x is plotted as `log10(concentration)` and
/// the grid and tick labels are drawn in decades.
pub fn response_plot(ui: &mut Ui, id: &str, compound: &str, stats: &RatioStatistics) {
    let points: Vec<[f64; 3]> = stats
        .plottable()
        .map(|p| [p.concentration.log10(), p.mean_ratio, p.standard_error])
        .collect();

    if points.is_empty() {
        ui.label("No finite ratios to plot.");
        return;
    }

    Plot::new(id)
        .height(320.0)
        .x_axis_label(format!("[{compound}] (M)"))
        .y_axis_label("FRET ratio")
        .x_grid_spacer(log_axis_spacer)
        .x_axis_formatter(|mark, _range| decade_label(mark.value))
        .label_formatter(|_name, value| {
            format!("{:.3e} M\n{:.4}", 10f64.powf(value.x), value.y)
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &[x, y, se] in &points {
                if !se.is_finite() || se <= 0.0 {
                    continue;
                }
                for segment in error_bar(x, y, se) {
                    plot_ui.line(Line::new(PlotPoints::from(segment)).color(MARKER_COLOR).width(1.0));
                }
            }

            let markers: PlotPoints = points.iter().map(|&[x, y, _]| [x, y]).collect();
            plot_ui.points(
                Points::new(markers)
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(4.0)
                    .color(MARKER_COLOR)
                    .name(compound),
            );
        });
}

/// Vertical bar plus top and bottom caps.
fn error_bar(x: f64, y: f64, se: f64) -> [Vec<[f64; 2]>; 3] {
    let (lo, hi) = (y - se, y + se);
    [
        vec![[x, lo], [x, hi]],
        vec![[x - CAP_HALF_WIDTH, hi], [x + CAP_HALF_WIDTH, hi]],
        vec![[x - CAP_HALF_WIDTH, lo], [x + CAP_HALF_WIDTH, lo]],
    ]
}

/// Major marks on every decade, minor marks at 2–9 × 10ⁿ.
///
/// Zoomed out past `MAX_LOG_DECADES`, egui_plot's default spacer takes over.
fn log_axis_spacer(input: GridInput) -> Vec<GridMark> {
    let (min, max) = input.bounds;
    if !(max - min).is_finite() || max - min > MAX_LOG_DECADES {
        return egui_plot::log_grid_spacer(10)(input);
    }
    let mut marks = Vec::new();
    for decade in min.floor() as i32..=max.ceil() as i32 {
        for j in 1..10 {
            let value = f64::from(decade) + f64::from(j).log10();
            let step_size = if j == 1 { 1.0 } else { 0.1 };
            if (min..=max).contains(&value) {
                marks.push(GridMark { value, step_size });
            }
        }
    }
    marks
}

fn decade_label(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 {
        format!("1e{}", rounded as i32)
    } else {
        String::new()
    }
}
