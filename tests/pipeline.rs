use approx::assert_relative_eq;

use fret_wrangler::config::Settings;
use fret_wrangler::data::assignment::{AssignmentStatus, CompoundAssignment, Replicate};
use fret_wrangler::data::export::pivot_to_tsv;
use fret_wrangler::data::loader::parse_export;
use fret_wrangler::data::model::{TimeUnit, Timepoint};
use fret_wrangler::data::pivot::pivot_timepoints;
use fret_wrangler::data::stats::ratio_statistics;
use fret_wrangler::data::units::ConcentrationUnit;
use fret_wrangler::data::WranglerError;

/// Rows A–C × columns 1–3 plus one unused well, read at 0 s and 120 s.
const EXPORT: &str = "\
User: LAB
Path: C:\\Program Files\\Data
Test ID: 311
Test Name: TR-FRET competition

Well,Content,Raw Data (337/665 A),Raw Data (337/665 A).1,Raw Data (337/620 B),Raw Data (337/620 B).1,
,Time [s],0,120,0,120,
A1,Sample X1,100,90,50,50,
A2,Sample X2,100,90,50,50,
A3,Sample X3,100,90,50,50,
B1,Sample X4,50,45,50,50,
B2,Sample X5,100,90,50,50,
B3,Sample X6,150,135,50,50,
C1,Sample X7,10,10,50,50,
C2,Sample X8,20,20,50,50,
C3,Sample X9,10,10,0,0,
D7,Blank B1,5,5,5,5,
";

fn compound() -> CompoundAssignment {
    let mut assignment = CompoundAssignment::new("Cmpd-1", ConcentrationUnit::Nanomolar);
    assignment.set_concentration_text("1, 10").unwrap();
    assignment.with_rows(['A', 'B']).with_columns([1, 2, 3])
}

#[test]
fn export_to_statistics() {
    let settings = Settings::default();
    let plate = parse_export(EXPORT.as_bytes(), settings.header_skip_rows).unwrap();

    assert_eq!(plate.table.len(), 10);
    assert_eq!(plate.row_labels.len(), 4);
    assert_eq!(plate.column_numbers.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 7]);

    let assignment = compound();
    assert_eq!(assignment.status(), AssignmentStatus::Ready);
    let ready = assignment.ready().unwrap();

    let series = pivot_timepoints(&plate.table, &ready, 60.0, TimeUnit::Seconds);
    assert_eq!(series.labels().collect::<Vec<_>>(), vec!["60 seconds", "180 seconds"]);

    let first = &series.entries[0];
    assert_eq!(first.timepoint, Timepoint::Offset(0.0));
    assert_eq!(first.table.concentrations.len(), 2);
    assert_relative_eq!(first.table.concentrations[0], 1e-9, max_relative = 1e-12);
    assert_relative_eq!(first.table.concentrations[1], 1e-8, max_relative = 1e-12);
    assert_eq!(first.table.replicates().len(), 3);
    assert_eq!(first.table.columns.len(), 6);
    // Row C and well D7 are not part of the assignment.
    assert_eq!(first.table.excluded_wells, 4);

    let stats = ratio_statistics(&first.table, &settings.ratio_channels).unwrap();
    assert_eq!(stats.points.len(), 2);

    let low = stats.points[0];
    assert_relative_eq!(low.mean_ratio, 2.0, epsilon = 1e-12);
    assert_relative_eq!(low.standard_error, 0.0, epsilon = 1e-12);

    // Ratios 1, 2, 3.
    let high = stats.points[1];
    assert_relative_eq!(high.mean_ratio, 2.0, epsilon = 1e-12);
    let expected = (2.0f64 / 3.0).sqrt() / 3.0f64.sqrt();
    assert_relative_eq!(high.standard_error, expected, epsilon = 1e-12);
    assert_eq!(high.n, 3);

    let later = series.get("180 seconds").unwrap();
    let later_stats = ratio_statistics(&later.table, &settings.ratio_channels).unwrap();
    assert_relative_eq!(later_stats.points[0].mean_ratio, 1.8, epsilon = 1e-12);
}

#[test]
fn zero_denominator_is_missing_not_fatal() {
    let plate = parse_export(EXPORT.as_bytes(), 4).unwrap();
    let ready = CompoundAssignment::new("Cmpd-2", ConcentrationUnit::Micromolar)
        .with_concentrations(vec![1e-6])
        .with_rows(['C'])
        .with_columns([1, 2, 3])
        .ready()
        .unwrap();

    let series = pivot_timepoints(&plate.table, &ready, 0.0, TimeUnit::Seconds);
    let stats = ratio_statistics(&series.entries[0].table, &Default::default()).unwrap();

    // Ratios 0.2, 0.4 and a zero denominator; the error still divides by
    // all three replicates.
    let p = stats.points[0];
    assert_eq!(p.n, 2);
    assert_relative_eq!(p.mean_ratio, 0.3, epsilon = 1e-12);
    assert_relative_eq!(p.standard_error, 0.1 / 3.0f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn pivot_and_statistics_are_reproducible() {
    let plate = parse_export(EXPORT.as_bytes(), 4).unwrap();
    let ready = compound().ready().unwrap();
    let settings = Settings::default();

    let run = || {
        let series = pivot_timepoints(&plate.table, &ready, 0.0, TimeUnit::Minutes);
        let stats: Vec<_> = series
            .entries
            .iter()
            .map(|e| ratio_statistics(&e.table, &settings.ratio_channels).unwrap())
            .collect();
        (series, stats)
    };

    assert_eq!(run(), run());
}

#[test]
fn renamed_channels_surface_missing_channel() {
    let plate = parse_export(EXPORT.as_bytes(), 4).unwrap();
    let ready = compound().ready().unwrap();
    let series = pivot_timepoints(&plate.table, &ready, 0.0, TimeUnit::Seconds);

    let mut settings = Settings::default();
    settings.ratio_channels.numerator = "Raw Data (337/665)".to_string();
    let err = ratio_statistics(&series.entries[0].table, &settings.ratio_channels).unwrap_err();
    assert!(matches!(err, WranglerError::MissingChannel(_)));
}

#[test]
fn clipboard_text_has_one_line_per_concentration() {
    let plate = parse_export(EXPORT.as_bytes(), 4).unwrap();
    let ready = compound().ready().unwrap();
    let series = pivot_timepoints(&plate.table, &ready, 0.0, TimeUnit::Seconds);

    let text = pivot_to_tsv(&series.entries[0].table).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].ends_with(&Replicate(3).to_string()));
}

#[test]
fn structural_errors_abort_parsing() {
    let no_content = EXPORT.replace("Content", "Sample");
    assert!(matches!(
        parse_export(no_content.as_bytes(), 4),
        Err(WranglerError::UnrecognizedFormat(_))
    ));

    let bad_well = EXPORT.replace("B3,", "3B,");
    assert!(matches!(
        parse_export(bad_well.as_bytes(), 4),
        Err(WranglerError::MalformedWellIdentifier { ref cell }) if cell == "3B"
    ));
}
