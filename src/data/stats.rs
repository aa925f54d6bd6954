use serde::{Deserialize, Serialize};

use super::error::{Result, WranglerError};
use super::pivot::PivotedTable;

/// The two emission channels whose quotient is the FRET ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioChannels {
    pub numerator: String,
    pub denominator: String,
}

impl Default for RatioChannels {
    fn default() -> Self {
        Self {
            numerator: "Raw Data (337/665 A)".to_string(),
            denominator: "Raw Data (337/620 B)".to_string(),
        }
    }
}

/// Mean ratio across replicates at one concentration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioPoint {
    pub concentration: f64,
    pub mean_ratio: f64,
    pub standard_error: f64,
    /// Replicates that contributed a finite ratio. The standard error still
    /// divides by the full replicate count.
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatioStatistics {
    pub points: Vec<RatioPoint>,
}

impl RatioStatistics {
    /// Points with a finite mean, i.e. the ones that can be plotted.
    pub fn plottable(&self) -> impl Iterator<Item = &RatioPoint> {
        self.points
            .iter()
            .filter(|p| p.mean_ratio.is_finite() && p.concentration > 0.0)
    }
}

/// Per-replicate ratio series, aligned on the pivot's concentrations.
pub fn ratio_by_replicate(pivot: &PivotedTable, channels: &RatioChannels) -> Result<Vec<Vec<f64>>> {
    for channel in [&channels.numerator, &channels.denominator] {
        if !pivot.has_channel(channel) {
            return Err(WranglerError::MissingChannel(channel.clone()));
        }
    }

    let ratios = pivot
        .replicates()
        .into_iter()
        .map(|rep| {
            let num = pivot.series(&channels.numerator, rep).unwrap_or_default();
            let den = pivot.series(&channels.denominator, rep).unwrap_or_default();
            num.iter()
                .zip(&den)
                .map(|(a, b)| {
                    let r = a / b;
                    if r.is_finite() { r } else { f64::NAN }
                })
                .collect()
        })
        .collect();
    Ok(ratios)
}

/// Mean and standard error of the channel ratio at each concentration.
///
/// Mean and population standard deviation skip missing ratios. The standard
/// error divides by the square root of the pivot's replicate count, whether
/// or not every replicate produced a finite ratio.
pub fn ratio_statistics(pivot: &PivotedTable, channels: &RatioChannels) -> Result<RatioStatistics> {
    let ratios = ratio_by_replicate(pivot, channels)?;
    let n_replicates = ratios.len();

    let points = pivot
        .concentrations
        .iter()
        .enumerate()
        .map(|(i, &concentration)| {
            let row: Vec<f64> = ratios
                .iter()
                .map(|series| series[i])
                .filter(|r| r.is_finite())
                .collect();
            let (mean_ratio, standard_error) = mean_and_sem(&row, n_replicates);
            RatioPoint {
                concentration,
                mean_ratio,
                standard_error,
                n: row.len(),
            }
        })
        .collect();

    Ok(RatioStatistics { points })
}

fn mean_and_sem(values: &[f64], n_replicates: usize) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt() / (n_replicates as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::assignment::Replicate;
    use crate::data::model::Timepoint;
    use crate::data::pivot::PivotColumn;
    use approx::assert_relative_eq;

    const A: &str = "Raw Data (337/665 A)";
    const B: &str = "Raw Data (337/620 B)";

    /// One concentration per entry of `rows`; each row lists
    /// `(channel A, channel B)` per replicate.
    fn pivot(rows: &[(f64, Vec<(f64, f64)>)]) -> PivotedTable {
        let n_reps = rows[0].1.len();
        let mut columns = Vec::new();
        for channel in [A, B] {
            for k in 1..=n_reps {
                columns.push(PivotColumn {
                    channel: channel.to_string(),
                    replicate: Replicate(k),
                });
            }
        }
        let values = rows
            .iter()
            .map(|(_, reps)| {
                reps.iter()
                    .map(|(a, _)| *a)
                    .chain(reps.iter().map(|(_, b)| *b))
                    .collect()
            })
            .collect();

        PivotedTable {
            timepoint: Timepoint::Endpoint,
            concentrations: rows.iter().map(|(c, _)| *c).collect(),
            columns,
            values,
            excluded_wells: 0,
        }
    }

    #[test]
    fn single_replicate_ratio() {
        let table = pivot(&[(1e-9, vec![(100.0, 50.0)])]);
        let ratios = ratio_by_replicate(&table, &RatioChannels::default()).unwrap();
        assert_eq!(ratios, vec![vec![2.0]]);
    }

    #[test]
    fn identical_replicates_have_zero_error() {
        let table = pivot(&[(1e-9, vec![(100.0, 50.0), (200.0, 100.0), (50.0, 25.0)])]);
        let stats = ratio_statistics(&table, &RatioChannels::default()).unwrap();

        let p = stats.points[0];
        assert_relative_eq!(p.mean_ratio, 2.0);
        assert_relative_eq!(p.standard_error, 0.0);
        assert_eq!(p.n, 3);
    }

    #[test]
    fn standard_error_uses_population_std() {
        let table = pivot(&[(1e-8, vec![(1.0, 1.0), (4.0, 2.0), (9.0, 3.0)])]);
        let stats = ratio_statistics(&table, &RatioChannels::default()).unwrap();

        let p = stats.points[0];
        let expected_std = (2.0f64 / 3.0).sqrt();
        assert_relative_eq!(p.mean_ratio, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.standard_error, expected_std / 3.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn bad_denominators_become_missing() {
        let table = pivot(&[
            (1e-9, vec![(100.0, 0.0), (100.0, 50.0)]),
            (1e-8, vec![(f64::NAN, 10.0), (0.0, 0.0)]),
        ]);
        let ratios = ratio_by_replicate(&table, &RatioChannels::default()).unwrap();
        assert!(ratios[0][0].is_nan());
        assert_eq!(ratios[1][0], 2.0);

        let stats = ratio_statistics(&table, &RatioChannels::default()).unwrap();
        assert_relative_eq!(stats.points[0].mean_ratio, 2.0);
        assert_relative_eq!(stats.points[0].standard_error, 0.0);
        assert_eq!(stats.points[0].n, 1);
        assert!(stats.points[1].mean_ratio.is_nan());
        assert!(stats.points[1].standard_error.is_nan());
        assert_eq!(stats.points[1].n, 0);
        assert_eq!(stats.plottable().count(), 1);
    }

    #[test]
    fn standard_error_divides_by_every_replicate() {
        // Replicate 3 has a blank acceptor reading: ratios 1, 2, NaN.
        let table = pivot(&[(1e-8, vec![(1.0, 1.0), (4.0, 2.0), (f64::NAN, 3.0)])]);
        let stats = ratio_statistics(&table, &RatioChannels::default()).unwrap();

        let p = stats.points[0];
        assert_relative_eq!(p.mean_ratio, 1.5, epsilon = 1e-12);
        assert_relative_eq!(p.standard_error, 0.5 / 3.0f64.sqrt(), epsilon = 1e-12);
        assert_eq!(p.n, 2);
    }

    #[test]
    fn missing_channel_is_an_error() {
        let table = pivot(&[(1e-9, vec![(100.0, 50.0)])]);
        let channels = RatioChannels {
            numerator: A.to_string(),
            denominator: "Raw Data (337/615 B)".to_string(),
        };
        let err = ratio_statistics(&table, &channels).unwrap_err();
        assert!(matches!(err, WranglerError::MissingChannel(ref c) if c == "Raw Data (337/615 B)"));
    }

    #[test]
    fn statistics_are_deterministic() {
        let table = pivot(&[
            (1e-9, vec![(10.0, 3.0), (11.0, 3.0)]),
            (1e-7, vec![(7.0, 2.0), (8.0, 3.0)]),
        ]);
        let channels = RatioChannels::default();
        assert_eq!(
            ratio_statistics(&table, &channels).unwrap(),
            ratio_statistics(&table, &channels).unwrap()
        );
    }
}
