use std::fmt;
use std::str::FromStr;

use super::error::{Result, WranglerError};

/// Unit the user typed concentrations in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationUnit {
    Molar,
    Millimolar,
    Micromolar,
    #[default]
    Nanomolar,
}

impl ConcentrationUnit {
    /// Selection order offered to the user.
    pub const ALL: [ConcentrationUnit; 4] = [
        ConcentrationUnit::Nanomolar,
        ConcentrationUnit::Micromolar,
        ConcentrationUnit::Millimolar,
        ConcentrationUnit::Molar,
    ];

    /// Factor converting a value in this unit to molar.
    pub fn multiplier(self) -> f64 {
        match self {
            ConcentrationUnit::Molar => 1.0,
            ConcentrationUnit::Millimolar => 1e-3,
            ConcentrationUnit::Micromolar => 1e-6,
            ConcentrationUnit::Nanomolar => 1e-9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConcentrationUnit::Molar => "molar",
            ConcentrationUnit::Millimolar => "millimolar",
            ConcentrationUnit::Micromolar => "micromolar",
            ConcentrationUnit::Nanomolar => "nanomolar",
        }
    }
}

impl fmt::Display for ConcentrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcentrationUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ConcentrationUnit::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown concentration unit '{s}'"))
    }
}

/// Parse comma-separated concentrations and convert them to molar.
///
/// Returns `Ok(None)` for blank input: nothing supplied yet, which is not an
/// error. If any token contains a decimal point every token is read as a
/// float, otherwise every token must be an integer.
pub fn parse_concentrations(text: &str, unit: ConcentrationUnit) -> Result<Option<Vec<f64>>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    if let Some(empty) = tokens.iter().find(|t| t.is_empty()) {
        return Err(WranglerError::ConcentrationParse {
            token: (*empty).to_string(),
        });
    }

    let as_float = tokens.iter().any(|t| t.contains('.'));
    let raw: Vec<f64> = tokens
        .iter()
        .map(|token| {
            let parsed = if as_float {
                token.parse::<f64>().ok()
            } else {
                token.parse::<i64>().ok().map(|v| v as f64)
            };
            parsed
                .filter(|v| v.is_finite())
                .ok_or_else(|| WranglerError::ConcentrationParse {
                    token: token.to_string(),
                })
        })
        .collect::<Result<_>>()?;

    let multiplier = unit.multiplier();
    Ok(Some(raw.into_iter().map(|v| v * multiplier).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_relative_eq!(*a, *e, max_relative = 1e-12);
        }
    }

    #[test]
    fn integers_in_nanomolar() {
        let concs = parse_concentrations("1, 10, 100", ConcentrationUnit::Nanomolar)
            .unwrap()
            .unwrap();
        assert_all_close(&concs, &[1e-9, 1e-8, 1e-7]);
    }

    #[test]
    fn decimals_in_micromolar() {
        let concs = parse_concentrations("1.5, 2.5", ConcentrationUnit::Micromolar)
            .unwrap()
            .unwrap();
        assert_all_close(&concs, &[1.5e-6, 2.5e-6]);
    }

    #[test]
    fn one_decimal_switches_every_token_to_float() {
        let concs = parse_concentrations("3,0.5", ConcentrationUnit::Molar)
            .unwrap()
            .unwrap();
        assert_all_close(&concs, &[3.0, 0.5]);
    }

    #[test]
    fn blank_input_is_not_an_error() {
        assert!(parse_concentrations("", ConcentrationUnit::Molar).unwrap().is_none());
        assert!(parse_concentrations("   ", ConcentrationUnit::Molar).unwrap().is_none());
    }

    #[test]
    fn rejects_bad_tokens() {
        for text in ["1, x, 3", "1,,2", "1, 2,", "1e-3", "nan.0"] {
            let err = parse_concentrations(text, ConcentrationUnit::Nanomolar).unwrap_err();
            assert!(matches!(err, WranglerError::ConcentrationParse { .. }), "{text}");
        }
    }

    #[test]
    fn unit_names_round_trip() {
        for unit in ConcentrationUnit::ALL {
            assert_eq!(unit.as_str().parse::<ConcentrationUnit>().unwrap(), unit);
        }
        assert!("picomolar".parse::<ConcentrationUnit>().is_err());
    }
}
