use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::{Result, WranglerError};
use super::units::{ConcentrationUnit, parse_concentrations};

// ---------------------------------------------------------------------------
// Replicate identity
// ---------------------------------------------------------------------------

/// 1-based replicate number, taken from the order columns were selected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Replicate(pub usize);

impl fmt::Display for Replicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Replicate {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Validation outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    Ready,
    /// More concentrations than rows; holds the shortfall.
    NeedMoreRows(usize),
    /// More rows than concentrations; holds the excess.
    TooManyRows(usize),
    /// Concentrations or replicate columns not supplied.
    Incomplete,
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Ready => write!(f, "Ready"),
            AssignmentStatus::NeedMoreRows(n) => {
                write!(f, "Select {n} more row(s) for the concentrations")
            }
            AssignmentStatus::TooManyRows(n) => {
                write!(f, "You've selected {n} row(s) too many for the concentrations")
            }
            AssignmentStatus::Incomplete => {
                write!(f, "Enter concentrations and select replicate columns")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CompoundAssignment – filled in field by field
// ---------------------------------------------------------------------------

/// Plate layout for one compound, under construction.
///
/// Concentrations pair positionally with `conc_rows`; replicate columns are
/// numbered in the order they were added.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundAssignment {
    pub name: String,
    units: ConcentrationUnit,
    concentration_text: String,
    concentrations: Option<Vec<f64>>,
    conc_rows: Vec<char>,
    replicate_cols: Vec<u32>,
}

impl CompoundAssignment {
    pub fn new(name: impl Into<String>, units: ConcentrationUnit) -> Self {
        Self {
            name: name.into(),
            units,
            concentration_text: String::new(),
            concentrations: None,
            conc_rows: Vec::new(),
            replicate_cols: Vec::new(),
        }
    }

    /// Set molar concentrations directly, bypassing text entry.
    pub fn with_concentrations(mut self, concentrations: Vec<f64>) -> Self {
        self.concentrations = Some(concentrations);
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = char>) -> Self {
        self.conc_rows.clear();
        for row in rows {
            self.select_row(row);
        }
        self
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = u32>) -> Self {
        self.replicate_cols.clear();
        for col in columns {
            self.select_column(col);
        }
        self
    }

    pub fn units(&self) -> ConcentrationUnit {
        self.units
    }

    pub fn concentration_text(&self) -> &str {
        &self.concentration_text
    }

    pub fn concentrations(&self) -> Option<&[f64]> {
        self.concentrations.as_deref()
    }

    pub fn conc_rows(&self) -> &[char] {
        &self.conc_rows
    }

    pub fn replicate_cols(&self) -> &[u32] {
        &self.replicate_cols
    }

    /// Store the raw text and re-resolve it against the current unit.
    ///
    /// On a parse failure the previous concentrations are discarded so no
    /// stale values reach the pivot.
    pub fn set_concentration_text(&mut self, text: &str) -> Result<()> {
        self.concentration_text = text.to_string();
        self.resolve()
    }

    pub fn set_units(&mut self, units: ConcentrationUnit) -> Result<()> {
        self.units = units;
        self.resolve()
    }

    fn resolve(&mut self) -> Result<()> {
        match parse_concentrations(&self.concentration_text, self.units) {
            Ok(concs) => {
                self.concentrations = concs;
                Ok(())
            }
            Err(e) => {
                self.concentrations = None;
                Err(e)
            }
        }
    }

    /// Append a row; selecting the same row twice is a no-op.
    pub fn select_row(&mut self, row: char) {
        if !self.conc_rows.contains(&row) {
            self.conc_rows.push(row);
        }
    }

    pub fn deselect_row(&mut self, row: char) {
        self.conc_rows.retain(|r| *r != row);
    }

    pub fn select_column(&mut self, column: u32) {
        if !self.replicate_cols.contains(&column) {
            self.replicate_cols.push(column);
        }
    }

    pub fn deselect_column(&mut self, column: u32) {
        self.replicate_cols.retain(|c| *c != column);
    }

    pub fn status(&self) -> AssignmentStatus {
        let n_concs = match &self.concentrations {
            Some(c) if !c.is_empty() => c.len(),
            _ => return AssignmentStatus::Incomplete,
        };
        if self.replicate_cols.is_empty() {
            return AssignmentStatus::Incomplete;
        }

        let n_rows = self.conc_rows.len();
        match n_concs.cmp(&n_rows) {
            std::cmp::Ordering::Equal => AssignmentStatus::Ready,
            std::cmp::Ordering::Greater => AssignmentStatus::NeedMoreRows(n_concs - n_rows),
            std::cmp::Ordering::Less => AssignmentStatus::TooManyRows(n_rows - n_concs),
        }
    }

    /// Promote to a [`ReadyAssignment`] if the counts line up.
    pub fn ready(&self) -> Result<ReadyAssignment> {
        match self.status() {
            AssignmentStatus::Ready => {}
            AssignmentStatus::Incomplete => {
                let missing = if self.concentrations.as_ref().map_or(true, Vec::is_empty) {
                    "no concentrations supplied"
                } else {
                    "no replicate columns selected"
                };
                return Err(WranglerError::IncompleteAssignment(missing.to_string()));
            }
            mismatch => return Err(WranglerError::AssignmentCountMismatch(mismatch)),
        }

        let concentrations = self.concentrations.as_deref().unwrap_or_default();
        let mut seen = BTreeSet::new();
        for conc in concentrations {
            if !seen.insert(conc.to_bits()) {
                return Err(WranglerError::DuplicateConcentration(*conc));
            }
        }

        let concentration_by_row = self
            .conc_rows
            .iter()
            .copied()
            .zip(concentrations.iter().copied())
            .collect();
        let replicate_by_column = self
            .replicate_cols
            .iter()
            .enumerate()
            .map(|(i, col)| (*col, Replicate(i + 1)))
            .collect();

        Ok(ReadyAssignment {
            name: self.name.clone(),
            concentration_by_row,
            replicate_by_column,
        })
    }
}

// ---------------------------------------------------------------------------
// ReadyAssignment – validated join maps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ReadyAssignment {
    pub name: String,
    pub concentration_by_row: BTreeMap<char, f64>,
    pub replicate_by_column: BTreeMap<u32, Replicate>,
}

impl ReadyAssignment {
    pub fn replicates(&self) -> BTreeSet<Replicate> {
        self.replicate_by_column.values().copied().collect()
    }
}
