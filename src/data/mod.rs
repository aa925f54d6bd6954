//! Data layer: plate parsing, well mapping, pivoting and ratio statistics.
//!
//! Architecture:
//! ```text
//!  plate reader .csv export
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse export → ParsedPlate (MeasurementTable, timepoints,
//!   └──────────┘                  row labels, column numbers)
//!        │
//!        │          ┌────────────┐   ┌──────────────┐
//!        │          │   units     │ → │  assignment   │  per compound:
//!        │          └────────────┘   └──────────────┘  rows ↔ concentrations,
//!        ▼                                  │          columns ↔ replicates
//!   ┌──────────┐                            │
//!   │  pivot    │ ◀─────────────────────────┘  one PivotedTable per timepoint
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  stats    │  FRET ratio → mean ± SEM per concentration
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  export   │  CSV / clipboard text
//!   └──────────┘
//! ```

pub mod assignment;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod pivot;
pub mod stats;
pub mod units;

pub use error::{Result, WranglerError};
