//! Reshape TR-FRET plate reader exports into concentration-response data.
//!
//! [`data`] holds the parsing and table-reshaping engine; [`config`] the
//! user-adjustable settings. The `fret-wrangler` binary is a thin egui
//! front end over both.

pub mod config;
pub mod data;
