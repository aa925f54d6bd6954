//! Write a synthetic TR-FRET plate export for trying out the viewer.
//!
//! Usage: `generate_sample [OUTPUT.csv] [--endpoint]`
//!
//! Two compounds are laid out as 8-point dilution series in rows A–H:
//! `Cmpd-1` in columns 1–3 and `Cmpd-2` in columns 4–6.

use std::io::Write;

use anyhow::{Context, Result};

const ACCEPTOR: &str = "Raw Data (337/665 A)";
const DONOR: &str = "Raw Data (337/620 B)";
const TIMEPOINTS: [f64; 4] = [0.0, 300.0, 600.0, 900.0];
/// Molar concentrations, one per row A–H.
const CONCENTRATIONS: [f64; 8] = [1e-10, 3e-10, 1e-9, 3e-9, 1e-8, 3e-8, 1e-7, 3e-7];

/// Four-parameter logistic: ratio falls from `top` to `bottom` around `ic50`.
fn dose_response(conc: f64, ic50: f64, hill: f64) -> f64 {
    let (bottom, top) = (0.4, 2.2);
    bottom + (top - bottom) / (1.0 + (conc / ic50).powf(hill))
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Expected FRET ratio for a well, or `None` for an unused well.
fn well_ratio(row: usize, col: u32) -> Option<f64> {
    let conc = *CONCENTRATIONS.get(row)?;
    match col {
        1..=3 => Some(dose_response(conc, 5e-9, 1.0)),
        4..=6 => Some(dose_response(conc, 4e-8, 1.4)),
        _ => None,
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let endpoint = args.iter().any(|a| a == "--endpoint");
    let output_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map_or("sample_plate.csv", String::as_str);

    let timepoints: &[f64] = if endpoint { &TIMEPOINTS[..1] } else { &TIMEPOINTS };
    let mut rng = SimpleRng::new(42);

    let mut file = std::fs::File::create(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writeln!(file, "User: USER")?;
    writeln!(file, "Path: C:\\Program Files (x86)\\BMG\\PHERAstar\\User\\Data")?;
    writeln!(file, "Test ID: 1")?;
    writeln!(file, "Test Name: TR-FRET competition")?;
    writeln!(file)?;

    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

    let mut header = vec!["Well".to_string(), "Content".to_string()];
    for channel in [ACCEPTOR, DONOR] {
        for i in 0..timepoints.len() {
            header.push(if i == 0 { channel.to_string() } else { format!("{channel}.{i}") });
        }
    }
    header.push(String::new());
    wtr.write_record(&header)?;

    if !endpoint {
        let mut time_row = vec![String::new(), "Time [s]".to_string()];
        for _ in [ACCEPTOR, DONOR] {
            time_row.extend(timepoints.iter().map(|t| t.to_string()));
        }
        time_row.push(String::new());
        wtr.write_record(&time_row)?;
    }

    let mut n_wells = 0;
    for (row_idx, row) in ('A'..='P').enumerate() {
        for col in 1..=24u32 {
            let ratio = well_ratio(row_idx, col);
            let content = match ratio {
                Some(_) => format!("Sample X{}", n_wells + 1),
                None => "Blank B".to_string(),
            };

            let mut acceptor = Vec::with_capacity(timepoints.len());
            let mut donor = Vec::with_capacity(timepoints.len());
            for (t_idx, _) in timepoints.iter().enumerate() {
                let d = rng.gauss(24000.0, 600.0).round();
                // Slight signal decay over the kinetic read.
                let r = ratio.unwrap_or(0.05) * (1.0 - 0.015 * t_idx as f64);
                let a = (d * r + rng.gauss(0.0, 150.0)).round().max(0.0);
                donor.push(d.to_string());
                acceptor.push(a.to_string());
            }

            let mut record = vec![format!("{row}{col}"), content];
            record.extend(acceptor);
            record.extend(donor);
            record.push(String::new());
            wtr.write_record(&record)?;
            n_wells += 1;
        }
    }
    wtr.flush()?;

    println!(
        "Wrote {n_wells} wells ({} timepoint(s)) to {output_path}",
        timepoints.len()
    );
    Ok(())
}
