#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Power/detuning/position scan driven by a TOML configuration file.
//!
//! Usage: `transfer_scan [CONFIG]`, defaulting to `scan.toml`.

use anyhow::Result;
use state_prep::{
    mkdir,
    println_flush,
    config::read_config,
    scan::run_scan,
};

fn main() -> Result<()> {
    let path = std::env::args().nth(1)
        .unwrap_or_else(|| "scan.toml".to_string());
    let config = read_config(&path)?;
    mkdir!(config.outdir);

    println_flush!(
        "scanning {} x {} x {} grid points on {} workers",
        config.grid.powers.len(),
        config.grid.detunings.len(),
        config.grid.positions.len(),
        config.workers,
    );
    let table = run_scan(&config)?;

    for row in table.failures() {
        eprintln!(
            "failed point (power {:.3e} W, detuning {:.3e} Hz, \
            position {:.3e} m): {}",
            row.power,
            row.detuning,
            row.position,
            row.error.as_deref().unwrap_or("unknown"),
        );
    }

    if config.save_archives {
        for row in table.rows.iter() {
            if let Some(archive) = &row.archive {
                println_flush!(
                    "archived (power {:.3e} W, detuning {:.3e} Hz) -> {}",
                    row.power,
                    row.detuning,
                    archive.display(),
                );
            }
        }
    }

    let out = config.outdir.join("scan.npz");
    table.save_npz(&out)?;
    println_flush!("wrote {}", out.display());
    Ok(())
}
