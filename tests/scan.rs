//! Scan-harness behavior: grid expansion, per-point isolation, and failure
//! policy.

use state_prep::{
    config::ScanConfig,
    error::ConfigError,
    scan::run_scan,
};

fn config_toml(outdir: &std::path::Path, vz: f64) -> String {
    format!(r#"
        workers = 2
        n_steps = 400
        outdir = "{}"

        [trajectory]
        rini = [0.0, 0.0, -0.02]
        vini = [0.0, 0.0, {vz}]
        z_final = 0.02

        [basis]
        manifolds = [0, 1]

        [transition]
        j_g = 0
        j_e = 1

        [microwave]
        sigma = 0.005
        k = [1.0, 0.0, 0.0]
        polarization = [0.0, 0.0, 1.0]

        [grid]
        powers = [0.0, 1e-7]
        detunings = [0.0]
        positions = [0.0]

        [states]
        initial = "J=0, mJ=0, m1=1/2, m2=1/2"
        intermediate = "J=0, mJ=0, m1=1/2, m2=1/2"
        target = "J=1, mJ=0, m1=1/2, m2=1/2"

        [fields]
        electric = [0.0, 0.0, 0.0]
        magnetic = [0.0, 0.0, 0.0]

        [hyperfine]
        c1 = 0.0
        c2 = 0.0
        c4 = 0.0
    "#, outdir.display())
}

#[test]
fn small_grid_runs_clean() {
    let outdir = std::env::temp_dir();
    let config: ScanConfig
        = toml::from_str(&config_toml(&outdir, 200.0)).unwrap();
    let table = run_scan(&config).unwrap();
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.failures().count(), 0);
    for row in table.rows.iter() {
        assert!((0.0..=1.0).contains(&row.prob_intermediate));
        assert!((0.0..=1.0).contains(&row.prob_final));
    }
    // zero power must leave the target state empty
    let quiet
        = table.rows.iter().find(|row| row.power == 0.0).unwrap();
    assert!(quiet.prob_final < 1e-9);

    let out = outdir.join(format!("scan-test-{}.npz", std::process::id()));
    table.save_npz(&out).unwrap();
    std::fs::remove_file(&out).ok();
}

#[test]
fn bad_trajectory_rejected() {
    let outdir = std::env::temp_dir();
    let config: ScanConfig
        = toml::from_str(&config_toml(&outdir, 0.0)).unwrap();
    assert!(matches!(
        run_scan(&config),
        Err(ConfigError::Trajectory(_)),
    ));
}
