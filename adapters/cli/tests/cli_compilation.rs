use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "tower-defence"])
        .status()
        .expect("failed to invoke cargo check for tower-defence CLI binary");

    assert!(status.success(), "cargo check --bin tower-defence should succeed");
}

#[test]
fn builtin_scenario_runs_to_completion() {
    let output = Command::new(env!("CARGO_BIN_EXE_tower-defence"))
        .args(["--ticks", "200"])
        .output()
        .expect("failed to run tower-defence binary");

    assert!(output.status.success(), "tower-defence should exit cleanly");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ticks: 200"));
    assert!(stdout.contains("tower 0 arrow"));
}

#[test]
fn missing_scenario_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_tower-defence"))
        .args(["--scenario", "does/not/exist.toml"])
        .output()
        .expect("failed to run tower-defence binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read scenario"));
}
