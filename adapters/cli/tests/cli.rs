use std::process::Command;

fn plinth(scenario: &str) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_plinth"))
        .arg(format!("{}/scenarios/{scenario}", env!("CARGO_MANIFEST_DIR")))
        .output()
        .expect("failed to launch the plinth binary")
}

#[test]
fn courtyard_scenario_prints_a_detour() {
    let output = plinth("courtyard.toml");
    assert!(output.status.success(), "plinth should accept the courtyard scenario");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.starts_with("grid: 25 cells in 5x1x5 (Uniform)"));
    assert!(stdout.contains("placed object 0 at (2, 0, 1) facing BottomLeft"));
    assert!(stdout.contains("rejected placement at (2, 0, 2): Occupied"));
    assert!(stdout.contains("path (0, 0, 2) -> (4, 0, 2): 9 cells, cost 8:"));
    assert!(stdout.contains("reachable from (0, 0, 2) within 2: 8 cells"));
}

#[test]
fn missing_scenario_fails_with_context() {
    let output = plinth("does-not-exist.toml");
    assert!(!output.status.success(), "a missing scenario must fail");

    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(stderr.contains("failed to read scenario"));
}
