use std::path::Path;
use std::process::{Command, Output};

use road_follow::simulation::ProfileLibrary;

fn run_simulation(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_road_follow"))
        .args(args)
        .env("RUST_LOG", "warn,road_follow=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Parse the number logged after `label`, handling the log prefix
fn logged_value(stderr: &str, label: &str) -> f64 {
    let line = stderr
        .lines()
        .find(|line| line.contains(label))
        .unwrap_or_else(|| panic!("Could not find '{}' line in: {}", label, stderr));
    let parts: Vec<&str> = line.split(label).collect();
    parts
        .get(1)
        .map(|s| s.trim().trim_end_matches('m').trim_end_matches('s'))
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("Could not parse value from line: {}", line))
}

/// Test that the simulation runs headless to completion
#[test]
fn test_headless_simulation_runs() {
    let output = run_simulation(&["--ticks", "200", "--seed", "1"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
    assert_eq!(logged_value(&stderr, "Ticks:"), 200.0);
    assert_eq!(logged_value(&stderr, "Vehicles:"), 6.0);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Final State ==="));
}

/// Test that generated traffic never overlaps in either scenario
#[test]
fn test_scenarios_keep_vehicles_apart() {
    for scenario in ["platoon", "wall"] {
        let output = run_simulation(&[
            "--scenario",
            scenario,
            "--ticks",
            "500",
            "--autonomous",
            "4",
            "--human",
            "4",
            "--seed",
            "3",
        ]);
        assert!(output.status.success(), "{} scenario failed", scenario);

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(logged_value(&stderr, "Overlaps:"), 0.0, "{}", stderr);
        assert!(logged_value(&stderr, "Minimum gap:") > 0.0);
    }
}

/// Test that the realtime clock stops after the requested ticks
#[test]
fn test_realtime_simulation_runs() {
    let output = run_simulation(&["--realtime", "--ticks", "5", "--seed", "2"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Simulation clock started"));
    assert!(stderr.contains("Simulation clock stopped"));
    assert!(logged_value(&stderr, "Ticks:") >= 5.0);
}

/// Test that invalid input is reported as a failure
#[test]
fn test_invalid_arguments_fail() {
    let output = run_simulation(&["--delta", "0", "--ticks", "3"]);
    assert!(!output.status.success());

    let output = run_simulation(&["--profile", "hovercraft", "--ticks", "3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hovercraft"));
}

/// Test the bundled profile file loads and drives a run
#[test]
fn test_profile_file_is_usable() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("profiles/vehicles.toml");
    let library = ProfileLibrary::load(&path).expect("profile file parses");
    assert_eq!(library.resolve("van").unwrap().length, 5.5);
    assert_eq!(library.resolve("bus").unwrap().min_gap, 3.0);

    let path = path.to_string_lossy().to_string();
    let output = run_simulation(&["--profile-file", &path, "--profile", "bus", "--ticks", "50"]);
    assert!(output.status.success());
}
