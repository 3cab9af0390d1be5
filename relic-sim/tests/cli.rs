use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "relic-sim-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report_for_each_seed() {
    let exe = env!("CARGO_BIN_EXE_relic-sim");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args(["--seeds", "1,2", "--events", "300", "--report", "json", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    std::fs::remove_file(&output_path).ok();
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(report["summary"]["runs"], 2);
    let runs = report["runs"].as_array().expect("runs array");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["seed"], 1);
    assert_eq!(runs[1]["seed"], 2);
}

#[test]
fn cli_is_deterministic_per_seed() {
    let exe = env!("CARGO_BIN_EXE_relic-sim");
    let run = || {
        let output = Command::new(exe)
            .args(["--seeds", "0x2a", "--events", "500", "--report", "json"])
            .output()
            .expect("run cli");
        assert!(output.status.success());
        output.stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn cli_writes_markdown_report() {
    let exe = env!("CARGO_BIN_EXE_relic-sim");
    let output_path = temp_path("md");
    let status = Command::new(exe)
        .args([
            "--seeds",
            "7",
            "--events",
            "200",
            "--f2p",
            "--no-scaling",
            "--report",
            "markdown",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    std::fs::remove_file(&output_path).ok();
    assert!(content.contains("# Relic Simulation Results"));
    assert!(content.contains("| 7 | 200 |"));
}

#[test]
fn cli_console_report_prints_banner() {
    let exe = env!("CARGO_BIN_EXE_relic-sim");
    let output = Command::new(exe)
        .args(["--seeds", "3", "--events", "100"])
        .env("NO_COLOR", "1")
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Relic Progression Simulator"));
    assert!(stdout.contains("Total time"));
}

#[test]
fn cli_rejects_bad_seed_token() {
    let exe = env!("CARGO_BIN_EXE_relic-sim");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--events", "10"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}

#[test]
fn cli_rejects_invalid_config() {
    let exe = env!("CARGO_BIN_EXE_relic-sim");
    let config_path = temp_path("config");
    std::fs::write(&config_path, r#"{"combat_base_chance": 0}"#).expect("write config");
    let output = Command::new(exe)
        .args(["--events", "10", "--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    std::fs::remove_file(&config_path).ok();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("acquisition config is invalid"));
}

#[test]
fn cli_surfaces_definition_warnings() {
    let exe = env!("CARGO_BIN_EXE_relic-sim");
    let defs_path = temp_path("defs");
    std::fs::write(
        &defs_path,
        r#"{"unlocks":[
            {"id":"A","name":"A","relicType":"COMBAT","requiredTier":"APPRENTICE","members":false},
            {"id":"A","name":"dup","relicType":"COMBAT","requiredTier":"APPRENTICE","members":false}
        ]}"#,
    )
    .expect("write definitions");
    let output = Command::new(exe)
        .args(["--events", "50", "--report", "json", "--definitions"])
        .arg(&defs_path)
        .output()
        .expect("run cli");
    std::fs::remove_file(&defs_path).ok();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicates id A"));
}
