//! Runs the built binary against config files on disk.

use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn servo_hand() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_servo-hand"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn unparsable_config_is_reported_and_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("servo_hand.json");
    fs::write(&path, "{ nope").unwrap();

    let out = servo_hand()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("--list-channels")
        .output()
        .unwrap();

    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error parsing config"), "stderr was: {stderr}");
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ nope");

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("wrist"));
}

#[test]
fn missing_config_is_created_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("servo_hand.json");

    let out = servo_hand()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("--list-channels")
        .output()
        .unwrap();

    assert!(out.status.success());
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"log_level\": \"info\""));
}
