use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with an isolated working directory and session file, pointed at a
/// server that is never reached by these tests
fn vidclip(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vidclip").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("VIDCLIP_CONFIG")
        .env_remove("RUST_LOG")
        .args([
            "--mirror",
            dir.path().join("session.json").to_str().unwrap(),
            "--api-base-url",
            "http://127.0.0.1:9",
        ]);
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clip"))
        .stdout(predicate::str::contains("speed"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_end_before_start_is_rejected() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args([
            "clip",
            "--url",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "--start",
            "00:00:40",
            "--end",
            "00:00:10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("End time must be after start time"));
}

#[test]
fn test_malformed_time_is_rejected() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args([
            "clip",
            "--url",
            "https://youtu.be/dQw4w9WgXcQ",
            "--start",
            "1:00",
            "--end",
            "00:02:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid start time '1:00'"));
}

#[test]
fn test_clip_longer_than_ten_minutes_is_rejected() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args([
            "clip",
            "--url",
            "https://youtu.be/dQw4w9WgXcQ",
            "--start",
            "00:00:00",
            "--end",
            "00:10:01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Max duration is 10 mins"));
}

#[test]
fn test_speed_factor_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args(["speed", "--factor", "4", "--clip", "art-720"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Speed factor must be between"));
}

#[test]
fn test_speed_requires_a_source() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args(["speed", "--factor", "1.5"])
        .assert()
        .failure();
}

#[test]
fn test_status_of_fresh_session_is_idle() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args(["status", "clip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clip job: idle"));
}

#[test]
fn test_cancel_without_job_fails() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args(["cancel", "speed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pending speed_edit job to cancel"));
}

#[test]
fn test_unknown_log_level_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    vidclip(&dir)
        .args(["--log-level", "loud", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("log_level"));
}
