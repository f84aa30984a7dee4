use std::process::Command;

fn calbot() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_calbot"));
    command.env_remove("CALBOT_CONFIG").env_remove("RUST_LOG");
    command
}

#[test]
fn missing_config_prints_template_and_exits_1() {
    let dir = tempfile::tempdir().expect("should create temp dir");

    let output = calbot()
        .current_dir(dir.path())
        .output()
        .expect("should run calbot");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("notify_interval: \"10m\""));
    assert!(stdout.contains("chat:"));
    assert!(stdout.contains("calendar:"));
}

#[test]
fn malformed_config_exits_1_without_template() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    std::fs::write(dir.path().join("config.yml"), "chat:\n  host: irc.example.net\n")
        .expect("should write config");

    let output = calbot()
        .current_dir(dir.path())
        .output()
        .expect("should run calbot");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("notify_interval"));
}

#[test]
fn print_template_exits_0() {
    let output = calbot()
        .arg("--print-template")
        .output()
        .expect("should run calbot");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("start_time_of_day"));
}
