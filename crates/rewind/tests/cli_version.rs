#![cfg(feature = "cli")]

use std::process::Command;

#[test]
fn extended_version_reports_build_target() {
    let output = Command::new(env!("CARGO_BIN_EXE_rewind"))
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let target = stdout
        .lines()
        .find_map(|line| line.strip_prefix("build_target: "))
        .expect("build target line should be printed");
    assert_ne!(target, "unknown");
    assert!(stdout.contains(&format!("version: {}", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.lines().all(|line| !line.ends_with(": unknown")));
}
