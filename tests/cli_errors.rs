//! Exit codes and error text of the `epicurves` binary.

use std::process::Command;

fn epicurves(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_epicurves"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn final_error_reaches_stderr_with_logging_off() {
    let out = epicurves(&["fit", "--csv", "/nonexistent/epicurves.csv"]);

    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Failed to open CSV '/nonexistent/epicurves.csv'"), "{stderr}");
    assert!(out.stdout.is_empty());
}

#[test]
fn missing_report_inputs_exit_with_input_code() {
    let dir = tempfile::tempdir().unwrap();
    let csv_dir = dir.path().join("missing");
    let outdir = dir.path().join("out");

    let out = epicurves(&[
        "world",
        "today",
        "--csv-dir",
        csv_dir.to_str().unwrap(),
        "--outdir",
        outdir.to_str().unwrap(),
    ]);

    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("time_series_covid19_confirmed_global.csv"));
}
