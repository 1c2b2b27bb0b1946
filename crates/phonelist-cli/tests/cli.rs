use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn phonelist(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_phonelist"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run phonelist")
}

#[test]
fn generate_writes_every_number_without_prompting() {
    let dir = temp_dir("phonelist_cli_generate");
    let out = dir.join("numbers.txt");

    let output = phonelist(
        &dir,
        &[
            "generate",
            "--no-input",
            "--country",
            "1",
            "--area-code",
            "212",
            "--subscriber-digits",
            "3",
            "--workers",
            "3",
            "--batch-size",
            "40",
            "--out",
            out.to_str().expect("utf8 path"),
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let contents = fs::read_to_string(&out).expect("read output");
    let mut lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1000);
    lines.sort_unstable();
    assert_eq!(lines.first().copied(), Some("1212000"));
    assert_eq!(lines.last().copied(), Some("1212999"));
    assert!(!dir.join("numbers.txt.progress.json").exists());

    let runs: Vec<_> = fs::read_dir(dir.join("runs"))
        .expect("runs dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].join("config.json").exists());
    assert!(runs[0].join("report.json").exists());
    assert!(runs[0].join("logs.ndjson").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_area_code_exits_with_config_error() {
    let dir = temp_dir("phonelist_cli_bad_area");
    let out = dir.join("numbers.txt");

    let output = phonelist(
        &dir,
        &[
            "generate",
            "--no-input",
            "--country",
            "1",
            "--area-code",
            "21",
            "--out",
            out.to_str().expect("utf8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(!out.exists());
    assert!(!dir.join("runs").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_country_without_input_is_rejected() {
    let dir = temp_dir("phonelist_cli_no_country");

    let output = phonelist(&dir, &["generate", "--no-input", "--area-code", "212"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--country"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn state_lookup_uses_area_table_and_default_name() {
    let dir = temp_dir("phonelist_cli_state");
    fs::write(dir.join("areas.json"), r#"{"ny": ["212", "718"]}"#).expect("write table");
    fs::write(
        dir.join("phonelist.toml"),
        "subscriber_digits = 2\nout_dir = \"lists\"\n",
    )
    .expect("write settings");

    let output = phonelist(
        &dir,
        &[
            "generate",
            "--no-input",
            "--country",
            "1",
            "--state",
            "NY",
            "--area-table",
            "areas.json",
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let files: Vec<PathBuf> = fs::read_dir(dir.join("lists"))
        .expect("lists dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0]
        .file_name()
        .and_then(|name| name.to_str())
        .expect("file name")
        .to_string();
    assert!(name.starts_with("US_NY_"), "unexpected name {name}");
    let contents = fs::read_to_string(&files[0]).expect("read output");
    assert_eq!(contents.lines().count(), 200);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn status_reports_missing_progress_file() {
    let dir = temp_dir("phonelist_cli_status");

    let output = phonelist(
        &dir,
        &["status", "--progress-file", "missing.progress.json"],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no progress file"));

    let _ = fs::remove_dir_all(&dir);
}
