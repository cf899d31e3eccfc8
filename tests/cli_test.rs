//! Command-line behaviour: exit codes, stdout report, stderr diagnostics

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod common;

fn svn_churn(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("svn-churn").unwrap();
    // Keep config lookup and env overrides out of the picture.
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env_remove("LOG_LEVEL")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_OUTPUT")
        .env_remove("SVN_CHURN_LIMIT")
        .env_remove("SVN_CHURN_MATCH_MODE")
        .env("XDG_CONFIG_HOME", workdir.path().join("xdg"));
    cmd
}

#[test]
fn test_report_for_mixed_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let log = common::mixed_scenario().write_to(temp_dir.path(), "log.xml").unwrap();

    svn_churn(&temp_dir)
        .arg(&log)
        .args(["-e", "tags", "-x", ".py", "-s", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SVN Log Analysis Report"))
        .stdout(predicate::str::contains("Start Date: 2024-01-01"))
        .stdout(predicate::str::contains("Extensions: .py"))
        .stdout(predicate::str::contains("Excluded:   /tags"))
        .stdout(predicate::str::contains("2        | /trunk/a.py"))
        .stdout(predicate::str::contains("/tags/a.py").not());
}

#[test]
fn test_limit_and_tie_break() {
    let temp_dir = TempDir::new().unwrap();
    let log = common::SvnLogBuilder::new()
        .entry(None, &["/trunk/c.txt", "/trunk/b.txt", "/trunk/a.txt"])
        .write_to(temp_dir.path(), "log.xml")
        .unwrap();

    let output = svn_churn(&temp_dir)
        .arg(&log)
        .args(["--limit", "1"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<&str> = stdout.lines().filter(|l| l.contains(" | /")).collect();
    assert_eq!(rows, vec!["1        | /trunk/a.txt"]);
}

#[test]
fn test_empty_log_exits_zero() {
    let temp_dir = TempDir::new().unwrap();
    let log = common::SvnLogBuilder::new().write_to(temp_dir.path(), "log.xml").unwrap();

    svn_churn(&temp_dir)
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching files found."));
}

#[test]
fn test_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let log = common::mixed_scenario().write_to(temp_dir.path(), "log.xml").unwrap();

    let output = svn_churn(&temp_dir)
        .arg(&log)
        .args(["--json", "-e", "tags"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["files"][0]["path"], "/trunk/a.py");
    assert_eq!(value["files"][0]["count"], 3);
    assert_eq!(value["stats"]["entries_read"], 3);
}

#[test]
fn test_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();

    svn_churn(&temp_dir)
        .arg("does-not-exist.xml")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("File 'does-not-exist.xml' not found."));
}

#[test]
fn test_malformed_input_fails_without_partial_report() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("broken.xml");
    std::fs::write(
        &log,
        "<log><logentry><paths><path>/a</path></paths></logentry><logentry></log>",
    )
    .unwrap();

    svn_churn(&temp_dir)
        .arg(&log)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("XML Parse Error"));
}

#[test]
fn test_non_xml_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let cases = [
        ("notes.txt", "this is not an svn log\n"),
        ("log.json", "{\"log\": []}\n"),
        ("trailing.xml", "<log></log>\ngarbage\n"),
    ];

    for (name, content) in cases {
        let log = temp_dir.path().join(name);
        std::fs::write(&log, content).unwrap();

        svn_churn(&temp_dir)
            .arg(&log)
            .assert()
            .code(1)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("XML Parse Error"));
    }
}

#[test]
fn test_invalid_date_argument_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let log = common::SvnLogBuilder::new().write_to(temp_dir.path(), "log.xml").unwrap();

    svn_churn(&temp_dir)
        .arg(&log)
        .args(["--start", "01/02/2024"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn test_config_file_supplies_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let log = common::SvnLogBuilder::new()
        .entry(None, &["/tags/x.py", "/trunk/x.py", "/trunk/x.rs"])
        .write_to(temp_dir.path(), "log.xml")
        .unwrap();
    std::fs::write(
        temp_dir.path().join("svn-churn.toml"),
        "[filter]\nexclude = [\"tags\"]\nextensions = [\"py\"]\n",
    )
    .unwrap();

    svn_churn(&temp_dir)
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("1        | /trunk/x.py"))
        .stdout(predicate::str::contains("/trunk/x.rs").not())
        .stdout(predicate::str::contains("/tags/x.py").not());
}

#[test]
fn test_config_file_is_reported_once_logging_is_up() {
    let temp_dir = TempDir::new().unwrap();
    let log = common::SvnLogBuilder::new().write_to(temp_dir.path(), "log.xml").unwrap();
    std::fs::write(
        temp_dir.path().join("svn-churn.toml"),
        "[logging]\nlevel = \"INFO\"\n",
    )
    .unwrap();

    svn_churn(&temp_dir)
        .arg(&log)
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded configuration from file"))
        .stderr(predicate::str::contains("svn-churn.toml"));
}
