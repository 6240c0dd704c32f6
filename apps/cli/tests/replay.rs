use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn tree_prints_collapsed_seed_project() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("codenest-cli")?
        .arg("tree")
        .assert()
        .success()
        .stdout("> Project\n");

    Command::cargo_bin("codenest-cli")?
        .args(["tree", "--expand-all"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("v Project")
                .and(predicate::str::contains("    styles.css (css)")),
        );
    Ok(())
}

#[test]
fn replay_applies_commands_and_prints_text_summary() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("script.json");
    fs::write(
        &script,
        r#"[
            {"command": "create_file", "parent": "/"},
            {"command": "toggle_expansion", "folder": "/"},
            {"command": "select_file", "file": "/newfile.txt"},
            {"command": "edit_tab", "tab": "/newfile.txt", "content": "notes"},
            {"command": "close_tab", "tab": "/index.html"}
        ]"#,
    )?;

    Command::cargo_bin("codenest-cli")?
        .args(["replay", script.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("    newfile.txt (text)")
                .and(predicate::str::contains("* newfile.txt /newfile.txt [modified]"))
                .and(predicate::str::contains("newfile.txt [text] | 1 open, 1 modified")),
        );
    Ok(())
}

#[test]
fn replay_json_output_reports_empty_session() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("close.json");
    fs::write(
        &script,
        r#"[{"command": "close_tab", "tab": "/index.html"}]"#,
    )?;

    let output = Command::cargo_bin("codenest-cli")?
        .args(["replay", script.to_str().unwrap(), "--format", "json"])
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["tabs"].as_array().map(Vec::len), Some(0));
    assert!(value["active_tab"].is_null());
    assert_eq!(value["status"]["no_file_open"], true);
    Ok(())
}

#[test]
fn replay_rejects_malformed_script() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("bad.json");
    fs::write(&script, r#"[{"command": "rename", "path": "/a"}]"#)?;

    Command::cargo_bin("codenest-cli")?
        .args(["replay", script.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid command script"));
    Ok(())
}

#[test]
fn replay_honours_preferences_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let prefs = dir.path().join("prefs.json");
    fs::write(
        &prefs,
        r#"{ "files": { "new_folder_name": "lib" }, "tabs": { "open_seed_tab": false } }"#,
    )?;
    let script = dir.path().join("script.json");
    fs::write(
        &script,
        r#"[
            {"command": "create_folder", "parent": "/"},
            {"command": "toggle_expansion", "folder": "/"}
        ]"#,
    )?;

    Command::cargo_bin("codenest-cli")?
        .args([
            "--preferences",
            prefs.to_str().unwrap(),
            "replay",
            script.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("  > lib\n")
                .and(predicate::str::contains("No file open [text] | 0 open, 0 modified")),
        );
    Ok(())
}
