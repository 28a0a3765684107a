#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STORY: &str = r#":::meta
id: "ferry"
:::

story ferry:
  config:
    starting_scene = dock

  scene dock:
    beat pier:
      say ferryman "Crossing tonight?"
      choice:
        option "Pay the toll" goto deck
        option "Ask about the fog":
          say ferryman "It lifts by dawn."
          choice:
            option "Pay the toll" goto deck

  scene river:
    beat deck:
      stage "The boat pushes off."
      end
"#;

/// Create a temp directory holding one script file.
fn write_script(source: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("story.skr");
    fs::write(&path, source).unwrap();
    (dir, path)
}

fn skr() -> Command {
    let mut cmd = Command::cargo_bin("skr").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_clean_script() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed for 'ferry'."))
        .stdout(predicate::str::contains("1 stories, 2 scenes, 2 beats"));
}

#[test]
fn check_reports_unknown_target() {
    let (_dir, path) = write_script("story s:\n  scene a:\n    beat x:\n      goto nowhere\n");
    skr()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Target \"nowhere\" does not match any declared node.",
        ))
        .stderr(predicate::str::contains("1 error, 0 warnings"))
        .stderr(predicate::str::contains("error: script has errors"));
}

#[test]
fn check_warnings_do_not_fail() {
    let source = "story s:\n  scene a:\n    beat x:\n      goto x\n  scene b:\n    beat x:\n      end\n";
    let (_dir, path) = write_script(source);
    skr()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 warning"));
}

#[test]
fn check_missing_file() {
    skr()
        .arg("check")
        .arg("does-not-exist.skr")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

#[test]
fn build_to_stdout() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("build")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"Script\""))
        .stdout(predicate::str::contains("\"kind\": \"beat\""));
}

#[test]
fn build_to_file() {
    let (dir, path) = write_script(STORY);
    let out = dir.path().join("story.json");
    skr()
        .arg("build")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 'ferry'"));

    let json = fs::read_to_string(&out).unwrap();
    assert!(json.contains("\"id\": \"pier\""));
}

#[test]
fn build_refuses_errors() {
    let (dir, path) = write_script("story s:\n  scene :\n");
    let out = dir.path().join("story.json");
    skr()
        .arg("build")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure();
    assert!(!out.exists());
}

// ---------------------------------------------------------------------------
// outline
// ---------------------------------------------------------------------------

#[test]
fn outline_lists_nodes() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("outline")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("pier"))
        .stdout(predicate::str::contains("deck"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("6 nodes"));
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_with_choices() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("play")
        .arg(&path)
        .args(["--choose", "2", "--choose", "pay the toll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Crossing tonight?"))
        .stdout(predicate::str::contains("[pier::inline-pier::choice-1]"))
        .stdout(predicate::str::contains("It lifts by dawn."))
        .stdout(predicate::str::contains("The boat pushes off."))
        .stdout(predicate::str::contains("The End"));
}

#[test]
fn play_from_scene() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("play")
        .arg(&path)
        .args(["--scene", "river", "--choose", "1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("The boat pushes off."))
        .stderr(predicate::str::contains("no choice matches \"1\""));
}

#[test]
fn play_unknown_scene() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("play")
        .arg(&path)
        .args(["--scene", "attic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Starting scene \"attic\" does not exist.",
        ));
}

#[test]
fn play_built_json() {
    let (dir, path) = write_script(STORY);
    let out = dir.path().join("story.json");
    skr().arg("build").arg(&path).arg("-o").arg(&out).assert().success();

    skr()
        .arg("play")
        .arg(&out)
        .args(["--choose", "Pay the toll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The boat pushes off."));
}

#[test]
fn play_interactive_undo_and_quit() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("play")
        .arg(&path)
        .write_stdin("1\nundo\nask about the fog\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("The End"))
        .stdout(predicate::str::contains("It lifts by dawn."));
}

#[test]
fn play_interactive_unknown_input() {
    let (_dir, path) = write_script(STORY);
    skr()
        .arg("play")
        .arg(&path)
        .write_stdin("dance\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No choice matches \"dance\"."));
}

#[test]
fn play_script_without_story() {
    let (_dir, path) = write_script("");
    skr()
        .arg("play")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Runtime does not contain a story declaration.",
        ))
        .stderr(predicate::str::contains("help:"));
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

#[test]
fn new_writes_template() {
    let dir = TempDir::new().unwrap();
    skr()
        .current_dir(dir.path())
        .args(["new", "night-ferry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created story 'night-ferry'"));

    let path = dir.path().join("night-ferry.skr");
    let source = fs::read_to_string(&path).unwrap();
    assert!(source.contains("id: \"night-ferry\""));
    assert!(source.contains("story night_ferry:"));

    skr()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed for 'night_ferry'."));
}

#[test]
fn new_refuses_to_overwrite() {
    let (_dir, path) = write_script(STORY);
    skr()
        .args(["new", "ferry", "-o"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
