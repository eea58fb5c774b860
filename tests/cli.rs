//! Smoke tests for the non-interactive subcommands

use assert_cmd::Command;
use parley::agent::compact::{CompactionPolicy, Summarizer};
use parley::agent::history::{ChatHistory, SessionDefaults};
use parley::agent::message::Role;
use parley::agent::persistence::SessionStore;
use predicates::prelude::*;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn seed_session(dir: &Path, name: &str, turns: &[&str]) {
    let store = SessionStore::open(dir).unwrap();
    let mut history = ChatHistory::start(
        store,
        CompactionPolicy::new(Summarizer::unconfigured()),
        &SessionDefaults::default(),
        Some(name),
    )
    .unwrap();
    for (i, text) in turns.iter().enumerate() {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        history.append(role, *text, None).unwrap();
    }
}

/// A command isolated from any user config and with colors off
fn parley(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("parley").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("PARLEY_HISTORY_DIR");
    cmd
}

#[test]
fn sessions_lists_saved_sessions() {
    let home = tempdir().unwrap();
    let history = home.path().join("history");
    seed_session(&history, "alpha", &["hi"]);
    seed_session(&history, "beta", &["hello", "hey"]);

    parley(&home)
        .arg("sessions")
        .arg("--history-dir")
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta"));
}

#[test]
fn sessions_on_empty_dir_reports_none() {
    let home = tempdir().unwrap();
    parley(&home)
        .args(["sessions", "--history-dir"])
        .arg(home.path().join("empty"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved sessions"));
}

#[test]
fn show_prints_messages() {
    let home = tempdir().unwrap();
    let history = home.path().join("history");
    seed_session(&history, "talk", &["what is rust", "a language"]);

    parley(&home)
        .args(["show", "talk", "--history-dir"])
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("what is rust"))
        .stdout(predicate::str::contains("a language"));
}

#[test]
fn show_limit_keeps_newest() {
    let home = tempdir().unwrap();
    let history = home.path().join("history");
    seed_session(&history, "talk", &["first question", "first answer", "second question"]);

    parley(&home)
        .args(["show", "talk", "-n", "1", "--history-dir"])
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("second question"))
        .stdout(predicate::str::contains("first answer").not());
}

#[test]
fn show_missing_session_fails() {
    let home = tempdir().unwrap();
    parley(&home)
        .args(["show", "ghost", "--history-dir"])
        .arg(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn export_writes_transcript() {
    let home = tempdir().unwrap();
    let history = home.path().join("history");
    seed_session(&history, "talk", &["export me", "done"]);

    parley(&home)
        .args(["export", "talk", "-o", "talk.txt", "--history-dir"])
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("talk.txt"));

    let transcript = std::fs::read_to_string(history.join("talk.txt")).unwrap();
    assert!(transcript.contains("Session:  talk"));
    assert!(transcript.contains("[1] USER"));
    assert!(transcript.contains("export me"));
}

#[test]
fn invalid_explicit_config_is_fatal() {
    let home = tempdir().unwrap();
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "[history\ncompress_after = 2").unwrap();

    parley(&home)
        .args(["sessions", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration"));
}
