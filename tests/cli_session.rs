use accutype::config::{Config, ConfigStore, FileConfigStore, TestMode};
use assert_cmd::Command;
use std::fs;
use tempfile::tempdir;

fn accutype(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("accutype").unwrap();
    cmd.arg("--db")
        .arg(dir.join("results.db"))
        .arg("--config")
        .arg(dir.join("config.json"))
        .env("RUST_LOG", "off");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn score_prints_metrics() {
    let dir = tempdir().unwrap();
    let out = stdout_of(accutype(dir.path()).args([
        "score",
        "one two three four",
        "one two three four",
        "--seconds",
        "30",
        "--user",
        "ada",
    ]));
    assert!(out.contains("Accuracy: 100%"));
    assert!(out.contains("Speed: 8 WPM"));
    assert!(out.contains("User: ada"));
}

#[test]
fn score_with_nothing_typed_is_not_a_failure() {
    let dir = tempdir().unwrap();
    let out = stdout_of(accutype(dir.path()).args(["score", "abc", "", "--seconds", "3"]));
    assert!(out.contains("Nothing typed"));
}

#[test]
fn run_stores_result_and_history_lists_it() {
    let dir = tempdir().unwrap();
    let sentences = dir.path().join("sentences.txt");
    fs::write(&sentences, "Hello world.\n").unwrap();

    let store = FileConfigStore::with_path(dir.path().join("config.json"));
    store
        .save(&Config {
            user_name: "grace".into(),
            word_count: 1,
            sentences_file: Some(sentences),
            ..Config::default()
        })
        .unwrap();

    let out = stdout_of(accutype(dir.path()).arg("run").write_stdin("Hello world.\n"));
    assert!(out.contains("Hello world."));
    assert!(out.contains("Test completed."));
    assert!(out.contains("Accuracy: 100%"));

    let history = stdout_of(accutype(dir.path()).arg("history"));
    assert_eq!(history.lines().count(), 1);
    assert!(history.contains("100%"));
    assert!(history.contains("grace"));

    let users = stdout_of(accutype(dir.path()).arg("users"));
    assert!(users.starts_with("grace\t1 tests"));

    let csv_path = dir.path().join("export.csv");
    stdout_of(accutype(dir.path()).arg("export").arg(&csv_path));
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("Accuracy,Speed,Duration,Words,User,Timestamp\n100%,"));
}

#[test]
fn config_set_persists() {
    let dir = tempdir().unwrap();
    stdout_of(accutype(dir.path()).args(["config", "set", "word_count", "25"]));

    let cfg = FileConfigStore::with_path(dir.path().join("config.json")).load();
    assert_eq!(cfg.word_count, 25);

    let output = accutype(dir.path())
        .args(["config", "set", "volume", "3"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

fn failure_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(!output.status.success(), "{:?}", output);
    String::from_utf8(output.stderr).unwrap()
}

fn write_config(dir: &std::path::Path, config: &Config) {
    FileConfigStore::with_path(dir.join("config.json"))
        .save(config)
        .unwrap();
}

#[test]
fn score_with_huge_duration_fails_cleanly() {
    let dir = tempdir().unwrap();
    let err = failure_of(accutype(dir.path()).args([
        "score",
        "abc",
        "abc",
        "--seconds",
        "9223372036854775807",
    ]));
    assert!(err.contains("out of range"), "{err}");
    assert!(!err.contains("panicked"), "{err}");
}

#[test]
fn batch_reports_each_entry() {
    let dir = tempdir().unwrap();
    let batch = dir.path().join("attempts.json");
    fs::write(
        &batch,
        r#"[
            {"given_text": "one two three four", "typed_text": "one two three four",
             "typed_character_count": 18, "duration_seconds": 30, "user_name": "ada"},
            {"given_text": 7, "typed_text": "seven", "typed_character_count": 5,
             "duration_seconds": 5},
            {"given_text": "abc", "typed_text": "abc", "typed_character_count": 3,
             "duration_seconds": 9223372036854775807}
        ]"#,
    )
    .unwrap();

    let out = stdout_of(accutype(dir.path()).arg("batch").arg(&batch).arg("--save"));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "#0: 100% accuracy, 8 WPM, 30 seconds, 4 words, ada");
    assert!(lines[1].starts_with("#1: skipped, argument `given_text` must be text"));
    assert!(lines[2].starts_with("#2: skipped, duration of"));

    let history = stdout_of(accutype(dir.path()).arg("history"));
    assert_eq!(history.lines().count(), 1);
}

#[test]
fn batch_with_malformed_file_fails() {
    let dir = tempdir().unwrap();
    let batch = dir.path().join("attempts.json");
    fs::write(&batch, "{ not a list").unwrap();
    failure_of(accutype(dir.path()).arg("batch").arg(&batch));
}

#[test]
fn show_and_remove_stored_result() {
    let dir = tempdir().unwrap();
    let saved = stdout_of(accutype(dir.path()).args([
        "score", "abc", "abd", "--seconds", "10", "--user", "lin", "--save",
    ]));
    assert!(saved.contains("saved as 1"));

    let shown = stdout_of(accutype(dir.path()).args(["show", "1"]));
    assert!(shown.starts_with("id: 1\nAccuracy: 66%"), "{shown}");
    assert!(shown.contains("User: lin"));

    let removed = stdout_of(accutype(dir.path()).args(["remove", "1"]));
    assert_eq!(removed.trim(), "removed 1");

    let err = failure_of(accutype(dir.path()).args(["show", "1"]));
    assert!(err.contains("no result with id 1"));
    let err = failure_of(accutype(dir.path()).args(["remove", "1"]));
    assert!(err.contains("no result with id 1"));
}

#[test]
fn timed_run_completes_when_sentences_run_out() {
    let dir = tempdir().unwrap();
    let sentences = dir.path().join("sentences.txt");
    fs::write(&sentences, "Hello world.\n").unwrap();
    write_config(
        dir.path(),
        &Config {
            mode: TestMode::Time,
            time_limit_secs: 60,
            sentences_file: Some(sentences),
            ..Config::default()
        },
    );

    let out = stdout_of(accutype(dir.path()).arg("run").write_stdin("Hello world.\n"));
    assert!(out.contains("You have 60 seconds."));
    assert!(out.contains("Test completed."));
    assert!(!out.contains("Time is up."));
    assert!(out.contains("Accuracy: 100%"));
}

#[test]
fn sentences_edits_are_persisted() {
    let dir = tempdir().unwrap();
    let bundled = stdout_of(accutype(dir.path()).args(["sentences", "list"]));
    assert!(bundled.lines().count() >= 10);

    let added = stdout_of(accutype(dir.path()).args([
        "sentences",
        "add",
        "  Zebras graze at noon. ",
    ]));
    assert_eq!(added.trim(), "added: Zebras graze at noon.");

    let cfg = FileConfigStore::with_path(dir.path().join("config.json")).load();
    let file = cfg.sentences_file.unwrap();
    assert_eq!(file, dir.path().join("sentences.txt"));
    let saved = fs::read_to_string(&file).unwrap();
    assert_eq!(saved.lines().count(), bundled.lines().count() + 1);

    let found = stdout_of(accutype(dir.path()).args(["sentences", "search", "zebras"]));
    assert_eq!(found.trim(), "Zebras graze at noon.");

    failure_of(accutype(dir.path()).args(["sentences", "add", "Zebras graze at noon."]));

    stdout_of(accutype(dir.path()).args(["sentences", "remove", "Zebras graze at noon."]));
    let found = stdout_of(accutype(dir.path()).args(["sentences", "search", "zebras"]));
    assert!(found.is_empty());

    let err = failure_of(accutype(dir.path()).args([
        "sentences",
        "remove",
        "Zebras graze at noon.",
    ]));
    assert!(err.contains("no such sentence"));
}
