use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("snowpass"))
}

/// Binary bound to `data_dir`, without the OS keyring, using `password`.
fn snowpass(data_dir: &Path, password: &str) -> Command {
    let mut cmd = bin();
    cmd.env("SNOWPASS_PASSWORD", password)
        .env_remove("SNOWPASS_DATA_DIR")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--no-session");
    cmd
}

fn create(data_dir: &Path, name: &str, password: &str) {
    snowpass(data_dir, password)
        .arg("create")
        .arg(name)
        .assert()
        .success();
}

fn add(data_dir: &Path, name: &str, password: &str, identifier: &str, value: &str) {
    snowpass(data_dir, password)
        .args(["add", identifier, "to", name])
        .write_stdin(format!("{value}\n{value}\n"))
        .assert()
        .success();
}

#[test]
fn create_writes_keystore_and_index() {
    let dir = tempdir().unwrap();

    snowpass(dir.path(), "hunter2")
        .arg("create")
        .arg("work")
        .assert()
        .success()
        .stdout(predicate::str::contains("Keystore 'work' created"));

    assert!(dir.path().join("work.json").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("work_index.json")).unwrap(),
        "[]"
    );
}

#[test]
fn keystore_file_is_hex_envelope() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "hunter2");

    let content = std::fs::read_to_string(dir.path().join("work.json")).unwrap();
    let (salt, payload) = content.split_once(':').unwrap();
    assert_eq!(salt.len(), 16);
    assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(payload.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn create_fails_if_keystore_exists() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "hunter2");

    snowpass(dir.path(), "hunter2")
        .arg("create")
        .arg("work")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_get_delete_roundtrip() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "hunter2");
    add(dir.path(), "work", "hunter2", "secret1", "abc123");

    snowpass(dir.path(), "hunter2")
        .args(["get", "secret1", "from", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("abc123"));

    snowpass(dir.path(), "hunter2")
        .args(["list", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret1"));

    snowpass(dir.path(), "hunter2")
        .args(["delete", "secret1", "from", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 'secret1'"));

    snowpass(dir.path(), "hunter2")
        .args(["get", "secret1", "from", "work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    snowpass(dir.path(), "hunter2")
        .args(["list", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret1").not());
}

#[test]
fn add_with_mismatched_data_fails() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "hunter2");

    snowpass(dir.path(), "hunter2")
        .args(["add", "secret1", "to", "work"])
        .write_stdin("abc\nabd\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("do not match"));
}

#[test]
fn wrong_password_fails() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "hunter2");

    snowpass(dir.path(), "wrong_pw")
        .args(["get", "A", "from", "work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid password or corrupted data",
        ));
}

#[test]
fn actions_fail_if_keystore_not_exists() {
    let dir = tempdir().unwrap();

    snowpass(dir.path(), "hunter2")
        .args(["get", "A", "from", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn wrong_connective_is_rejected() {
    let dir = tempdir().unwrap();

    snowpass(dir.path(), "hunter2")
        .args(["get", "A", "to", "work"])
        .assert()
        .failure();
}

#[test]
fn edit_requires_existing_identifier() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "hunter2");

    snowpass(dir.path(), "hunter2")
        .args(["edit", "ghost", "in", "work"])
        .write_stdin("x\nx\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    add(dir.path(), "work", "hunter2", "token", "old");
    snowpass(dir.path(), "hunter2")
        .args(["edit", "token", "in", "work"])
        .write_stdin("new\nnew\n")
        .assert()
        .success();

    snowpass(dir.path(), "hunter2")
        .args(["get", "token", "from", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new"));
}

#[test]
fn change_password_switches_master_password() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "P1");
    add(dir.path(), "work", "P1", "a", "1");

    // current, new, verify
    bin()
        .env_remove("SNOWPASS_PASSWORD")
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--no-session")
        .args(["change-password", "work"])
        .write_stdin("P1\nP2\nP2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("changed successfully"));

    snowpass(dir.path(), "P1")
        .args(["get", "a", "from", "work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid password"));

    snowpass(dir.path(), "P2")
        .args(["get", "a", "from", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));
}

#[test]
fn list_all_shows_every_keystore_without_password() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "pw1");
    create(dir.path(), "home", "pw2");
    add(dir.path(), "work", "pw1", "github", "x");

    bin()
        .env_remove("SNOWPASS_PASSWORD")
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--no-session")
        .args(["list", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("home"))
        .stdout(predicate::str::contains("work"))
        .stdout(predicate::str::contains("github"))
        .stdout(predicate::str::contains("_index").not());
}

#[test]
fn delete_keystore_removes_files() {
    let dir = tempdir().unwrap();
    create(dir.path(), "work", "hunter2");

    snowpass(dir.path(), "hunter2")
        .args(["delete-keystore", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted successfully"));

    assert!(!dir.path().join("work.json").exists());
    assert!(!dir.path().join("work_index.json").exists());
}

#[test]
fn invalid_keystore_name_is_rejected() {
    let dir = tempdir().unwrap();

    snowpass(dir.path(), "hunter2")
        .args(["create", "work_index"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid keystore name"));
}
