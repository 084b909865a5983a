#![allow(deprecated)] // cargo_bin is deprecated but still functional

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

fn chunketag() -> Command {
    let mut cmd = Command::cargo_bin("chunketag").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn prints_padded_etag_and_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("hello.txt");
    fs::write(&path, "hello").unwrap();

    let expected = format!(
        "{:<39} {}\n",
        "5d41402abc4b2a76b9719d911017c592",
        path.display()
    );
    chunketag()
        .arg(&path)
        .assert()
        .success()
        .stdout(expected)
        .stderr("");
}

#[test]
fn chunksize_option_selects_multipart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("letters");
    fs::write(&path, "abcdefghijkl").unwrap();

    for (size, etag) in [
        ("4", "17ca064a842163311e72510a0a5e810c-3"),
        ("6", "0b53b1b7dc9e84d2199a8f90c1fcd3a8-2"),
        ("12", "9fc9d606912030dca86582ed62595cf7"),
        ("1KB", "9fc9d606912030dca86582ed62595cf7"),
    ] {
        chunketag()
            .args(["--chunksize", size])
            .arg(&path)
            .assert()
            .success()
            .stdout(format!("{etag:<39} {}\n", path.display()));
    }

    chunketag()
        .args(["-c", "2MB"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("9fc9d606912030dca86582ed62595cf7"));
}

#[test]
fn keeps_input_order() {
    let temp = TempDir::new().unwrap();
    let empty = temp.path().join("empty");
    let letters = temp.path().join("letters");
    fs::write(&empty, "").unwrap();
    fs::write(&letters, "abcde").unwrap();

    let expected = format!(
        "{:<39} {}\n{:<39} {}\n{:<39} {}\n",
        "aa933d75a4a9ae385721c4e8444e1eec-2",
        letters.display(),
        EMPTY_MD5,
        empty.display(),
        "aa933d75a4a9ae385721c4e8444e1eec-2",
        letters.display(),
    );
    chunketag()
        .args(["--chunksize", "4"])
        .arg(&letters)
        .arg(&empty)
        .arg(&letters)
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn missing_file_is_reported_and_others_still_run() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");
    let present = temp.path().join("present");
    fs::write(&present, "").unwrap();

    chunketag()
        .arg(&missing)
        .arg(&present)
        .assert()
        .code(1)
        .stdout(format!("{EMPTY_MD5:<39} {}\n", present.display()))
        .stderr(
            predicate::str::starts_with(format!("ERROR: open {}: ", missing.display()))
                .and(predicate::str::ends_with("\n"))
                .and(contains("ERROR:").count(1)),
        );
}

#[test]
fn rejects_bad_chunksize_before_reading_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("file");
    fs::write(&path, "data").unwrap();

    for size in ["0", "0KB", "abc", "-1", "8388608TB"] {
        chunketag()
            .args(["--chunksize", size])
            .arg(&path)
            .assert()
            .code(2)
            .stdout("");
    }

    chunketag()
        .args(["--chunksize", "0"])
        .arg(&path)
        .assert()
        .stderr(contains("non-positive chunk size"));
}

#[test]
fn requires_a_file() {
    chunketag().assert().code(2).stdout("");
}

#[test]
fn help_shows_default_chunksize() {
    chunketag()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("[default: 8MB]"));
}

#[cfg(unix)]
#[test]
fn non_utf8_paths_are_written_unchanged() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join(OsStr::from_bytes(b"n\xff"));
    if fs::write(&path, "y").is_err() {
        eprintln!("Skipping: filesystem rejects non-UTF-8 names");
        return;
    }

    let mut expected = format!("{:<39} ", "415290769594460e2e485922904f345d").into_bytes();
    expected.extend_from_slice(path.as_os_str().as_bytes());
    expected.push(b'\n');
    chunketag().arg(&path).assert().success().stdout(expected);

    let missing = temp.path().join(OsStr::from_bytes(b"gone\xfe"));
    let output = chunketag().arg(&missing).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let mut prefix = b"ERROR: open ".to_vec();
    prefix.extend_from_slice(missing.as_os_str().as_bytes());
    prefix.extend_from_slice(b": ");
    assert!(output.stderr.starts_with(&prefix));
    assert!(output.stderr.ends_with(b"\n"));
}

#[test]
fn closed_stdout_ends_quietly() {
    use std::io::{BufRead, BufReader, Read};
    use std::process::Stdio;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("small");
    fs::write(&path, "abc").unwrap();

    // Far more output than a pipe buffer holds, so writes hit the closed pipe.
    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("chunketag"))
        .env_remove("RUST_LOG")
        .args(std::iter::repeat(&path).take(3000))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let mut first = String::new();
    BufReader::new(child.stdout.take().unwrap())
        .read_line(&mut first)
        .unwrap();
    assert!(first.starts_with("900150983cd24fb0d6963f7d28e17f72 "));

    let status = child.wait().unwrap();
    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();

    assert_eq!(status.code(), Some(0), "stderr: {stderr}");
    assert!(!stderr.contains("panicked"), "stderr: {stderr}");
}
