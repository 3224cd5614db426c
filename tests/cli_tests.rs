use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const METADATA: &str = r#"{
    "title": "The Long Road",
    "creator": [
        {"name": "Nora Reader", "role": "narrator"},
        {"name": "Ann Author", "role": "author"}
    ],
    "description": {"full": "<p>A <i>long</i> road.</p>"},
    "spine": [{"duration": 300.5}, {"duration": 200.25}],
    "chapters": [
        {"title": "Opening", "spine": 0, "offset": 0},
        {"title": "Opening", "spine": 0, "offset": 120},
        {"title": "The Turn", "spine": 1, "offset": 10.0007}
    ]
}"#;

/// Command with config lookups pointed at an empty directory
fn libby2m4b(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("libby2m4b").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_book(dir: &Path, metadata: &str, parts: &[&str]) {
    std::fs::create_dir_all(dir.join("metadata")).unwrap();
    std::fs::write(dir.join("metadata").join("metadata.json"), metadata).unwrap();
    for part in parts {
        std::fs::write(dir.join(part), b"").unwrap();
    }
}

#[test]
fn test_version() {
    let temp = tempfile::tempdir().unwrap();
    libby2m4b(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("libby2m4b"));
}

#[test]
fn test_convert_help() {
    let temp = tempfile::tempdir().unwrap();
    libby2m4b(temp.path())
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Convert a downloaded book folder"))
        .stdout(predicate::str::contains("--recursive"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--skip-existing"))
        .stdout(predicate::str::contains("--no-cover"));
}

#[test]
fn test_job_help() {
    let temp = tempfile::tempdir().unwrap();
    libby2m4b(temp.path())
        .args(["job", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dest"))
        .stdout(predicate::str::contains("stdin"));
}

#[test]
fn test_chapters_ffmetadata() {
    let temp = tempfile::tempdir().unwrap();
    let book = temp.path().join("book");
    write_book(&book, METADATA, &[]);

    libby2m4b(temp.path())
        .args(["chapters", "--ffmetadata", book.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(";FFMETADATA1\n"))
        .stdout(predicate::str::contains("artist=Nora Reader\n"))
        .stdout(predicate::str::contains("album_artist=Ann Author\n"))
        .stdout(predicate::str::contains("comment=A long road.\n"))
        .stdout(predicate::str::contains(
            "START=0\nEND=310500\ntitle=Opening\n",
        ))
        .stdout(predicate::str::contains(
            "START=310500\nEND=500750\ntitle=The Turn\n",
        ));
}

#[test]
fn test_chapters_json() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("metadata.json");
    std::fs::write(&file, METADATA).unwrap();

    let output = libby2m4b(temp.path())
        .args(["chapters", "--json", file.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_millis"], 500_750);
    assert_eq!(json["chapters"].as_array().unwrap().len(), 2);
    assert_eq!(json["chapters"][1]["title"], "The Turn");
    assert_eq!(json["chapters"][1]["start_millis"], 310_500);
}

#[test]
fn test_chapters_table() {
    let temp = tempfile::tempdir().unwrap();
    let book = temp.path().join("book");
    write_book(&book, METADATA, &[]);

    libby2m4b(temp.path())
        .args(["chapters", book.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Long Road"))
        .stdout(predicate::str::contains("00:05:10.500"))
        .stdout(predicate::str::contains("The Turn"));
}

#[test]
fn test_chapters_out_of_range_spine_fails() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("metadata.json");
    std::fs::write(
        &file,
        r#"{"spine": [{"duration": 10}], "chapters": [{"title": "X", "spine": 3, "offset": 0}]}"#,
    )
    .unwrap();

    libby2m4b(temp.path())
        .args(["chapters", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid metadata"))
        .stderr(predicate::str::contains("chapters[0].spine"));
}

#[test]
fn test_chapters_missing_document_fails() {
    let temp = tempfile::tempdir().unwrap();
    libby2m4b(temp.path())
        .args(["chapters", temp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_convert_missing_folder_fails() {
    let temp = tempfile::tempdir().unwrap();
    libby2m4b(temp.path())
        .args(["convert", "/nonexistent/book"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_convert_folder_without_parts_fails() {
    let temp = tempfile::tempdir().unwrap();
    let book = temp.path().join("book");
    write_book(&book, METADATA, &[]);

    libby2m4b(temp.path())
        .args(["convert", "--dry-run", book.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No MP3 files found"));
}

#[test]
fn test_convert_dry_run() {
    let temp = tempfile::tempdir().unwrap();
    let book = temp.path().join("book");
    let out = temp.path().join("out");
    write_book(&book, METADATA, &["Part 002.mp3", "Part 001.mp3"]);

    libby2m4b(temp.path())
        .args([
            "convert",
            "--dry-run",
            "--no-cover",
            book.to_str().unwrap(),
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ann Author/The Long Road/The Long Road.m4b"))
        .stdout(predicate::str::contains("2 part(s)"))
        .stdout(predicate::str::contains("-map_chapters 1"))
        .stdout(predicate::str::contains("Dry run - ffmpeg was not run."));

    assert!(!out.exists());
}

#[test]
fn test_convert_recursive_dry_run_with_flat_format() {
    let temp = tempfile::tempdir().unwrap();
    let library = temp.path().join("library");
    write_book(&library.join("one"), METADATA, &["001.mp3"]);
    write_book(
        &library.join("nested").join("two"),
        r#"{"spine": [{"duration": 60}], "chapters": [{"title": "Only", "spine": 0, "offset": 0}]}"#,
        &["001.mp3"],
    );

    libby2m4b(temp.path())
        .args([
            "convert",
            "--recursive",
            "--dry-run",
            "--format",
            "{title}",
            library.to_str().unwrap(),
            temp.path().join("out").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 book folder(s)"))
        .stdout(predicate::str::contains("The Long Road.m4b"))
        .stdout(predicate::str::contains("two.m4b"));
}

#[test]
fn test_convert_rejects_unknown_placeholder() {
    let temp = tempfile::tempdir().unwrap();
    let book = temp.path().join("book");
    write_book(&book, METADATA, &["001.mp3"]);

    libby2m4b(temp.path())
        .args([
            "convert",
            "--dry-run",
            "--format",
            "{series}/{title}",
            book.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown placeholder 'series'"));
}

#[test]
fn test_job_with_bad_indices_fails_before_download() {
    let temp = tempfile::tempdir().unwrap();
    let job = format!(
        r#"{{"metadata": {}, "urls": [{{"url": "file:///nonexistent/a.mp3", "index": 4}}]}}"#,
        METADATA
    );

    libby2m4b(temp.path())
        .args(["job", "-", "--dest", temp.path().to_str().unwrap()])
        .write_stdin(job)
        .assert()
        .failure()
        .stderr(predicate::str::contains("urls[0].index"));
}

#[test]
fn test_job_warns_on_part_count_mismatch() {
    let temp = tempfile::tempdir().unwrap();
    let job = format!(
        r#"{{"metadata": {}, "urls": [{{"url": "file:///nonexistent/a.mp3", "index": 0}}]}}"#,
        METADATA
    );

    libby2m4b(temp.path())
        .args(["job", "-", "--dest", temp.path().to_str().unwrap()])
        .write_stdin(job)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 part URL(s)"))
        .stderr(predicate::str::contains("2 spine entries"))
        .stderr(predicate::str::contains("Failed to download part 0"));
}

#[test]
fn test_chapters_with_shared_start_and_late_opening() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("metadata.json");
    std::fs::write(
        &file,
        r#"{"spine": [{"duration": 100}], "chapters": [
            {"title": "Credits", "spine": 0, "offset": 2},
            {"title": "Chapter 1", "spine": 0, "offset": 2},
            {"title": "Chapter 2", "spine": 0, "offset": 50}
        ]}"#,
    )
    .unwrap();

    libby2m4b(temp.path())
        .args(["chapters", "--ffmetadata", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("START=0\nEND=2000\ntitle=Credits\n"))
        .stdout(predicate::str::contains("START=2000\nEND=50000\ntitle=Chapter 1\n"));
}

#[test]
fn test_fields() {
    let temp = tempfile::tempdir().unwrap();
    libby2m4b(temp.path())
        .arg("fields")
        .assert()
        .success()
        .stdout(predicate::str::contains("{author}"))
        .stdout(predicate::str::contains("{narrator}"))
        .stdout(predicate::str::contains("{year}"));
}
