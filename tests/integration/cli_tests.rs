use clap::Parser;
use clonesweep::cli::Cli;
use clonesweep::config::Settings;
use clonesweep::error::ExitCode;
use clonesweep::run_app;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Build argv with the file locations pinned inside `dir`.
fn argv(dir: &TempDir, rest: &[&str]) -> Vec<String> {
    let at = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
    let mut args = vec![
        "clonesweep".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        at("settings.toml"),
        "--cache".to_string(),
        at("cache.json"),
        "--report".to_string(),
        at("duplicates.json"),
    ];
    args.extend(rest.iter().map(|s| s.to_string()));
    args
}

fn run(dir: &TempDir, rest: &[&str]) -> anyhow::Result<ExitCode> {
    run_app(Cli::try_parse_from(argv(dir, rest)).unwrap())
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_scan_exit_codes() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    fs::write(scan.join("a.txt"), "one").unwrap();
    fs::write(scan.join("b.txt"), "two").unwrap();
    let scan_arg = scan.to_string_lossy().into_owned();

    let code = run(&dir, &["scan", &scan_arg]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(read_json(&dir.path().join("duplicates.json")), serde_json::json!({}));

    fs::write(scan.join("c.txt"), "one").unwrap();
    let code = run(&dir, &["scan", &scan_arg]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let report = read_json(&dir.path().join("duplicates.json"));
    assert_eq!(report.as_object().unwrap().len(), 1);
}

#[test]
fn test_scan_invalid_path_is_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing").to_string_lossy().into_owned();

    let err = run(&dir, &["scan", &missing]).unwrap_err();

    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_scan_file_instead_of_directory_is_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    assert!(run(&dir, &["scan", &*file.to_string_lossy()]).is_err());
}

#[test]
fn test_redundant_nested_root_scanned_once() {
    let dir = tempdir().unwrap();
    let outer = dir.path().join("outer");
    let inner = outer.join("inner");
    fs::create_dir_all(&inner).unwrap();
    fs::write(inner.join("only.txt"), "single").unwrap();

    let code = run(
        &dir,
        &[
            "scan",
            "-r",
            &*outer.to_string_lossy(),
            &*inner.to_string_lossy(),
        ],
    )
    .unwrap();

    // The nested root is dropped, so the file is recorded once.
    assert_eq!(code, ExitCode::NoDuplicates);
    let cache = read_json(&dir.path().join("cache.json"));
    assert_eq!(cache["data"]["only.txt"].as_array().unwrap().len(), 1);
}

#[test]
fn test_clear_commands() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    fs::write(scan.join("a.txt"), "same").unwrap();
    fs::write(scan.join("b.txt"), "same").unwrap();
    run(&dir, &["scan", &*scan.to_string_lossy()]).unwrap();

    assert_eq!(run(&dir, &["clear-duplicates"]).unwrap(), ExitCode::Success);
    assert_eq!(read_json(&dir.path().join("duplicates.json")), serde_json::json!({}));

    assert_eq!(run(&dir, &["clear-cache"]).unwrap(), ExitCode::Success);
    let cache = read_json(&dir.path().join("cache.json"));
    assert_eq!(cache["data"], serde_json::json!({}));
    assert_eq!(cache["metadata"]["times_loaded"], 0);
}

#[test]
fn test_exclude_affects_next_scan() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    fs::write(scan.join("a.iso"), "same").unwrap();
    fs::write(scan.join("b.iso"), "same").unwrap();

    assert_eq!(
        run(&dir, &["exclude", "exts", ".iso"]).unwrap(),
        ExitCode::Success
    );
    let saved = Settings::load_file(&dir.path().join("settings.toml")).unwrap();
    assert_eq!(saved.user_exts_skip, vec![".iso"]);

    let code = run(&dir, &["scan", &*scan.to_string_lossy()]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    run(&dir, &["clear-exclusions"]).unwrap();
    let code = run(&dir, &["scan", &*scan.to_string_lossy()]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_exclude_invalid_extension_is_error() {
    let dir = tempdir().unwrap();

    let err = run(&dir, &["exclude", "exts", "iso"]).unwrap_err();

    assert!(err.to_string().contains("iso"));
    assert!(!dir.path().join("settings.toml").exists());
}

#[test]
fn test_settings_command_succeeds_without_file() {
    let dir = tempdir().unwrap();
    assert_eq!(run(&dir, &["settings"]).unwrap(), ExitCode::Success);
}
