// tests/config_and_settings.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use gorun::cli::CliArgs;
use gorun::config::{load_and_validate, load_and_validate_with, Settings};
use gorun::errors::GorunError;
use gorun::fs::mock::MockFileSystem;

fn demos_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/gorun.toml")
}

fn cli(args: &[&str]) -> CliArgs {
    let mut full = vec!["gorun"];
    full.extend_from_slice(args);
    CliArgs::try_parse_from(full).unwrap()
}

#[test]
fn demo_config_loads_and_normalises() {
    let cfg = load_and_validate(demos_config()).unwrap();

    assert_eq!(
        cfg.watch.patterns,
        vec!["demos/hello/...", "demos/templates/*.tmpl"]
    );
    assert_eq!(
        cfg.watch.extensions,
        Some(vec!["go".to_string(), "tmpl".to_string()])
    );
    assert_eq!(cfg.watch.debounce, Some(Duration::from_millis(150)));
    assert_eq!(cfg.build.name.as_deref(), Some("hello"));
}

#[test]
fn config_values_fill_in_missing_flags() {
    let cfg = load_and_validate(demos_config()).unwrap();
    let args = cli(&["-w", "demos/hello", "--", "-flag"]);

    let settings = Settings::resolve(&args, Some(&cfg), None).unwrap();

    assert!(settings.watch);
    assert_eq!(settings.patterns.len(), 2);
    assert_eq!(settings.extensions, vec!["go", "tmpl"]);
    assert_eq!(settings.debounce, Some(Duration::from_millis(150)));
    assert_eq!(settings.name.as_deref(), Some("hello"));
    assert_eq!(settings.args, vec!["-flag"]);
}

#[test]
fn config_patterns_alone_do_not_enable_watch() {
    let cfg = load_and_validate(demos_config()).unwrap();
    let settings = Settings::resolve(&cli(&["demos/hello"]), Some(&cfg), None).unwrap();

    assert!(!settings.watch);
}

#[test]
fn flags_override_config() {
    let cfg = load_and_validate(demos_config()).unwrap();
    let args = cli(&[
        "-p=./a/...,./b/...",
        "-n=other",
        "-e=txt",
        "--debounce=1s",
        "--go=/usr/local/go/bin/go",
        "demos/hello",
    ]);

    let settings = Settings::resolve(&args, Some(&cfg), Some(OsString::from("/gopath"))).unwrap();

    assert!(settings.watch, "-p implies -w");
    assert_eq!(settings.patterns, vec!["./a/...", "./b/..."]);
    assert_eq!(settings.name.as_deref(), Some("other"));
    assert_eq!(settings.extensions, vec!["txt"]);
    assert_eq!(settings.debounce, Some(Duration::from_secs(1)));
    assert_eq!(settings.go, "/usr/local/go/bin/go");
    assert_eq!(settings.gopath, Some(OsString::from("/gopath")));
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gorun.toml");
    std::fs::write(&path, "[watch]\npaterns = [\"./...\"]\n").unwrap();

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, GorunError::TomlError(_)), "{err:?}");
}

#[test]
fn invalid_values_surface_as_config_errors() {
    let fs = MockFileSystem::new();
    let cases = [
        ("/cfg/empty_ext.toml", "[watch]\nextensions = []\n"),
        ("/cfg/bad_debounce.toml", "[watch]\ndebounce = \"soon\"\n"),
        ("/cfg/bad_name.toml", "[build]\nname = \"bin/app\"\n"),
        ("/cfg/blank_pattern.toml", "[watch]\npatterns = [\"  \"]\n"),
    ];
    for (path, contents) in cases {
        fs.add_file(path, contents);
    }

    for (path, _) in cases {
        let err = load_and_validate_with(&fs, path).unwrap_err();
        assert!(matches!(err, GorunError::ConfigError(_)), "{path}: {err:?}");
    }
}

#[test]
fn missing_config_file_is_an_error() {
    let fs = MockFileSystem::new();
    assert!(load_and_validate_with(&fs, "/nope/gorun.toml").is_err());
}
