//! Integration tests for directory scanning and configuration loading.

use std::path::PathBuf;

use codexplain::cli::{run_scan, ScanArgs, EXIT_FAILED, EXIT_SUCCESS};
use codexplain::config::{self, Config};
use codexplain::scan;
use codexplain::{SpaceComplexity, TimeComplexity};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

#[test]
fn test_collect_skips_vendor_and_unknown_extensions() {
    let root = testdata_path().join("tree");
    let files = scan::collect_files(&root).unwrap();

    let names: Vec<String> = files
        .iter()
        .map(|f| f.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["src/loops.py", "src/util.go"]);
}

#[test]
fn test_scan_tree() {
    let root = testdata_path().join("tree");
    let files = scan::collect_files(&root).unwrap();
    let entries = scan::scan_files(&files, &root);

    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].file, "src/loops.py");
    assert_eq!(entries[0].language, "python");
    assert_eq!(entries[0].time, TimeComplexity::Cubic);
    assert_eq!(entries[0].space, SpaceComplexity::Constant);

    assert_eq!(entries[1].file, "src/util.go");
    assert_eq!(entries[1].language, "go");
    assert_eq!(entries[1].time, TimeComplexity::Linear);

    let over = scan::over_limit(&entries, TimeComplexity::Quadratic);
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].file, "src/loops.py");
}

#[test]
fn test_scan_command_gates_on_max() {
    let args = ScanArgs {
        path: testdata_path().join("tree"),
        format: "json".to_string(),
        max: Some("O(n^2)".to_string()),
    };
    assert_eq!(run_scan(&args).unwrap(), EXIT_FAILED);

    let args = ScanArgs {
        max: Some("cubic".to_string()),
        ..args
    };
    assert_eq!(run_scan(&args).unwrap(), EXIT_SUCCESS);

    let args = ScanArgs { max: None, ..args };
    assert_eq!(run_scan(&args).unwrap(), EXIT_SUCCESS);
}

#[test]
fn test_parse_fixture_config() {
    let config = Config::parse_file(testdata_path().join("codexplain.yaml")).unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.server.max_body_bytes, 65536);
    assert!(!config.generator.enabled);
    assert_eq!(config.generator.model, "llama-3.1-8b-instant");
    assert_eq!(config.generator.timeout_ms, 5000);
    assert_eq!(config.logging.filter, "debug");

    // Unset keys keep their defaults.
    assert_eq!(config.generator.api_key_env, "GROQ_API_KEY");
    assert!(config.generator.auto_select_model);
    assert!(config.validate().is_ok());
}

#[test]
fn test_discover_and_load_fixture_config() {
    let found = config::discover_in(&testdata_path()).unwrap();
    assert_eq!(found, testdata_path().join("codexplain.yaml"));

    let (config, path) = Config::load(Some(&found)).unwrap();
    assert_eq!(path, Some(found));
    assert_eq!(config.server.port, 8088);
}

#[test]
fn test_missing_config_file_is_error() {
    let missing = testdata_path().join("absent.yaml");
    assert!(Config::load(Some(&missing)).is_err());
}
