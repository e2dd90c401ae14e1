//! Table-driven tests for configuration loading and validation.

use std::path::PathBuf;

use faxqueue::config::{load_config, load_config_from_str};
use faxqueue::job::Stage;
use faxqueue::queue::SubmitRequest;
use faxqueue::{JobQueue, SourceRegistry};

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "defaults_only",
        config_json: "{}",
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "base_directory": "/data/fax",
            "directories": {
                "staging": "spool/staging",
                "queue": "spool/queue",
                "processing": "spool/processing",
                "archive_success": "reports/ok",
                "archive_failure": "reports/failed"
            },
            "sources": { "inbox": "in", "scanner": "/mnt/scanner" },
            "exclude_suffixes": ["__OK.pdf"],
            "exclude_contains": [],
            "limits": { "max_list_files": 50, "max_active_jobs": 5 },
            "country_code": "43",
            "database_path": "db/contacts.sqlite"
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{ "version": "2.0" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "empty_base_directory",
        config_json: r#"{ "base_directory": "  " }"#,
        should_succeed: false,
        expected_error: Some("base_directory"),
    },
    ConfigTestCase {
        name: "stage_outside_base",
        config_json: r#"{ "directories": { "processing": "../processing" } }"#,
        should_succeed: false,
        expected_error: Some("directories.processing"),
    },
    ConfigTestCase {
        name: "bucket_name_with_slash",
        config_json: r#"{ "sources": { "a/b": "x" } }"#,
        should_succeed: false,
        expected_error: Some("a/b"),
    },
    ConfigTestCase {
        name: "bucket_without_directory",
        config_json: r#"{ "sources": { "inbox": "" } }"#,
        should_succeed: false,
        expected_error: Some("inbox"),
    },
    ConfigTestCase {
        name: "zero_active_limit",
        config_json: r#"{ "limits": { "max_active_jobs": 0 } }"#,
        should_succeed: false,
        expected_error: Some("limits.max_active_jobs"),
    },
    ConfigTestCase {
        name: "country_code_with_plus",
        config_json: r#"{ "country_code": "+49" }"#,
        should_succeed: false,
        expected_error: Some("country_code"),
    },
    ConfigTestCase {
        name: "malformed_json",
        config_json: r#"{ "sources": "#,
        should_succeed: false,
        expected_error: None,
    },
];

#[test]
fn test_json_config_loading() {
    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected failure", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    assert!(
                        message.contains(expected),
                        "{}: '{}' does not mention '{}'",
                        case.name,
                        message,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_loaded_config_drives_queue() {
    let temp = tempfile::TempDir::new().unwrap();
    let config_json = format!(
        r#"{{
            "base_directory": {},
            "directories": {{ "queue": "spool/queue", "staging": "spool/staging" }},
            "sources": {{ "inbox": "in" }},
            "country_code": "43"
        }}"#,
        serde_json::to_string(&temp.path().to_string_lossy()).unwrap()
    );
    let config_path = temp.path().join("config.json");
    std::fs::write(&config_path, config_json).unwrap();

    let config = load_config(&config_path).unwrap();
    let queue = JobQueue::from_config(&config);
    queue.sources().ensure_directories().unwrap();
    std::fs::write(temp.path().join("in/scan.pdf"), b"%PDF").unwrap();

    let report = queue.submit(
        &SubmitRequest {
            src: "inbox".to_string(),
            files: vec!["scan.pdf".to_string()],
            recipient_name: "Praxis B".to_string(),
            recipient_number: "0662 123".to_string(),
            ..Default::default()
        },
        None,
    );

    assert_eq!(report.created(), 1);
    let ids = queue.layout().list_job_ids(Stage::Queued);
    assert_eq!(ids.len(), 1);
    assert!(temp.path().join("spool/queue").join(&ids[0]).is_dir());
    let record: serde_json::Value = serde_json::from_slice(
        &std::fs::read(temp.path().join("spool/queue").join(&ids[0]).join("job.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(record["recipient"]["number"], "43662123");
}

#[test]
fn test_source_directories_resolve_against_base() {
    let config = load_config_from_str(
        r#"{ "base_directory": "/data/fax", "sources": { "inbox": "in", "scanner": "/mnt/scanner" } }"#,
    )
    .unwrap();
    let registry = SourceRegistry::from_config(&config);

    assert_eq!(
        registry.directory("inbox").unwrap(),
        PathBuf::from("/data/fax/in").as_path()
    );
    assert_eq!(
        registry.directory("scanner").unwrap(),
        PathBuf::from("/mnt/scanner").as_path()
    );
    assert!(registry.directory("missing").is_err());
}
