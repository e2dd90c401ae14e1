//! Terminal archives: classification of worker outcomes and the cleanup
//! operations on the failure archive.

mod common;

use serde_json::json;

use common::{OutcomeBuilder, TestHarness};

use faxqueue::listing::status_snapshot;
use faxqueue::outcome::{ArchiveKind, CleanupResult, Outcome};

const JOB: &str = "JOB-20260213-101500-a1b2c3";

#[test]
fn test_archive_listing_classifies_outcomes() {
    let harness = TestHarness::new();
    harness.write_outcome(
        ArchiveKind::Success,
        &format!("scan__{}.json", JOB),
        &OutcomeBuilder::new(JOB)
            .status("OK")
            .times("2026-02-13T10:15:00+01:00", "2026-02-13T10:17:30+01:00")
            .result(json!({"pages": 3, "statuscode": 0}))
            .build(),
        true,
    );
    harness.write_outcome(
        ArchiveKind::Success,
        "letter__JOB-20260213-091500-zzzzzz.json",
        &OutcomeBuilder::new("JOB-20260213-091500-zzzzzz")
            .status("FAILED")
            .times("2026-02-13T09:15:00+01:00", "2026-02-13T09:15:20+01:00")
            .cancel_handled("2026-02-13T09:15:19+01:00")
            .result(json!({"statuscode": 345, "npages": 1, "totpages": 2}))
            .build(),
        false,
    );

    let entries = harness.archive.list(ArchiveKind::Success, 25);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].outcome, Outcome::Success);
    assert_eq!(entries[0].pages.to_string(), "3");
    assert_eq!(entries[0].duration.as_deref(), Some("2 min 30 s"));
    assert_eq!(
        entries[0].artifact.as_deref(),
        Some(format!("scan__{}__OK.pdf", JOB).as_str())
    );
    assert_eq!(entries[1].outcome, Outcome::Aborted);
    assert_eq!(entries[1].pages.to_string(), "1/2");
    assert_eq!(entries[1].duration.as_deref(), Some("20 s"));
}

#[test]
fn test_failure_listing_and_snapshot_count() {
    let harness = TestHarness::new();
    for (i, reason) in ["No carrier", "Busy"].iter().enumerate() {
        harness.write_outcome(
            ArchiveKind::Failure,
            &format!("doc{}__{}.json", i, JOB),
            &OutcomeBuilder::new(JOB)
                .status("FAILED")
                .times(
                    "2026-02-13T10:00:00+00:00",
                    &format!("2026-02-13T10:0{}:00+00:00", i + 1),
                )
                .result(json!({"error_message": reason}))
                .build(),
            i == 0,
        );
    }

    let entries = harness.archive.list(ArchiveKind::Failure, 200);
    let errors: Vec<_> = entries.iter().map(|e| e.error.clone().unwrap()).collect();
    assert_eq!(errors, vec!["Busy", "No carrier"]);
    assert!(entries[1].artifact.is_some());

    assert_eq!(status_snapshot(harness.layout(), 12).failed, 2);
}

#[test]
fn test_adopt_renames_on_collision_and_keeps_existing() {
    let harness = TestHarness::new();
    let name = format!("scan__{}.json", JOB);
    harness.write_outcome(
        ArchiveKind::Success,
        &name,
        &OutcomeBuilder::new(JOB).status("OK").build(),
        true,
    );
    harness.write_outcome(
        ArchiveKind::Failure,
        &name,
        &OutcomeBuilder::new(JOB).status("FAILED").build(),
        true,
    );

    let report = harness.archive.adopt_failures(&[name.clone()]);

    assert_eq!(report.processed, 1);
    let CleanupResult::Adopted { renamed_to } = &report.items[0].result else {
        panic!("adoption failed: {:?}", report.items[0]);
    };
    assert_ne!(renamed_to, &name);

    let success = harness.archive_files(ArchiveKind::Success);
    assert_eq!(success.len(), 4);
    assert!(success.contains(&name));
    assert!(success.contains(renamed_to));
    let adopted_artifact = ArchiveKind::Success.artifact_name(renamed_to).unwrap();
    assert!(success.contains(&adopted_artifact));
    assert!(harness.archive_files(ArchiveKind::Failure).is_empty());

    let existing = harness
        .archive
        .open_record(ArchiveKind::Success, &name)
        .unwrap();
    let record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(existing).unwrap()).unwrap();
    assert_eq!(record["status"], "OK");
}

#[test]
fn test_batch_delete_reports_n_minus_one() {
    let harness = TestHarness::new();
    let names: Vec<String> = (0..4).map(|i| format!("doc{}__{}.json", i, JOB)).collect();
    for (i, name) in names.iter().enumerate() {
        if i == 2 {
            continue;
        }
        harness.write_outcome(
            ArchiveKind::Failure,
            name,
            &OutcomeBuilder::new(JOB).status("FAILED").build(),
            i % 2 == 0,
        );
    }

    let report = harness.archive.delete_failures(&names);

    assert_eq!(report.processed, names.len() - 1);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.items[2].result,
        CleanupResult::Failed { .. }
    ));
    assert_eq!(report.items[3].result, CleanupResult::Deleted);
    assert!(harness.archive_files(ArchiveKind::Failure).is_empty());
}

#[test]
fn test_cleanup_rejects_names_outside_archive() {
    let harness = TestHarness::new();
    harness.write_outcome(
        ArchiveKind::Success,
        "keep.json",
        &OutcomeBuilder::new(JOB).status("OK").build(),
        false,
    );

    let report = harness.archive.delete_failures(&[
        "../success/keep.json".to_string(),
        "keep.pdf".to_string(),
    ]);

    assert_eq!(report.processed, 0);
    assert_eq!(report.failed(), 2);
    assert_eq!(harness.archive_files(ArchiveKind::Success), vec!["keep.json"]);
}
