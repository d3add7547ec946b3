//! Concurrency tests for the history store.
//!
//! Verifies that concurrent appends to the same project key are
//! serialized and no updates are lost.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use depwatch_core::types::{
    ScanResult, ScanSummary, ScanTrigger, SeverityCounts, SignatureStatus, SignatureSummary,
};
use depwatch_history::HistoryStore;

fn sample_result(scan_id: &str, project: &str) -> ScanResult {
    ScanResult {
        scan_id: scan_id.to_owned(),
        project: project.to_owned(),
        trigger: ScanTrigger::Scheduled,
        summary: ScanSummary {
            counts: SeverityCounts::default(),
            total_vulnerabilities: 0,
            risk_score: 0,
        },
        vulnerabilities: vec![],
        dependencies: vec![],
        signatures: SignatureSummary {
            status: SignatureStatus::None,
            total: 0,
            verified: 0,
            unverified: 0,
            verified_packages: vec![],
            unverified_packages: vec![],
            message: "no packages".to_owned(),
        },
        started_at: SystemTime::now(),
        duration: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn concurrent_appends_to_same_key_lose_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(HistoryStore::new(tmp.path(), 0));

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .append("demo", &sample_result(&format!("scan-{i}"), "demo"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = store.load("demo").await.unwrap();
    assert_eq!(entries.len(), 10, "every concurrent append must be retained");

    // 모든 scan_id가 정확히 한 번씩 존재
    let mut ids: Vec<&str> = entries.iter().map(|e| e.scan_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn concurrent_appends_to_different_keys_do_not_interfere() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(HistoryStore::new(tmp.path(), 0));

    let mut handles = Vec::new();
    for i in 0..5 {
        let store = Arc::clone(&store);
        let project = format!("project-{i}");
        handles.push(tokio::spawn(async move {
            for j in 0..3 {
                store
                    .append(&project, &sample_result(&format!("scan-{j}"), &project))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..5 {
        let entries = store.load(&format!("project-{i}")).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].scan_id, "scan-2");
    }
}

#[tokio::test]
async fn append_survives_corrupt_file_race() {
    let tmp = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(tmp.path(), 0);

    store
        .append("demo", &sample_result("scan-1", "demo"))
        .await
        .unwrap();

    // 외부에서 파일을 손상시킨 뒤에도 append는 성공해야 함
    tokio::fs::write(tmp.path().join("demo.json"), b"garbage")
        .await
        .unwrap();

    store
        .append("demo", &sample_result("scan-2", "demo"))
        .await
        .unwrap();

    let entries = store.load("demo").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].scan_id, "scan-2");
}
