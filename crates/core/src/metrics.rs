//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `depwatch_`
//! - 모듈명: `scan_`, `history_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use depwatch_core::metrics;
//! use metrics::counter;
//!
//! counter!(depwatch_core::metrics::SCAN_COMPLETED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 심각도 레이블 키 (low, moderate, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 트리거 레이블 키 (manual, scheduled)
pub const LABEL_TRIGGER: &str = "trigger";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 프로젝트 레이블 키
pub const LABEL_PROJECT: &str = "project";

// ─── Scan Pipeline 메트릭 ──────────────────────────────────────────

/// Scan Pipeline: 완료된 스캔 수 (counter, label: trigger)
pub const SCAN_COMPLETED_TOTAL: &str = "depwatch_scan_completed_total";

/// Scan Pipeline: 실패한 스캔 수 (counter)
pub const SCAN_FAILED_TOTAL: &str = "depwatch_scan_failed_total";

/// Scan Pipeline: 스캔 소요 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "depwatch_scan_duration_seconds";

/// Scan Pipeline: 발견된 취약점 수 (counter, label: severity)
pub const SCAN_VULNERABILITIES_TOTAL: &str = "depwatch_scan_vulnerabilities_total";

/// Scan Pipeline: 의존성 해석 실패 수 (counter)
pub const SCAN_RESOLUTION_FAILURES_TOTAL: &str = "depwatch_scan_resolution_failures_total";

/// Scan Pipeline: 마지막 스캔의 리스크 점수 (gauge, label: project)
pub const SCAN_RISK_SCORE: &str = "depwatch_scan_risk_score";

/// Scan Pipeline: 등록된 모니터링 프로젝트 수 (gauge)
pub const SCAN_MONITORED_PROJECTS: &str = "depwatch_scan_monitored_projects";

// ─── History 메트릭 ────────────────────────────────────────────────

/// History: 기록된 히스토리 엔트리 수 (counter)
pub const HISTORY_APPENDS_TOTAL: &str = "depwatch_history_appends_total";

/// History: 손상된 히스토리 파일 복구 수 (counter)
pub const HISTORY_CORRUPT_RESETS_TOTAL: &str = "depwatch_history_corrupt_resets_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "depwatch_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, labels: version)
pub const DAEMON_BUILD_INFO: &str = "depwatch_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 스캔 소요 시간 히스토그램 버킷 (초)
///
/// 1s ~ 300s 범위 (외부 명령 실행 포함)
pub const SCAN_DURATION_BUCKETS: [f64; 8] = [1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 180.0, 300.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 호출하여 Prometheus HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `depwatch-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Scan Pipeline
    describe_counter!(
        SCAN_COMPLETED_TOTAL,
        "Total number of dependency scans completed"
    );
    describe_counter!(SCAN_FAILED_TOTAL, "Total number of dependency scans failed");
    describe_histogram!(
        SCAN_DURATION_SECONDS,
        "Time to complete a single dependency scan in seconds"
    );
    describe_counter!(
        SCAN_VULNERABILITIES_TOTAL,
        "Total number of vulnerabilities found across all scans"
    );
    describe_counter!(
        SCAN_RESOLUTION_FAILURES_TOTAL,
        "Total number of dependency resolution failures"
    );
    describe_gauge!(
        SCAN_RISK_SCORE,
        "Risk score of the most recent scan per project (0-100)"
    );
    describe_gauge!(
        SCAN_MONITORED_PROJECTS,
        "Number of projects registered for scheduled scanning"
    );

    // History
    describe_counter!(
        HISTORY_APPENDS_TOTAL,
        "Total number of scan results appended to history"
    );
    describe_counter!(
        HISTORY_CORRUPT_RESETS_TOTAL,
        "Total number of corrupt history files reset to empty"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Depwatch daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        SCAN_COMPLETED_TOTAL,
        SCAN_FAILED_TOTAL,
        SCAN_DURATION_SECONDS,
        SCAN_VULNERABILITIES_TOTAL,
        SCAN_RESOLUTION_FAILURES_TOTAL,
        SCAN_RISK_SCORE,
        SCAN_MONITORED_PROJECTS,
        HISTORY_APPENDS_TOTAL,
        HISTORY_CORRUPT_RESETS_TOTAL,
        DAEMON_UPTIME_SECONDS,
        DAEMON_BUILD_INFO,
    ];

    #[test]
    fn all_metrics_start_with_depwatch_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("depwatch_"),
                "Metric '{}' does not start with 'depwatch_' prefix",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // describe_all() should not panic even without a recorder installed
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        let labels = [LABEL_SEVERITY, LABEL_TRIGGER, LABEL_RESULT, LABEL_PROJECT];
        for label in &labels {
            assert_eq!(
                label.to_lowercase(),
                *label,
                "Label key '{}' should be lowercase",
                label
            );
        }
    }

    #[test]
    fn scan_duration_buckets_are_sorted() {
        let buckets = SCAN_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }
}
