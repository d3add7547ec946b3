//! 리스크 점수 — 심각도 가중 0-100 점수 계산
//!
//! 점수는 최악의 경우(전부 critical)의 가중 합을 기준으로 정규화됩니다.
//! 취약점 개수 자체가 아니라 심각도 구성이 점수를 결정합니다.

use depwatch_core::types::{ScanSummary, SeverityCounts, VulnerabilityRecord};

/// 심각도별 가중치
const WEIGHT_CRITICAL: usize = 4;
const WEIGHT_HIGH: usize = 3;
const WEIGHT_MODERATE: usize = 2;
const WEIGHT_LOW: usize = 1;

/// 심각도 집계로부터 0-100 리스크 점수를 계산합니다.
///
/// `score = round(100 × Σ(count × weight) / (total × 4))`
///
/// 취약점이 없으면 0입니다. 반올림은 사사오입(round-half-up)입니다.
pub fn risk_score(counts: &SeverityCounts) -> u8 {
    let total = counts.total();
    if total == 0 {
        return 0;
    }

    let weighted = counts.critical * WEIGHT_CRITICAL
        + counts.high * WEIGHT_HIGH
        + counts.moderate * WEIGHT_MODERATE
        + counts.low * WEIGHT_LOW;

    // round(100 * weighted / (total * 4)) = floor((50 * weighted + total) / (2 * total))
    let score = (50 * weighted + total) / (2 * total);
    score as u8
}

/// 취약점 레코드 목록을 집계하여 스캔 요약을 생성합니다.
pub fn summarize(vulnerabilities: &[VulnerabilityRecord]) -> ScanSummary {
    let mut counts = SeverityCounts::default();
    for record in vulnerabilities {
        counts.record(record.severity);
    }

    ScanSummary {
        counts,
        total_vulnerabilities: counts.total(),
        risk_score: risk_score(&counts),
    }
}
