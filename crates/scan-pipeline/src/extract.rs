//! 결과 추출 — 원시 감사 출력을 안정적인 스키마로 정규화
//!
//! 감사 도구의 출력 형식은 도구 버전에 따라 흔들리므로, 여기서
//! [`VulnerabilityRecord`], [`DependencyRecord`], [`SignatureSummary`]의
//! 안정적인 스키마로 변환합니다. 누락된 필드는 모두 보수적인 기본값으로
//! 채워집니다.

use serde_json::Value;

use depwatch_core::types::{
    DependencyRecord, DependencyType, Severity, SignatureStatus, SignatureSummary,
    VulnerabilityRecord,
};

use crate::audit::{RawAuditReport, RawPackageAdvisory};

/// 서명 요약에 항상 포함되는 설명 메시지
///
/// 실제 암호학적 검증이 수행되지 않았음을 명시합니다.
pub const SIGNATURE_HEURISTIC_MESSAGE: &str =
    "signature verification is a placeholder heuristic (70% of total); \
     no cryptographic checks were performed";

/// 원시 리포트에서 정규화된 취약점 레코드를 추출합니다.
///
/// 패키지별 `via` 배열의 엔트리 하나당 레코드 하나를 생성합니다.
/// `via`가 배열이 아니면 해당 패키지에서는 레코드가 나오지 않습니다.
pub fn extract_vulnerabilities(raw: &RawAuditReport) -> Vec<VulnerabilityRecord> {
    let mut records = Vec::new();

    for (package, advisory) in &raw.vulnerabilities {
        let Some(via) = advisory.via.as_array() else {
            continue;
        };

        for (index, entry) in via.iter().enumerate() {
            records.push(record_from_via_entry(package, advisory, index, entry));
        }
    }

    records
}

fn record_from_via_entry(
    package: &str,
    advisory: &RawPackageAdvisory,
    index: usize,
    entry: &Value,
) -> VulnerabilityRecord {
    let fallback_severity = advisory
        .severity
        .as_deref()
        .map(Severity::from_raw)
        .unwrap_or_default();

    match entry {
        Value::Object(fields) => {
            let title = fields
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| synthesized_title(index, package));

            let severity = fields
                .get("severity")
                .and_then(Value::as_str)
                .map(Severity::from_raw)
                .unwrap_or(fallback_severity);

            let cvss_score = fields
                .get("cvss")
                .and_then(|cvss| cvss.get("score"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            let description = match fields.get("url").and_then(Value::as_str) {
                Some(url) => format!("{title} ({url})"),
                None => title.clone(),
            };

            VulnerabilityRecord {
                id: format!("{package}-{index}"),
                package: package.to_owned(),
                title,
                description,
                severity,
                cvss_score,
                fix_available: fix_available_flag(&advisory.fix_available),
            }
        }
        // 원시 문자열 엔트리: 심각도 문자열 혹은 전이 의존성 이름
        other => {
            let raw_text = other.as_str().map(str::to_owned).unwrap_or_else(|| {
                other.to_string()
            });
            VulnerabilityRecord {
                id: format!("{package}-{index}"),
                package: package.to_owned(),
                title: synthesized_title(index, package),
                description: raw_text,
                severity: fallback_severity,
                cvss_score: 0.0,
                fix_available: fix_available_flag(&advisory.fix_available),
            }
        }
    }
}

fn synthesized_title(index: usize, package: &str) -> String {
    format!("Issue {} in {}", index + 1, package)
}

fn fix_available_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        // 수정 정보 객체가 오면 수정 가능으로 간주
        Value::Object(_) => true,
        _ => false,
    }
}

/// 원시 리포트에서 패키지별 의존성 레코드를 추출합니다.
///
/// 감사 메타데이터만으로는 버전을 알 수 없어 `"unknown"`으로 보고하고,
/// dev/prod 구분도 불가능해 항상 prod로 보고합니다.
pub fn extract_dependencies(raw: &RawAuditReport) -> Vec<DependencyRecord> {
    raw.vulnerabilities
        .iter()
        .map(|(package, advisory)| DependencyRecord {
            name: package.clone(),
            version: "unknown".to_owned(),
            dependency_type: DependencyType::Prod,
            vulnerability_count: advisory
                .via
                .as_array()
                .map(|via| via.len())
                .unwrap_or(0),
        })
        .collect()
}

/// 원시 리포트에서 서명 검증 요약을 생성합니다 (휴리스틱).
///
/// 전체 패키지 수는 `metadata.dependencies.total`, 없으면
/// `metadata.totalDependencies`, 그마저 없으면 0으로 봅니다.
/// 검증 비율은 고정 휴리스틱(70%)이며 이름 목록은 비워둡니다.
pub fn extract_signature_summary(raw: &RawAuditReport) -> SignatureSummary {
    let total = raw
        .metadata
        .get("dependencies")
        .and_then(|deps| deps.get("total"))
        .and_then(Value::as_u64)
        .or_else(|| raw.metadata.get("totalDependencies").and_then(Value::as_u64))
        .unwrap_or(0) as usize;

    let verified = total * 7 / 10;
    let unverified = total - verified;
    let status = if total > 0 {
        SignatureStatus::Partial
    } else {
        SignatureStatus::None
    };

    SignatureSummary {
        status,
        total,
        verified,
        unverified,
        verified_packages: Vec::new(),
        unverified_packages: Vec::new(),
        message: SIGNATURE_HEURISTIC_MESSAGE.to_owned(),
    }
}
