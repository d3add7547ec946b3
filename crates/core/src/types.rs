//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 스캔 파이프라인과 히스토리 저장소가 공유하는 데이터 구조를 정의합니다.
//! [`ScanResult`]는 한 번의 스캔이 생성하는 불변 기록 단위이며,
//! 생성 이후 변경되지 않습니다.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// 취약점 심각도
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Moderate < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도 — 인식 불가 입력의 기본값
    #[default]
    Low,
    /// 중간 심각도
    Moderate,
    /// 높은 심각도
    High,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 감사 도구가 출력한 원시 심각도 문자열을 정규화합니다.
    ///
    /// 대소문자를 구분하지 않고 부분 문자열 포함 여부로 판정하며,
    /// critical > high > moderate(medium) > low 우선순위로 매칭합니다.
    /// 어느 것에도 해당하지 않으면 `Low`를 반환합니다.
    pub fn from_raw(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("critical") {
            Self::Critical
        } else if lower.contains("high") {
            Self::High
        } else if lower.contains("moderate") || lower.contains("medium") {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// 스캔 트리거 종류
///
/// 수동 요청과 스케줄러 실행을 구분합니다. 관측용 메타데이터일 뿐
/// 파이프라인 동작은 분기하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanTrigger {
    /// 호출자가 직접 요청한 스캔
    Manual,
    /// 스케줄러가 주기적으로 실행한 스캔
    Scheduled,
}

impl fmt::Display for ScanTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// 의존성 매니페스트
///
/// 호출자가 제출한 프로젝트 의존성 선언 문서(package.json)를 불투명한
/// JSON 값으로 감쌉니다. 스캔에 제출된 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(serde_json::Value);

impl Manifest {
    /// JSON 값에서 매니페스트를 생성합니다.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// 매니페스트에 선언된 프로젝트 이름을 반환합니다.
    ///
    /// 최상위 `"name"` 필드가 문자열이 아니거나 없으면 `None`입니다.
    pub fn project_name(&self) -> Option<&str> {
        self.0.get("name").and_then(|v| v.as_str())
    }

    /// 내부 JSON 값에 대한 참조를 반환합니다.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// 워크스페이스에 기록할 직렬화 형태를 반환합니다.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }
}

impl From<serde_json::Value> for Manifest {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// 정규화된 단일 취약점 레코드
///
/// 감사 도구 출력의 advisory 하나에 대응합니다. 스캔마다 새로 생성되며
/// 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// 스캔 내 고유 ID (`{패키지명}-{순번}`)
    pub id: String,
    /// 영향받는 패키지명
    pub package: String,
    /// 취약점 제목
    pub title: String,
    /// 상세 설명 (advisory URL 포함 가능)
    pub description: String,
    /// 심각도
    pub severity: Severity,
    /// CVSS 계열 점수 (없으면 0.0)
    pub cvss_score: f64,
    /// 수정 버전 제공 여부
    pub fix_available: bool,
}

impl fmt::Display for VulnerabilityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} (cvss: {}, fix: {})",
            self.id,
            self.severity,
            self.title,
            self.cvss_score,
            if self.fix_available { "yes" } else { "no" },
        )
    }
}

/// 의존성 구분 (prod/dev)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// 프로덕션 의존성
    #[default]
    Prod,
    /// 개발 의존성
    ///
    /// 감사 출력만으로는 구분할 수 없어 현재 추출 단계에서는 사용되지 않습니다.
    Dev,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prod => write!(f, "prod"),
            Self::Dev => write!(f, "dev"),
        }
    }
}

/// 감사 출력에서 관측된 패키지별 의존성 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// 패키지명
    pub name: String,
    /// 버전 — 감사 메타데이터만으로는 알 수 없으면 `"unknown"`
    pub version: String,
    /// 의존성 구분
    pub dependency_type: DependencyType,
    /// 해당 패키지에서 발견된 취약점 수
    pub vulnerability_count: usize,
}

impl fmt::Display for DependencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({}) vulns={}",
            self.name, self.version, self.dependency_type, self.vulnerability_count,
        )
    }
}

/// 서명 검증 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    /// 검증 대상 없음
    None,
    /// 일부 패키지만 검증됨
    Partial,
    /// 전체 패키지 검증됨
    Full,
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Partial => write!(f, "partial"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// 서명 검증 요약 — 자리표시자 휴리스틱
///
/// 실제 암호학적 검증은 수행하지 않습니다. 검증 비율은 고정 휴리스틱
/// (전체의 70%)으로 계산되며, `message` 필드가 이 사실을 명시합니다.
/// 보안 통제로 취급해서는 안 됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSummary {
    /// 검증 상태
    pub status: SignatureStatus,
    /// 전체 패키지 수
    pub total: usize,
    /// 검증된 것으로 집계된 패키지 수
    pub verified: usize,
    /// 미검증 패키지 수
    pub unverified: usize,
    /// 검증된 패키지 이름 목록 (휴리스틱 단계에서는 항상 비어 있음)
    pub verified_packages: Vec<String>,
    /// 미검증 패키지 이름 목록 (휴리스틱 단계에서는 항상 비어 있음)
    pub unverified_packages: Vec<String>,
    /// 설명 메시지
    pub message: String,
}

/// 심각도별 취약점 개수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl SeverityCounts {
    /// 전체 취약점 수를 반환합니다.
    pub fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low
    }

    /// 심각도 하나를 집계에 반영합니다.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Low => self.low += 1,
        }
    }
}

/// 스캔 요약 — 심각도 집계와 리스크 점수
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// 심각도별 개수
    pub counts: SeverityCounts,
    /// 전체 취약점 수 (counts 합계와 항상 일치)
    pub total_vulnerabilities: usize,
    /// 리스크 점수 (0-100)
    pub risk_score: u8,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "score={} total={} (c={} h={} m={} l={})",
            self.risk_score,
            self.total_vulnerabilities,
            self.counts.critical,
            self.counts.high,
            self.counts.moderate,
            self.counts.low,
        )
    }
}

/// 스캔 결과 — 한 번의 스캔이 생성하는 기록 단위
///
/// 조립된 이후에는 불변이며, 히스토리 저장소에 영속화된 뒤
/// 호출자에게 값으로 반환됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// 스캔 고유 ID (UUID v4)
    pub scan_id: String,
    /// 프로젝트 이름
    pub project: String,
    /// 스캔 트리거 종류
    pub trigger: ScanTrigger,
    /// 요약 (심각도 집계 + 리스크 점수)
    pub summary: ScanSummary,
    /// 정규화된 취약점 목록
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    /// 관측된 의존성 목록
    pub dependencies: Vec<DependencyRecord>,
    /// 서명 검증 요약 (휴리스틱)
    pub signatures: SignatureSummary,
    /// 스캔 시작 시각
    pub started_at: SystemTime,
    /// 스캔 소요 시간
    pub duration: Duration,
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScanResult[{}] project={} trigger={} {}",
            &self.scan_id[..8.min(self.scan_id.len())],
            self.project,
            self.trigger,
            self.summary,
        )
    }
}
