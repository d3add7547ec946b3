//! 감사 실행 — 외부 취약점 감사 도구 호출
//!
//! `npm audit --json`은 취약점이 발견되면 관례적으로 0이 아닌 종료 코드를
//! 반환합니다. 이는 실패가 아니라 정상 동작이므로, 종료 코드와 무관하게
//! stdout을 수집해 파싱을 시도합니다.
//!
//! - stdout이 전혀 없으면 `AuditExecutionFailed` (치명)
//! - stdout이 있지만 파싱 불가면 `AuditOutputMalformed` (치명)
//! - 그 외에는 종료 코드에 따라 [`AuditInvocation::Success`] 또는
//!   [`AuditInvocation::PartialOutput`]으로 태깅된 성공

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ScanPipelineError;
use crate::workspace::WorkspaceHandle;

/// 패키지별 원시 advisory 엔트리
///
/// `via`는 구조화된 advisory 객체와 원시 문자열이 섞인 배열이거나
/// 아예 없을 수 있어 `serde_json::Value`로 받습니다. `fixAvailable`도
/// 불리언 또는 수정 정보 객체가 올 수 있습니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPackageAdvisory {
    /// 개별 이슈 목록 (객체 혹은 문자열의 배열)
    #[serde(default)]
    pub via: serde_json::Value,
    /// 패키지 수준 심각도 (advisory에 심각도가 없을 때의 대체값)
    #[serde(default)]
    pub severity: Option<String>,
    /// 수정 버전 제공 여부 (불리언 또는 객체)
    #[serde(default, rename = "fixAvailable")]
    pub fix_available: serde_json::Value,
}

/// 감사 도구의 원시 JSON 출력
///
/// `vulnerabilities`는 패키지명에서 advisory 엔트리로의 매핑입니다.
/// `BTreeMap`을 사용해 추출 결과의 패키지 순서를 결정적으로 만듭니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuditReport {
    /// 패키지명 -> advisory 엔트리
    #[serde(default)]
    pub vulnerabilities: BTreeMap<String, RawPackageAdvisory>,
    /// 해석 메타데이터 (전체 의존성 수 등)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl RawAuditReport {
    /// JSON 문자열에서 원시 리포트를 파싱합니다.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// 감사 호출 결과 — 종료 코드 정책이 반영된 태깅된 성공
#[derive(Debug, Clone)]
pub enum AuditInvocation {
    /// 종료 코드 0 (취약점 없음이 일반적)
    Success(RawAuditReport),
    /// 0이 아닌 종료 코드이지만 stdout은 유효한 JSON (취약점 발견 시 일반적)
    PartialOutput(RawAuditReport),
}

impl AuditInvocation {
    /// 태그를 버리고 원시 리포트를 꺼냅니다.
    pub fn into_report(self) -> RawAuditReport {
        match self {
            Self::Success(report) | Self::PartialOutput(report) => report,
        }
    }

    /// 원시 리포트에 대한 참조를 반환합니다.
    pub fn report(&self) -> &RawAuditReport {
        match self {
            Self::Success(report) | Self::PartialOutput(report) => report,
        }
    }
}

/// 외부 감사 도구 실행기
#[derive(Debug, Clone)]
pub struct AuditRunner {
    npm_binary: String,
    timeout: Duration,
    max_output_bytes: usize,
}

impl AuditRunner {
    /// 감사 실행기를 생성합니다.
    pub fn new(npm_binary: impl Into<String>, timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            npm_binary: npm_binary.into(),
            timeout,
            max_output_bytes,
        }
    }

    /// 워크스페이스에 대해 감사를 실행하고 stdout을 파싱합니다.
    ///
    /// low 심각도를 포함한 전체 결과를 JSON으로 요청합니다.
    pub async fn run(
        &self,
        workspace: &WorkspaceHandle,
    ) -> Result<AuditInvocation, ScanPipelineError> {
        let mut command = Command::new(&self.npm_binary);
        command
            .args(["audit", "--json", "--audit-level=low"])
            .current_dir(workspace.path())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ScanPipelineError::AuditExecutionFailed {
                    reason: format!("spawn failed: {e}"),
                });
            }
            Err(_) => {
                return Err(ScanPipelineError::AuditTimeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        if output.stdout.len() > self.max_output_bytes {
            return Err(ScanPipelineError::AuditOutputMalformed {
                reason: format!(
                    "output too large: {} bytes (max: {})",
                    output.stdout.len(),
                    self.max_output_bytes,
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                workspace = workspace.id(),
                status = %output.status,
                stderr = stderr.lines().next().unwrap_or(""),
                "audit produced no output"
            );
            return Err(ScanPipelineError::AuditExecutionFailed {
                reason: format!("no stdout, exit status {}", output.status),
            });
        }

        let report = RawAuditReport::parse(&stdout).map_err(|e| {
            ScanPipelineError::AuditOutputMalformed {
                reason: e.to_string(),
            }
        })?;

        if output.status.success() {
            debug!(workspace = workspace.id(), "audit completed cleanly");
            Ok(AuditInvocation::Success(report))
        } else {
            // 취약점 발견 시의 관례적인 비정상 종료. 에러가 아님
            debug!(
                workspace = workspace.id(),
                status = %output.status,
                packages = report.vulnerabilities.len(),
                "audit exited non-zero with parseable output"
            );
            Ok(AuditInvocation::PartialOutput(report))
        }
    }
}
