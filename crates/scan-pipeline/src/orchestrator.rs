//! 스캔 오케스트레이터 — 단일 스캔의 전체 실행 흐름
//!
//! 하나의 스캔은 다음 단계를 순서대로 거칩니다.
//!
//! 1. 격리 워크스페이스 생성 및 매니페스트 기록
//! 2. 의존성 해석 (실패해도 계속 진행)
//! 3. 감사 도구 실행 및 stdout 파싱
//! 4. 취약점/의존성/서명 추출 및 리스크 점수 계산
//! 5. 히스토리 append
//!
//! 워크스페이스는 감사가 치명적으로 실패한 경우를 포함해 모든 종료
//! 경로에서 정리됩니다.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use metrics::{counter, gauge, histogram};
use tracing::{info, warn};

use depwatch_core::metrics::{
    LABEL_PROJECT, LABEL_SEVERITY, LABEL_TRIGGER, SCAN_COMPLETED_TOTAL, SCAN_DURATION_SECONDS,
    SCAN_FAILED_TOTAL, SCAN_RESOLUTION_FAILURES_TOTAL, SCAN_RISK_SCORE,
    SCAN_VULNERABILITIES_TOTAL,
};
use depwatch_core::types::{Manifest, ScanResult, ScanTrigger, Severity};
use depwatch_history::HistoryStore;

use crate::audit::AuditRunner;
use crate::config::ScanPipelineConfig;
use crate::error::ScanPipelineError;
use crate::extract::{extract_dependencies, extract_signature_summary, extract_vulnerabilities};
use crate::resolver::{DependencyResolver, ResolutionOutcome};
use crate::score::summarize;
use crate::workspace::WorkspaceManager;

/// 이름 없는 매니페스트에 부여되는 프로젝트 이름
const FALLBACK_PROJECT_NAME: &str = "unnamed-project";

/// 스캔 실행 오케스트레이터
///
/// 워크스페이스 관리자, 해석기, 감사 실행기, 히스토리 저장소를 조합해
/// 매니페스트 하나에 대한 스캔을 처음부터 끝까지 실행합니다.
#[derive(Debug)]
pub struct ScanOrchestrator {
    workspaces: WorkspaceManager,
    resolver: DependencyResolver,
    audit: AuditRunner,
    history: Arc<HistoryStore>,
}

impl ScanOrchestrator {
    /// 설정과 히스토리 저장소로 오케스트레이터를 생성합니다.
    pub fn new(config: &ScanPipelineConfig, history: Arc<HistoryStore>) -> Self {
        let timeout = Duration::from_secs(config.command_timeout_secs);
        Self {
            workspaces: WorkspaceManager::new(config.workspace_root.clone()),
            resolver: DependencyResolver::new(config.npm_binary.clone(), timeout),
            audit: AuditRunner::new(
                config.npm_binary.clone(),
                timeout,
                config.max_audit_output_bytes,
            ),
            history,
        }
    }

    /// 매니페스트 하나를 스캔하고 결과를 히스토리에 기록합니다.
    ///
    /// 프로젝트 이름은 명시적 이름, 매니페스트의 `name` 필드,
    /// 대체 이름 순서로 결정됩니다. 의존성 해석 실패는 치명적이지
    /// 않지만, 감사 도구가 사용 가능한 출력을 내지 못하면 스캔 전체가
    /// 실패합니다.
    pub async fn run(
        &self,
        manifest: &Manifest,
        project_name: Option<&str>,
        trigger: ScanTrigger,
    ) -> Result<ScanResult, ScanPipelineError> {
        let project = resolve_project_name(manifest, project_name);
        let scan_id = uuid::Uuid::new_v4().to_string();
        let started_at = SystemTime::now();
        let started = Instant::now();

        info!(
            scan_id = scan_id.as_str(),
            project = project.as_str(),
            trigger = %trigger,
            "scan started"
        );

        let workspace = self.workspaces.create(manifest).await.inspect_err(|_| {
            counter!(SCAN_FAILED_TOTAL).increment(1);
        })?;

        let resolution = self.resolver.resolve(&workspace).await;
        if let ResolutionOutcome::Failed { reason } = &resolution {
            counter!(SCAN_RESOLUTION_FAILURES_TOTAL).increment(1);
            warn!(
                scan_id = scan_id.as_str(),
                project = project.as_str(),
                reason = reason.as_str(),
                "resolution failed, auditing without a complete lockfile"
            );
        }

        // 감사 실패 시에도 워크스페이스는 정리
        let invocation = match self.audit.run(&workspace).await {
            Ok(invocation) => invocation,
            Err(e) => {
                counter!(SCAN_FAILED_TOTAL).increment(1);
                self.workspaces.destroy(workspace).await;
                return Err(e);
            }
        };
        self.workspaces.destroy(workspace).await;

        let raw = invocation.into_report();
        let vulnerabilities = extract_vulnerabilities(&raw);
        let dependencies = extract_dependencies(&raw);
        let signatures = extract_signature_summary(&raw);
        let summary = summarize(&vulnerabilities);

        let result = ScanResult {
            scan_id: scan_id.clone(),
            project: project.clone(),
            trigger,
            summary,
            vulnerabilities,
            dependencies,
            signatures,
            started_at,
            duration: started.elapsed(),
        };

        record_scan_metrics(&result);

        // 스캔 자체는 성공했으므로 영속화 실패는 결과 반환을 막지 않음
        if let Err(e) = self.history.append(&project, &result).await {
            warn!(
                scan_id = scan_id.as_str(),
                project = project.as_str(),
                error = %e,
                "scan completed but history append failed"
            );
        }

        info!(
            scan_id = scan_id.as_str(),
            project = project.as_str(),
            risk_score = result.summary.risk_score,
            vulnerabilities = result.summary.total_vulnerabilities,
            duration_ms = result.duration.as_millis() as u64,
            "scan completed"
        );

        Ok(result)
    }
}

/// 명시적 이름, 매니페스트의 `name`, 대체 이름 순서로 프로젝트 이름을 결정합니다.
pub fn resolve_project_name(manifest: &Manifest, explicit: Option<&str>) -> String {
    if let Some(name) = explicit {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            return trimmed.to_owned();
        }
    }

    manifest
        .project_name()
        .map(str::to_owned)
        .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_owned())
}

fn record_scan_metrics(result: &ScanResult) {
    counter!(SCAN_COMPLETED_TOTAL, LABEL_TRIGGER => result.trigger.to_string()).increment(1);
    histogram!(SCAN_DURATION_SECONDS).record(result.duration.as_secs_f64());
    gauge!(SCAN_RISK_SCORE, LABEL_PROJECT => result.project.clone())
        .set(f64::from(result.summary.risk_score));

    for (severity, count) in [
        (Severity::Critical, result.summary.counts.critical),
        (Severity::High, result.summary.counts.high),
        (Severity::Moderate, result.summary.counts.moderate),
        (Severity::Low, result.summary.counts.low),
    ] {
        if count > 0 {
            counter!(SCAN_VULNERABILITIES_TOTAL, LABEL_SEVERITY => severity.to_string())
                .increment(count as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(value: serde_json::Value) -> Manifest {
        Manifest::new(value)
    }

    #[test]
    fn explicit_name_wins() {
        let m = manifest(serde_json::json!({ "name": "from-manifest" }));
        assert_eq!(resolve_project_name(&m, Some("explicit")), "explicit");
    }

    #[test]
    fn manifest_name_used_when_no_explicit() {
        let m = manifest(serde_json::json!({ "name": "from-manifest" }));
        assert_eq!(resolve_project_name(&m, None), "from-manifest");
    }

    #[test]
    fn blank_explicit_name_falls_through() {
        let m = manifest(serde_json::json!({ "name": "from-manifest" }));
        assert_eq!(resolve_project_name(&m, Some("   ")), "from-manifest");
    }

    #[test]
    fn nameless_manifest_uses_fallback() {
        let m = manifest(serde_json::json!({ "version": "1.0.0" }));
        assert_eq!(resolve_project_name(&m, None), "unnamed-project");
    }

    #[test]
    fn non_string_manifest_name_uses_fallback() {
        let m = manifest(serde_json::json!({ "name": 42 }));
        assert_eq!(resolve_project_name(&m, None), "unnamed-project");
    }
}
