//! 의존성 해석 — 외부 도구로 lockfile 생성
//!
//! 워크스페이스 안에서 `npm install --package-lock-only`를 실행해 스크립트
//! 실행 없이 lockfile만 생성합니다. 해석 실패는 치명적이지 않습니다.
//! 감사 단계는 lockfile이 없거나 불완전해도 부분 정보를 낼 수 있으므로,
//! 실패를 [`ResolutionOutcome::Failed`]로 태깅만 하고 파이프라인은 계속
//! 진행합니다.

use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::workspace::WorkspaceHandle;

/// 의존성 해석 결과
///
/// 해석 실패는 에러가 아니라 일급 결과값입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// lockfile 생성 완료
    Completed,
    /// 해석 실패 (파이프라인은 계속 진행)
    Failed {
        /// 실패 사유
        reason: String,
    },
}

impl ResolutionOutcome {
    /// 해석이 완료되었는지 반환합니다.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// 외부 해석 도구 실행기
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    npm_binary: String,
    timeout: Duration,
}

impl DependencyResolver {
    /// 해석기를 생성합니다.
    pub fn new(npm_binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            npm_binary: npm_binary.into(),
            timeout,
        }
    }

    /// 워크스페이스 안에서 lockfile-only 해석을 실행합니다.
    ///
    /// 스크립트 실행과 감사, 펀딩 안내를 모두 비활성화하고
    /// lockfile 생성만 수행합니다. 타임아웃, 실행 실패, 비정상 종료는
    /// 모두 [`ResolutionOutcome::Failed`]로 보고됩니다.
    pub async fn resolve(&self, workspace: &WorkspaceHandle) -> ResolutionOutcome {
        let mut command = Command::new(&self.npm_binary);
        command
            .args([
                "install",
                "--package-lock-only",
                "--ignore-scripts",
                "--no-audit",
                "--no-fund",
            ])
            .current_dir(workspace.path())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(
                    workspace = workspace.id(),
                    error = %e,
                    "dependency resolution could not be spawned"
                );
                return ResolutionOutcome::Failed {
                    reason: format!("spawn failed: {e}"),
                };
            }
            Err(_) => {
                warn!(
                    workspace = workspace.id(),
                    timeout_secs = self.timeout.as_secs(),
                    "dependency resolution timed out"
                );
                return ResolutionOutcome::Failed {
                    reason: format!("timed out after {}s", self.timeout.as_secs()),
                };
            }
        };

        if output.status.success() {
            debug!(workspace = workspace.id(), "dependency resolution completed");
            ResolutionOutcome::Completed
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = format!(
                "exit status {}: {}",
                output.status,
                stderr.lines().next().unwrap_or("no stderr"),
            );
            warn!(
                workspace = workspace.id(),
                reason = reason.as_str(),
                "dependency resolution failed, continuing to audit"
            );
            ResolutionOutcome::Failed { reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use depwatch_core::types::Manifest;

    use crate::workspace::WorkspaceManager;

    async fn workspace_in(tmp: &tempfile::TempDir) -> WorkspaceHandle {
        let manager = WorkspaceManager::new(tmp.path());
        manager
            .create(&Manifest::new(serde_json::json!({ "name": "demo" })))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_binary_is_failed_outcome() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = workspace_in(&tmp).await;

        let resolver = DependencyResolver::new(
            "/nonexistent/depwatch-test-npm",
            Duration::from_secs(5),
        );
        let outcome = resolver.resolve(&workspace).await;
        assert!(matches!(outcome, ResolutionOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn failing_binary_is_failed_outcome() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = workspace_in(&tmp).await;

        // false(1)는 인자를 무시하고 종료 코드 1을 반환
        let resolver = DependencyResolver::new("false", Duration::from_secs(5));
        let outcome = resolver.resolve(&workspace).await;
        assert!(matches!(outcome, ResolutionOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn succeeding_binary_is_completed_outcome() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = workspace_in(&tmp).await;

        let resolver = DependencyResolver::new("true", Duration::from_secs(5));
        let outcome = resolver.resolve(&workspace).await;
        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn slow_binary_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = workspace_in(&tmp).await;

        let resolver = DependencyResolver::new("sleep", Duration::from_millis(100));
        // sleep은 넘긴 npm 인자를 파싱하지 못해 즉시 종료할 수 있으므로
        // 타임아웃과 실패 둘 다 Failed로 수렴하는지만 확인
        let outcome = resolver.resolve(&workspace).await;
        assert!(matches!(outcome, ResolutionOutcome::Failed { .. }));
    }
}
