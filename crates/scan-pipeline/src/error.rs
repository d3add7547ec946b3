//! 스캔 파이프라인 에러 타입
//!
//! [`ScanPipelineError`]는 스캔 파이프라인 모듈 내에서 발생할 수 있는 모든
//! 에러를 나타냅니다. `From<ScanPipelineError> for DepwatchError` 구현을 통해
//! `?` 연산자로 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 치명 / 비치명 구분
//!
//! - **치명** (스캔 중단): `AuditExecutionFailed`, `AuditOutputMalformed`,
//!   `AuditTimeout`, `WorkspaceSetup`, `InvalidManifest`
//! - **비치명** (로그 후 계속): 의존성 해석 실패는 에러가 아니라
//!   [`ResolutionOutcome::Failed`](crate::resolver::ResolutionOutcome)로 표현되며,
//!   워크스페이스 정리 실패는 로그만 남깁니다.

use depwatch_core::error::{DepwatchError, ScanError, StorageError};

/// 스캔 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanPipelineError {
    /// 워크스페이스 생성/준비 실패
    #[error("workspace setup failed: {reason}")]
    WorkspaceSetup {
        /// 실패 사유
        reason: String,
    },

    /// 유효하지 않은 매니페스트
    #[error("invalid manifest: {reason}")]
    InvalidManifest {
        /// 실패 사유
        reason: String,
    },

    /// 감사 도구가 사용 가능한 출력을 전혀 생성하지 못함
    #[error("audit execution failed: {reason}")]
    AuditExecutionFailed {
        /// 실패 사유
        reason: String,
    },

    /// 감사 도구 출력이 존재하지만 파싱 불가
    #[error("audit output malformed: {reason}")]
    AuditOutputMalformed {
        /// 파싱 실패 사유
        reason: String,
    },

    /// 감사 도구 실행 시간 초과
    #[error("audit timed out after {timeout_secs}s")]
    AuditTimeout {
        /// 타임아웃 (초)
        timeout_secs: u64,
    },

    /// 히스토리 영속화 실패
    #[error("history persistence failed: {0}")]
    History(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),
}

impl From<ScanPipelineError> for DepwatchError {
    fn from(err: ScanPipelineError) -> Self {
        match err {
            ScanPipelineError::WorkspaceSetup { reason } => {
                DepwatchError::Scan(ScanError::WorkspaceSetup { reason })
            }
            ScanPipelineError::InvalidManifest { reason } => {
                DepwatchError::Scan(ScanError::InvalidManifest { reason })
            }
            ScanPipelineError::AuditExecutionFailed { reason } => {
                DepwatchError::Scan(ScanError::AuditExecutionFailed { reason })
            }
            ScanPipelineError::AuditOutputMalformed { reason } => {
                DepwatchError::Scan(ScanError::AuditOutputMalformed { reason })
            }
            ScanPipelineError::AuditTimeout { timeout_secs } => {
                DepwatchError::Scan(ScanError::AuditTimeout { timeout_secs })
            }
            ScanPipelineError::History(msg) => {
                DepwatchError::Storage(StorageError::Serialization(msg))
            }
            ScanPipelineError::Config { field, reason } => {
                DepwatchError::Config(depwatch_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            ScanPipelineError::Channel(msg) => DepwatchError::Pipeline(
                depwatch_core::error::PipelineError::ChannelSend(msg),
            ),
        }
    }
}
