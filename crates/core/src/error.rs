//! 에러 타입 — 도메인별 에러 정의

/// Depwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DepwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 스캔 처리 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// 히스토리 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중인 파이프라인을 다시 시작
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 파이프라인을 중지
    #[error("pipeline not running")]
    NotRunning,

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),
}

/// 스캔 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 스캔 워크스페이스 준비 실패
    #[error("workspace setup failed: {reason}")]
    WorkspaceSetup { reason: String },

    /// 유효하지 않은 매니페스트
    #[error("invalid manifest: {reason}")]
    InvalidManifest { reason: String },

    /// 감사 도구 실행 실패 (출력 없음)
    #[error("audit command failed to produce output: {reason}")]
    AuditExecutionFailed { reason: String },

    /// 감사 도구 출력 파싱 실패
    #[error("audit output malformed: {reason}")]
    AuditOutputMalformed { reason: String },

    /// 감사 도구 실행 시간 초과
    #[error("audit command timed out after {timeout_secs}s")]
    AuditTimeout { timeout_secs: u64 },
}

/// 히스토리 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 히스토리 파일 쓰기 실패
    #[error("history write failed for '{key}': {reason}")]
    WriteFailed { key: String, reason: String },

    /// 히스토리 파일 읽기 실패
    #[error("history read failed for '{key}': {reason}")]
    ReadFailed { key: String, reason: String },

    /// 히스토리 직렬화 실패
    #[error("history serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: DepwatchError = ConfigError::FileNotFound {
            path: "/etc/depwatch.toml".to_owned(),
        }
        .into();
        assert!(matches!(err, DepwatchError::Config(_)));
        assert!(err.to_string().contains("/etc/depwatch.toml"));
    }

    #[test]
    fn scan_error_converts_to_top_level() {
        let err: DepwatchError = ScanError::AuditExecutionFailed {
            reason: "no stdout".to_owned(),
        }
        .into();
        assert!(matches!(err, DepwatchError::Scan(_)));
        assert!(err.to_string().contains("no stdout"));
    }

    #[test]
    fn pipeline_error_display() {
        assert_eq!(
            PipelineError::AlreadyRunning.to_string(),
            "pipeline already running"
        );
        assert_eq!(PipelineError::NotRunning.to_string(), "pipeline not running");
    }

    #[test]
    fn storage_error_carries_key() {
        let err = StorageError::WriteFailed {
            key: "demo-app".to_owned(),
            reason: "disk full".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("demo-app"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn io_error_converts_to_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DepwatchError = io.into();
        assert!(matches!(err, DepwatchError::Io(_)));
    }

    #[test]
    fn audit_timeout_display_includes_duration() {
        let err = ScanError::AuditTimeout { timeout_secs: 180 };
        assert!(err.to_string().contains("180"));
    }
}
