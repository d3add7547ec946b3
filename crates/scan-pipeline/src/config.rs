//! 스캔 파이프라인 설정
//!
//! [`ScanPipelineConfig`]는 core의 [`ScannerConfig`](depwatch_core::config::ScannerConfig)를
//! 확장하여 파이프라인 고유 설정(이벤트 채널 용량, 출력 버퍼 한도)을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use depwatch_scan_pipeline::ScanPipelineConfig;
//!
//! // 기본값으로 생성
//! let config = ScanPipelineConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use depwatch_scan_pipeline::ScanPipelineConfigBuilder;
//!
//! let config = ScanPipelineConfigBuilder::new()
//!     .npm_binary("/usr/bin/npm")
//!     .scan_interval_secs(600)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ScanPipelineError;

/// 스캔 파이프라인 설정
///
/// core의 `ScannerConfig`에서 파생되며, 모듈 고유 확장 필드를 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPipelineConfig {
    /// 파이프라인 활성화 여부
    pub enabled: bool,
    /// 스캔 워크스페이스 루트 디렉토리
    pub workspace_root: String,
    /// npm 실행 파일 경로
    pub npm_binary: String,
    /// 외부 명령 타임아웃 (초)
    pub command_timeout_secs: u64,
    /// 주기적 스캔 간격 (초). 0이면 수동 트리거만 가능
    pub scan_interval_secs: u64,

    // --- 모듈 고유 확장 ---
    /// 감사 출력 최대 허용 크기 (바이트)
    pub max_audit_output_bytes: usize,
    /// 스캔 이벤트 채널 용량
    pub event_channel_capacity: usize,
}

impl Default for ScanPipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workspace_root: "/var/lib/depwatch/workspaces".to_owned(),
            npm_binary: "npm".to_owned(),
            command_timeout_secs: 180,
            scan_interval_secs: 300,
            max_audit_output_bytes: 10 * 1024 * 1024, // 10 MB
            event_channel_capacity: 256,
        }
    }
}

/// 설정 상한값 상수
const MAX_COMMAND_TIMEOUT_SECS: u64 = 3_600; // 1 hour
const MAX_SCAN_INTERVAL_SECS: u64 = 604_800; // 7 days
const MAX_AUDIT_OUTPUT_LIMIT: usize = 100 * 1024 * 1024; // 100 MB

impl ScanPipelineConfig {
    /// core의 `ScannerConfig`에서 파이프라인 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값을 사용합니다.
    pub fn from_core(core: &depwatch_core::config::ScannerConfig) -> Self {
        Self {
            enabled: core.enabled,
            workspace_root: core.workspace_root.clone(),
            npm_binary: core.npm_binary.clone(),
            command_timeout_secs: core.command_timeout_secs,
            scan_interval_secs: core.scan_interval_secs,
            ..Self::default()
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `command_timeout_secs`: 1-3600
    /// - `scan_interval_secs`: 0 (수동 모드) 또는 60-604800
    /// - `npm_binary`, `workspace_root`: 활성화 시 비어있으면 안 됨
    /// - `workspace_root`: `..` 컴포넌트 금지
    /// - `max_audit_output_bytes`: 1-104857600 (100MB)
    pub fn validate(&self) -> Result<(), ScanPipelineError> {
        if self.command_timeout_secs == 0 || self.command_timeout_secs > MAX_COMMAND_TIMEOUT_SECS {
            return Err(ScanPipelineError::Config {
                field: "command_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_COMMAND_TIMEOUT_SECS}"),
            });
        }

        if self.scan_interval_secs > 0 && self.scan_interval_secs < 60 {
            return Err(ScanPipelineError::Config {
                field: "scan_interval_secs".to_owned(),
                reason: format!("must be 0 (manual) or 60-{MAX_SCAN_INTERVAL_SECS}"),
            });
        }

        if self.scan_interval_secs > MAX_SCAN_INTERVAL_SECS {
            return Err(ScanPipelineError::Config {
                field: "scan_interval_secs".to_owned(),
                reason: format!("must be 0 (manual) or 60-{MAX_SCAN_INTERVAL_SECS}"),
            });
        }

        if self.max_audit_output_bytes == 0 || self.max_audit_output_bytes > MAX_AUDIT_OUTPUT_LIMIT
        {
            return Err(ScanPipelineError::Config {
                field: "max_audit_output_bytes".to_owned(),
                reason: format!("must be 1-{MAX_AUDIT_OUTPUT_LIMIT}"),
            });
        }

        if self.event_channel_capacity == 0 {
            return Err(ScanPipelineError::Config {
                field: "event_channel_capacity".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        if self.enabled {
            if self.npm_binary.is_empty() {
                return Err(ScanPipelineError::Config {
                    field: "npm_binary".to_owned(),
                    reason: "npm_binary must not be empty when enabled".to_owned(),
                });
            }

            if self.workspace_root.is_empty() {
                return Err(ScanPipelineError::Config {
                    field: "workspace_root".to_owned(),
                    reason: "workspace_root must not be empty when enabled".to_owned(),
                });
            }

            // Path traversal 체크: Path::components()로 정확하게 ParentDir 컴포넌트 검출
            if std::path::Path::new(&self.workspace_root)
                .components()
                .any(|c| c == std::path::Component::ParentDir)
            {
                return Err(ScanPipelineError::Config {
                    field: "workspace_root".to_owned(),
                    reason: "workspace_root contains path traversal pattern '..'".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// [`ScanPipelineConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct ScanPipelineConfigBuilder {
    config: ScanPipelineConfig,
}

impl ScanPipelineConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 활성화 여부를 설정합니다.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// 워크스페이스 루트 디렉토리를 설정합니다.
    pub fn workspace_root(mut self, root: impl Into<String>) -> Self {
        self.config.workspace_root = root.into();
        self
    }

    /// npm 실행 파일 경로를 설정합니다.
    pub fn npm_binary(mut self, path: impl Into<String>) -> Self {
        self.config.npm_binary = path.into();
        self
    }

    /// 외부 명령 타임아웃(초)을 설정합니다.
    pub fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.config.command_timeout_secs = secs;
        self
    }

    /// 스캔 간격(초)을 설정합니다.
    pub fn scan_interval_secs(mut self, secs: u64) -> Self {
        self.config.scan_interval_secs = secs;
        self
    }

    /// 감사 출력 최대 크기(바이트)를 설정합니다.
    pub fn max_audit_output_bytes(mut self, bytes: usize) -> Self {
        self.config.max_audit_output_bytes = bytes;
        self
    }

    /// 이벤트 채널 용량을 설정합니다.
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ScanPipelineError::Config` 반환
    pub fn build(self) -> Result<ScanPipelineConfig, ScanPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ScanPipelineConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let core = depwatch_core::config::ScannerConfig {
            enabled: true,
            workspace_root: "/opt/depwatch/ws".to_owned(),
            npm_binary: "/usr/bin/npm".to_owned(),
            command_timeout_secs: 60,
            scan_interval_secs: 600,
        };
        let config = ScanPipelineConfig::from_core(&core);
        assert!(config.enabled);
        assert_eq!(config.workspace_root, "/opt/depwatch/ws");
        assert_eq!(config.npm_binary, "/usr/bin/npm");
        assert_eq!(config.command_timeout_secs, 60);
        assert_eq!(config.scan_interval_secs, 600);
        // extended fields use defaults
        assert_eq!(config.max_audit_output_bytes, 10 * 1024 * 1024);
        assert_eq!(config.event_channel_capacity, 256);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = ScanPipelineConfig {
            command_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_too_small_scan_interval() {
        let config = ScanPipelineConfig {
            scan_interval_secs: 30, // too small (< 60)
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_zero_scan_interval() {
        let config = ScanPipelineConfig {
            scan_interval_secs: 0, // manual mode
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_too_large_scan_interval() {
        let config = ScanPipelineConfig {
            scan_interval_secs: 700_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_npm_binary_when_enabled() {
        let config = ScanPipelineConfig {
            enabled: true,
            npm_binary: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_empty_npm_binary_when_disabled() {
        let config = ScanPipelineConfig {
            enabled: false,
            npm_binary: String::new(),
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_workspace_root_traversal() {
        let config = ScanPipelineConfig {
            workspace_root: "/var/lib/../../etc".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_audit_output_limit() {
        let config = ScanPipelineConfig {
            max_audit_output_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = ScanPipelineConfigBuilder::new()
            .npm_binary("/usr/bin/npm")
            .command_timeout_secs(60)
            .scan_interval_secs(600)
            .build()
            .unwrap();
        assert_eq!(config.npm_binary, "/usr/bin/npm");
        assert_eq!(config.command_timeout_secs, 60);
        assert_eq!(config.scan_interval_secs, 600);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = ScanPipelineConfigBuilder::new()
            .command_timeout_secs(0) // invalid
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_all_setters() {
        let config = ScanPipelineConfigBuilder::new()
            .enabled(true)
            .workspace_root("/tmp/ws")
            .npm_binary("npm")
            .command_timeout_secs(120)
            .scan_interval_secs(0)
            .max_audit_output_bytes(1024)
            .event_channel_capacity(8)
            .build()
            .unwrap();

        assert!(config.enabled);
        assert_eq!(config.workspace_root, "/tmp/ws");
        assert_eq!(config.command_timeout_secs, 120);
        assert_eq!(config.scan_interval_secs, 0);
        assert_eq!(config.max_audit_output_bytes, 1024);
        assert_eq!(config.event_channel_capacity, 8);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = ScanPipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ScanPipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.npm_binary, deserialized.npm_binary);
        assert_eq!(config.scan_interval_secs, deserialized.scan_interval_secs);
    }
}
