//! 설정 관리 — depwatch.toml 파싱 및 런타임 설정
//!
//! [`DepwatchConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DEPWATCH_SCANNER_NPM_BINARY=/usr/bin/npm` 형식)
//! 3. 설정 파일 (`depwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), depwatch_core::error::DepwatchError> {
//! use depwatch_core::config::DepwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DepwatchConfig::load("depwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DepwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, DepwatchError};

/// Depwatch 통합 설정
///
/// `depwatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캐너 설정
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// 히스토리 저장소 설정
    #[serde(default)]
    pub history: HistoryConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DepwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DepwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DepwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DepwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DepwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DepwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            DepwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DEPWATCH_{SECTION}_{FIELD}`
    /// 예: `DEPWATCH_SCANNER_NPM_BINARY=/usr/local/bin/npm`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DEPWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DEPWATCH_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "DEPWATCH_GENERAL_DATA_DIR");
        override_string(&mut self.general.pid_file, "DEPWATCH_GENERAL_PID_FILE");

        // Scanner
        override_bool(&mut self.scanner.enabled, "DEPWATCH_SCANNER_ENABLED");
        override_string(
            &mut self.scanner.workspace_root,
            "DEPWATCH_SCANNER_WORKSPACE_ROOT",
        );
        override_string(&mut self.scanner.npm_binary, "DEPWATCH_SCANNER_NPM_BINARY");
        override_u64(
            &mut self.scanner.command_timeout_secs,
            "DEPWATCH_SCANNER_COMMAND_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.scanner.scan_interval_secs,
            "DEPWATCH_SCANNER_SCAN_INTERVAL_SECS",
        );

        // History
        override_string(&mut self.history.dir, "DEPWATCH_HISTORY_DIR");
        override_usize(&mut self.history.max_entries, "DEPWATCH_HISTORY_MAX_ENTRIES");

        // Metrics
        override_bool(&mut self.metrics.enabled, "DEPWATCH_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "DEPWATCH_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "DEPWATCH_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DepwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 스캐너 활성화 시 필수 값 검증
        if self.scanner.enabled {
            if self.scanner.npm_binary.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "scanner.npm_binary".to_owned(),
                    reason: "npm_binary must not be empty when scanner is enabled".to_owned(),
                }
                .into());
            }

            if self.scanner.workspace_root.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "scanner.workspace_root".to_owned(),
                    reason: "workspace_root must not be empty when scanner is enabled".to_owned(),
                }
                .into());
            }

            if self.scanner.command_timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "scanner.command_timeout_secs".to_owned(),
                    reason: "timeout must be at least 1 second".to_owned(),
                }
                .into());
            }

            if self.scanner.scan_interval_secs > 0 && self.scanner.scan_interval_secs < 60 {
                return Err(ConfigError::InvalidValue {
                    field: "scanner.scan_interval_secs".to_owned(),
                    reason: "must be 0 (manual only) or at least 60 seconds".to_owned(),
                }
                .into());
            }
        }

        // 히스토리 디렉토리 검증
        if self.history.dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "history.dir".to_owned(),
                reason: "history dir must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리
    pub data_dir: String,
    /// PID 파일 경로
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/var/lib/depwatch".to_owned(),
            pid_file: "/var/run/depwatch.pid".to_owned(),
        }
    }
}

/// 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 스캔 워크스페이스 루트 디렉토리
    pub workspace_root: String,
    /// npm 실행 파일 경로
    pub npm_binary: String,
    /// 외부 명령 타임아웃 (초)
    pub command_timeout_secs: u64,
    /// 스케줄 스캔 주기 (초, 0이면 수동 스캔만)
    pub scan_interval_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workspace_root: "/var/lib/depwatch/workspaces".to_owned(),
            npm_binary: "npm".to_owned(),
            command_timeout_secs: 180,
            scan_interval_secs: 300,
        }
    }
}

/// 히스토리 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// 히스토리 파일 디렉토리
    pub dir: String,
    /// 프로젝트당 최대 보관 엔트리 수 (0이면 무제한)
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: "/var/lib/depwatch/history".to_owned(),
            max_entries: 0,
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}
