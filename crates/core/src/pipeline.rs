//! 파이프라인 trait — 모듈 생명주기 정의
//!
//! 데몬이 관리하는 모든 모듈은 [`Pipeline`] trait을 구현하여
//! 공통 생명주기(start/stop/health_check)를 제공합니다.

use std::fmt;

use serde::Serialize;

use crate::error::DepwatchError;

/// 모듈 헬스 상태
///
/// 데몬의 헬스 리포트에 그대로 직렬화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 동작 중이나 일부 기능 저하 (사유 포함)
    Degraded(String),
    /// 동작 불가 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태 여부
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 기능 저하 상태 여부
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// 동작 불가 상태 여부
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 모듈 생명주기 trait
///
/// 데몬은 각 모듈을 이 trait을 통해 시작/중지하고 주기적으로
/// 헬스체크를 수행합니다.
pub trait Pipeline: Send {
    /// 모듈을 시작합니다. 이미 실행 중이면 에러를 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), DepwatchError>> + Send;

    /// 모듈을 중지합니다. 실행 중이 아니면 에러를 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), DepwatchError>> + Send;

    /// 현재 헬스 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_predicates() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(!HealthStatus::Healthy.is_degraded());
        assert!(HealthStatus::Degraded("slow".to_owned()).is_degraded());
        assert!(HealthStatus::Unhealthy("stopped".to_owned()).is_unhealthy());
    }

    #[test]
    fn health_status_serializes_for_health_report() {
        let json = serde_json::to_value(HealthStatus::Healthy).unwrap();
        assert_eq!(json, serde_json::json!("Healthy"));

        let json = serde_json::to_value(HealthStatus::Degraded("slow".to_owned())).unwrap();
        assert_eq!(json, serde_json::json!({ "Degraded": "slow" }));
    }

    #[test]
    fn health_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(
            HealthStatus::Degraded("last scan failed".to_owned()).to_string(),
            "degraded: last scan failed"
        );
        assert_eq!(
            HealthStatus::Unhealthy("not started".to_owned()).to_string(),
            "unhealthy: not started"
        );
    }
}
