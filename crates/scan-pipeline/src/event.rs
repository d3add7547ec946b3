//! 스캔 이벤트 — 완료된 스캔을 데몬으로 전달

use std::fmt;

use depwatch_core::event::{EVENT_TYPE_SCAN, Event, EventMetadata, MODULE_SCAN_PIPELINE};
use depwatch_core::types::ScanResult;

/// 스캔 완료 이벤트
///
/// 한 번의 스캔이 끝날 때마다 생성되어 mpsc 채널로 전달됩니다.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 스캔 결과
    pub result: ScanResult,
}

impl ScanEvent {
    /// 새로운 trace를 시작하는 스캔 이벤트를 생성합니다.
    pub fn new(result: ScanResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_SCAN_PIPELINE),
            result,
        }
    }

    /// 기존 trace에 연결된 스캔 이벤트를 생성합니다.
    pub fn with_trace(result: ScanResult, trace_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_SCAN_PIPELINE, trace_id),
            result,
        }
    }
}

impl Event for ScanEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_SCAN
    }
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScanEvent[{}] project={} trigger={} score={} vulns={}",
            &self.id[..8.min(self.id.len())],
            self.result.project,
            self.result.trigger,
            self.result.summary.risk_score,
            self.result.summary.total_vulnerabilities,
        )
    }
}
