//! 모니터 레지스트리 — 주기 스캔 대상 프로젝트 추적
//!
//! 수동 스캔 요청마다 프로젝트와 마지막 매니페스트가 upsert되고,
//! 스케줄러는 틱마다 스냅샷을 순회합니다. 전역 상태가 아니라 명시적으로
//! 주입되는 컴포넌트이며, 뮤텍스로 보호되어 순회 중 등록이 순회를
//! 손상시키지 않습니다. 프로세스 재시작 시 내용은 사라집니다.

use std::collections::HashMap;

use tokio::sync::Mutex;

use depwatch_core::types::Manifest;

/// 주기 스캔 대상 프로젝트 레지스트리
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    entries: Mutex<HashMap<String, Manifest>>,
}

impl MonitorRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로젝트를 등록하거나 매니페스트를 갱신합니다 (last-write-wins).
    pub async fn register(&self, project_name: impl Into<String>, manifest: Manifest) {
        let mut entries = self.entries.lock().await;
        entries.insert(project_name.into(), manifest);
    }

    /// 프로젝트 등록을 해제합니다. 등록돼 있었으면 true를 반환합니다.
    pub async fn unregister(&self, project_name: &str) -> bool {
        let mut entries = self.entries.lock().await;
        entries.remove(project_name).is_some()
    }

    /// 현재 등록된 (프로젝트, 매니페스트) 쌍의 스냅샷을 반환합니다.
    ///
    /// 순회 중 레지스트리가 변경돼도 스냅샷은 영향받지 않습니다.
    /// 순서는 프로젝트 이름 기준으로 정렬되어 결정적입니다.
    pub async fn entries(&self) -> Vec<(String, Manifest)> {
        let entries = self.entries.lock().await;
        let mut snapshot: Vec<(String, Manifest)> = entries
            .iter()
            .map(|(name, manifest)| (name.clone(), manifest.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// 등록된 프로젝트 수를 반환합니다.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// 레지스트리가 비어 있는지 반환합니다.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str) -> Manifest {
        Manifest::new(serde_json::json!({ "name": name }))
    }

    #[tokio::test]
    async fn register_and_snapshot() {
        let registry = MonitorRegistry::new();
        registry.register("app-a", manifest("app-a")).await;
        registry.register("app-b", manifest("app-b")).await;

        let entries = registry.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "app-a");
        assert_eq!(entries[1].0, "app-b");
    }

    #[tokio::test]
    async fn register_is_upsert() {
        let registry = MonitorRegistry::new();
        registry
            .register("app", Manifest::new(serde_json::json!({ "version": "1" })))
            .await;
        registry
            .register("app", Manifest::new(serde_json::json!({ "version": "2" })))
            .await;

        assert_eq!(registry.len().await, 1);
        let entries = registry.entries().await;
        assert_eq!(entries[0].1.as_value()["version"], "2");
    }

    #[tokio::test]
    async fn unregister_removes_entry() {
        let registry = MonitorRegistry::new();
        registry.register("app", manifest("app")).await;
        assert!(registry.unregister("app").await);
        assert!(!registry.unregister("app").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_later_registration() {
        let registry = MonitorRegistry::new();
        registry.register("app-a", manifest("app-a")).await;

        let snapshot = registry.entries().await;
        registry.register("app-b", manifest("app-b")).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len().await, 2);
    }
}
