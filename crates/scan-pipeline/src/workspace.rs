//! 스캔 워크스페이스 — 스캔별 격리 디렉토리 관리
//!
//! 각 스캔은 워크스페이스 루트 아래에 UUID로 명명된 고유 디렉토리를
//! 할당받고, 그 안에 매니페스트를 `package.json`으로 기록합니다.
//! 워크스페이스는 스캔 간에 절대 재사용되거나 공유되지 않습니다.
//!
//! 정리 실패는 스캔 결과에 영향을 주지 않습니다. 스캔의 성공 여부가
//! 정리 성공에 의존해서는 안 되기 때문에 실패는 로그만 남깁니다.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use depwatch_core::types::Manifest;

use crate::error::ScanPipelineError;

/// 스캔 하나에 할당된 격리 워크스페이스 핸들
#[derive(Debug)]
pub struct WorkspaceHandle {
    id: String,
    path: PathBuf,
}

impl WorkspaceHandle {
    /// 워크스페이스 고유 ID를 반환합니다.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 워크스페이스 디렉토리 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 워크스페이스 내 매니페스트 파일 경로를 반환합니다.
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join("package.json")
    }
}

/// 스캔별 워크스페이스 생성/정리 관리자
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// 워크스페이스 관리자를 생성합니다.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 워크스페이스 루트 경로를 반환합니다.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 새 워크스페이스를 할당하고 매니페스트를 기록합니다.
    ///
    /// 디렉토리 이름은 UUID v4로 충돌 없이 생성됩니다.
    pub async fn create(&self, manifest: &Manifest) -> Result<WorkspaceHandle, ScanPipelineError> {
        let id = uuid::Uuid::new_v4().to_string();
        let path = self.root.join(&id);

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| ScanPipelineError::WorkspaceSetup {
                reason: format!("create workspace dir {}: {e}", path.display()),
            })?;

        let json = manifest
            .to_json_pretty()
            .map_err(|e| ScanPipelineError::InvalidManifest {
                reason: format!("manifest serialization: {e}"),
            })?;

        let manifest_path = path.join("package.json");
        tokio::fs::write(&manifest_path, json.as_bytes())
            .await
            .map_err(|e| ScanPipelineError::WorkspaceSetup {
                reason: format!("write manifest {}: {e}", manifest_path.display()),
            })?;

        debug!(workspace = id.as_str(), "workspace created");
        Ok(WorkspaceHandle { id, path })
    }

    /// 워크스페이스를 제거합니다 (best-effort).
    ///
    /// 실패는 경고 로그만 남기고 절대 전파하지 않습니다.
    pub async fn destroy(&self, handle: WorkspaceHandle) {
        match tokio::fs::remove_dir_all(&handle.path).await {
            Ok(()) => debug!(workspace = handle.id.as_str(), "workspace removed"),
            Err(e) => warn!(
                workspace = handle.id.as_str(),
                error = %e,
                "workspace cleanup failed, leaving directory behind"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> Manifest {
        Manifest::new(serde_json::json!({
            "name": "demo-app",
            "version": "1.0.0",
            "dependencies": { "lodash": "^4.17.0" },
        }))
    }

    #[tokio::test]
    async fn create_writes_manifest_file() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(tmp.path());

        let handle = manager.create(&sample_manifest()).await.unwrap();
        assert!(handle.path().is_dir());
        assert!(handle.manifest_path().is_file());

        let content = tokio::fs::read_to_string(handle.manifest_path())
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["name"], "demo-app");
    }

    #[tokio::test]
    async fn create_allocates_unique_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(tmp.path());

        let a = manager.create(&sample_manifest()).await.unwrap();
        let b = manager.create(&sample_manifest()).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn destroy_removes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(tmp.path());

        let handle = manager.create(&sample_manifest()).await.unwrap();
        let path = handle.path().to_path_buf();
        manager.destroy(handle).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn destroy_missing_directory_does_not_panic() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(tmp.path());

        let handle = manager.create(&sample_manifest()).await.unwrap();
        tokio::fs::remove_dir_all(handle.path()).await.unwrap();
        // 이미 제거된 디렉토리여도 조용히 넘어감
        manager.destroy(handle).await;
    }

    #[tokio::test]
    async fn create_makes_root_if_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(tmp.path().join("nested/workspaces"));

        let handle = manager.create(&sample_manifest()).await.unwrap();
        assert!(handle.path().is_dir());
    }
}
