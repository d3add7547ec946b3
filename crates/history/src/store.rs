//! 히스토리 저장소 — 프로젝트별 append 전용 JSON 파일
//!
//! [`HistoryStore`]는 프로젝트당 하나의 JSON 배열 파일을 유지합니다.
//! 배열의 맨 앞이 가장 최근 스캔 결과입니다.
//!
//! # 동시성
//!
//! append는 프로젝트 키별 비동기 뮤텍스로 직렬화됩니다. 같은 키에 대한
//! 동시 append는 순서대로 실행되어 업데이트 유실이 발생하지 않습니다.
//! 서로 다른 키는 서로를 차단하지 않습니다.
//!
//! # 쓰기 원자성
//!
//! 파일 쓰기는 임시 파일에 전체 내용을 기록한 뒤 rename으로 교체합니다.
//! 쓰기 도중 프로세스가 중단되어도 기존 히스토리 파일은 손상되지 않습니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use depwatch_core::error::{DepwatchError, StorageError};
use depwatch_core::metrics::{HISTORY_APPENDS_TOTAL, HISTORY_CORRUPT_RESETS_TOTAL};
use depwatch_core::types::ScanResult;

use crate::key::project_key;

/// 프로젝트별 스캔 히스토리 저장소
pub struct HistoryStore {
    dir: PathBuf,
    max_entries: usize,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HistoryStore {
    /// 히스토리 저장소를 생성합니다.
    ///
    /// `max_entries`가 0이면 프로젝트당 보관 개수에 제한이 없습니다.
    pub fn new(dir: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            dir: dir.into(),
            max_entries,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 히스토리 디렉토리 경로를 반환합니다.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 스캔 결과를 프로젝트 히스토리 맨 앞에 추가합니다.
    ///
    /// 기존 히스토리를 읽고, 새 결과를 맨 앞에 붙인 뒤 전체를 다시
    /// 기록합니다. 기존 파일이 손상되어 있으면 경고 후 빈 히스토리로
    /// 재시작합니다 (과거 기록은 버려지지만 새 결과는 기록됩니다).
    pub async fn append(
        &self,
        project_name: &str,
        result: &ScanResult,
    ) -> Result<(), DepwatchError> {
        let key = project_key(project_name);
        let guard = self.lock_for(&key).await;
        let _held = guard.lock().await;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            StorageError::WriteFailed {
                key: key.clone(),
                reason: format!("create history dir: {e}"),
            }
        })?;

        let mut entries = self.read_entries(&key).await?;
        entries.insert(0, result.clone());
        if self.max_entries > 0 && entries.len() > self.max_entries {
            entries.truncate(self.max_entries);
        }

        self.write_entries(&key, &entries).await?;
        counter!(HISTORY_APPENDS_TOTAL).increment(1);
        debug!(key = key.as_str(), entries = entries.len(), "history appended");
        Ok(())
    }

    /// 프로젝트 히스토리 전체를 반환합니다 (최신 순).
    ///
    /// 파일이 없으면 빈 벡터를 반환합니다.
    pub async fn load(&self, project_name: &str) -> Result<Vec<ScanResult>, DepwatchError> {
        let key = project_key(project_name);
        let guard = self.lock_for(&key).await;
        let _held = guard.lock().await;
        self.read_entries(&key).await
    }

    /// 프로젝트의 가장 최근 스캔 결과를 반환합니다.
    pub async fn latest(&self, project_name: &str) -> Result<Option<ScanResult>, DepwatchError> {
        let mut entries = self.load(project_name).await?;
        if entries.is_empty() {
            Ok(None)
        } else {
            Ok(Some(entries.remove(0)))
        }
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read_entries(&self, key: &str) -> Result<Vec<ScanResult>, DepwatchError> {
        let path = self.file_path(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    key: key.to_owned(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        match serde_json::from_str::<Vec<ScanResult>>(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // 손상된 파일은 빈 히스토리로 취급하고 다음 쓰기에서 교체
                warn!(
                    key,
                    error = %e,
                    "history file corrupt, resetting to empty"
                );
                counter!(HISTORY_CORRUPT_RESETS_TOTAL).increment(1);
                Ok(Vec::new())
            }
        }
    }

    async fn write_entries(&self, key: &str, entries: &[ScanResult]) -> Result<(), DepwatchError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let path = self.file_path(key);
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| StorageError::WriteFailed {
                key: key.to_owned(),
                reason: format!("write temp file: {e}"),
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StorageError::WriteFailed {
                key: key.to_owned(),
                reason: format!("rename temp file: {e}"),
            })?;
        Ok(())
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("dir", &self.dir)
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}
