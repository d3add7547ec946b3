//! 스캔 서비스 — 파이프라인 생명주기와 주기 스캔 관리
//!
//! [`ScanService`]는 core의 [`Pipeline`] trait을 구현하여
//! `depwatch-daemon`에서 다른 모듈과 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! Manifest --> WorkspaceManager --> DependencyResolver --> AuditRunner
//!                                                              |
//!                                                        RawAuditReport
//!                                                              |
//!                                         extract + score --> ScanResult
//!                                                              |
//!                                          +-------------------+---------+
//!                                          |                             |
//!                                     HistoryStore              ScanEvent --> mpsc
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::gauge;
use tokio::sync::mpsc;
use tracing::{info, warn};

use depwatch_core::error::DepwatchError;
use depwatch_core::metrics::SCAN_MONITORED_PROJECTS;
use depwatch_core::pipeline::{HealthStatus, Pipeline};
use depwatch_core::types::{Manifest, ScanResult, ScanTrigger};
use depwatch_history::HistoryStore;

use crate::config::ScanPipelineConfig;
use crate::error::ScanPipelineError;
use crate::event::ScanEvent;
use crate::orchestrator::{ScanOrchestrator, resolve_project_name};
use crate::registry::MonitorRegistry;

/// 서비스 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum ServiceState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 스캔 파이프라인 서비스
///
/// 수동 스캔 요청을 받아 실행하고, 등록된 프로젝트를 고정 간격으로
/// 재스캔하는 백그라운드 태스크를 관리합니다. 완료된 스캔은
/// [`ScanEvent`]로 전송됩니다.
///
/// # 재시작 제한
///
/// `stop()` 후 재시작이 필요하면 `ScanServiceBuilder`로 새 인스턴스를
/// 생성해야 합니다.
pub struct ScanService {
    /// 파이프라인 설정
    config: ScanPipelineConfig,
    /// 현재 상태
    state: ServiceState,
    /// 스캔 실행 오케스트레이터
    orchestrator: Arc<ScanOrchestrator>,
    /// 주기 스캔 대상 레지스트리
    registry: Arc<MonitorRegistry>,
    /// 스캔 이벤트 전송 채널
    event_tx: mpsc::Sender<ScanEvent>,
    /// 백그라운드 태스크 핸들
    tasks: Vec<tokio::task::JoinHandle<()>>,
    /// 완료된 스캔 수
    scans_completed: Arc<AtomicU64>,
}

impl ScanService {
    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            ServiceState::Initialized => "initialized",
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
        }
    }

    /// 완료된 스캔 수를 반환합니다.
    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    /// 주기 스캔 레지스트리 핸들을 반환합니다.
    pub fn registry(&self) -> Arc<MonitorRegistry> {
        Arc::clone(&self.registry)
    }

    /// 수동 스캔을 실행합니다.
    ///
    /// 프로젝트는 주기 스캔 대상으로 함께 등록됩니다 (매니페스트는
    /// last-write-wins로 갱신). 스캔이 완료되면 결과를 반환하고
    /// [`ScanEvent`]를 전송합니다.
    pub async fn scan(
        &self,
        manifest: Manifest,
        project_name: Option<&str>,
    ) -> Result<ScanResult, ScanPipelineError> {
        let project = resolve_project_name(&manifest, project_name);
        self.registry.register(project.clone(), manifest.clone()).await;
        gauge!(SCAN_MONITORED_PROJECTS).set(self.registry.len().await as f64);

        let result = self
            .orchestrator
            .run(&manifest, Some(&project), ScanTrigger::Manual)
            .await?;

        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.event_tx.try_send(ScanEvent::new(result.clone())) {
            warn!(
                project = project.as_str(),
                error = %e,
                "failed to send scan event (channel full or closed)"
            );
        }

        Ok(result)
    }

    /// 프로젝트를 주기 스캔 대상에서 제거합니다.
    pub async fn unmonitor(&self, project_name: &str) -> bool {
        let removed = self.registry.unregister(project_name).await;
        gauge!(SCAN_MONITORED_PROJECTS).set(self.registry.len().await as f64);
        removed
    }
}

impl Pipeline for ScanService {
    async fn start(&mut self) -> Result<(), DepwatchError> {
        if self.state == ServiceState::Running {
            return Err(depwatch_core::error::PipelineError::AlreadyRunning.into());
        }

        info!("starting scan service");

        // 주기적 스캔 태스크 스폰 (scan_interval_secs > 0인 경우)
        if self.config.scan_interval_secs > 0 {
            let interval_secs = self.config.scan_interval_secs;
            let orchestrator = Arc::clone(&self.orchestrator);
            let registry = Arc::clone(&self.registry);
            let event_tx = self.event_tx.clone();
            let scans_completed = Arc::clone(&self.scans_completed);

            let task = tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval(Duration::from_secs(interval_secs));
                // 시작 직후의 즉시 틱은 건너뜀 (등록 전이므로 스캔할 것이 없음)
                interval.tick().await;

                info!(interval_secs, "periodic scan task started");

                loop {
                    interval.tick().await;

                    let entries = registry.entries().await;
                    if entries.is_empty() {
                        continue;
                    }

                    info!(projects = entries.len(), "starting scheduled scan pass");

                    // 한 프로젝트의 실패가 나머지 순회를 막지 않음
                    for (project, manifest) in &entries {
                        match orchestrator
                            .run(manifest, Some(project), ScanTrigger::Scheduled)
                            .await
                        {
                            Ok(result) => {
                                scans_completed.fetch_add(1, Ordering::Relaxed);
                                if let Err(e) = event_tx.try_send(ScanEvent::new(result)) {
                                    warn!(
                                        project = project.as_str(),
                                        error = %e,
                                        "failed to send scan event"
                                    );
                                }
                            }
                            Err(e) => {
                                warn!(
                                    project = project.as_str(),
                                    error = %e,
                                    "scheduled scan failed, continuing with next project"
                                );
                            }
                        }
                    }
                }
            });

            self.tasks.push(task);
            info!(interval_secs, "periodic scan task spawned");
        } else {
            info!("periodic scanning disabled, manual trigger only");
        }

        self.state = ServiceState::Running;
        info!("scan service started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DepwatchError> {
        if self.state != ServiceState::Running {
            return Err(depwatch_core::error::PipelineError::NotRunning.into());
        }

        info!("stopping scan service");

        for task in self.tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }

        self.state = ServiceState::Stopped;
        info!("scan service stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            ServiceState::Running => {
                if self.config.scan_interval_secs > 0 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded(
                        "periodic scanning disabled, manual trigger only".to_owned(),
                    )
                }
            }
            ServiceState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            ServiceState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 스캔 서비스 빌더
///
/// 서비스를 구성하고 필요한 채널을 생성합니다.
pub struct ScanServiceBuilder {
    config: ScanPipelineConfig,
    history: Option<Arc<HistoryStore>>,
    event_tx: Option<mpsc::Sender<ScanEvent>>,
}

impl ScanServiceBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ScanPipelineConfig::default(),
            history: None,
            event_tx: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: ScanPipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 히스토리 저장소를 지정합니다.
    pub fn history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// 외부 이벤트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn event_sender(mut self, tx: mpsc::Sender<ScanEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 서비스를 빌드합니다.
    ///
    /// # Returns
    ///
    /// - `ScanService`: 서비스 인스턴스
    /// - `Option<mpsc::Receiver<ScanEvent>>`: 이벤트 수신 채널
    ///   (외부 event_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(ScanService, Option<mpsc::Receiver<ScanEvent>>), ScanPipelineError> {
        self.config.validate()?;

        let history = self.history.ok_or_else(|| ScanPipelineError::Config {
            field: "history".to_owned(),
            reason: "history store is required".to_owned(),
        })?;

        let (event_tx, event_rx) = if let Some(tx) = self.event_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.event_channel_capacity);
            (tx, Some(rx))
        };

        let orchestrator = Arc::new(ScanOrchestrator::new(&self.config, history));

        let service = ScanService {
            config: self.config,
            state: ServiceState::Initialized,
            orchestrator,
            registry: Arc::new(MonitorRegistry::new()),
            event_tx,
            tasks: Vec::new(),
            scans_completed: Arc::new(AtomicU64::new(0)),
        };

        Ok((service, event_rx))
    }
}

impl Default for ScanServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
