//! Module orchestration -- assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `depwatch-daemon`.
//! It loads configuration, builds the history store and scan pipeline,
//! manages startup/shutdown ordering, and runs the main event loop.
//!
//! # Lifecycle
//!
//! 1. Validate configuration and install the metrics recorder
//! 2. Build the history store and the scan service
//! 3. Write the PID file and start the service
//! 4. Consume scan events until SIGTERM/SIGINT
//! 5. Stop the service and remove the PID file

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use depwatch_core::config::DepwatchConfig;
use depwatch_core::pipeline::{HealthStatus, Pipeline};
use depwatch_history::HistoryStore;
use depwatch_scan_pipeline::{ScanEvent, ScanPipelineConfig, ScanService, ScanServiceBuilder};

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};
use crate::metrics_server;

/// The main daemon orchestrator.
///
/// Manages the complete lifecycle of the scan pipeline:
/// configuration loading, history store wiring, startup,
/// health reporting, and graceful shutdown.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: DepwatchConfig,
    /// Scan pipeline service (None when disabled in config).
    service: Option<ScanService>,
    /// Scan event receiver (consumed by the event logger task).
    scan_rx: Option<mpsc::Receiver<ScanEvent>>,
    /// Shutdown broadcast sender (signals all background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Path to the `depwatch.toml` configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - The scan service fails to initialize
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = DepwatchConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when config has already been loaded.
    pub async fn build_from_config(config: DepwatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        // Install metrics recorder before module initialization
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
            record_daemon_metrics();
        }

        let (shutdown_tx, _) = broadcast::channel(16);

        let mut service = None;
        let mut scan_rx = None;

        if config.scanner.enabled {
            tracing::info!("initializing scan pipeline");

            let history = Arc::new(HistoryStore::new(
                config.history.dir.clone(),
                config.history.max_entries,
            ));
            let pipeline_config = ScanPipelineConfig::from_core(&config.scanner);

            let (svc, rx) = ScanServiceBuilder::new()
                .config(pipeline_config)
                .history(history)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build scan service: {}", e))?;

            service = Some(svc);
            scan_rx = rx;
        } else {
            tracing::warn!("scan pipeline disabled, daemon will idle");
        }

        tracing::info!("orchestrator initialized");

        Ok(Self {
            config,
            service,
            scan_rx,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Start the scan pipeline and enter the main event loop.
    ///
    /// This method blocks until a shutdown signal is received.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        // Write PID file if configured
        if !self.config.general.pid_file.is_empty() {
            let path = Path::new(&self.config.general.pid_file);
            write_pid_file(path)?;
        }

        // Start the scan service
        if let Some(service) = self.service.as_mut() {
            tracing::info!("starting scan pipeline");
            if let Err(e) = service.start().await {
                tracing::error!(error = %e, "scan pipeline startup failed");
                if !self.config.general.pid_file.is_empty() {
                    remove_pid_file(Path::new(&self.config.general.pid_file));
                }
                return Err(e.into());
            }
        }

        // Spawn scan event logger task
        let mut event_logger_task = if let Some(scan_rx) = self.scan_rx.take() {
            let shutdown_rx = self.shutdown_tx.subscribe();
            Some(spawn_scan_event_logger(scan_rx, shutdown_rx))
        } else {
            None
        };

        // Spawn uptime updater task
        let mut uptime_updater_task = if self.config.metrics.enabled {
            let shutdown_rx = self.shutdown_tx.subscribe();
            Some(spawn_uptime_updater(self.start_time, shutdown_rx))
        } else {
            None
        };

        // Main event loop
        tracing::info!("entering main event loop");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        // Initiate shutdown
        tracing::info!("broadcasting shutdown signal to all tasks");
        let _ = self.shutdown_tx.send(());

        if let Some(task) = event_logger_task.take() {
            let _ = task.await;
        }
        if let Some(task) = uptime_updater_task.take() {
            let _ = task.await;
        }

        // Stop the scan service
        if let Some(service) = self.service.as_mut() {
            if let Err(e) = service.stop().await {
                tracing::error!(error = %e, "failed to stop scan pipeline");
            }
        }

        // Remove PID file
        if !self.config.general.pid_file.is_empty() {
            remove_pid_file(Path::new(&self.config.general.pid_file));
        }

        Ok(())
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let mut modules = Vec::new();

        if let Some(service) = self.service.as_ref() {
            modules.push(ModuleHealth {
                name: "scan-pipeline".to_owned(),
                enabled: true,
                status: service.health_check().await,
            });
        }

        let overall_status = if modules.is_empty() {
            HealthStatus::Degraded("no modules enabled".to_owned())
        } else {
            aggregate_status(&modules)
        };
        let uptime_secs = self.start_time.elapsed().as_secs();

        if self.config.metrics.enabled {
            use depwatch_core::metrics as m;
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth {
            status: overall_status,
            uptime_secs,
            modules,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &DepwatchConfig {
        &self.config
    }

    /// Get a reference to the scan service, if enabled.
    pub fn service(&self) -> Option<&ScanService> {
        self.service.as_ref()
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the current process PID to a file.
///
/// Used to prevent duplicate daemon instances.
///
/// # Security
///
/// - Uses `create_new(true)` to atomically create file (prevents TOCTOU races)
/// - Verifies the created file is a regular file (prevents symlink attacks)
/// - Creates parent directory with restrictive permissions (0o700)
///
/// # Errors
///
/// Returns an error if the PID file cannot be written.
fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = fs::DirBuilder::new();
            builder.mode(0o700).recursive(true);
            builder.create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let pid = std::process::id();

    // Atomically create file only if it doesn't exist (eliminates TOCTOU race)
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_string());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Verify the created file is a regular file (not a symlink or other special file)
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file (possible symlink attack)",
            path.display()
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        file.set_permissions(permissions)?;
    }

    writeln!(file, "{}", pid)?;

    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on daemon shutdown.
///
/// Logs a warning but does not fail if the file cannot be removed.
fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        );
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}

/// Spawn a background task that logs completed scans.
///
/// ScanEvents carry the normalized result of each scan. This task
/// logs them for audit purposes.
fn spawn_scan_event_logger(
    mut scan_rx: mpsc::Receiver<ScanEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event_result = scan_rx.recv() => {
                    match event_result {
                        Some(event) => {
                            tracing::info!(
                                scan_id = %event.result.scan_id,
                                project = %event.result.project,
                                trigger = %event.result.trigger,
                                risk_score = event.result.summary.risk_score,
                                vulnerabilities = event.result.summary.total_vulnerabilities,
                                timestamp = ?event.metadata.timestamp,
                                "scan completed"
                            );
                        }
                        None => {
                            tracing::debug!("scan event channel closed, exiting logger");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("scan event logger shutting down");
                    break;
                }
            }
        }
    })
}

/// Record daemon-level metrics (build info).
///
/// This should be called once during orchestrator initialization.
fn record_daemon_metrics() {
    use depwatch_core::metrics as m;

    // Build info (always 1, with version label)
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        "daemon metrics recorded"
    );
}

/// Spawn a background task that periodically updates the uptime metric.
///
/// Updates every 10 seconds to keep the metric fresh for Prometheus scrapes.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    use depwatch_core::metrics as m;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(10));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let uptime_secs = start_time.elapsed().as_secs();
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_pid_file_creates_parent_directory() {
        // Given: A path with non-existent parent directory
        let temp_dir = std::env::temp_dir();
        let test_dir = temp_dir.join(format!("depwatch_test_{}", std::process::id()));
        let pid_file = test_dir.join("subdir").join("test.pid");

        // When: Writing PID file
        let result = write_pid_file(&pid_file);

        // Then: Should succeed and create parent directory
        assert!(
            result.is_ok(),
            "write_pid_file should create parent directory"
        );
        assert!(pid_file.exists(), "PID file should exist");

        // Verify content
        let content = fs::read_to_string(&pid_file).expect("should read PID file");
        let pid = std::process::id();
        assert_eq!(
            content.trim(),
            pid.to_string(),
            "PID file should contain current process ID"
        );

        // Cleanup
        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn test_write_pid_file_fails_if_already_exists() {
        // Given: An existing PID file
        let temp_dir = std::env::temp_dir();
        let pid_file = temp_dir.join(format!("depwatch_test_dup_{}.pid", std::process::id()));
        fs::write(&pid_file, "12345").expect("should write initial PID file");

        // When: Attempting to write PID file again
        let result = write_pid_file(&pid_file);

        // Then: Should fail with appropriate error
        assert!(
            result.is_err(),
            "write_pid_file should fail when file already exists"
        );
        let err_msg = result.unwrap_err().to_string();
        assert!(
            err_msg.contains("already exists"),
            "error should mention file already exists, got: {}",
            err_msg
        );
        assert!(
            err_msg.contains("12345"),
            "error should show existing PID, got: {}",
            err_msg
        );

        // Cleanup
        let _ = fs::remove_file(&pid_file);
    }

    #[test]
    fn test_remove_pid_file_succeeds() {
        // Given: An existing PID file
        let temp_dir = std::env::temp_dir();
        let pid_file = temp_dir.join(format!("depwatch_test_remove_{}.pid", std::process::id()));
        fs::write(&pid_file, "99999").expect("should write PID file");
        assert!(pid_file.exists(), "PID file should exist before removal");

        // When: Removing PID file
        remove_pid_file(&pid_file);

        // Then: File should be removed
        assert!(!pid_file.exists(), "PID file should be removed");
    }

    #[test]
    fn test_remove_pid_file_handles_nonexistent_gracefully() {
        // Given: A non-existent PID file
        let temp_dir = std::env::temp_dir();
        let pid_file = temp_dir.join(format!("depwatch_test_nonexist_{}.pid", std::process::id()));
        assert!(!pid_file.exists(), "PID file should not exist before test");

        // When: Attempting to remove non-existent file
        // Then: Should not panic (logs warning internally)
        remove_pid_file(&pid_file);
    }

    #[tokio::test]
    async fn test_scan_event_logger_shutdown_signal() {
        // Given: A running scan event logger
        let (_scan_tx, scan_rx) = mpsc::channel::<ScanEvent>(16);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = spawn_scan_event_logger(scan_rx, shutdown_rx);

        // When: Sending shutdown signal
        let _ = shutdown_tx.send(());

        // Then: Task should complete quickly
        let result = tokio::time::timeout(tokio::time::Duration::from_millis(100), task).await;
        assert!(
            result.is_ok(),
            "scan event logger should shut down within timeout"
        );
    }

    #[tokio::test]
    async fn test_scan_event_logger_exits_when_channel_closes() {
        // Given: A scan event logger whose sender is dropped
        let (scan_tx, scan_rx) = mpsc::channel::<ScanEvent>(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        let task = spawn_scan_event_logger(scan_rx, shutdown_rx);

        // When: Dropping the sender
        drop(scan_tx);

        // Then: Task should complete quickly
        let result = tokio::time::timeout(tokio::time::Duration::from_millis(100), task).await;
        assert!(
            result.is_ok(),
            "scan event logger should exit when channel closes"
        );
    }
}
