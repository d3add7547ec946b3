//! Integration tests for metrics server functionality.

use depwatch_core::config::MetricsConfig;
use depwatch_daemon::metrics_server;
use serial_test::serial;

#[test]
#[serial]
fn test_install_metrics_recorder_succeeds_with_valid_config() {
    // Given: A valid metrics configuration
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_string(),
        port: 19464, // Use non-standard port to avoid conflicts
    };

    // When: Installing the metrics recorder
    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Should succeed
    assert!(
        result.is_ok(),
        "install_metrics_recorder should succeed with valid config: {:?}",
        result.err()
    );
}

#[test]
#[serial]
fn test_install_metrics_recorder_fails_with_invalid_address() {
    // Given: An invalid metrics configuration (invalid IP)
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "999.999.999.999".to_string(),
        port: 9464,
    };

    // When: Installing the metrics recorder
    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Should fail
    assert!(
        result.is_err(),
        "install_metrics_recorder should fail with invalid address"
    );
}

#[tokio::test]
#[serial]
async fn test_metrics_disabled_does_not_start_server() {
    use depwatch_core::config::DepwatchConfig;

    // Given: A config with metrics disabled (avoids global recorder conflicts)
    let mut config = DepwatchConfig::default();
    config.metrics.enabled = false;
    config.scanner.enabled = false;

    // When: Building orchestrator
    let result = depwatch_daemon::orchestrator::Orchestrator::build_from_config(config).await;

    // Then: Should succeed without starting a metrics server
    assert!(
        result.is_ok(),
        "orchestrator should build successfully with metrics disabled: {:?}",
        result.err()
    );
}
