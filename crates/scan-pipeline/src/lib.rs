#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScanPipelineError`)
//! - [`config`]: Pipeline configuration (`ScanPipelineConfig`, builder)
//! - [`workspace`]: Per-scan isolated workspaces (`WorkspaceManager`, `WorkspaceHandle`)
//! - [`resolver`]: External lockfile resolution (`DependencyResolver`, `ResolutionOutcome`)
//! - [`audit`]: External audit invocation (`AuditRunner`, `AuditInvocation`, `RawAuditReport`)
//! - [`extract`]: Raw output normalization (vulnerability/dependency/signature extraction)
//! - [`score`]: Risk scoring (`risk_score`, `summarize`)
//! - [`registry`]: Monitored project registry (`MonitorRegistry`)
//! - [`orchestrator`]: Single scan transaction (`ScanOrchestrator`)
//! - [`event`]: Scan completion events (`ScanEvent`)
//! - [`service`]: Lifecycle + scheduler (`ScanService`, `ScanServiceBuilder`, `Pipeline` impl)
//!
//! # Architecture
//!
//! ```text
//! Manifest --> WorkspaceManager --> DependencyResolver --> AuditRunner
//!                                                              |
//!                                                       RawAuditReport
//!                                                              |
//!                                          extract --> score --> ScanResult
//!                                                              |
//!                                        HistoryStore <--------+--------> mpsc ScanEvent
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod event;
pub mod extract;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod score;
pub mod service;
pub mod workspace;

// --- Public API Re-exports ---

// Service (lifecycle + scheduler)
pub use service::{ScanService, ScanServiceBuilder};

// Orchestrator
pub use orchestrator::ScanOrchestrator;

// Configuration
pub use config::{ScanPipelineConfig, ScanPipelineConfigBuilder};

// Error
pub use error::ScanPipelineError;

// Events
pub use event::ScanEvent;

// Registry
pub use registry::MonitorRegistry;

// Subprocess outcomes
pub use audit::{AuditInvocation, AuditRunner, RawAuditReport};
pub use resolver::{DependencyResolver, ResolutionOutcome};

// Workspace
pub use workspace::{WorkspaceHandle, WorkspaceManager};
