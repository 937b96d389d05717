#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScanEngineError`, `ScanError`)
//! - [`config`]: Engine configuration (`ScanEngineConfig`, builder)
//! - [`runtime`]: Docker API abstraction (`ContainerRuntime` trait, `BollardRuntime`)
//! - [`tool`]: External process execution (`ToolRunner` trait, `ProcessToolRunner`)
//! - [`archive`]: Image archive extraction (`Archiver` trait, `TarArchiver`)
//! - [`context`]: Per-scan state (`ScanContext`, `StagedArtifact`)
//! - [`resolver`]: Local presence check and pull (`ImageResolver`)
//! - [`stager`]: Save and extract, at most once per scan (`ArtifactStager`)
//! - [`outcome`]: Normalized adapter results (`ScanOutcome` and payloads)
//! - [`adapters`]: Trivy, YARA, ClamAV and Falco adapters
//! - [`sandbox`]: Ephemeral sandbox container (`SandboxController`)
//! - [`aggregator`]: Risk scoring (`aggregate`, `RiskAssessment`)
//! - [`cleanup`]: Staged artifact removal
//! - [`report`]: Engine output (`ScanReport`)
//! - [`engine`]: Main orchestrator (`ScanEngine`, `ScanEngineBuilder`)

pub mod adapters;
pub mod aggregator;
pub mod archive;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod report;
pub mod resolver;
pub mod runtime;
pub mod sandbox;
pub mod stager;
pub mod tool;

// --- Public API Re-exports ---

// Engine (main orchestrator)
pub use engine::{ScanEngine, ScanEngineBuilder};

// Configuration
pub use config::{ScanEngineConfig, ScanEngineConfigBuilder};

// Error
pub use error::{ScanEngineError, ScanError};

// Results
pub use aggregator::{RiskAssessment, aggregate};
pub use cleanup::CleanupSummary;
pub use outcome::{
    AdapterKind, AntivirusReport, RuntimeAlerts, ScanOutcome, SeverityCounts, SignatureMatches,
    VulnerabilityReport,
};
pub use report::ScanReport;

// Collaborators
pub use archive::{Archiver, TarArchiver};
pub use context::{ScanContext, StagedArtifact};
pub use runtime::{BollardRuntime, ContainerRuntime, SandboxHandle};
pub use tool::{ProcessToolRunner, ToolOutput, ToolRunner};
