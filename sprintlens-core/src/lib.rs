//! # sprintlens-core
//!
//! Core library for sprintlens - sprint metrics derived from issue-tracker
//! status histories.
//!
//! This library provides:
//! - Domain types for issues, status transitions, and derived metrics
//! - A boundary decoder turning exported tracker JSON into typed records,
//!   with structured per-field warnings
//! - The metrics engine: phase extraction, batch aggregation, and a
//!   deterministic narrative summary
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows strictly leaf-to-root:
//! - **Snapshot (raw):** exported issue JSON on disk (immutable)
//! - **Records (typed):** normalized [`IssueRecord`]s from the decoder
//! - **Derived:** per-issue [`IssueMetrics`], batch [`AggregateMetrics`],
//!   narrative text (regenerable, recomputed per refresh)
//!
//! ## Example
//!
//! ```rust,no_run
//! use sprintlens_core::{ingest, metrics, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let batch = ingest::load_snapshot(
//!     std::path::Path::new("export.json"),
//!     &config.fields,
//! )
//! .expect("failed to load snapshot");
//!
//! let computed = metrics::compute_batch(&batch.issues, &config.statuses.vocabulary());
//! println!("{}", metrics::render_summary(&computed.aggregate));
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::SnapshotBatch;
pub use types::*;

// Public modules
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod types;
