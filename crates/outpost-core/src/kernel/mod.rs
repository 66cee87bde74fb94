//! # Outpost Kernel
//!
//! The `kernel` module drives a client node through its lifecycle: connect to
//! the server, load and start plugins, bring the front-ends up, serve, and
//! tear everything down again on request.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Orchestration**: [`Orchestrator`](orchestrator::Orchestrator) sequences
//!   startup and shutdown and owns every long-lived collaborator.
//! - **Lifecycle Phases**: [`LifecyclePhase`](phase::LifecyclePhase), ordered
//!   so the orchestrator can only move forward.
//! - **Connectivity Monitoring**: [`ConnectivityMonitor`](monitor::ConnectivityMonitor)
//!   restarts the process once when the server goes offline while serving.
//! - **Process Restart**: the [`ProcessRestarter`](restart::ProcessRestarter)
//!   seam and its re-exec implementation.
//! - **Core Constants** and **Error Handling** ([`Error`](error::Error) plus a
//!   `Result` alias).
pub mod constants;
pub mod error;
pub mod monitor;
pub mod orchestrator;
pub mod phase;
pub mod restart;

pub use error::{Error, Result};
pub use monitor::ConnectivityMonitor;
pub use orchestrator::{Orchestrator, ShutdownReport, StartupOutcome};
pub use phase::LifecyclePhase;
pub use restart::{ProcessRestarter, ReexecRestarter};
