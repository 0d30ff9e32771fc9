//! Attest node: the composition root of the verification engine.
//!
//! The node:
//! - Derives component accounts from configuration
//! - Builds the stake vault, actor registry, commit-reveal engine and pools
//! - Sets up the authorization chain between them
//! - Feeds audit events into Prometheus metrics
//! - Expires challenges whose wall time ran out before their vote started

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;
pub mod simulation;

pub use config::{AccountsConfig, NodeConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::{MetricsEventLog, NodeMetrics};
pub use node::{AttestNode, NodeAccounts};
pub use shutdown::ShutdownController;
pub use simulation::{
    Simulation, TrainingReport, TrainingScenario, VerificationReport, VerificationScenario,
};
