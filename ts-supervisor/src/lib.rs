//! Reconciliation orchestrator, lifecycle controller, configuration sources
//! and the authorization filter that sit on top of `ts-worker`.
//!
//! Grounded on `jackbot-rs`'s own layering: `ts-supervisor` plays the role
//! the `jackbot` crate plays in the teacher workspace — the top-level crate
//! that wires everything below it together and exposes the binary
//! entrypoint.

pub mod authz;
pub mod config_source;
pub mod factory;
pub mod lifecycle;
pub mod logging;
pub mod orchestrator;
pub mod registry;
pub mod settings;
pub mod shutdown;

pub use authz::{AuthError, AuthzFilter, Identity};
pub use config_source::{ConfigFilter, ConfigSource, InMemoryConfigSource};
pub use factory::Factory;
pub use lifecycle::LifecycleController;
pub use orchestrator::{Orchestrator, OrchestratorStatus, WorkerStatus};
pub use settings::Settings;
