//! fleet-core - Device registry and action simulator
//!
//! This crate owns all in-memory fleet state. The [`DeviceRegistry`] stores
//! device records behind a single lock; the [`ActionSimulator`] runs one
//! background worker per initiated action and writes outcomes back through
//! the registry. [`FleetService`] layers the caller-side preconditions
//! (non-empty ids, device exists, device not busy) on top of both.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 FleetService                 │
//! │        (validation, busy-device checks)      │
//! │                                              │
//! │  ┌─────────────────┐    ┌─────────────────┐  │
//! │  │ ActionSimulator │───▶│ DeviceRegistry  │  │
//! │  │ (actions, tasks)│    │ (devices)       │  │
//! │  └────────┬────────┘    └─────────────────┘  │
//! │           │ one task per action              │
//! │     ┌─────┴─────┐                            │
//! │     │  worker   │                            │
//! │     └───────────┘                            │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod service;
pub mod simulator;

pub use config::SimulatorConfig;
pub use error::{FleetError, FleetResult};
pub use models::*;
pub use registry::DeviceRegistry;
pub use service::{FleetService, StatusChange};
pub use simulator::{
    ActionPlan, ActionSimulator, FixedOutcome, OutcomeSource, RandomOutcome,
};
