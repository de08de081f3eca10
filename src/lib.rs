//! # Chargeguard - per-phase EV charger load balancing
//!
//! Keeps an EV charger's per-phase current below what the mains fuse can
//! still carry once the rest of the house is accounted for. External current
//! sensors on each phase are sampled on a fixed cadence, the charger's own
//! draw is subtracted, and a short running mean of the remaining load gives
//! the headroom that is sent to the charger as a per-phase limit.
//!
//! ## Features
//!
//! - **Async-first**: a single Tokio control loop, no overlapping ticks
//! - **Vendor-neutral**: chargers and sensors plug in through async traits
//! - **Spike filtering**: windowed mean over recent samples per phase
//! - **Command throttling**: limits are sent on change and re-affirmed
//!   before the charger's command TTL runs out
//! - **Configuration**: YAML-based configuration with validation
//! - **Status API**: optional HTTP surface over the latest snapshot
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `phase`: Per-phase sample history and target
//! - `calculator`: Filtered headroom calculation
//! - `sensor`: Sensor read interface and an in-memory reader
//! - `charger`: Charger capability trait
//! - `dispatch`: Command de-duplication and re-affirmation
//! - `controller`: Tick state machine and control loop
//! - `web`: HTTP status API

pub mod calculator;
pub mod charger;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod phase;
pub mod sensor;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use charger::Charger;
pub use config::Config;
pub use controller::{Controller, ControllerSnapshot, ControllerState, ShutdownHandle, TickOutcome};
pub use error::{ChargeGuardError, Result};
pub use phase::{PhaseCurrents, PhaseId};
pub use sensor::{SensorReader, SensorReading, SensorRef, SharedSensorValues};
