//! Charger capability consumed by the controller
//!
//! Vendor drivers implement [`Charger`]; the controller only ever talks to
//! this trait. A driver reports failures as errors and never retries a
//! command on its own: retry policy belongs to the controller.

use crate::error::Result;
use crate::phase::{PhaseCurrents, PhaseId};
use serde::{Deserialize, Serialize};

/// Abstract EV charger
#[async_trait::async_trait]
pub trait Charger: Send + Sync {
    /// Start charging. Idempotent.
    async fn start(&self) -> Result<()>;

    /// Stop charging. Idempotent.
    async fn stop(&self) -> Result<()>;

    /// Send new per-phase current caps. Must return
    /// [`ChargeGuardError::Dispatch`](crate::error::ChargeGuardError::Dispatch)
    /// when the command could not be delivered.
    async fn update_limits(&self, limits: &PhaseCurrents) -> Result<()>;

    /// The charger's own instantaneous draw per phase
    async fn phase_currents(&self) -> Result<PhaseCurrents>;

    /// Circuit fuse/breaker rating in amperes; 0 when not known yet
    async fn rated_current(&self) -> Result<f64>;

    /// Whether balancing should be active right now
    async fn charging(&self) -> Result<bool>;
}

/// Vendor-neutral charger operating status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargerStatus {
    Disconnected,
    AwaitingStart,
    ReadyToCharge,
    Charging,
    Completed,
    Error,
}

impl ChargerStatus {
    /// Collapse to "should we be balancing": true while the charger draws or
    /// is about to draw power.
    pub fn wants_balancing(&self) -> bool {
        matches!(
            self,
            ChargerStatus::AwaitingStart | ChargerStatus::ReadyToCharge | ChargerStatus::Charging
        )
    }
}

/// Point-in-time view of the charger taken once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargerState {
    pub phase_currents: PhaseCurrents,
    pub rated_current: f64,
    pub charging: bool,
}

impl ChargerState {
    /// Charger draw on `phase`; phases the charger does not report count as 0 A
    pub fn draw_on(&self, phase: PhaseId) -> f64 {
        self.phase_currents
            .get(&phase)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}
