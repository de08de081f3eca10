//! Per-phase sample history and target current
//!
//! A [`Phase`] is created once per configured conductor when the controller is
//! built and is mutated only by the controller's tick.

use crate::sensor::SensorRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

mod buffer;

pub use buffer::{DEFAULT_SAMPLE_CAPACITY, MAX_SAMPLE_CAPACITY, SampleBuffer};

/// Per-phase current values in amperes
pub type PhaseCurrents = BTreeMap<PhaseId, f64>;

/// Conductor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhaseId {
    #[serde(alias = "L1")]
    P1,
    #[serde(alias = "L2")]
    P2,
    #[serde(alias = "L3")]
    P3,
}

impl PhaseId {
    pub const ALL: [PhaseId; 3] = [PhaseId::P1, PhaseId::P2, PhaseId::P3];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseId::P1 => "P1",
            PhaseId::P2 => "P2",
            PhaseId::P3 => "P3",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseId {
    type Err = crate::error::ChargeGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "P1" | "L1" | "1" => Ok(PhaseId::P1),
            "P2" | "L2" | "2" => Ok(PhaseId::P2),
            "P3" | "L3" | "3" => Ok(PhaseId::P3),
            other => Err(crate::error::ChargeGuardError::validation(
                "phase".to_string(),
                format!("unknown phase '{}'", other),
            )),
        }
    }
}

/// Holds data for each phase
#[derive(Debug, Clone)]
pub struct Phase {
    id: PhaseId,
    sensor: SensorRef,
    target_current: Option<f64>,
    samples: SampleBuffer,
}

impl Phase {
    pub fn new(id: PhaseId, sensor: SensorRef, capacity: usize) -> Self {
        Self {
            id,
            sensor,
            target_current: None,
            samples: SampleBuffer::new(capacity),
        }
    }

    pub fn id(&self) -> PhaseId {
        self.id
    }

    pub fn sensor(&self) -> &SensorRef {
        &self.sensor
    }

    /// Target current on the phase, `None` until the first calculation
    pub fn target_current(&self) -> Option<f64> {
        self.target_current
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Newest net sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.latest()
    }

    pub fn add_sample(&mut self, measurement: f64) {
        self.samples.push(measurement);
    }

    /// Sets the target current on the phase
    pub fn update_target(&mut self, new_target_current: f64) {
        crate::logging::get_logger("phase").debug(&format!(
            "Phase {}: target current {:?} -> {:.2} A",
            self.id, self.target_current, new_target_current
        ));
        self.target_current = Some(new_target_current);
    }
}
