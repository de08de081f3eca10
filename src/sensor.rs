//! Sensor read interface
//!
//! The controller never resolves sensors itself; the host hands it an
//! already-resolved [`SensorReader`]. A read yields either a numeric current
//! or an explicit "unavailable" marker, nothing else.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Opaque reference to an external current sensor (e.g. an entity id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorRef(String);

impl SensorRef {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Result of a single sensor read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorReading {
    Value(f64),
    Unavailable,
}

impl SensorReading {
    /// Parse a host state string. `unavailable`, `unknown`, empty and
    /// non-numeric states all map to `Unavailable`, as do non-finite numbers.
    pub fn from_state_str(state: &str) -> Self {
        let s = state.trim();
        if s.is_empty()
            || s.eq_ignore_ascii_case("unavailable")
            || s.eq_ignore_ascii_case("unknown")
        {
            return SensorReading::Unavailable;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => SensorReading::Value(v),
            _ => SensorReading::Unavailable,
        }
    }

    /// Finite value, if any
    pub fn value(&self) -> Option<f64> {
        match self {
            SensorReading::Value(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

/// Reads the current value of an external sensor
#[async_trait::async_trait]
pub trait SensorReader: Send + Sync {
    async fn read(&self, sensor: &SensorRef) -> SensorReading;
}

/// In-memory sensor table a host pushes readings into
///
/// Cheap to clone; all clones share the same table. Sensors that were never
/// set read as `Unavailable`.
#[derive(Debug, Clone, Default)]
pub struct SharedSensorValues {
    values: Arc<RwLock<HashMap<SensorRef, SensorReading>>>,
}

impl SharedSensorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, sensor: &SensorRef, amps: f64) {
        self.values
            .write()
            .await
            .insert(sensor.clone(), SensorReading::Value(amps));
    }

    pub async fn set_unavailable(&self, sensor: &SensorRef) {
        self.values
            .write()
            .await
            .insert(sensor.clone(), SensorReading::Unavailable);
    }

    /// Store a raw host state string
    pub async fn set_state(&self, sensor: &SensorRef, state: &str) {
        self.values
            .write()
            .await
            .insert(sensor.clone(), SensorReading::from_state_str(state));
    }

    pub async fn remove(&self, sensor: &SensorRef) {
        self.values.write().await.remove(sensor);
    }
}

#[async_trait::async_trait]
impl SensorReader for SharedSensorValues {
    async fn read(&self, sensor: &SensorRef) -> SensorReading {
        self.values
            .read()
            .await
            .get(sensor)
            .copied()
            .unwrap_or(SensorReading::Unavailable)
    }
}
