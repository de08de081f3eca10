use crate::dispatch::DispatchDecision;
use crate::phase::PhaseId;
use serde::Serialize;
use std::fmt;

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControllerState {
    /// Charger is not charging; no commands are sent
    Off,
    /// Charger is charging and limits are being balanced
    On,
    /// A sensor, the charger or its rating could not be read
    Unavailable,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Off => "OFF",
            ControllerState::On => "ON",
            ControllerState::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// The sensor of this phase had no usable reading
    SensorUnavailable(PhaseId),
    /// Querying the charger failed
    ChargerUnavailable,
    /// No rated current known yet
    RatedCurrentUnavailable,
    /// Targets refreshed, charger not charging
    Idle,
    /// Targets refreshed and dispatch evaluated
    Balanced(DispatchDecision),
}

impl TickOutcome {
    /// The state a tick with this outcome leaves the controller in
    pub fn resulting_state(&self) -> ControllerState {
        match self {
            TickOutcome::SensorUnavailable(_)
            | TickOutcome::ChargerUnavailable
            | TickOutcome::RatedCurrentUnavailable => ControllerState::Unavailable,
            TickOutcome::Idle => ControllerState::Off,
            TickOutcome::Balanced(_) => ControllerState::On,
        }
    }
}
