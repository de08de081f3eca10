use super::{Controller, ControllerState, TickOutcome};
use crate::phase::{PhaseCurrents, PhaseId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Attribute name under which a phase's target is published
pub fn current_limit_attribute(phase: PhaseId) -> String {
    format!("Current limit {}", phase)
}

/// Read-only view of the controller, republished after every tick
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub timestamp: String,
    pub name: String,
    pub state: ControllerState,
    /// `"Current limit P1"`..`"Current limit P3"`; unconfigured phases are `None`
    pub attributes: BTreeMap<String, Option<f64>>,
    /// Newest net sample per configured phase
    pub samples: BTreeMap<PhaseId, Option<f64>>,
    pub rated_current: Option<f64>,
    pub charging: Option<bool>,
    pub last_dispatch_at: Option<String>,
    pub last_dispatch: Option<PhaseCurrents>,
    pub last_outcome: Option<TickOutcome>,
    pub total_ticks: u64,
    pub dispatch_failures: u64,
}

impl ControllerSnapshot {
    /// Published target for `phase`
    pub fn current_limit(&self, phase: PhaseId) -> Option<f64> {
        self.attributes
            .get(&current_limit_attribute(phase))
            .copied()
            .flatten()
    }
}

impl Controller {
    pub fn subscribe_snapshot(&self) -> watch::Receiver<Arc<ControllerSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let mut attributes: BTreeMap<String, Option<f64>> = PhaseId::ALL
            .iter()
            .map(|id| (current_limit_attribute(*id), None))
            .collect();
        let mut samples = BTreeMap::new();
        for phase in &self.phases {
            attributes.insert(current_limit_attribute(phase.id()), phase.target_current());
            samples.insert(phase.id(), phase.latest());
        }

        ControllerSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            name: self.name.clone(),
            state: self.state,
            attributes,
            samples,
            rated_current: self.last_charger.as_ref().map(|c| c.rated_current),
            charging: self.last_charger.as_ref().map(|c| c.charging),
            last_dispatch_at: self
                .last_dispatch
                .as_ref()
                .map(|r| r.sent_at_utc.to_rfc3339()),
            last_dispatch: self.last_dispatch.as_ref().map(|r| r.currents.clone()),
            last_outcome: self.last_outcome.clone(),
            total_ticks: self.total_ticks,
            dispatch_failures: self.dispatch_failures,
        }
    }

    pub(super) fn publish_snapshot(&self) {
        let _ = self.snapshot_tx.send(Arc::new(self.snapshot()));
    }
}
