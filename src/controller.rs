//! Per-phase load-balancing controller
//!
//! Every tick reads the external phase sensors, subtracts the charger's own
//! draw, runs the filtered headroom calculation and, while the charger is
//! charging, pushes the resulting per-phase caps to it. A tick either
//! completes or leaves phase history and the dispatch record untouched.

use crate::calculator::Calculator;
use crate::charger::{Charger, ChargerState};
use crate::config::Config;
use crate::dispatch::{DispatchDecision, DispatchPolicy, DispatchRecord};
use crate::error::{ChargeGuardError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::phase::{Phase, PhaseCurrents, PhaseId};
use crate::sensor::SensorReader;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};

mod snapshot;
mod state;

pub use snapshot::{ControllerSnapshot, current_limit_attribute};
pub use state::{ControllerState, TickOutcome};

/// Requests shutdown of a running [`Controller::run`] loop
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

pub struct Controller {
    name: String,

    /// One entry per configured phase, in phase order
    phases: Vec<Phase>,

    sensors: Arc<dyn SensorReader>,
    charger: Arc<dyn Charger>,

    /// Fuse override from configuration
    rated_override: Option<f64>,
    /// Charger-reported rating; 0 until the charger knows it
    charger_rated: f64,

    filter_window: usize,
    policy: DispatchPolicy,
    sample_interval: Duration,

    state: ControllerState,
    last_dispatch: Option<DispatchRecord>,
    last_charger: Option<ChargerState>,
    last_outcome: Option<TickOutcome>,
    total_ticks: u64,
    dispatch_failures: u64,

    logger: StructuredLogger,

    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,

    snapshot_tx: watch::Sender<Arc<ControllerSnapshot>>,
    snapshot_rx: watch::Receiver<Arc<ControllerSnapshot>>,
}

impl Controller {
    /// Build a controller for the phases in `config`.
    ///
    /// Fails with [`ChargeGuardError::NoSensors`] when no phase is configured
    /// and with a validation error for any other bad setting.
    pub fn new(
        config: &Config,
        sensors: Arc<dyn SensorReader>,
        charger: Arc<dyn Charger>,
    ) -> Result<Self> {
        config.validate()?;

        let name = config.controller.name.clone();
        let logger = get_logger_with_context(LogContext::new("controller").with_controller(&name));

        let phases: Vec<Phase> = config
            .controller
            .phases
            .iter()
            .map(|(id, sensor)| Phase::new(*id, sensor.clone(), config.sampling.buffer_capacity))
            .collect();

        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(empty_snapshot()));

        let controller = Self {
            name,
            phases,
            sensors,
            charger,
            rated_override: config.controller.rated_current,
            charger_rated: 0.0,
            filter_window: config.sampling.filter_window,
            policy: config.dispatch_policy(),
            sample_interval: config.sample_interval(),
            state: ControllerState::Unavailable,
            last_dispatch: None,
            last_charger: None,
            last_outcome: None,
            total_ticks: 0,
            dispatch_failures: 0,
            logger,
            shutdown_tx,
            shutdown_rx,
            snapshot_tx,
            snapshot_rx,
        };
        controller.publish_snapshot();

        controller.logger.info(&format!(
            "Controller created for phases [{}]",
            controller
                .phases
                .iter()
                .map(|p| format!("{}={}", p.id(), p.sensor()))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        Ok(controller)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, id: PhaseId) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id() == id)
    }

    /// Last limits the charger accepted
    pub fn last_dispatch(&self) -> Option<&DispatchRecord> {
        self.last_dispatch.as_ref()
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Ask the charger to start charging
    pub async fn start_charging(&self) -> Result<()> {
        self.logger.info("Start charging requested");
        self.charger.start().await
    }

    /// Ask the charger to stop charging
    pub async fn stop_charging(&self) -> Result<()> {
        self.logger.info("Stop charging requested");
        self.charger.stop().await
    }

    /// Run ticks at the sampling interval until shutdown is requested
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info(&format!(
            "Starting controller loop, interval {} ms",
            self.sample_interval.as_millis()
        ));

        let mut ticker = interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(outcome) => self.logger.trace(&format!("Tick outcome: {:?}", outcome)),
                        // Keep ticking; the next tick retries
                        Err(e) => self.logger.error(&format!("Tick failed: {}", e)),
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// One sampling and balancing step
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        self.total_ticks = self.total_ticks.saturating_add(1);
        let result = self.balance().await;
        match &result {
            Ok(outcome) => {
                self.set_state(outcome.resulting_state());
                self.last_outcome = Some(outcome.clone());
            }
            Err(_) => {
                // A failed dispatch keeps balancing active
                self.set_state(ControllerState::On);
                self.dispatch_failures = self.dispatch_failures.saturating_add(1);
            }
        }
        self.publish_snapshot();
        result
    }

    async fn balance(&mut self) -> Result<TickOutcome> {
        // All sensors are read before anything is mutated
        let mut readings = Vec::with_capacity(self.phases.len());
        for phase in &self.phases {
            match self.sensors.read(phase.sensor()).await.value() {
                Some(amps) => readings.push(amps),
                None => {
                    self.logger.warn(&format!(
                        "Sensor {} for phase {} is unavailable",
                        phase.sensor(),
                        phase.id()
                    ));
                    return Ok(TickOutcome::SensorUnavailable(phase.id()));
                }
            }
        }

        let charger = match self.query_charger().await {
            Ok(state) => state,
            Err(e) => {
                self.logger.warn(&format!("Charger query failed: {}", e));
                return Ok(TickOutcome::ChargerUnavailable);
            }
        };
        let rated = charger.rated_current;
        let charging = charger.charging;
        if rated <= 0.0 {
            self.logger.warn("Rated current not known yet");
            self.last_charger = Some(charger);
            return Ok(TickOutcome::RatedCurrentUnavailable);
        }

        let calculator = Calculator::new(rated, self.filter_window);
        for (phase, reading) in self.phases.iter_mut().zip(readings) {
            let net = reading - charger.draw_on(phase.id());
            phase.add_sample(net);
            let target = calculator.calculate_target_with_filter(phase);
            let unfiltered = calculator.calculate_target_current(net);
            self.logger.debug(&format!(
                "Phase {}: sampled {:.2} A (net {:.2} A), target {:.2} A, unfiltered {:.2} A",
                phase.id(),
                reading,
                net,
                target,
                unfiltered
            ));
            if phase.target_current() != Some(target) {
                phase.update_target(target);
            }
        }
        self.last_charger = Some(charger);

        if !charging {
            if self.last_dispatch.take().is_some() {
                self.logger
                    .info("Charging stopped, next session is commanded immediately");
            }
            return Ok(TickOutcome::Idle);
        }

        let candidate: PhaseCurrents = self
            .phases
            .iter()
            .filter_map(|p| p.target_current().map(|t| (p.id(), t)))
            .collect();

        let now = Instant::now();
        let Some(reason) = self
            .policy
            .decide(&candidate, self.last_dispatch.as_ref(), now)
        else {
            self.logger.debug("Limits unchanged, dispatch skipped");
            return Ok(TickOutcome::Balanced(DispatchDecision::Skipped));
        };

        if let Err(e) = self.charger.update_limits(&candidate).await {
            self.logger
                .warn(&format!("Dispatch of {:?} failed: {}", candidate, e));
            return Err(if matches!(e, ChargeGuardError::Dispatch { .. }) {
                e
            } else {
                ChargeGuardError::dispatch(e.to_string())
            });
        }

        self.logger
            .debug(&format!("Dispatched {:?} ({:?})", candidate, reason));
        self.last_dispatch = Some(DispatchRecord::new(candidate.clone(), now));
        Ok(TickOutcome::Balanced(DispatchDecision::Sent {
            reason,
            currents: candidate,
        }))
    }

    async fn query_charger(&mut self) -> Result<ChargerState> {
        let phase_currents = self.charger.phase_currents().await?;
        let rated_current = self.rated_ceiling().await?;
        let charging = self.charger.charging().await?;
        Ok(ChargerState {
            phase_currents,
            rated_current,
            charging,
        })
    }

    /// Effective ceiling: the lower of the fuse override and the charger
    /// rating. The charger is asked again only while its rating is unknown.
    /// With a fuse override a failed rating query leaves the rating unknown.
    async fn rated_ceiling(&mut self) -> Result<f64> {
        if self.charger_rated <= 0.0 {
            match self.charger.rated_current().await {
                Ok(reported) if reported.is_finite() && reported > 0.0 => {
                    self.logger
                        .info(&format!("Charger rated current: {:.1} A", reported));
                    self.charger_rated = reported;
                }
                Ok(_) => {}
                Err(e) if self.rated_override.is_some() => {
                    self.logger.warn(&format!(
                        "Charger rated current query failed, using fuse rating: {}",
                        e
                    ));
                }
                Err(e) => return Err(e),
            }
        }

        let ceiling = match (self.rated_override, self.charger_rated > 0.0) {
            (Some(fuse), true) => fuse.min(self.charger_rated),
            (Some(fuse), false) => fuse,
            (None, _) => self.charger_rated,
        };
        Ok(ceiling)
    }

    fn set_state(&mut self, next: ControllerState) {
        if self.state != next {
            self.logger
                .info(&format!("State {} -> {}", self.state, next));
            self.state = next;
        }
    }
}

fn empty_snapshot() -> ControllerSnapshot {
    ControllerSnapshot {
        timestamp: chrono::Utc::now().to_rfc3339(),
        name: String::new(),
        state: ControllerState::Unavailable,
        attributes: Default::default(),
        samples: Default::default(),
        rated_current: None,
        charging: None,
        last_dispatch_at: None,
        last_dispatch: None,
        last_outcome: None,
        total_ticks: 0,
        dispatch_failures: 0,
    }
}
