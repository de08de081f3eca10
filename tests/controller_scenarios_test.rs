use chargeguard::dispatch::{DispatchDecision, DispatchReason};
use chargeguard::error::{ChargeGuardError, Result};
use chargeguard::{
    Charger, Config, Controller, ControllerState, PhaseCurrents, PhaseId, SensorRef,
    SharedSensorValues, TickOutcome,
};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Three-phase charger that remembers every accepted command
struct RecordingCharger {
    rated: f64,
    draw: PhaseCurrents,
    charging: AtomicBool,
    reject: AtomicBool,
    commands: Mutex<Vec<PhaseCurrents>>,
}

impl RecordingCharger {
    fn new(rated: f64, draw: PhaseCurrents) -> Arc<Self> {
        Arc::new(Self {
            rated,
            draw,
            charging: AtomicBool::new(true),
            reject: AtomicBool::new(false),
            commands: Mutex::new(Vec::new()),
        })
    }

    fn commands(&self) -> Vec<PhaseCurrents> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Charger for RecordingCharger {
    async fn start(&self) -> Result<()> {
        self.charging.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.charging.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn update_limits(&self, limits: &PhaseCurrents) -> Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(ChargeGuardError::dispatch("modbus write rejected"));
        }
        self.commands.lock().unwrap().push(limits.clone());
        Ok(())
    }

    async fn phase_currents(&self) -> Result<PhaseCurrents> {
        Ok(self.draw.clone())
    }

    async fn rated_current(&self) -> Result<f64> {
        Ok(self.rated)
    }

    async fn charging(&self) -> Result<bool> {
        Ok(self.charging.load(Ordering::SeqCst))
    }
}

fn three_phase_config() -> Config {
    Config::from_yaml_str(
        r#"
controller:
  name: Driveway
  phases:
    P1: sensor.l1
    P2: sensor.l2
    P3: sensor.l3
"#,
    )
    .unwrap()
}

async fn sensors(values: [f64; 3]) -> SharedSensorValues {
    let sensors = SharedSensorValues::new();
    for (name, value) in ["sensor.l1", "sensor.l2", "sensor.l3"].iter().zip(values) {
        sensors.set(&SensorRef::new(*name), value).await;
    }
    sensors
}

#[tokio::test]
async fn three_phase_limits_follow_house_load() {
    // Sensors see house load plus 8 A of charger draw per phase
    let draw = PhaseCurrents::from([(PhaseId::P1, 8.0), (PhaseId::P2, 8.0), (PhaseId::P3, 8.0)]);
    let charger = RecordingCharger::new(25.0, draw);
    let sensors = sensors([10.0, 20.0, 40.0]).await;
    let mut controller =
        Controller::new(&three_phase_config(), Arc::new(sensors), charger.clone()).unwrap();

    let outcome = controller.tick().await.unwrap();
    let TickOutcome::Balanced(DispatchDecision::Sent { reason, currents }) = outcome else {
        panic!("expected a dispatch");
    };
    assert_eq!(reason, DispatchReason::Initial);
    assert_eq!(currents.get(&PhaseId::P1), Some(&23.0));
    assert_eq!(currents.get(&PhaseId::P2), Some(&13.0));
    // 32 A of other load on a 25 A fuse leaves nothing
    assert_eq!(currents.get(&PhaseId::P3), Some(&0.0));
    assert_eq!(charger.commands().len(), 1);
}

#[tokio::test]
async fn targets_stay_within_rating_for_any_load() {
    let charger = RecordingCharger::new(16.0, PhaseCurrents::new());
    let sensors = sensors([0.0, 0.0, 0.0]).await;
    let mut controller = Controller::new(
        &three_phase_config(),
        Arc::new(sensors.clone()),
        charger.clone(),
    )
    .unwrap();

    for load in [-30.0, -1.0, 0.0, 3.5, 15.9, 16.0, 50.0, 1.0e6] {
        for name in ["sensor.l1", "sensor.l2", "sensor.l3"] {
            sensors.set(&SensorRef::new(name), load).await;
        }
        controller.tick().await.unwrap();
        for phase in controller.phases() {
            let target = phase.target_current().unwrap();
            assert!((0.0..=16.0).contains(&target), "{} out of range", target);
        }
    }
}

#[tokio::test]
async fn stop_then_resume_session() {
    let charger = RecordingCharger::new(32.0, PhaseCurrents::new());
    let sensors = sensors([0.0, 0.0, 0.0]).await;
    let mut controller = Controller::new(
        &three_phase_config(),
        Arc::new(sensors.clone()),
        charger.clone(),
    )
    .unwrap();

    controller.tick().await.unwrap();
    controller.stop_charging().await.unwrap();

    // Oven comes on during the pause
    sensors.set(&SensorRef::new("sensor.l2"), 18.0).await;
    assert_eq!(controller.tick().await.unwrap(), TickOutcome::Idle);
    assert_eq!(controller.state(), ControllerState::Off);
    assert_eq!(charger.commands().len(), 1);
    assert_eq!(controller.phase(PhaseId::P1).unwrap().target_current(), Some(32.0));
    assert_eq!(controller.phase(PhaseId::P2).unwrap().target_current(), Some(23.0));

    controller.start_charging().await.unwrap();
    controller.tick().await.unwrap();
    assert_eq!(controller.state(), ControllerState::On);
    let commands = charger.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[1].get(&PhaseId::P1), Some(&32.0));
    assert_eq!(commands[1].get(&PhaseId::P2), Some(&20.0));
}

#[tokio::test(start_paused = true)]
async fn rejected_commands_are_retried_by_the_loop() {
    let charger = RecordingCharger::new(32.0, PhaseCurrents::new());
    charger.reject.store(true, Ordering::SeqCst);
    let sensors = sensors([1.0, 2.0, 3.0]).await;
    let mut controller =
        Controller::new(&three_phase_config(), Arc::new(sensors), charger.clone()).unwrap();
    let shutdown = controller.shutdown_handle();
    let snapshots = controller.subscribe_snapshot();

    let task = tokio::spawn(async move { controller.run().await });

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(charger.commands().is_empty());
    assert_eq!(snapshots.borrow().dispatch_failures, 1);

    charger.reject.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(charger.commands().len(), 1);
    assert_eq!(snapshots.borrow().state, ControllerState::On);

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}
