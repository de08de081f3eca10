use chargeguard::config::Config;
use chargeguard::error::ChargeGuardError;
use chargeguard::phase::PhaseId;
use chargeguard::sensor::SensorRef;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.controller.name = "Garage".to_string();
    cfg.controller
        .phases
        .insert(PhaseId::P2, SensorRef::new("sensor.current_l2"));
    cfg.controller.rated_current = Some(25.0);
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.controller.name, "Garage");
    assert_eq!(loaded.controller.phases, cfg.controller.phases);
    assert_eq!(loaded.controller.rated_current, Some(25.0));
    assert_eq!(loaded.logging.file, cfg.logging.file);
    assert!(loaded.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    // No phases
    cfg.controller.phases.clear();
    assert!(matches!(cfg.validate(), Err(ChargeGuardError::NoSensors)));

    // Blank sensor reference
    cfg = Config::default();
    cfg.controller
        .phases
        .insert(PhaseId::P3, SensorRef::new("  "));
    assert!(matches!(
        cfg.validate(),
        Err(ChargeGuardError::Validation { .. })
    ));

    // Interval zero
    cfg = Config::default();
    cfg.sampling.interval_ms = 0;
    assert!(cfg.validate().is_err());

    // Capacity above the hard maximum
    cfg = Config::default();
    cfg.sampling.buffer_capacity = 721;
    assert!(cfg.validate().is_err());

    // Re-affirmation must beat the charger TTL
    cfg = Config::default();
    cfg.dispatch.charger_ttl_secs = 120;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.dispatch.min_change_amps = -1.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.web.enabled = true;
    cfg.web.port = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn missing_file_is_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ChargeGuardError::Io { .. }));
}

#[test]
fn explicit_override_path_is_used() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        "controller:\n  phases:\n    L2: sensor.kitchen\nsampling:\n  interval_ms: 1000\n",
    )
    .unwrap();
    let cfg = Config::load_with_override(Some(tmp.path())).unwrap();
    assert_eq!(
        cfg.controller.phases.get(&PhaseId::P2),
        Some(&SensorRef::new("sensor.kitchen"))
    );
    assert_eq!(cfg.sample_interval().as_millis(), 1000);
}
