#![no_main]
use chargeguard::calculator::Calculator;
use chargeguard::phase::{Phase, PhaseId};
use chargeguard::sensor::SensorRef;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First 8 bytes: rated current, next byte: window, rest: f32 samples
    if data.len() < 9 {
        return;
    }
    let mut rated_bytes = [0u8; 8];
    rated_bytes.copy_from_slice(&data[..8]);
    let rated = f64::from_le_bytes(rated_bytes);
    let window = data[8] as usize;

    let mut phase = Phase::new(PhaseId::P1, SensorRef::new("sensor.fuzz"), 60);
    for chunk in data[9..].chunks_exact(4) {
        let sample = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64;
        if sample.is_finite() {
            phase.add_sample(sample);
        }
    }

    let calc = Calculator::new(rated, window);
    let target = calc.calculate_target_with_filter(&phase);
    assert!(target >= 0.0 && target <= calc.rated_current());
    if let Some(latest) = phase.latest() {
        let raw = calc.calculate_target_current(latest);
        assert!(raw >= 0.0 && raw <= calc.rated_current());
    }
});
