#![no_main]
use chargeguard::sensor::SensorReading;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let state = String::from_utf8_lossy(data);
    let reading = SensorReading::from_state_str(&state);
    // Only finite values may come out as available
    if let Some(v) = reading.value() {
        assert!(v.is_finite());
    }
});
