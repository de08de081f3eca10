use super::*;
use crate::calculator::DEFAULT_FILTER_WINDOW;
use crate::dispatch::{DEFAULT_CHARGER_TTL_SECS, DEFAULT_REAFFIRM_INTERVAL_SECS};
use crate::phase::DEFAULT_SAMPLE_CAPACITY;

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            phases: BTreeMap::from([(PhaseId::P1, SensorRef::new("sensor.current_l1"))]),
            rated_current: None,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            buffer_capacity: DEFAULT_SAMPLE_CAPACITY,
            filter_window: DEFAULT_FILTER_WINDOW,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            reaffirm_interval_secs: DEFAULT_REAFFIRM_INTERVAL_SECS,
            charger_ttl_secs: DEFAULT_CHARGER_TTL_SECS,
            min_change_amps: 0.1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/chargeguard.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            sampling: SamplingConfig::default(),
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}
