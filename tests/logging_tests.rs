use chargeguard::config::LoggingConfig;
use chargeguard::logging::{
    LogContext, get_logger, get_logger_with_context, init_logging, level_rank, parse_log_level,
};
use tracing::Level;

#[test]
fn level_rank_orders_verbosity() {
    assert!(level_rank(Level::TRACE) < level_rank(Level::DEBUG));
    assert!(level_rank(Level::DEBUG) < level_rank(Level::INFO));
    assert!(level_rank(Level::WARN) < level_rank(Level::ERROR));
}

#[test]
fn parse_log_level_rejects_unknown() {
    assert_eq!(parse_log_level("Warn").unwrap(), Level::WARN);
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn init_logging_writes_to_configured_directory() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        file: tmp_dir
            .path()
            .join("chargeguard.log")
            .to_string_lossy()
            .to_string(),
        console_output: false,
        ..LoggingConfig::default()
    };

    init_logging(&config).unwrap();
    // Second call is a no-op
    init_logging(&config).unwrap();

    get_logger("test").info("hello");
    get_logger_with_context(LogContext::new("controller").with_controller("garage"))
        .warn("context");
}
