use serial_test::serial;
use std::env;
use waystone::config::CONFIG_FILE;
use waystone::ClientConfig;

fn clear_env() {
    env::remove_var("WAYSTONE_ENDPOINTS");
    env::remove_var("WAYSTONE_MAX_ATTEMPTS");
    env::remove_var("WAYSTONE_TIMEOUT_MS");
    env::remove_var("WAYSTONE_BASE_DELAY_MS");
}

#[test]
#[serial]
fn test_env_fallback_when_no_file() {
    clear_env();
    env::set_var("WAYSTONE_ENDPOINTS", "http://10.0.0.2:8080, http://10.0.0.3:8080");
    env::set_var("WAYSTONE_MAX_ATTEMPTS", "5");
    env::set_var("WAYSTONE_BASE_DELAY_MS", "250");

    let temp_dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::load_or_default(temp_dir.path());

    assert_eq!(
        config.endpoints,
        vec!["http://10.0.0.2:8080", "http://10.0.0.3:8080"]
    );
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.base_delay_ms, 250);
    assert_eq!(config.retry.timeout_ms, 5000);
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_unparsable_numbers_keep_defaults() {
    clear_env();
    env::set_var("WAYSTONE_ENDPOINTS", "http://10.0.0.2:8080");
    env::set_var("WAYSTONE_MAX_ATTEMPTS", "lots");

    let config = ClientConfig::from_env();
    assert_eq!(config.retry.max_attempts, 3);

    clear_env();
}

#[test]
#[serial]
fn test_no_file_no_env_is_invalid() {
    clear_env();

    let temp_dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::load_or_default(temp_dir.path());

    assert!(config.endpoints.is_empty());
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_invalid_file_falls_back_to_env() {
    clear_env();
    env::set_var("WAYSTONE_ENDPOINTS", "http://fallback:8080");

    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join(CONFIG_FILE), b"invalid json").unwrap();

    let config = ClientConfig::load_or_default(temp_dir.path());
    assert_eq!(config.endpoints, vec!["http://fallback:8080"]);

    clear_env();
}

#[test]
#[serial]
fn test_file_wins_over_env() {
    clear_env();
    env::set_var("WAYSTONE_ENDPOINTS", "http://from-env:8080");

    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join(CONFIG_FILE),
        r#"{"endpoints": ["http://from-file:8080"]}"#,
    )
    .unwrap();

    let config = ClientConfig::load_or_default(temp_dir.path());
    assert_eq!(config.endpoints, vec!["http://from-file:8080"]);
    assert_eq!(config.retry, waystone::RetryPolicy::default());

    clear_env();
}
