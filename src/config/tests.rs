//! Tests for config module.

use super::*;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

// ==================== Duration parsing tests ====================

#[test]
fn test_parse_duration_seconds() {
    let d = duration::parse_duration("30s").unwrap();
    assert_eq!(d, Duration::from_secs(30));
}

#[test]
fn test_parse_duration_minutes() {
    let d = duration::parse_duration("5m").unwrap();
    assert_eq!(d, Duration::from_secs(300));
}

#[test]
fn test_parse_duration_milliseconds() {
    let d = duration::parse_duration("100ms").unwrap();
    assert_eq!(d, Duration::from_millis(100));
}

#[test]
fn test_parse_duration_bare_number_is_seconds() {
    let d = duration::parse_duration("10").unwrap();
    assert_eq!(d, Duration::from_secs(10));
}

#[test]
fn test_parse_duration_invalid_unit() {
    let result = duration::parse_duration("10x");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("unknown duration unit"));
}

#[test]
fn test_format_duration_units() {
    assert_eq!(duration::format_duration(Duration::from_secs(10)), "10s");
    assert_eq!(duration::format_duration(Duration::from_secs(120)), "2m");
    assert_eq!(duration::format_duration(Duration::from_secs(7200)), "2h");
    assert_eq!(duration::format_duration(Duration::from_millis(1500)), "1500ms");
    assert_eq!(duration::format_duration(Duration::ZERO), "0s");
}

// ==================== Default limits tests ====================

#[test]
fn test_default_limits_are_conservative() {
    let limits = SafetyLimits::default();

    assert_eq!(limits.max_daily_loss, 100.0);
    assert_eq!(limits.max_daily_trades, 5);
    assert_eq!(limits.max_consecutive_losses, 3);
    assert_eq!(limits.max_position_size, 0.01);
    assert_eq!(limits.max_simultaneous_positions, 1);
    assert_eq!(limits.min_score_hybrid, 65.0);
    assert_eq!(limits.min_score_auto, 90.0);
    assert_eq!(limits.execution_timeout, Duration::from_secs(10));
    assert_eq!(limits.max_slippage_points, 5.0);
    assert_eq!(limits.min_stop_loss_points, 10.0);
    assert!(limits.validate().is_ok());
}

#[test]
fn test_zero_thresholds_are_valid() {
    let limits = SafetyLimits {
        max_daily_loss: 0.0,
        max_daily_trades: 0,
        max_position_size: 0.0,
        ..SafetyLimits::default()
    };
    assert!(limits.validate().is_ok());
}

#[test]
fn test_validate_negative_daily_loss() {
    let limits = SafetyLimits {
        max_daily_loss: -1.0,
        ..SafetyLimits::default()
    };
    let err = limits.validate().unwrap_err();
    assert!(err.to_string().contains("limits.max_daily_loss"));
}

#[test]
fn test_validate_nan_position_size() {
    let limits = SafetyLimits {
        max_position_size: f64::NAN,
        ..SafetyLimits::default()
    };
    let err = limits.validate().unwrap_err();
    assert!(err.to_string().contains("limits.max_position_size"));
}

#[test]
fn test_validate_score_out_of_range() {
    let limits = SafetyLimits {
        min_score_auto: 120.0,
        ..SafetyLimits::default()
    };
    let err = limits.validate().unwrap_err();
    assert!(err.to_string().contains("limits.min_score_auto"));
}

#[test]
fn test_validation_error_names_field() {
    let limits = SafetyLimits {
        min_stop_loss_points: f64::INFINITY,
        ..SafetyLimits::default()
    };
    let err = limits.validate().unwrap_err();
    assert_eq!(err.field(), Some("limits.min_stop_loss_points"));
    assert!(matches!(err, ConfigError::Validation { ref message, .. } if message.contains("non-negative")));

    let cfg = from_yaml("app:\n  name: \"\"\n  env: dev\n").unwrap();
    assert_eq!(cfg.validate().unwrap_err().field(), Some("app.name"));
}

// ==================== YAML field loading tests ====================

/// Parse config from YAML string (for testing).
fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    Ok(config)
}

#[test]
fn test_load_app_fields() {
    let yaml = r#"
app:
  name: governor
  env: production
  log_level: debug
"#;
    let cfg = from_yaml(yaml).unwrap();

    assert_eq!(cfg.app.name, "governor");
    assert_eq!(cfg.app.env, "production");
    assert_eq!(cfg.app.log_level, Some("debug".to_string()));
}

#[test]
fn test_load_limits_fields() {
    let yaml = r#"
app:
  name: test
  env: dev

limits:
  max_daily_loss: 250.5
  max_daily_trades: 10
  max_consecutive_losses: 4
  max_position_size: 0.05
  max_simultaneous_positions: 2
  min_score_hybrid: 70
  min_score_auto: 95
  execution_timeout: 30s
  max_slippage_points: 3.5
  min_stop_loss_points: 15
"#;
    let cfg = from_yaml(yaml).unwrap();

    let limits = &cfg.limits;
    assert_eq!(limits.max_daily_loss, 250.5);
    assert_eq!(limits.max_daily_trades, 10);
    assert_eq!(limits.max_consecutive_losses, 4);
    assert_eq!(limits.max_position_size, 0.05);
    assert_eq!(limits.max_simultaneous_positions, 2);
    assert_eq!(limits.min_score_hybrid, 70.0);
    assert_eq!(limits.min_score_auto, 95.0);
    assert_eq!(limits.execution_timeout, Duration::from_secs(30));
    assert_eq!(limits.max_slippage_points, 3.5);
    assert_eq!(limits.min_stop_loss_points, 15.0);
}

#[test]
fn test_load_partial_limits_keeps_defaults() {
    let yaml = r#"
app:
  name: test
  env: dev

limits:
  max_daily_trades: 2
"#;
    let cfg = from_yaml(yaml).unwrap();

    assert_eq!(cfg.limits.max_daily_trades, 2);
    assert_eq!(cfg.limits.max_daily_loss, 100.0);
    assert_eq!(cfg.limits.min_score_auto, 90.0);
    assert_eq!(cfg.limits.execution_timeout, Duration::from_secs(10));
}

#[test]
fn test_load_missing_limits_section_uses_defaults() {
    let yaml = r#"
app:
  name: test
  env: dev
"#;
    let cfg = from_yaml(yaml).unwrap();
    assert_eq!(cfg.limits, SafetyLimits::default());
}

#[test]
fn test_load_negative_trade_cap_fails_to_parse() {
    let yaml = r#"
app:
  name: test
  env: dev

limits:
  max_daily_trades: -1
"#;
    assert!(from_yaml(yaml).is_err());
}

#[test]
fn test_load_storage_fields() {
    let yaml = r#"
app:
  name: test
  env: dev

storage:
  state_file: /var/lib/governor/state.json
  kill_switch_file: /var/lib/governor/KILL.lock
"#;
    let cfg = from_yaml(yaml).unwrap();

    let storage = cfg.storage();
    assert_eq!(storage.state_file, "/var/lib/governor/state.json");
    assert_eq!(storage.kill_switch_file, "/var/lib/governor/KILL.lock");
}

#[test]
fn test_storage_defaults_when_section_missing() {
    let cfg = from_yaml("app:\n  name: test\n  env: dev\n").unwrap();

    let storage = cfg.storage();
    assert_eq!(storage.state_file, DEFAULT_STATE_FILE);
    assert_eq!(storage.kill_switch_file, DEFAULT_KILL_SWITCH_FILE);
}

#[test]
fn test_load_watch_fields() {
    let yaml = r#"
app:
  name: test
  env: dev

watch:
  interval: 250ms
"#;
    let cfg = from_yaml(yaml).unwrap();
    assert_eq!(cfg.watch_interval(), Duration::from_millis(250));
}

#[test]
fn test_watch_interval_default() {
    let cfg = from_yaml("app:\n  name: test\n  env: dev\n").unwrap();
    assert_eq!(cfg.watch_interval(), Duration::from_secs(5));
}

// ==================== Validation tests ====================

#[test]
fn test_validate_empty_app_name() {
    let yaml = r#"
app:
  name: ""
  env: development
"#;
    let cfg = from_yaml(yaml).unwrap();

    let result = cfg.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("app.name is required"));
}

#[test]
fn test_validate_rejects_invalid_limits() {
    let yaml = r#"
app:
  name: test
  env: development

limits:
  max_daily_loss: -50
"#;
    let cfg = from_yaml(yaml).unwrap();

    let result = cfg.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("max_daily_loss"));
}

#[test]
fn test_validate_same_storage_paths() {
    let yaml = r#"
app:
  name: test
  env: development

storage:
  state_file: same.json
  kill_switch_file: same.json
"#;
    let cfg = from_yaml(yaml).unwrap();

    let result = cfg.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("must differ"));
}

// ==================== File loading tests ====================

#[test]
fn test_load_from_file() {
    let yaml = r#"
app:
  name: testbot
  env: development

limits:
  max_daily_loss: 42
"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let cfg = Config::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(cfg.app.name, "testbot");
    assert_eq!(cfg.limits.max_daily_loss, 42.0);
}

#[test]
fn test_load_file_not_found() {
    let result = Config::load("nonexistent_config.yaml");
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("failed to read config file"));
}

#[test]
fn test_load_or_default_missing_file() {
    let cfg = Config::load_or_default("nonexistent_config.yaml").unwrap();

    assert_eq!(cfg.app.name, "safety-governor");
    assert_eq!(cfg.limits, SafetyLimits::default());
}

#[test]
fn test_load_or_default_invalid_file_is_error() {
    let yaml = r#"
app:
  name: testbot
  env: development

limits:
  min_score_hybrid: 150
"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let result = Config::load_or_default(file.path().to_str().unwrap());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("validation failed"));
}

#[test]
fn test_load_storage_overrides_from_env() {
    let mut cfg = from_yaml("app:\n  name: test\n  env: dev\n").unwrap();

    // Set env vars (unsafe because modifying env is not thread-safe)
    unsafe {
        env::set_var(STATE_FILE_ENV, "/tmp/override_state.json");
        env::set_var(KILL_SWITCH_FILE_ENV, "/tmp/override_kill.lock");
    }

    cfg.load_overrides_from_env();

    let storage = cfg.storage();
    assert_eq!(storage.state_file, "/tmp/override_state.json");
    assert_eq!(storage.kill_switch_file, "/tmp/override_kill.lock");

    // Cleanup
    unsafe {
        env::remove_var(STATE_FILE_ENV);
        env::remove_var(KILL_SWITCH_FILE_ENV);
    }
}
