// Configuration loading through the public API

use avatar_fx::config::*;
use avatar_fx::error::ConfigError;
use std::io::Write;

#[test]
fn test_full_document_round_trips() {
    let yaml = r#"
fetcher:
  timeout_secs: 4
  connect_timeout_secs: 2
  max_bytes: 2048
  user_agent: "avatar-bot/2"
decoder:
  max_pixels: 1000000
pipeline:
  processing_timeout_secs: 15
logging:
  level: debug
  format: json
"#;
    let config = Config::from_yaml_with_env(yaml).expect("Failed to parse config");
    assert!(config.validate().is_ok());

    let serialized = serde_yaml::to_string(&config).unwrap();
    let reparsed = Config::from_yaml_with_env(&serialized).unwrap();
    assert_eq!(reparsed, config);
}

#[test]
fn test_env_substitution_in_numbers() {
    std::env::set_var("AVATAR_FX_UNIT_MAX_PIXELS", "4096");
    let config =
        Config::from_yaml_with_env("decoder:\n  max_pixels: ${AVATAR_FX_UNIT_MAX_PIXELS}\n")
            .unwrap();
    assert_eq!(config.decoder.max_pixels, 4096);
}

#[test]
fn test_lowercase_placeholder_is_left_alone() {
    // Only ${UPPER_CASE} names are substituted
    let config = Config::from_yaml_with_env("fetcher:\n  user_agent: \"${not_a_var}\"\n").unwrap();
    assert_eq!(config.fetcher.user_agent, "${not_a_var}");
}

#[test]
fn test_invalid_yaml_is_parse_error() {
    let err = Config::from_yaml_with_env("fetcher: [1, 2").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_from_file_then_validate_rejects_zero_timeout() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "fetcher:\n  connect_timeout_secs: 0").unwrap();
    let config = Config::from_file(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("connect_timeout_secs"));
}
