use super::*;

#[test]
fn empty_document_yields_defaults() {
    let config = EngineConfig::from_toml_str("").expect("empty config should parse");

    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.introspection.default_max_length, 2000);
    assert!(config.tracking.lazy_load_persistent);
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = EngineConfig::from_toml_str(
        r#"
        [introspection]
        id_token = "key"

        [identity]
        anomaly_log_limit = 4
        "#,
    )
    .expect("partial config should parse");

    assert_eq!(config.introspection.id_token, "key");
    assert_eq!(config.introspection.version_token, "version");
    assert_eq!(config.identity.anomaly_log_limit, 4);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = EngineConfig::from_toml_str("[tracking]\nlazy = true\n")
        .expect_err("unknown key should fail");

    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn min_length_above_max_length_is_invalid() {
    let err = EngineConfig::from_toml_str(
        "[introspection]\ndefault_min_length = 10\ndefault_max_length = 5\n",
    )
    .expect_err("inverted bounds should fail validation");

    assert_eq!(
        err,
        ConfigError::Invalid {
            key: "introspection.default_min_length",
            message: "10 exceeds default_max_length 5".to_string(),
        }
    );
}

#[test]
fn blank_id_token_is_invalid() {
    let err = EngineConfig::from_toml_str("[introspection]\nid_token = \"  \"\n")
        .expect_err("blank token should fail validation");

    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "introspection.id_token",
            ..
        }
    ));
}

#[test]
fn missing_file_reports_path() {
    let err = EngineConfig::from_path("/nonexistent/umbra.toml")
        .expect_err("missing file should fail");

    assert!(matches!(
        err,
        ConfigError::Io { ref path, .. } if path.ends_with("umbra.toml")
    ));
}
