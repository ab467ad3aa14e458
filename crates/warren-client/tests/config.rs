use std::collections::HashMap;
use std::io::Write;

use warren_client::{ClientConfig, ConfigError, HttpClient};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |var: &str| map.get(var).cloned()
}

#[test]
fn defaults_point_at_local_broker() {
    let config = ClientConfig::default();
    assert_eq!(config.endpoint, "http://localhost:15672");
    assert_eq!(config.username, "guest");
    assert!(!config.insecure);
    config.validate().unwrap();
}

#[test]
fn env_overrides_replace_fields() {
    let config = ClientConfig::default()
        .with_env_overrides(env(&[
            ("RABBITMQ_ENDPOINT", "https://broker.internal:15671"),
            ("RABBITMQ_USERNAME", "ops"),
            ("RABBITMQ_PASSWORD", "hunter2"),
            ("RABBITMQ_INSECURE", "true"),
        ]))
        .unwrap();

    assert_eq!(config.endpoint, "https://broker.internal:15671");
    assert_eq!(config.username, "ops");
    assert_eq!(config.password, "hunter2");
    assert!(config.insecure);
    assert_eq!(config.cacert_file, None);
}

#[test]
fn bad_insecure_flag_is_rejected() {
    let err = ClientConfig::default()
        .with_env_overrides(env(&[("RABBITMQ_INSECURE", "maybe")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { var: "RABBITMQ_INSECURE", .. }));
}

#[test]
fn validate_rejects_bad_endpoints() {
    let mut config = ClientConfig::default();

    config.endpoint = "  ".into();
    assert!(matches!(config.validate(), Err(ConfigError::MissingEndpoint)));

    config.endpoint = "not a url".into();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint { .. })));

    config.endpoint = "amqp://localhost:5672".into();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint { .. })));

    config.endpoint = "http://localhost:15672".into();
    config.username.clear();
    assert!(matches!(config.validate(), Err(ConfigError::MissingUsername)));
}

#[test]
fn load_reads_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"endpoint": "http://rmq:15672", "username": "admin", "password": "pw", "timeout_secs": 30}}"#
    )
    .unwrap();

    let config = ClientConfig::load(file.path()).unwrap();
    assert_eq!(config.username, "admin");
    assert_eq!(config.timeout_secs, Some(30));
}

#[test]
fn client_construction_validates_config() {
    let config = ClientConfig {
        endpoint: String::new(),
        ..ClientConfig::default()
    };
    assert!(matches!(
        HttpClient::new(&config),
        Err(ConfigError::MissingEndpoint)
    ));

    let config = ClientConfig {
        cacert_file: Some("/nonexistent/ca.pem".into()),
        ..ClientConfig::default()
    };
    assert!(matches!(HttpClient::new(&config), Err(ConfigError::CaCert { .. })));
}
