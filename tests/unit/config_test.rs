use aramiyot::config::Config;
use std::io::Write;
use tempfile::NamedTempFile;
use validator::Validate;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.max_request_bytes, 10 * 1024 * 1024);
}

#[test]
fn test_load_from_file() {
    let file = config_file(
        r#"
server_port = 9090
token_secret = "0123456789abcdef0123456789abcdef"
genai_model = "gemini-test"
"#,
    );

    let config = Config::load_from(file.path().to_str()).unwrap();
    assert_eq!(config.server_port, 9090);
    assert_eq!(config.genai_model, "gemini-test");
    assert_eq!(config.ai_rate_limit_per_minute, 30);
    assert!(config.model_endpoint().ends_with("/models/gemini-test"));
}

#[test]
fn test_load_rejects_privileged_port() {
    let file = config_file(
        r#"
server_port = 80
token_secret = "0123456789abcdef0123456789abcdef"
"#,
    );
    assert!(Config::load_from(file.path().to_str()).is_err());
}

#[test]
fn test_load_rejects_short_secret() {
    let file = config_file("token_secret = \"short\"\n");
    assert!(Config::load_from(file.path().to_str()).is_err());
}

#[test]
fn test_model_endpoint_trims_trailing_slash() {
    let config = Config {
        genai_base_url: "http://localhost:8000/v1beta/".to_string(),
        genai_model: "m".to_string(),
        ..Config::default()
    };
    assert_eq!(config.model_endpoint(), "http://localhost:8000/v1beta/models/m");
}

#[test]
fn test_log_level_drives_default_filter() {
    let file = config_file(
        r#"
token_secret = "0123456789abcdef0123456789abcdef"
log_level = "debug"
"#,
    );

    let config = Config::load_from(file.path().to_str()).unwrap();
    assert_eq!(config.log_filter(), "aramiyot=debug,tower_http=info");
    assert!(!config.trust_forwarded_for);
    assert_eq!(Config::default().log_filter(), "aramiyot=info,tower_http=info");
}
