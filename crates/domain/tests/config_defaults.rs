use bc_domain::config::UpstreamConfig;

#[test]
fn empty_toml_yields_documented_defaults() {
    let config: UpstreamConfig = toml::from_str("").unwrap();
    assert_eq!(config.refresh_interval_secs, 1800);
    assert_eq!(config.poll_timeout_ms, 1000);
    assert_eq!(config.stale_read_limit, 3);
    assert_eq!(config.request_timeout_ms, 30000);
}

#[test]
fn default_matches_empty_toml() {
    let parsed: UpstreamConfig = toml::from_str("").unwrap();
    let built = UpstreamConfig::default();
    assert_eq!(parsed.base_url, built.base_url);
    assert_eq!(parsed.refresh_interval_secs, built.refresh_interval_secs);
    assert_eq!(parsed.poll_timeout_ms, built.poll_timeout_ms);
    assert_eq!(parsed.stale_read_limit, built.stale_read_limit);
    assert_eq!(parsed.request_timeout_ms, built.request_timeout_ms);
    assert_eq!(parsed.diagnostics_path, built.diagnostics_path);
}

#[test]
fn diagnostics_enabled_by_default() {
    let config = UpstreamConfig::default();
    let path = config.diagnostics_path.unwrap();
    assert_eq!(path.to_str().unwrap(), "backchannel-diagnostics.jsonl");
}

#[test]
fn explicit_values_override_defaults() {
    let toml_str = r#"
base_url = "https://chat.internal.test"
refresh_interval_secs = 60
stale_read_limit = 5
"#;
    let config: UpstreamConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.base_url, "https://chat.internal.test");
    assert_eq!(config.refresh_interval_secs, 60);
    assert_eq!(config.stale_read_limit, 5);
    assert_eq!(config.poll_timeout_ms, 1000);
}

#[test]
fn explicit_diagnostics_path_overrides_default() {
    let toml_str = r#"
diagnostics_path = "/var/log/bc/failures.jsonl"
"#;
    let config: UpstreamConfig = toml::from_str(toml_str).unwrap();
    let path = config.diagnostics_path.unwrap();
    assert_eq!(path.to_str().unwrap(), "/var/log/bc/failures.jsonl");
}
