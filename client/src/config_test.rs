use super::*;
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_uses_defaults_when_unset() {
    let cfg = SyncConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, SyncConfig::default());
    assert_eq!(cfg.poll_interval, Duration::from_millis(3000));
    assert_eq!(cfg.scroll_throttle, Duration::from_millis(250));
    assert!(cfg.username.is_none());
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = SyncConfig::from_lookup(lookup(&[
        ("OBSIDIAN_BASE_URL", "https://obsidian.example/"),
        ("CHAT_POLL_INTERVAL_MS", "1500"),
        ("CHAT_SCROLL_THROTTLE_MS", "100"),
        ("CHAT_REQUEST_TIMEOUT_SECS", "5"),
        ("CHAT_CONNECT_TIMEOUT_SECS", "2"),
        ("CHAT_USERNAME", " anna "),
    ]))
    .unwrap();

    assert_eq!(cfg.base_url, "https://obsidian.example");
    assert_eq!(cfg.poll_interval, Duration::from_millis(1500));
    assert_eq!(cfg.scroll_throttle, Duration::from_millis(100));
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.username.as_deref(), Some("anna"));
}

#[test]
fn from_lookup_rejects_zero_poll_interval() {
    let err = SyncConfig::from_lookup(lookup(&[("CHAT_POLL_INTERVAL_MS", "0")])).unwrap_err();
    assert!(err.to_string().contains("CHAT_POLL_INTERVAL_MS"));
}

#[test]
fn from_lookup_falls_back_on_garbage_numbers() {
    let cfg = SyncConfig::from_lookup(lookup(&[("CHAT_POLL_INTERVAL_MS", "soon")])).unwrap();
    assert_eq!(cfg.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
}

#[test]
fn blank_username_is_treated_as_anonymous() {
    let cfg = SyncConfig::from_lookup(lookup(&[("CHAT_USERNAME", "   ")])).unwrap();
    assert!(cfg.username.is_none());
}

#[test]
fn parse_base_url_requires_http_scheme() {
    assert!(parse_base_url(Some("ftp://files")).is_err());
    assert!(parse_base_url(Some("localhost:8000")).is_err());
    assert_eq!(parse_base_url(None).unwrap(), DEFAULT_BASE_URL);
}
