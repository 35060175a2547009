use super::*;

#[test]
fn transport_and_server_errors_are_retryable() {
    assert!(SyncError::Request("connection reset".into()).retryable());
    assert!(SyncError::Status { status: 503 }.retryable());
    assert!(SyncError::Status { status: 429 }.retryable());
}

#[test]
fn client_errors_are_not_retryable() {
    assert!(!SyncError::Status { status: 403 }.retryable());
    assert!(!SyncError::Parse("eof".into()).retryable());
    assert!(!SyncError::Rejected("bad form".into()).retryable());
    assert!(!SyncError::Invalid("empty".into()).retryable());
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(SyncError::Config(String::new()).error_code(), "E_CONFIG_PARSE");
    assert_eq!(SyncError::Status { status: 500 }.error_code(), "E_STATUS");
    assert_eq!(SyncError::Rejected(String::new()).error_code(), "E_REJECTED");
}

#[test]
fn display_includes_status() {
    let err = SyncError::Status { status: 502 };
    assert_eq!(err.to_string(), "server responded with status 502");
}
