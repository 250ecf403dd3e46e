use overseer_core::errors::*;

#[test]
fn timeout_error_carries_step_and_duration() {
    let err = OverseerError::Timeout {
        step: "recall.has_seen_error".into(),
        millis: 250,
    };
    let msg = err.to_string();
    assert!(msg.contains("recall.has_seen_error"));
    assert!(msg.contains("250"));
    assert!(err.is_timeout());
}

#[test]
fn dependency_helper_builds_dependency_failed() {
    let err = OverseerError::dependency("snapshot", "disk offline");
    assert!(!err.is_timeout());
    assert!(err.to_string().contains("snapshot"));
    assert!(err.to_string().contains("disk offline"));
}

#[test]
fn storage_error_converts_to_overseer_error() {
    let storage_err = StorageError::SqliteError {
        message: "disk full".into(),
    };
    let err: OverseerError = storage_err.into();
    assert!(matches!(err, OverseerError::StorageError(_)));
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn router_error_converts_to_overseer_error() {
    let err: OverseerError = RouterError::NoPath {
        from: "solidify".into(),
        to: "think".into(),
    }
    .into();
    let msg = err.to_string();
    assert!(msg.contains("solidify"));
    assert!(msg.contains("think"));
}

#[test]
fn config_error_converts_to_overseer_error() {
    let err: OverseerError = ConfigError::InvalidValue {
        key: "db_timeout_ms".into(),
        value: "-1".into(),
    }
    .into();
    assert!(matches!(err, OverseerError::ConfigError(_)));
}
