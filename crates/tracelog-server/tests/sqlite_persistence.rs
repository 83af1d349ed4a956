use tracelog_server::build_service;
use tracelog_server::config::{Config, StorageBackend};
use tracelog_types::{Identity, TracingError};

fn sqlite_config(path: &str, key: &str) -> Config {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Sqlite;
    config.database.path = path.to_string();
    config.tracing.controller = "controller".to_string();
    config.tracing.integrity_key = key.to_string();
    config
}

#[test]
fn services_and_logs_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracelog.db");
    let config = sqlite_config(path.to_str().unwrap(), "k1");

    let controller = Identity::new("controller");
    let svc = Identity::new("billing");

    {
        let mut service = build_service(&config).unwrap();
        service.initialize(&controller, svc.clone()).unwrap();
        service
            .add_log(&svc, "export", "report-3", "Q3 report", "dave")
            .unwrap();
    }

    let mut reopened = build_service(&config).unwrap();
    let logs = reopened.get_logs(&svc).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "export");
    assert!(reopened.verify_log(&svc, "dave", "report-3", "export").unwrap());

    let err = reopened.initialize(&controller, svc).unwrap_err();
    assert!(matches!(err, TracingError::Conflict(_)));
}

#[test]
fn rotated_integrity_key_orphans_stored_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracelog.db");
    let path = path.to_str().unwrap();

    let controller = Identity::new("controller");
    let svc = Identity::new("billing");

    {
        let mut service = build_service(&sqlite_config(path, "old-key")).unwrap();
        service.initialize(&controller, svc.clone()).unwrap();
        service.add_log(&svc, "read", "doc-1", "Doc", "erin").unwrap();
    }

    let rotated = build_service(&sqlite_config(path, "new-key")).unwrap();
    let err = rotated.verify_log(&svc, "erin", "doc-1", "read").unwrap_err();
    assert!(matches!(err, TracingError::NotFound(_)));
}

#[test]
fn invalid_config_fails_before_opening_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.db");
    let mut config = sqlite_config(path.to_str().unwrap(), "k");
    config.tracing.controller = String::new();

    assert!(build_service(&config).is_err());
    assert!(!path.exists());
}
