//! Settings loading tests

use std::io::Write;

use hoist::errors::DeployError;
use hoist::exec::policy::Privilege;
use hoist::storage::settings::Settings;

#[tokio::test]
async fn test_no_path_gives_defaults() {
    let settings = Settings::load(None).await.unwrap();
    assert_eq!(settings.service_user, "springboot");
    assert_eq!(settings.privilege, Privilege::Sudo);
    assert_eq!(settings.health.path, "/actuator/health");
}

#[tokio::test]
async fn test_partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"privilege": "none", "service": {{"settle_secs": 3}}, "ssh": {{"host": "10.0.0.5", "user": "ubuntu"}}}}"#
    )
    .unwrap();

    let settings = Settings::load(Some(file.path())).await.unwrap();
    assert_eq!(settings.privilege, Privilege::None);
    assert_eq!(settings.service.settle_secs, 3);
    assert_eq!(settings.service.log_lines, 50);
    assert_eq!(settings.runtime.package, "openjdk-17-jdk");

    let ssh = settings.ssh.unwrap();
    assert_eq!(ssh.destination(), "ubuntu@10.0.0.5");
    assert_eq!(ssh.port, 22);
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result = Settings::load(Some(&dir.path().join("absent.json"))).await;
    assert!(matches!(result, Err(DeployError::NotFound(_))));
}

#[tokio::test]
async fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    let result = Settings::load(Some(file.path())).await;
    assert!(matches!(result, Err(DeployError::ConfigError(_))));
}
