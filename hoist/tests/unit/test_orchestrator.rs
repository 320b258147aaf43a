//! Deployment orchestration tests

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use hoist::app::options::DeployOptions;
use hoist::deploy::fsm::DeploymentState;
use hoist::deploy::orchestrator::Deployer;
use hoist::deploy::pipeline::prepare_directories;
use hoist::exec::recording::RecordingExecutor;
use hoist::exec::runner::CommandRunner;
use hoist::models::command::CommandResult;
use hoist::models::deployment::DeploymentSpec;
use hoist::storage::settings::Settings;
use hoist::utils::sha256_hash;

const JAR_BYTES: &[u8] = b"PK\x03\x04 not really a jar";

/// Serve `status` to every request on an ephemeral port
async fn stub_server(status: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"status":"UP"}"#;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    port
}

/// A port with nothing listening on it
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn write_jar(dir: &Path) -> PathBuf {
    let path = dir.join("orders-1.0.jar");
    std::fs::write(&path, JAR_BYTES).unwrap();
    path
}

fn options(artifact: &Path, port: u16) -> DeployOptions {
    let spec = DeploymentSpec::new("orders", artifact)
        .unwrap()
        .with_port(port)
        .unwrap()
        .with_profile("staging")
        .unwrap();

    let mut settings = Settings::default();
    settings.service.settle_secs = 0;
    settings.health.host = Some("127.0.0.1".to_string());
    settings.health.timeout_secs = 2;
    DeployOptions::new(spec, &settings)
}

fn deployer(options: DeployOptions) -> (Deployer, Arc<RecordingExecutor>) {
    let executor = Arc::new(RecordingExecutor::new());
    executor.respond("is-active", CommandResult::ok("active\n"));
    let deployer = Deployer::new(options, executor.clone()).unwrap();
    (deployer, executor)
}

fn position(lines: &[String], line: &str) -> usize {
    lines
        .iter()
        .position(|l| l == line)
        .unwrap_or_else(|| panic!("`{}` was not run", line))
}

#[tokio::test]
async fn test_missing_artifact_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (mut deployer, executor) = deployer(options(&dir.path().join("missing.jar"), 9090));

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Failed);
    assert!(!report.succeeded());
    assert!(report.error.unwrap().contains("JAR file"));
    assert!(report.artifact_sha256.is_none());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_healthy_deployment() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let port = stub_server("200 OK").await;
    let (mut deployer, executor) = deployer(options(&jar, port));

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Healthy);
    assert!(report.succeeded());
    assert!(report.error.is_none());
    assert_eq!(report.artifact_sha256, Some(sha256_hash(JAR_BYTES)));
    assert_eq!(
        deployer.fsm().history(),
        &[
            DeploymentState::NotStarted,
            DeploymentState::Provisioning,
            DeploymentState::Starting,
            DeploymentState::HealthChecking,
            DeploymentState::Healthy,
        ]
    );

    let lines = executor.command_lines();
    let ordered = [
        "apt-get update".to_string(),
        "useradd -r -s /bin/false springboot".to_string(),
        "mkdir -p /opt/orders".to_string(),
        format!("cp {} /opt/orders/orders.jar", jar.display()),
        "mv /var/lib/hoist/staging/orders.service /etc/systemd/system/orders.service".to_string(),
        "systemctl daemon-reload".to_string(),
        "nginx -t".to_string(),
        "systemctl restart nginx".to_string(),
        format!("ufw allow {}", port),
        "ufw --force enable".to_string(),
        "systemctl enable orders.service".to_string(),
        "systemctl start orders.service".to_string(),
        "systemctl is-active orders.service".to_string(),
    ];
    let positions: Vec<_> = ordered.iter().map(|l| position(&lines, l)).collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!executor.ran("journalctl"));
}

#[tokio::test]
async fn test_unit_file_carries_profile_and_port() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let port = stub_server("200 OK").await;
    let (mut deployer, executor) = deployer(options(&jar, port));

    deployer.deploy().await;

    let unit = executor
        .calls()
        .into_iter()
        .find(|spec| spec.command_line() == "dd of=/var/lib/hoist/staging/orders.service status=none")
        .and_then(|spec| spec.stdin)
        .unwrap();
    assert!(unit.contains("User=springboot"));
    assert!(unit.contains("WorkingDirectory=/opt/orders"));
    assert!(unit.contains("Environment=SPRING_PROFILES_ACTIVE=staging"));
    assert!(unit.contains(&format!("-Dserver.port={}", port)));
}

#[tokio::test]
async fn test_failed_probe_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let port = stub_server("503 Service Unavailable").await;
    let (mut deployer, _executor) = deployer(options(&jar, port));

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Degraded);
    assert!(report.succeeded());
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_unreachable_probe_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let (mut deployer, _executor) = deployer(options(&jar, closed_port()));

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Degraded);
}

#[tokio::test]
async fn test_invalid_proxy_config_stops_before_restart() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let (mut deployer, executor) = deployer(options(&jar, closed_port()));
    executor.respond(
        "nginx -t",
        CommandResult::failed(1, "nginx: [emerg] unexpected \"}\""),
    );

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Failed);
    assert!(report
        .error
        .unwrap()
        .starts_with("Configuration validation failed"));
    assert!(executor.ran("nginx -t"));
    assert!(!executor.ran("systemctl restart nginx"));
    assert!(executor.ran("rm -f /etc/nginx/sites-enabled/orders"));
    assert!(!executor.ran("ufw"));
    assert!(!executor.ran("systemctl start"));
}

#[tokio::test]
async fn test_inactive_service_fails_with_journal() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let executor = Arc::new(RecordingExecutor::new());
    executor.respond(
        "is-active",
        CommandResult {
            code: Some(3),
            stdout: "inactive\n".to_string(),
            stderr: String::new(),
        },
    );
    let mut deployer = Deployer::new(options(&jar, closed_port()), executor.clone()).unwrap();

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Failed);
    assert_eq!(
        deployer.fsm().history().last(),
        Some(&DeploymentState::Failed)
    );
    assert_eq!(
        deployer.fsm().history()[deployer.fsm().history().len() - 2],
        DeploymentState::Starting
    );
    assert!(executor.ran("journalctl -u orders.service --no-pager -n 50"));
    assert!(report.error.unwrap().contains("inactive"));
}

#[tokio::test]
async fn test_existing_account_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let port = stub_server("200 OK").await;
    let (mut deployer, executor) = deployer(options(&jar, port));
    executor.respond(
        "useradd",
        CommandResult::failed(9, "useradd: user 'springboot' already exists"),
    );

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Healthy);
}

#[tokio::test]
async fn test_existing_group_is_not_an_existing_account() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let (mut deployer, executor) = deployer(options(&jar, closed_port()));
    executor.respond(
        "useradd",
        CommandResult::failed(
            9,
            "useradd: group springboot exists - if you want to add this user to that group, use -g.",
        ),
    );

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Failed);
    assert!(report.error.unwrap().contains("group springboot exists"));
    assert!(!executor.ran("mkdir"));
}

#[tokio::test]
async fn test_healthy_deployment_keeps_site_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let port = stub_server("200 OK").await;
    let (mut deployer, executor) = deployer(options(&jar, port));

    deployer.deploy().await;

    assert!(!executor.ran("rm -f /etc/nginx/sites-enabled/orders"));
}

#[tokio::test]
async fn test_other_account_failures_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(dir.path());
    let (mut deployer, executor) = deployer(options(&jar, closed_port()));
    executor.respond(
        "useradd",
        CommandResult::failed(10, "useradd: cannot open /etc/group"),
    );

    let report = deployer.deploy().await;

    assert_eq!(report.state, DeploymentState::Failed);
    assert!(!executor.ran("mkdir"));
}

#[tokio::test]
async fn test_directory_preparation_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(&write_jar(dir.path()), 9090);
    let executor = Arc::new(RecordingExecutor::new());
    let runner = CommandRunner::new(executor.clone());

    runner
        .run_all(&prepare_directories(&options).commands)
        .await
        .unwrap();
    let first = executor.command_lines();
    executor.clear();
    runner
        .run_all(&prepare_directories(&options).commands)
        .await
        .unwrap();

    assert_eq!(first, executor.command_lines());
    assert!(first.iter().all(|l| l.starts_with("mkdir -p ") || l.starts_with("chown -R ")));
}

#[tokio::test]
async fn test_plan_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (deployer, executor) = deployer(options(&write_jar(dir.path()), 9090));

    let plan = deployer.plan();

    assert_eq!(plan.len(), 8);
    assert_eq!(plan.last().unwrap().name, "start application");
    assert!(executor.calls().is_empty());
    assert_eq!(deployer.state(), DeploymentState::NotStarted);
}
