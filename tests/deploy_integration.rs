//! Deployment executor tests against the mock transport: the
//! backup-then-write protocol, status enforcement, the high-risk filter
//! chokepoint, and channel lifecycle.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use confcast::core::settings::Settings;
use confcast::core::types::Destination;
use confcast::deploy::mock::{CommandKind, MockConnector};
use confcast::deploy::{CommandOutput, DeployError, Deployer, RemoteCommand};
use confcast::service::{Service, ServiceError};
use confcast::store::MemoryStore;

fn destination() -> Destination {
    Destination {
        address: "10.0.0.1:22".into(),
        path: "/etc/nginx/nginx.conf".into(),
        user: "deploy".into(),
        secret: "hunter2".into(),
    }
}

#[tokio::test]
async fn deploy_backs_up_then_overwrites() {
    let connector = MockConnector::new();
    let transport = connector.transport();
    transport.set_file("/etc/nginx/nginx.conf", "old content\n");

    let deployer = Deployer::new(Arc::new(connector.clone()));
    let report = deployer
        .deploy("new content\nwith two lines\n", &destination())
        .await
        .unwrap();

    // The destination holds the artifact verbatim, newlines included.
    assert_eq!(
        transport.file("/etc/nginx/nginx.conf").as_deref(),
        Some("new content\nwith two lines\n")
    );

    // The backup is a hidden timestamped sibling holding the old bytes.
    let backup = report.backup_path.expect("a backup should exist");
    assert!(backup.starts_with("/etc/nginx/.nginx.conf."));
    assert!(backup.ends_with(".bak"));
    assert_eq!(transport.file(&backup).as_deref(), Some("old content\n"));

    // Protocol order: probe, copy, write. Channel closed afterwards.
    let kinds: Vec<_> = transport
        .executed()
        .iter()
        .map(|command| command.describe())
        .collect();
    assert!(kinds[0].starts_with("probe"));
    assert!(kinds[1].starts_with("copy"));
    assert!(kinds[2].starts_with("write"));
    assert!(transport.closed());
}

#[tokio::test]
async fn missing_destination_skips_the_backup() {
    let connector = MockConnector::new();
    let transport = connector.transport();

    let deployer = Deployer::new(Arc::new(connector.clone()));
    let report = deployer.deploy("fresh\n", &destination()).await.unwrap();

    assert_eq!(report.backup_path, None);
    assert_eq!(transport.file("/etc/nginx/nginx.conf").as_deref(), Some("fresh\n"));
    assert!(!transport
        .executed()
        .iter()
        .any(|command| matches!(command, RemoteCommand::CopyFile { .. })));
    assert!(transport.closed());
}

#[tokio::test]
async fn failed_backup_aborts_before_the_write() {
    let connector = MockConnector::new();
    let transport = connector.transport();
    transport.set_file("/etc/nginx/nginx.conf", "old\n");
    transport.override_status(
        CommandKind::Copy,
        CommandOutput {
            exit_status: 1,
            stdout: String::new(),
            stderr: "cp: permission denied".into(),
        },
    );

    let deployer = Deployer::new(Arc::new(connector.clone()));
    let err = deployer.deploy("new\n", &destination()).await.unwrap_err();

    match err {
        DeployError::CommandFailed {
            exit_status, stderr, ..
        } => {
            assert_eq!(exit_status, 1);
            assert!(stderr.contains("permission denied"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    // The destination was never touched, and the channel still closed.
    assert_eq!(transport.file("/etc/nginx/nginx.conf").as_deref(), Some("old\n"));
    assert!(transport.closed());
}

#[tokio::test]
async fn failed_write_leaves_the_backup_in_place() {
    let connector = MockConnector::new();
    let transport = connector.transport();
    transport.set_file("/etc/nginx/nginx.conf", "old\n");
    transport.fail_command(
        CommandKind::Write,
        DeployError::Transport {
            message: "broken pipe".into(),
        },
    );

    let deployer = Deployer::new(Arc::new(connector.clone()));
    let err = deployer.deploy("new\n", &destination()).await.unwrap_err();
    assert!(matches!(err, DeployError::Transport { .. }));

    // No rollback: the backup is the recovery mechanism.
    let backups: Vec<String> = transport
        .paths()
        .into_iter()
        .filter(|path| path.ends_with(".bak"))
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(transport.closed());
}

#[tokio::test]
async fn connection_failure_is_fatal_and_sends_nothing() {
    let connector = MockConnector::new();
    connector.fail_connect(DeployError::Connection {
        address: "10.0.0.1:22".into(),
        message: "connection refused".into(),
    });

    let deployer = Deployer::new(Arc::new(connector.clone()));
    let err = deployer.deploy("data", &destination()).await.unwrap_err();
    assert!(matches!(err, DeployError::Connection { .. }));
    assert!(connector.transport().executed().is_empty());
}

#[tokio::test]
async fn risky_delete_never_reaches_the_channel() {
    let transport = MockConnector::new().transport();
    let command = RemoteCommand::DeleteFile {
        path: "/".into(),
        recursive: true,
    };
    // The filter rejects before exec; the channel sees nothing.
    assert!(matches!(
        command.check_risk(),
        Err(DeployError::HighRiskCommand { .. })
    ));
    assert!(transport.executed().is_empty());
}

#[tokio::test]
async fn benign_write_to_root_path_passes_the_filter() {
    let connector = MockConnector::new();
    let deployer = Deployer::new(Arc::new(connector.clone()));
    let dest = Destination {
        path: "/".into(),
        ..destination()
    };
    // "/" is a directory on a real host and the write would fail there,
    // but the *filter* must not be what stops it.
    let result = deployer.deploy("data", &dest).await;
    assert!(!matches!(result, Err(DeployError::HighRiskCommand { .. })));
}

#[tokio::test]
async fn service_deploy_renders_persisted_state_and_pushes() {
    let resources = TempDir::new().unwrap();
    let svc_dir = resources.path().join("svc");
    fs::create_dir_all(svc_dir.join("templates")).unwrap();
    fs::write(svc_dir.join("VERSION"), "1.0.0").unwrap();
    fs::write(
        svc_dir.join("config_meta.tsv"),
        "key\tlevel\tvalue\tdescription\tcategory\nPORT\tcustomized\t8080\tlisten port\tnet\n",
    )
    .unwrap();
    fs::write(
        svc_dir.join("template_meta.tsv"),
        "template_name\tdest_address\tdest_path\tdest_user\tdest_secret\n\
         app.conf\t10.0.0.1:22\t/etc/app.conf\tdeploy\thunter2\n",
    )
    .unwrap();
    fs::write(
        svc_dir.join("templates/app.conf"),
        "port={{ self.PORT }}\nregistry={{ peer.REGISTRY_ADDR }}\n",
    )
    .unwrap();

    let hub_dir = resources.path().join("hub");
    fs::create_dir_all(hub_dir.join("templates")).unwrap();
    fs::write(hub_dir.join("VERSION"), "1.0.0").unwrap();
    fs::write(
        hub_dir.join("config_meta.tsv"),
        "key\tlevel\tvalue\tdescription\tcategory\nREGISTRY_ADDR\tdefault\t10.0.0.9:5000\tregistry\tnet\n",
    )
    .unwrap();
    fs::write(
        hub_dir.join("template_meta.tsv"),
        "template_name\tdest_address\tdest_path\tdest_user\tdest_secret\n",
    )
    .unwrap();

    let settings = Settings {
        resources_path: resources.path().to_path_buf(),
        ..Settings::default()
    };
    let connector = MockConnector::new();
    let service = Service::new(
        settings,
        Arc::new(MemoryStore::new()),
        Arc::new(connector.clone()),
    );

    service.bootstrap_root().await.unwrap();
    service.register("svc", Some("PORT=9090\n")).await.unwrap();
    let report = service.deploy("svc", "app.conf").await.unwrap();

    assert_eq!(
        connector.transport().file("/etc/app.conf").as_deref(),
        Some("port=9090\nregistry=10.0.0.9:5000\n")
    );
    assert_eq!(report.backup_path, None);

    // The channel was opened against the rendered template entry.
    let connects = connector.connects();
    assert_eq!(connects.len(), 1);
    assert_eq!(connects[0].address, "10.0.0.1:22");
    assert_eq!(connects[0].user, "deploy");

    // Deploying an unknown template is a data error, not a crash.
    let err = service.deploy("svc", "nope.conf").await.unwrap_err();
    assert!(matches!(err, ServiceError::TemplateNotFound { .. }));
}
