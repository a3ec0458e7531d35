//! Integration tests for configuration assembly and resource teardown.

use firelite::config::{LogLevel, VmOptions};
use firelite::errors::{FireliteError, LifecycleError};
use firelite::resources::ReleaseStack;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use tokio_util::sync::CancellationToken;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Test context with a real backing file for additional drives and a scratch
/// directory for tee output, cleaned up on drop.
struct TestContext {
    drive_file: NamedTempFile,
    scratch: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            drive_file: NamedTempFile::new().expect("drive backing file"),
            scratch: TempDir::new().expect("scratch dir"),
        }
    }

    fn drive_entry(&self, suffix: &str) -> String {
        format!("{}{}", self.drive_file.path().display(), suffix)
    }

    fn options(&self) -> VmOptions {
        VmOptions {
            root_drive: PathBuf::from("/tmp/root-image"),
            socket_path: Some(self.scratch.path().join("vm.sock")),
            ..Default::default()
        }
    }
}

// ============================================================================
// ASSEMBLY
// ============================================================================

#[test]
fn assembly_composes_all_descriptor_kinds() {
    let ctx = TestContext::new();
    let tee = ctx.scratch.path().join("vm.log");

    let options = VmOptions {
        additional_drives: vec![ctx.drive_entry(":rw")],
        root_partuuid: Some("U".to_string()),
        nic_configs: vec!["tap0/aa:bb:cc:dd:ee:ff".to_string()],
        vsock_devices: vec!["/tmp/v.sock:3".to_string()],
        metadata: Some(r#"{"hostname": "vm-1"}"#.to_string()),
        log_tee_file: Some(tee.clone()),
        ..ctx.options()
    };

    let mut releases = ReleaseStack::new();
    let config = options.assemble(&mut releases).unwrap();

    // Drives: additional first, root last with the reserved id.
    assert_eq!(config.drives.len(), 2);
    assert_eq!(config.drives[0].drive_id, "2");
    assert_eq!(config.drives[1].drive_id, "1");
    assert!(config.drives[1].is_root_device);
    assert_eq!(config.drives[1].partuuid.as_deref(), Some("U"));

    // Metadata presence flows into the NIC records.
    assert_eq!(config.network_interfaces.len(), 1);
    assert!(config.network_interfaces[0].allow_metadata_service);
    assert!(config.metadata.is_some());

    assert_eq!(config.vsock_devices.len(), 1);
    assert_eq!(config.vsock_devices[0].cid, 3);

    // The tee request generated both fifo paths in one directory and opened
    // the tee destination.
    let log_fifo = config.log_fifo.as_ref().unwrap();
    let metrics_fifo = config.metrics_fifo.as_ref().unwrap();
    assert_eq!(log_fifo.parent(), metrics_fifo.parent());
    assert!(config.fifo_log_writer.is_some());
    assert!(tee.exists());

    assert_eq!(config.log_level, LogLevel::Debug);

    // One close record for the tee file, one removal for the fifo directory.
    assert_eq!(releases.len(), 2);

    let fifo_dir = log_fifo.parent().unwrap().to_path_buf();
    assert!(fifo_dir.is_dir());
    drop(config);
    releases.release_all();
    assert!(!fifo_dir.exists(), "fifo directory removed by teardown");
    assert!(tee.exists(), "tee file persists after its handle closes");
}

#[test]
fn assembly_failure_keeps_prior_releases_registered() {
    let ctx = TestContext::new();

    // A bad vsock aborts assembly before fifo provisioning runs, so the
    // stack stays empty even though a fifo was requested.
    let options = VmOptions {
        vsock_devices: vec!["bad".to_string()],
        metrics_fifo: Some(PathBuf::from("/run/vm/metrics.pipe")),
        ..ctx.options()
    };

    let mut releases = ReleaseStack::new();
    let err = options.assemble(&mut releases).unwrap_err();
    assert!(matches!(err, FireliteError::Config(_)));
    // Vsock parsing runs before fifo provisioning, so nothing registered.
    assert!(releases.is_empty());

    // Now the other way around: valid vsock, fifo provisioning registers the
    // directory, and the caller's drain removes it.
    let options = VmOptions {
        metrics_fifo: Some(PathBuf::from("/run/vm/metrics.pipe")),
        ..ctx.options()
    };
    let mut releases = ReleaseStack::new();
    let config = options.assemble(&mut releases).unwrap();
    let fifo_dir = config.log_fifo.unwrap().parent().unwrap().to_path_buf();
    assert!(fifo_dir.is_dir());

    releases.release_all();
    assert!(!fifo_dir.exists());
}

// ============================================================================
// LAUNCH FAILURE PATHS
// ============================================================================

#[tokio::test]
async fn launch_fails_cleanly_without_vmm_binary() {
    let ctx = TestContext::new();
    let options = VmOptions {
        vmm_binary: Some(PathBuf::from("/no/such/vmm-binary")),
        ..ctx.options()
    };

    let err = firelite::launch(&options, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FireliteError::Lifecycle(LifecycleError::BinaryNotFound { .. })
    ));
}

#[tokio::test]
async fn launch_surfaces_descriptor_errors() {
    let ctx = TestContext::new();
    let options = VmOptions {
        additional_drives: vec!["/no-suffix".to_string()],
        ..ctx.options()
    };

    let err = firelite::launch(&options, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("suffix"));
}
