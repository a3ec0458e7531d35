//! Machine configuration model and assembly.
//!
//! [`VmOptions`] is the raw input record: descriptor strings, sizing and
//! paths as the operator supplied them. [`VmOptions::assemble`] runs the
//! validation pipeline and produces the immutable [`MachineConfig`] aggregate
//! that the lifecycle orchestrator hands to the VMM supervisor.

pub mod drive;
pub mod metadata;
pub mod net;
pub mod vsock;

pub use drive::{DriveSpec, ROOT_DRIVE_ID};
pub use net::NicSpec;
pub use vsock::VsockSpec;

use crate::errors::{ConfigError, Result};
use crate::jailer::JailerOptions;
use crate::resources::{FifoRequest, ReleaseStack, fifo, socket};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Built-in defaults matching the historical command-line defaults.
pub mod defaults {
    /// Kernel image looked up relative to the working directory.
    pub const KERNEL_IMAGE: &str = "./vmlinux";

    /// Kernel command line for a serial-console microVM guest.
    pub const KERNEL_ARGS: &str = "ro console=ttyS0 noapic reboot=k panic=1 pci=off nomodules";

    pub const VCPU_COUNT: u32 = 1;

    pub const MEM_SIZE_MIB: u32 = 512;
}

/// VMM log verbosity, forwarded to the supervisor as a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    #[default]
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warning" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(ConfigError::UnknownLogLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CPU template applied by the VMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuTemplate {
    C3,
    T2,
}

impl CpuTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            CpuTemplate::C3 => "C3",
            CpuTemplate::T2 => "T2",
        }
    }
}

impl FromStr for CpuTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c3" => Ok(CpuTemplate::C3),
            "t2" => Ok(CpuTemplate::T2),
            _ => Err(ConfigError::UnknownCpuTemplate(s.to_string())),
        }
    }
}

impl std::fmt::Display for CpuTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CPU and memory sizing for the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSizing {
    pub vcpu_count: u32,
    pub mem_size_mib: u32,
    pub cpu_template: Option<CpuTemplate>,
    pub ht_enabled: bool,
}

/// Raw user-supplied options for one VM run.
///
/// Descriptor fields carry the undecoded strings; [`VmOptions::assemble`]
/// turns them into typed records.
#[derive(Debug, Clone)]
pub struct VmOptions {
    /// Explicit VMM binary path; when unset the binary is looked up on $PATH.
    pub vmm_binary: Option<PathBuf>,
    pub kernel_image: PathBuf,
    pub kernel_args: String,
    pub initrd_path: Option<PathBuf>,
    /// Path to the root disk image. Not stat-checked at assembly time.
    pub root_drive: PathBuf,
    pub root_partuuid: Option<String>,
    /// Additional drives as `<path>:ro` / `<path>:rw` descriptors.
    pub additional_drives: Vec<String>,
    /// NIC descriptors as `DEVICE/MACADDR`.
    pub nic_configs: Vec<String>,
    /// Vsock descriptors as `PATH:CID`.
    pub vsock_devices: Vec<String>,
    pub log_fifo: Option<PathBuf>,
    pub metrics_fifo: Option<PathBuf>,
    /// Tee the log fifo contents into this file.
    pub log_tee_file: Option<PathBuf>,
    pub log_level: LogLevel,
    pub socket_path: Option<PathBuf>,
    /// Metadata-service payload as inline JSON; wins over `metadata_file`.
    pub metadata: Option<String>,
    pub metadata_file: Option<PathBuf>,
    pub vcpu_count: u32,
    pub cpu_template: Option<CpuTemplate>,
    pub disable_hyperthreading: bool,
    pub mem_size_mib: u32,
    pub jailer: Option<JailerOptions>,
    pub debug: bool,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            vmm_binary: None,
            kernel_image: PathBuf::from(defaults::KERNEL_IMAGE),
            kernel_args: defaults::KERNEL_ARGS.to_string(),
            initrd_path: None,
            root_drive: PathBuf::new(),
            root_partuuid: None,
            additional_drives: Vec::new(),
            nic_configs: Vec::new(),
            vsock_devices: Vec::new(),
            log_fifo: None,
            metrics_fifo: None,
            log_tee_file: None,
            log_level: LogLevel::default(),
            socket_path: None,
            metadata: None,
            metadata_file: None,
            vcpu_count: defaults::VCPU_COUNT,
            cpu_template: None,
            disable_hyperthreading: false,
            mem_size_mib: defaults::MEM_SIZE_MIB,
            jailer: None,
            debug: false,
        }
    }
}

/// The assembled, validated machine configuration.
///
/// Built once per run, immutable thereafter, consumed by the lifecycle
/// orchestrator and handed to the VMM supervisor.
#[derive(Debug)]
pub struct MachineConfig {
    /// Control socket path. `None` when jailer options are present: the
    /// sandboxing wrapper owns the socket path in that mode.
    pub socket_path: Option<PathBuf>,
    pub log_fifo: Option<PathBuf>,
    pub metrics_fifo: Option<PathBuf>,
    pub log_level: LogLevel,
    /// Open tee destination for piped log output.
    pub fifo_log_writer: Option<Arc<File>>,
    pub kernel_image_path: PathBuf,
    pub kernel_args: String,
    pub initrd_path: Option<PathBuf>,
    /// All drives; the root drive is last in the list and carries id "1".
    pub drives: Vec<DriveSpec>,
    pub network_interfaces: Vec<NicSpec>,
    pub vsock_devices: Vec<VsockSpec>,
    pub machine: MachineSizing,
    pub metadata: Option<serde_json::Value>,
    pub jailer: Option<JailerOptions>,
    pub debug: bool,
}

impl VmOptions {
    /// Run the assembly pipeline and produce a [`MachineConfig`].
    ///
    /// Stages run cheapest-first: metadata, NICs, drives, vsocks, fifo
    /// provisioning, socket path. Each stage hands an immutable value to the
    /// next; the first failure returns immediately. Releases already
    /// registered on `releases` stay registered and are drained by the
    /// caller's teardown, never rolled back here.
    pub fn assemble(&self, releases: &mut ReleaseStack) -> Result<MachineConfig> {
        let metadata = metadata::resolve(self.metadata.as_deref(), self.metadata_file.as_deref())?;

        let network_interfaces = net::build_interfaces(&self.nic_configs, metadata.is_some())?;

        let drives = drive::build_drives(
            &self.additional_drives,
            &self.root_drive,
            self.root_partuuid.as_deref(),
        )?;

        let vsock_devices = vsock::parse_vsock_descriptors(&self.vsock_devices)?;

        let fifos = fifo::provision(
            FifoRequest {
                log_fifo: self.log_fifo.as_deref(),
                metrics_fifo: self.metrics_fifo.as_deref(),
                tee_file: self.log_tee_file.as_deref(),
            },
            releases,
        )?;

        let socket_path = match (&self.socket_path, &self.jailer) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(_)) => None,
            (None, None) => Some(socket::generate_socket_path()?),
        };

        Ok(MachineConfig {
            socket_path,
            log_fifo: fifos.log_fifo,
            metrics_fifo: fifos.metrics_fifo,
            log_level: self.log_level,
            fifo_log_writer: fifos.tee_writer,
            kernel_image_path: self.kernel_image.clone(),
            kernel_args: self.kernel_args.clone(),
            initrd_path: self.initrd_path.clone(),
            drives,
            network_interfaces,
            vsock_devices,
            machine: MachineSizing {
                vcpu_count: self.vcpu_count,
                mem_size_mib: self.mem_size_mib,
                cpu_template: self.cpu_template,
                ht_enabled: !self.disable_hyperthreading,
            },
            metadata,
            jailer: self.jailer.clone(),
            debug: self.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FireliteError, ResourceError};
    use std::path::Path;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_round_trip() {
        for level in [
            LogLevel::Error,
            LogLevel::Warning,
            LogLevel::Info,
            LogLevel::Debug,
        ] {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
        }
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_cpu_template_round_trip() {
        assert_eq!("C3".parse::<CpuTemplate>().unwrap(), CpuTemplate::C3);
        assert_eq!("t2".parse::<CpuTemplate>().unwrap(), CpuTemplate::T2);
        assert!("Z9".parse::<CpuTemplate>().is_err());
    }

    #[test]
    fn test_assemble_invalid_metadata_short_circuits() {
        let options = VmOptions {
            metadata: Some("{ invalid:json".to_string()),
            nic_configs: vec!["also-invalid".to_string()],
            ..Default::default()
        };

        let mut releases = ReleaseStack::new();
        let err = options.assemble(&mut releases).unwrap_err();
        // Metadata parses before the NIC descriptors.
        assert!(matches!(
            err,
            FireliteError::Config(ConfigError::InvalidMetadata(_))
        ));
        assert!(releases.is_empty());
    }

    #[test]
    fn test_assemble_invalid_nic_before_drives() {
        let options = VmOptions {
            nic_configs: vec!["no-slash".to_string()],
            additional_drives: vec!["/no-suffix".to_string()],
            ..Default::default()
        };

        let err = options.assemble(&mut ReleaseStack::new()).unwrap_err();
        assert!(matches!(
            err,
            FireliteError::Config(ConfigError::MalformedNic)
        ));
    }

    #[test]
    fn test_assemble_conflicting_fifo_options() {
        let options = VmOptions {
            log_fifo: Some(PathBuf::from("b")),
            log_tee_file: Some(PathBuf::from("a")),
            ..Default::default()
        };

        let err = options.assemble(&mut ReleaseStack::new()).unwrap_err();
        assert!(matches!(
            err,
            FireliteError::Resource(ResourceError::ConflictingLogOptions)
        ));
    }

    #[test]
    fn test_assemble_explicit_socket_path_wins() {
        let options = VmOptions {
            socket_path: Some(PathBuf::from("/some/path/here")),
            ..Default::default()
        };

        let config = options.assemble(&mut ReleaseStack::new()).unwrap();
        assert_eq!(config.socket_path.as_deref(), Some(Path::new("/some/path/here")));
        assert!(config.log_fifo.is_none());
        assert!(config.metrics_fifo.is_none());
        assert!(config.fifo_log_writer.is_none());
    }

    #[test]
    fn test_assemble_jailer_owns_socket_path() {
        let options = VmOptions {
            jailer: Some(crate::jailer::JailerOptions::new(
                "vm-1",
                1000,
                1000,
                "/usr/bin/vmm",
            )),
            ..Default::default()
        };

        let config = options.assemble(&mut ReleaseStack::new()).unwrap();
        assert!(config.socket_path.is_none());
        assert!(config.jailer.is_some());
    }

    #[test]
    fn test_assemble_metadata_enables_metadata_service_on_nics() {
        let options = VmOptions {
            nic_configs: vec!["valid/things".to_string()],
            metadata: Some("42".to_string()),
            ..Default::default()
        };

        let config = options.assemble(&mut ReleaseStack::new()).unwrap();
        assert_eq!(config.network_interfaces.len(), 1);
        assert!(config.network_interfaces[0].allow_metadata_service);
        assert_eq!(config.metadata, Some(serde_json::json!(42)));
    }

    #[test]
    fn test_assemble_without_metadata_disables_metadata_service() {
        let options = VmOptions {
            nic_configs: vec!["valid/things".to_string()],
            ..Default::default()
        };

        let config = options.assemble(&mut ReleaseStack::new()).unwrap();
        assert!(!config.network_interfaces[0].allow_metadata_service);
        assert!(config.metadata.is_none());
    }

    #[test]
    fn test_assemble_end_to_end() {
        let extra_drive = NamedTempFile::new().unwrap();
        let options = VmOptions {
            additional_drives: vec![format!("{}:rw", extra_drive.path().display())],
            root_drive: PathBuf::from("/tmp/root-drive"),
            root_partuuid: Some("U".to_string()),
            ..Default::default()
        };

        let mut releases = ReleaseStack::new();
        let config = options.assemble(&mut releases).unwrap();

        assert_eq!(config.drives.len(), 2);

        let extra = &config.drives[0];
        assert_eq!(extra.drive_id, "2");
        assert_eq!(extra.path_on_host, extra_drive.path());
        assert!(!extra.is_read_only);
        assert!(!extra.is_root_device);

        let root = &config.drives[1];
        assert_eq!(root.drive_id, "1");
        assert_eq!(root.path_on_host, Path::new("/tmp/root-drive"));
        assert!(root.is_root_device);
        assert_eq!(root.partuuid.as_deref(), Some("U"));

        assert!(config.network_interfaces.is_empty());
        assert!(config.vsock_devices.is_empty());
        assert!(config.log_fifo.is_none());
        assert!(config.metrics_fifo.is_none());
        assert!(releases.is_empty(), "nothing transient was provisioned");

        let socket = config.socket_path.expect("socket path generated");
        let name = socket.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(crate::resources::socket::SOCKET_FILE_PREFIX));
        assert!(socket.parent().unwrap().is_dir());

        assert_eq!(config.machine.vcpu_count, 1);
        assert_eq!(config.machine.mem_size_mib, 512);
        assert!(config.machine.ht_enabled);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_assemble_generated_fifo_registers_release() {
        let options = VmOptions {
            metrics_fifo: Some(PathBuf::from("/run/vm/metrics.pipe")),
            socket_path: Some(PathBuf::from("/tmp/vm.sock")),
            ..Default::default()
        };

        let mut releases = ReleaseStack::new();
        let config = options.assemble(&mut releases).unwrap();

        let log = config.log_fifo.expect("log fifo generated");
        assert!(log.parent().unwrap().is_dir());
        assert_eq!(releases.len(), 1);

        releases.release_all();
        assert!(!log.parent().unwrap().exists());
    }

    #[test]
    fn test_assemble_disable_hyperthreading() {
        let options = VmOptions {
            disable_hyperthreading: true,
            socket_path: Some(PathBuf::from("/tmp/vm.sock")),
            ..Default::default()
        };

        let config = options.assemble(&mut ReleaseStack::new()).unwrap();
        assert!(!config.machine.ht_enabled);
    }
}
