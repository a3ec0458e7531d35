//! Command-line flag definitions.

use clap::Parser;
use firelite::config::{CpuTemplate, LogLevel, VmOptions, defaults};
use std::path::PathBuf;

/// Launch and supervise a microVM process.
#[derive(Parser, Debug)]
#[command(name = "firelite", version, about = "Launch and supervise a microVM")]
pub struct Cli {
    /// Path to the VMM binary (defaults to looking it up on PATH)
    #[arg(long = "vmm-binary")]
    pub vmm_binary: Option<PathBuf>,

    /// Path to the kernel image
    #[arg(long = "kernel", default_value = defaults::KERNEL_IMAGE)]
    pub kernel_image: PathBuf,

    /// Kernel commandline
    #[arg(long = "kernel-opts", default_value = defaults::KERNEL_ARGS)]
    pub kernel_args: String,

    /// Path to the initial ramdisk
    #[arg(long = "initrd")]
    pub initrd_path: Option<PathBuf>,

    /// Path to the root disk image
    #[arg(long = "root-drive", required = true)]
    pub root_drive: PathBuf,

    /// Root partition UUID
    #[arg(long = "root-partition")]
    pub root_partuuid: Option<String>,

    /// Path to an additional drive, suffixed with :ro or :rw (repeatable)
    #[arg(long = "add-drive", value_name = "PATH:SUFFIX")]
    pub additional_drives: Vec<String>,

    /// NIC info, specified as DEVICE/MAC (repeatable)
    #[arg(long = "tap-device", value_name = "DEVICE/MAC")]
    pub nic_configs: Vec<String>,

    /// Vsock interface, specified as PATH:CID (repeatable)
    #[arg(long = "vsock-device", value_name = "PATH:CID")]
    pub vsock_devices: Vec<String>,

    /// FIFO for VMM logs
    #[arg(long = "vmm-log-fifo")]
    pub log_fifo: Option<PathBuf>,

    /// FIFO for VMM metrics
    #[arg(long = "metrics-fifo")]
    pub metrics_fifo: Option<PathBuf>,

    /// Pipe the log fifo contents to the specified file
    #[arg(short = 'l', long = "log-tee")]
    pub log_tee_file: Option<PathBuf>,

    /// VMM log verbosity (Error, Warning, Info, Debug)
    #[arg(long = "log-level", default_value = "Debug")]
    pub log_level: LogLevel,

    /// Path for the VMM control socket; defaults to a unique file in the
    /// first existing directory from {$HOME, $TMPDIR, /tmp}
    #[arg(short = 's', long = "socket-path")]
    pub socket_path: Option<PathBuf>,

    /// Metadata for the in-guest metadata service, as inline JSON
    #[arg(long = "metadata")]
    pub metadata: Option<String>,

    /// Read metadata-service JSON from this file (inline --metadata wins)
    #[arg(long = "metadata-file")]
    pub metadata_file: Option<PathBuf>,

    /// Number of CPUs
    #[arg(short = 'c', long = "ncpus", default_value_t = defaults::VCPU_COUNT)]
    pub vcpu_count: u32,

    /// CPU template to apply (C3 or T2)
    #[arg(long = "cpu-template")]
    pub cpu_template: Option<CpuTemplate>,

    /// Disable CPU hyperthreading
    #[arg(short = 't', long = "disable-hyperthreading")]
    pub disable_hyperthreading: bool,

    /// VM memory, in MiB
    #[arg(short = 'm', long = "memory", default_value_t = defaults::MEM_SIZE_MIB)]
    pub mem_size_mib: u32,

    /// Enable debug output
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl Cli {
    pub fn into_options(self) -> VmOptions {
        VmOptions {
            vmm_binary: self.vmm_binary,
            kernel_image: self.kernel_image,
            kernel_args: self.kernel_args,
            initrd_path: self.initrd_path,
            root_drive: self.root_drive,
            root_partuuid: self.root_partuuid,
            additional_drives: self.additional_drives,
            nic_configs: self.nic_configs,
            vsock_devices: self.vsock_devices,
            log_fifo: self.log_fifo,
            metrics_fifo: self.metrics_fifo,
            log_tee_file: self.log_tee_file,
            log_level: self.log_level,
            socket_path: self.socket_path,
            metadata: self.metadata,
            metadata_file: self.metadata_file,
            vcpu_count: self.vcpu_count,
            cpu_template: self.cpu_template,
            disable_hyperthreading: self.disable_hyperthreading,
            mem_size_mib: self.mem_size_mib,
            jailer: None,
            debug: self.debug,
        }
    }
}
