//! Configuration for the external sandboxing wrapper.
//!
//! When jailer options are present the wrapper binary owns process launch
//! and the control socket path: the assembler skips socket-path generation
//! and the orchestrator skips VMM binary validation. The isolation mechanics
//! (chroot, privilege drop, namespaces) live entirely in the wrapper; this
//! module only produces the invocation it consumes.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_JAILER_BINARY: &str = "jailer";

/// Invocation parameters for the sandboxing wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JailerOptions {
    /// Path to the wrapper binary itself.
    #[serde(default = "default_jailer_binary")]
    pub jailer_binary: PathBuf,

    /// Unique id of the jailed VM, used by the wrapper to key its chroot.
    pub id: String,

    /// UID the wrapper drops to after setup.
    pub uid: u32,

    /// GID the wrapper drops to after setup.
    pub gid: u32,

    /// VMM binary the wrapper execs inside the jail.
    pub exec_file: PathBuf,

    /// Base directory for chroot jails; the wrapper's default applies when
    /// unset.
    #[serde(default)]
    pub chroot_base_dir: Option<PathBuf>,

    /// NUMA node to pin the jailed process to.
    #[serde(default)]
    pub numa_node: Option<i32>,
}

fn default_jailer_binary() -> PathBuf {
    PathBuf::from(DEFAULT_JAILER_BINARY)
}

impl JailerOptions {
    pub fn new(id: impl Into<String>, uid: u32, gid: u32, exec_file: impl Into<PathBuf>) -> Self {
        Self {
            jailer_binary: default_jailer_binary(),
            id: id.into(),
            uid,
            gid,
            exec_file: exec_file.into(),
            chroot_base_dir: None,
            numa_node: None,
        }
    }

    /// Argument vector for the wrapper binary.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--id".into(),
            self.id.clone().into(),
            "--uid".into(),
            self.uid.to_string().into(),
            "--gid".into(),
            self.gid.to_string().into(),
            "--exec-file".into(),
            self.exec_file.clone().into(),
        ];

        if let Some(chroot_base) = &self.chroot_base_dir {
            args.push("--chroot-base-dir".into());
            args.push(chroot_base.clone().into());
        }
        if let Some(node) = self.numa_node {
            args.push("--node".into());
            args.push(node.to_string().into());
        }

        args
    }

    /// The full wrapper command, ready to spawn.
    pub fn command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.jailer_binary);
        cmd.args(self.build_args());
        cmd
    }
}
