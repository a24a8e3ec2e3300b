//! Accelerator probes.

use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::profile::{AcceleratorKind, OsFamily};

/// NVIDIA management tool used for detection.
pub const NVIDIA_PROBE_TOOL: &str = "nvidia-smi";

/// AMD management tool used for detection.
pub const AMD_PROBE_TOOL: &str = "rocm-smi";

/// Strategy for discovering which accelerator the host has.
///
/// Implementations must not fail: anything that goes wrong while probing
/// means the accelerator is absent.
pub trait AcceleratorProbe {
    fn detect(&self) -> AcceleratorKind;
}

/// Probe that always reports the same accelerator.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub AcceleratorKind);

impl AcceleratorProbe for FixedProbe {
    fn detect(&self) -> AcceleratorKind {
        self.0
    }
}

/// Probe that inspects the OS/architecture and runs the vendor
/// management tools.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    os_family: OsFamily,
    architecture: String,
    nvidia_tool: String,
    amd_tool: String,
}

impl SystemProbe {
    /// Probe for the machine this process runs on.
    pub fn current() -> Self {
        Self::new(OsFamily::current(), std::env::consts::ARCH)
    }

    /// Probe for an explicit OS family and architecture.
    pub fn new(os_family: OsFamily, architecture: impl Into<String>) -> Self {
        Self {
            os_family,
            architecture: architecture.into(),
            nvidia_tool: NVIDIA_PROBE_TOOL.to_string(),
            amd_tool: AMD_PROBE_TOOL.to_string(),
        }
    }

    /// Use different management tool binaries.
    pub fn with_tools(mut self, nvidia: impl Into<String>, amd: impl Into<String>) -> Self {
        self.nvidia_tool = nvidia.into();
        self.amd_tool = amd.into();
        self
    }

    fn is_arm(&self) -> bool {
        let arch = self.architecture.to_ascii_lowercase();
        arch.contains("arm") || arch.contains("aarch64")
    }
}

impl AcceleratorProbe for SystemProbe {
    fn detect(&self) -> AcceleratorKind {
        let kind = match self.os_family {
            OsFamily::MacOs if self.is_arm() => AcceleratorKind::AppleSilicon,
            OsFamily::Linux => {
                if tool_succeeds(&self.nvidia_tool) {
                    AcceleratorKind::Nvidia
                } else if tool_succeeds(&self.amd_tool) {
                    AcceleratorKind::Amd
                } else {
                    AcceleratorKind::None
                }
            }
            _ => AcceleratorKind::None,
        };

        info!(
            "Detected accelerator: {} ({} / {})",
            kind, self.os_family, self.architecture
        );
        kind
    }
}

/// Run a management tool and report whether it exited successfully.
///
/// A tool that cannot be spawned counts as a failure.
fn tool_succeeds(tool: &str) -> bool {
    let status = Command::new(tool)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) => {
            debug!("{} exited with {}", tool, status);
            status.success()
        }
        Err(e) => {
            debug!("{} could not be run: {}", tool, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_TOOL: &str = "homebase-definitely-not-installed-tool";

    #[test]
    fn test_fixed_probe() {
        assert_eq!(
            FixedProbe(AcceleratorKind::Nvidia).detect(),
            AcceleratorKind::Nvidia
        );
    }

    #[test]
    fn test_apple_silicon() {
        let probe = SystemProbe::new(OsFamily::MacOs, "aarch64");
        assert_eq!(probe.detect(), AcceleratorKind::AppleSilicon);

        let probe = SystemProbe::new(OsFamily::MacOs, "arm64");
        assert_eq!(probe.detect(), AcceleratorKind::AppleSilicon);
    }

    #[test]
    fn test_intel_mac_is_cpu() {
        let probe = SystemProbe::new(OsFamily::MacOs, "x86_64");
        assert_eq!(probe.detect(), AcceleratorKind::None);
    }

    #[test]
    fn test_missing_tools_fall_back_to_cpu() {
        let probe =
            SystemProbe::new(OsFamily::Linux, "x86_64").with_tools(MISSING_TOOL, MISSING_TOOL);
        assert_eq!(probe.detect(), AcceleratorKind::None);
    }

    #[test]
    fn test_windows_never_probes() {
        let probe = SystemProbe::new(OsFamily::Windows, "x86_64").with_tools("true", "true");
        assert_eq!(probe.detect(), AcceleratorKind::None);
    }

    #[cfg(unix)]
    #[test]
    fn test_nvidia_takes_priority() {
        let probe = SystemProbe::new(OsFamily::Linux, "x86_64").with_tools("true", "true");
        assert_eq!(probe.detect(), AcceleratorKind::Nvidia);
    }

    #[cfg(unix)]
    #[test]
    fn test_amd_after_failed_nvidia() {
        let probe = SystemProbe::new(OsFamily::Linux, "x86_64").with_tools("false", "true");
        assert_eq!(probe.detect(), AcceleratorKind::Amd);

        let probe = SystemProbe::new(OsFamily::Linux, "x86_64").with_tools(MISSING_TOOL, "true");
        assert_eq!(probe.detect(), AcceleratorKind::Amd);
    }
}
