//! Host hardware profile.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::SystemError;
use crate::probe::AcceleratorProbe;

/// Operating system family of the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    MacOs,
    Linux,
    Windows,
    Other(String),
}

impl OsFamily {
    /// The OS family this binary was built for.
    pub fn current() -> Self {
        Self::from_target(std::env::consts::OS)
    }

    /// Map a Rust target OS string to a family.
    pub fn from_target(os: &str) -> Self {
        match os {
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macOS"),
            Self::Linux => write!(f, "Linux"),
            Self::Windows => write!(f, "Windows"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Kind of compute accelerator available to the model server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AcceleratorKind {
    /// CPU only.
    None,
    /// Apple integrated GPU (Metal).
    AppleSilicon,
    /// NVIDIA discrete GPU (CUDA).
    Nvidia,
    /// AMD discrete GPU (ROCm).
    Amd,
}

impl AcceleratorKind {
    /// Whether a GPU of any kind is present.
    pub fn is_gpu(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for AcceleratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "CPU",
            Self::AppleSilicon => "Apple Silicon",
            Self::Nvidia => "NVIDIA",
            Self::Amd => "AMD",
        };
        f.write_str(name)
    }
}

impl FromStr for AcceleratorKind {
    type Err = SystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "cpu" => Ok(Self::None),
            "apple" | "apple-silicon" | "metal" => Ok(Self::AppleSilicon),
            "nvidia" | "cuda" => Ok(Self::Nvidia),
            "amd" | "rocm" => Ok(Self::Amd),
            _ => Err(SystemError::UnknownAccelerator(s.to_string())),
        }
    }
}

/// Snapshot of the host's hardware characteristics.
///
/// Built once at startup and handed to whoever needs it; nothing re-detects
/// behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareProfile {
    /// Operating system family.
    pub os_family: OsFamily,
    /// CPU architecture (e.g. `x86_64`, `aarch64`).
    pub architecture: String,
    /// Detected accelerator.
    pub accelerator_kind: AcceleratorKind,
    /// Number of logical CPUs, if it could be determined.
    pub cpu_count: Option<u32>,
}

impl HardwareProfile {
    /// Detect the current host using the given accelerator probe.
    pub fn detect(probe: &dyn AcceleratorProbe) -> Self {
        let cpu_count = std::thread::available_parallelism()
            .ok()
            .and_then(|n| u32::try_from(n.get()).ok());

        Self {
            os_family: OsFamily::current(),
            architecture: std::env::consts::ARCH.to_string(),
            accelerator_kind: probe.detect(),
            cpu_count,
        }
    }

    /// Build a profile from known values.
    pub fn new(
        os_family: OsFamily,
        architecture: impl Into<String>,
        accelerator_kind: AcceleratorKind,
        cpu_count: Option<u32>,
    ) -> Self {
        Self {
            os_family,
            architecture: architecture.into(),
            accelerator_kind,
            cpu_count,
        }
    }
}
