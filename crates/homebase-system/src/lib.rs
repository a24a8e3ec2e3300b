//! Host hardware detection for Homebase.
//!
//! This crate inspects the machine once at startup and derives the
//! generation parameters (threads, context window, batch size, GPU hints)
//! that every request in the process reuses.
//!
//! ## Usage
//!
//! ```ignore
//! use homebase_system::{HostSettings, SystemProbe};
//!
//! let settings = HostSettings::detect(&SystemProbe::current());
//! println!("{}", settings.config().context_size);
//! ```

mod error;
mod probe;
mod profile;
mod selector;

pub use error::SystemError;
pub use probe::{AcceleratorProbe, FixedProbe, SystemProbe, AMD_PROBE_TOOL, NVIDIA_PROBE_TOOL};
pub use profile::{AcceleratorKind, HardwareProfile, OsFamily};
pub use selector::{ConfigSelector, GenerationConfig, HostSettings, OptionValue};

/// Thread count used when the CPU count cannot be determined.
pub const FALLBACK_THREAD_COUNT: u32 = 4;
