//! Generation parameter selection.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::probe::AcceleratorProbe;
use crate::profile::{AcceleratorKind, HardwareProfile};
use crate::FALLBACK_THREAD_COUNT;

/// Value of an accelerator-specific option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(u32),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Performance parameters applied to every generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationConfig {
    pub thread_count: u32,
    pub context_size: u32,
    pub batch_size: u32,
    /// Hint for how many requests the server can serve at once.
    pub parallel_requests: u32,
    pub accelerator_options: IndexMap<String, OptionValue>,
}

impl GenerationConfig {
    /// Baseline every profile starts from.
    fn baseline() -> Self {
        Self {
            thread_count: FALLBACK_THREAD_COUNT,
            context_size: 4096,
            batch_size: 8,
            parallel_requests: 1,
            accelerator_options: IndexMap::new(),
        }
    }

    /// Number of layers to offload to the GPU, if the profile sets one.
    pub fn gpu_layer_count(&self) -> Option<u32> {
        match self.accelerator_options.get("num_gpu") {
            Some(OptionValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Options in the shape the model server expects.
    pub fn runtime_options(&self, accelerator: AcceleratorKind) -> IndexMap<String, OptionValue> {
        let mut options = IndexMap::new();
        options.insert("num_thread".to_string(), self.thread_count.into());
        options.insert("num_ctx".to_string(), self.context_size.into());
        options.insert("num_batch".to_string(), self.batch_size.into());

        let keys: &[&str] = match accelerator {
            AcceleratorKind::Nvidia => &["num_gpu", "gpu_layers"],
            AcceleratorKind::Amd => &["gpu_layers"],
            AcceleratorKind::AppleSilicon => &["metal_device"],
            AcceleratorKind::None => &[],
        };
        for key in keys {
            if let Some(value) = self.accelerator_options.get(*key) {
                options.insert((*key).to_string(), value.clone());
            }
        }

        options
    }
}

/// Per-accelerator values layered on top of the baseline.
struct Overrides {
    thread_count: Option<u32>,
    context_size: u32,
    batch_size: u32,
    parallel_requests: u32,
    options: &'static [(&'static str, StaticValue)],
}

#[derive(Clone, Copy)]
enum StaticValue {
    Int(u32),
    Text(&'static str),
}

impl From<StaticValue> for OptionValue {
    fn from(value: StaticValue) -> Self {
        match value {
            StaticValue::Int(n) => OptionValue::Int(n),
            StaticValue::Text(s) => OptionValue::Text(s.to_string()),
        }
    }
}

const APPLE_SILICON: Overrides = Overrides {
    thread_count: Some(8),
    context_size: 16384,
    batch_size: 32,
    parallel_requests: 3,
    options: &[("metal_device", StaticValue::Text("mps"))],
};

const NVIDIA: Overrides = Overrides {
    thread_count: Some(8),
    context_size: 16384,
    batch_size: 32,
    parallel_requests: 4,
    options: &[
        ("num_gpu", StaticValue::Int(99)),
        ("gpu_layers", StaticValue::Text("auto")),
        ("cuda_device", StaticValue::Text("cuda")),
    ],
};

const AMD: Overrides = Overrides {
    thread_count: Some(8),
    context_size: 8192,
    batch_size: 16,
    parallel_requests: 2,
    options: &[
        ("gpu_layers", StaticValue::Text("auto")),
        ("rocm_device", StaticValue::Text("hip")),
    ],
};

// Thread count comes from the CPU count for CPU-only hosts.
const CPU_ONLY: Overrides = Overrides {
    thread_count: None,
    context_size: 4096,
    batch_size: 8,
    parallel_requests: 1,
    options: &[],
};

/// Maps a hardware profile to generation parameters using a fixed table.
pub struct ConfigSelector;

impl ConfigSelector {
    /// Select the configuration for a profile.
    ///
    /// Pure function of the profile: the same profile always yields the
    /// same configuration.
    pub fn select(profile: &HardwareProfile) -> GenerationConfig {
        let overrides = match profile.accelerator_kind {
            AcceleratorKind::AppleSilicon => &APPLE_SILICON,
            AcceleratorKind::Nvidia => &NVIDIA,
            AcceleratorKind::Amd => &AMD,
            AcceleratorKind::None => &CPU_ONLY,
        };

        let mut config = GenerationConfig::baseline();
        config.thread_count = overrides
            .thread_count
            .or(profile.cpu_count)
            .unwrap_or(FALLBACK_THREAD_COUNT);
        config.context_size = overrides.context_size;
        config.batch_size = overrides.batch_size;
        config.parallel_requests = overrides.parallel_requests;
        for (key, value) in overrides.options {
            config
                .accelerator_options
                .insert((*key).to_string(), (*value).into());
        }

        config
    }
}

/// Hardware profile and the configuration derived from it.
///
/// Construct once at startup and share by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSettings {
    profile: HardwareProfile,
    config: GenerationConfig,
}

impl HostSettings {
    /// Detect the host and select its configuration.
    pub fn detect(probe: &dyn AcceleratorProbe) -> Self {
        Self::from_profile(HardwareProfile::detect(probe))
    }

    /// Select the configuration for a known profile.
    pub fn from_profile(profile: HardwareProfile) -> Self {
        let config = ConfigSelector::select(&profile);
        info!(
            "Selected config: {} threads, ctx {}, batch {}, {} parallel",
            config.thread_count, config.context_size, config.batch_size, config.parallel_requests
        );
        Self { profile, config }
    }

    pub fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Server options for this host.
    pub fn runtime_options(&self) -> IndexMap<String, OptionValue> {
        self.config.runtime_options(self.profile.accelerator_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::OsFamily;

    fn profile(kind: AcceleratorKind, cpus: Option<u32>) -> HardwareProfile {
        HardwareProfile::new(OsFamily::Linux, "x86_64", kind, cpus)
    }

    #[test]
    fn test_nvidia_config() {
        let config = ConfigSelector::select(&profile(AcceleratorKind::Nvidia, Some(16)));
        assert_eq!(config.thread_count, 8);
        assert_eq!(config.context_size, 16384);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.parallel_requests, 4);
        assert_eq!(
            config.accelerator_options.get("gpu_layers"),
            Some(&OptionValue::Text("auto".to_string()))
        );
        assert_eq!(config.gpu_layer_count(), Some(99));
    }

    #[test]
    fn test_amd_config() {
        let config = ConfigSelector::select(&profile(AcceleratorKind::Amd, Some(16)));
        assert_eq!(config.context_size, 8192);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.parallel_requests, 2);
        assert!(config.accelerator_options.contains_key("rocm_device"));
        assert_eq!(config.gpu_layer_count(), None);
    }

    #[test]
    fn test_apple_silicon_config() {
        let profile = HardwareProfile::new(
            OsFamily::MacOs,
            "aarch64",
            AcceleratorKind::AppleSilicon,
            Some(10),
        );
        let config = ConfigSelector::select(&profile);
        assert_eq!(config.thread_count, 8);
        assert_eq!(config.context_size, 16384);
        assert_eq!(config.parallel_requests, 3);
        assert_eq!(
            config.accelerator_options.get("metal_device"),
            Some(&OptionValue::Text("mps".to_string()))
        );
    }

    #[test]
    fn test_cpu_config_uses_cpu_count() {
        let config = ConfigSelector::select(&profile(AcceleratorKind::None, Some(12)));
        assert_eq!(config.thread_count, 12);
        assert_eq!(config.context_size, 4096);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.parallel_requests, 1);
        assert!(config.accelerator_options.is_empty());
    }

    #[test]
    fn test_cpu_config_unknown_cpu_count() {
        let config = ConfigSelector::select(&profile(AcceleratorKind::None, None));
        assert_eq!(config.thread_count, FALLBACK_THREAD_COUNT);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let profile = profile(AcceleratorKind::Nvidia, Some(8));
        assert_eq!(
            ConfigSelector::select(&profile),
            ConfigSelector::select(&profile)
        );
    }

    #[test]
    fn test_runtime_options() {
        let settings = HostSettings::from_profile(profile(AcceleratorKind::Nvidia, Some(8)));
        let options = settings.runtime_options();
        let keys: Vec<&str> = options.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["num_thread", "num_ctx", "num_batch", "num_gpu", "gpu_layers"]
        );
        assert_eq!(options["num_ctx"], OptionValue::Int(16384));

        let settings = HostSettings::from_profile(profile(AcceleratorKind::None, Some(2)));
        assert_eq!(settings.runtime_options().len(), 3);
    }

    #[test]
    fn test_option_value_serializes_untagged() {
        let json = serde_json::to_string(&settings_options()).unwrap();
        assert_eq!(json, r#"{"num_gpu":99,"gpu_layers":"auto"}"#);
    }

    fn settings_options() -> IndexMap<String, OptionValue> {
        let mut map = IndexMap::new();
        map.insert("num_gpu".to_string(), OptionValue::from(99));
        map.insert("gpu_layers".to_string(), OptionValue::from("auto"));
        map
    }
}
