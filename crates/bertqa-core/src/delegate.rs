//! Hardware acceleration delegate selection.
//!
//! The engine can run on a GPU delegate, on the platform's neural network
//! accelerator (NNAPI), or on a fixed-size CPU thread pool. Which one is used is
//! decided once per model load by [`select_delegate`], a pure function of the
//! device's reported capabilities.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Minimum platform version (Android 8.1, API level 27) that ships NNAPI.
pub const NNAPI_MIN_PLATFORM_VERSION: u32 = 27;

/// Thread count used when neither accelerator is available.
pub const CPU_FALLBACK_THREADS: usize = 4;

/// Acceleration backend the engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegate {
    Gpu,
    Nnapi,
    Cpu { num_threads: usize },
}

impl fmt::Display for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu => f.write_str("gpu"),
            Self::Nnapi => f.write_str("nnapi"),
            Self::Cpu { num_threads } => write!(f, "cpu:{num_threads}"),
        }
    }
}

impl FromStr for Delegate {
    type Err = CoreError;

    /// Parses `gpu`, `nnapi`, `cpu` (fallback thread count) or `cpu:<threads>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "gpu" => Ok(Self::Gpu),
            "nnapi" => Ok(Self::Nnapi),
            "cpu" => Ok(Self::Cpu {
                num_threads: CPU_FALLBACK_THREADS,
            }),
            other => other
                .strip_prefix("cpu:")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .map(|num_threads| Self::Cpu { num_threads })
                .ok_or_else(|| CoreError::UnknownDelegate(s.to_string())),
        }
    }
}

/// What the device reports about its acceleration support.
pub trait DeviceCapabilities {
    /// Whether the GPU delegate is supported on this device.
    fn gpu_delegate_supported(&self) -> bool;

    /// Platform (OS API) version of the device.
    fn platform_version(&self) -> u32;
}

/// Static snapshot of device capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceProfile {
    pub gpu_delegate_supported: bool,
    pub platform_version: u32,
}

impl DeviceCapabilities for DeviceProfile {
    fn gpu_delegate_supported(&self) -> bool {
        self.gpu_delegate_supported
    }

    fn platform_version(&self) -> u32 {
        self.platform_version
    }
}

/// Thresholds used by [`select_delegate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegatePolicy {
    pub nnapi_min_platform_version: u32,
    pub cpu_threads: usize,
}

impl Default for DelegatePolicy {
    fn default() -> Self {
        Self {
            nnapi_min_platform_version: NNAPI_MIN_PLATFORM_VERSION,
            cpu_threads: CPU_FALLBACK_THREADS,
        }
    }
}

/// Pick a delegate in priority order: GPU, then NNAPI, then CPU threads.
pub fn select_delegate(caps: &impl DeviceCapabilities, policy: &DelegatePolicy) -> Delegate {
    if caps.gpu_delegate_supported() {
        Delegate::Gpu
    } else if caps.platform_version() >= policy.nnapi_min_platform_version {
        Delegate::Nnapi
    } else {
        Delegate::Cpu {
            num_threads: policy.cpu_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(gpu: bool, version: u32) -> DeviceProfile {
        DeviceProfile {
            gpu_delegate_supported: gpu,
            platform_version: version,
        }
    }

    #[test]
    fn gpu_wins_when_supported() {
        let policy = DelegatePolicy::default();
        assert_eq!(select_delegate(&profile(true, 21), &policy), Delegate::Gpu);
        assert_eq!(select_delegate(&profile(true, 34), &policy), Delegate::Gpu);
    }

    #[test]
    fn nnapi_when_platform_new_enough() {
        let policy = DelegatePolicy::default();
        assert_eq!(select_delegate(&profile(false, 27), &policy), Delegate::Nnapi);
        assert_eq!(select_delegate(&profile(false, 33), &policy), Delegate::Nnapi);
    }

    #[test]
    fn cpu_fallback_uses_four_threads() {
        let policy = DelegatePolicy::default();
        assert_eq!(
            select_delegate(&profile(false, 26), &policy),
            Delegate::Cpu { num_threads: 4 }
        );
        assert_eq!(
            select_delegate(&profile(false, 0), &policy),
            Delegate::Cpu { num_threads: 4 }
        );
    }

    #[test]
    fn selection_is_deterministic() {
        let policy = DelegatePolicy::default();
        let caps = profile(false, 26);
        let first = select_delegate(&caps, &policy);
        for _ in 0..10 {
            assert_eq!(select_delegate(&caps, &policy), first);
        }
    }

    #[test]
    fn custom_policy_thresholds() {
        let policy = DelegatePolicy {
            nnapi_min_platform_version: 30,
            cpu_threads: 2,
        };
        assert_eq!(
            select_delegate(&profile(false, 29), &policy),
            Delegate::Cpu { num_threads: 2 }
        );
        assert_eq!(select_delegate(&profile(false, 30), &policy), Delegate::Nnapi);
    }

    #[test]
    fn parse_delegates() {
        assert_eq!("gpu".parse::<Delegate>().unwrap(), Delegate::Gpu);
        assert_eq!("NNAPI".parse::<Delegate>().unwrap(), Delegate::Nnapi);
        assert_eq!(
            "cpu".parse::<Delegate>().unwrap(),
            Delegate::Cpu { num_threads: 4 }
        );
        assert_eq!(
            "cpu:8".parse::<Delegate>().unwrap(),
            Delegate::Cpu { num_threads: 8 }
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("tpu".parse::<Delegate>().is_err());
        assert!("cpu:0".parse::<Delegate>().is_err());
        assert!("cpu:many".parse::<Delegate>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for d in [Delegate::Gpu, Delegate::Nnapi, Delegate::Cpu { num_threads: 3 }] {
            assert_eq!(d.to_string().parse::<Delegate>().unwrap(), d);
        }
    }
}
