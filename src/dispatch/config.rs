//! Tuning knobs for the typed kernel dispatch cache.
//!
//! HVA itself takes no configuration — every call site supplies its own
//! scalars and thresholds directly. TKDC's bucket-count policy is the one
//! piece of this crate that benefits from a reusable config object, mirroring
//! this codebase's convention of a small `*Config` struct with a `Default`
//! impl plus named constructors for common tunings, rather than exposing
//! every field as a constructor argument.
use std::time::Duration;

/// Bucket-count policy constants for [`crate::dispatch::Tkdc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TkdcConfig {
    /// Capacity the cache grows to on its very first insert.
    pub initial: usize,
    /// The "home" capacity shrinking never goes below.
    pub default: usize,
    /// The ceiling capacity growth never exceeds.
    pub maximum: usize,
}

impl Default for TkdcConfig {
    fn default() -> Self {
        TkdcConfig {
            initial: 16,
            default: 128,
            maximum: 1024,
        }
    }
}

impl TkdcConfig {
    /// A config with a different ceiling, keeping the standard `initial`/
    /// `default` home sizes. Panics in debug builds if `maximum` isn't a
    /// power of two at least as large as `default`.
    pub fn bounded(maximum: usize) -> Self {
        let cfg = TkdcConfig {
            maximum,
            ..Default::default()
        };
        debug_assert!(maximum.is_power_of_two());
        debug_assert!(maximum >= cfg.default);
        cfg
    }

    pub(crate) fn fast_growth_bound(&self, capacity: usize) -> Duration {
        Duration::from_secs_f64((capacity as f64 / 128.0) / 1000.0)
    }

    pub(crate) fn slow_growth_bound(&self, capacity: usize) -> Duration {
        Duration::from_secs_f64((capacity as f64 * 16.0) / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_constants() {
        let cfg = TkdcConfig::default();
        assert_eq!(cfg.initial, 16);
        assert_eq!(cfg.default, 128);
        assert_eq!(cfg.maximum, 1024);
    }

    #[test]
    fn bounded_keeps_initial_and_default_home_sizes() {
        let cfg = TkdcConfig::bounded(4096);
        assert_eq!(cfg.initial, 16);
        assert_eq!(cfg.default, 128);
        assert_eq!(cfg.maximum, 4096);
    }

    #[test]
    fn growth_bounds_scale_with_capacity() {
        let cfg = TkdcConfig::default();
        assert!(cfg.fast_growth_bound(128) < cfg.fast_growth_bound(1024));
        assert!(cfg.slow_growth_bound(128) < cfg.slow_growth_bound(1024));
    }
}
