//! Harness configuration.
//!
//! Every field has a default, so a TOML file only needs the knobs it changes:
//!
//! ```toml
//! # random delays
//! src_delay = 3
//! sink_delay = 5
//! mem_stall_prob = 0.5
//! mem_latency = 3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Default seed of the stall PRNG.
pub const DEFAULT_SEED: u64 = 0xdeadbeef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Cycles the test source waits before offering each message.
    pub src_delay: u32,
    /// Cycles the test sink waits before accepting each message.
    pub sink_delay: u32,
    /// Per-request probability that memory delays acceptance by one cycle.
    pub mem_stall_prob: f64,
    /// Cycles from acceptance to response visibility (>= 1).
    pub mem_latency: u32,
    /// Accelerator response latency (>= 1).
    pub xcel_latency: u32,
    pub seed: u64,
    /// Cycle budget of `TestHarness::run`.
    pub max_cycles: u64,
    /// Flat memory size in bytes, based at address 0.
    pub mem_size: usize,
    /// Capacity of the processor's in-flight request table.
    pub max_inflight: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            src_delay: 0,
            sink_delay: 0,
            mem_stall_prob: 0.0,
            mem_latency: 1,
            xcel_latency: 1,
            seed: DEFAULT_SEED,
            max_cycles: 10_000,
            mem_size: 64 * 1024,
            max_inflight: 4,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Randomized delay preset: source 3, sink 5, stall 0.5, latency 3.
    pub fn rand_delays() -> Self {
        Self {
            src_delay: 3,
            sink_delay: 5,
            mem_stall_prob: 0.5,
            mem_latency: 3,
            ..Self::default()
        }
    }

    pub fn with_src_delay(mut self, cycles: u32) -> Self {
        self.src_delay = cycles;
        self
    }

    pub fn with_sink_delay(mut self, cycles: u32) -> Self {
        self.sink_delay = cycles;
        self
    }

    pub fn with_mem_stall_prob(mut self, prob: f64) -> Self {
        self.mem_stall_prob = prob;
        self
    }

    pub fn with_mem_latency(mut self, cycles: u32) -> Self {
        self.mem_latency = cycles;
        self
    }

    pub fn with_xcel_latency(mut self, cycles: u32) -> Self {
        self.xcel_latency = cycles;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = cycles;
        self
    }

    pub fn with_mem_size(mut self, bytes: usize) -> Self {
        self.mem_size = bytes;
        self
    }

    pub fn with_max_inflight(mut self, records: usize) -> Self {
        self.max_inflight = records;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, SimError> {
        let config: Self = toml::from_str(s).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}: {:?}", path.as_ref().display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&self.mem_stall_prob) {
            return Err(SimError::Config(format!(
                "mem_stall_prob must be within [0, 1], got {}",
                self.mem_stall_prob
            )));
        }
        if self.mem_latency == 0 {
            return Err(SimError::Config("mem_latency must be at least 1".into()));
        }
        if self.xcel_latency == 0 {
            return Err(SimError::Config("xcel_latency must be at least 1".into()));
        }
        if self.max_inflight == 0 || self.max_inflight > 256 {
            return Err(SimError::Config(format!(
                "max_inflight must be within 1..=256, got {}",
                self.max_inflight
            )));
        }
        if self.mem_size == 0 || self.mem_size > u32::MAX as usize {
            return Err(SimError::Config(format!("unsupported mem_size {}", self.mem_size)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.mem_latency, 1);
        assert_eq!(config.seed, 0xdeadbeef);
        assert_eq!(config.mem_size, 65536);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = HarnessConfig::new()
            .with_src_delay(2)
            .with_mem_stall_prob(0.25)
            .with_max_cycles(500);
        assert_eq!(config.src_delay, 2);
        assert_eq!(config.mem_stall_prob, 0.25);
        assert_eq!(config.max_cycles, 500);
        assert_eq!(config.sink_delay, 0);
    }

    #[test]
    fn test_partial_toml() {
        let config = HarnessConfig::from_toml_str("src_delay = 3\nmem_stall_prob = 0.5\n").unwrap();
        assert_eq!(config.src_delay, 3);
        assert_eq!(config.mem_stall_prob, 0.5);
        assert_eq!(config.mem_latency, 1);
    }

    #[test]
    fn test_rand_delays_preset() {
        let config = HarnessConfig::rand_delays();
        assert_eq!((config.src_delay, config.sink_delay, config.mem_latency), (3, 5, 3));
        assert_eq!(config.mem_stall_prob, 0.5);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            HarnessConfig::new().with_mem_stall_prob(1.5).validate(),
            Err(SimError::Config(_))
        ));
        assert!(HarnessConfig::new().with_mem_latency(0).validate().is_err());
        assert!(HarnessConfig::new().with_max_inflight(0).validate().is_err());
        assert!(HarnessConfig::from_toml_str("mem_latency = 0").is_err());
        assert!(HarnessConfig::from_toml_str("mem_latency = \"fast\"").is_err());
    }
}
