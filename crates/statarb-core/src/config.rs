use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Pair, RegimeTier};

/// Ascending VIX cutoffs separating NORMAL/WARNING/HIGH/CRISIS.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VixThresholds {
    pub warning: f64,
    pub high: f64,
    pub crisis: f64,
}

/// Size multiplier carried by each regime tier, in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VixMultipliers {
    pub normal: f64,
    pub warning: f64,
    pub high: f64,
    pub crisis: f64,
}

impl VixMultipliers {
    pub fn for_tier(&self, tier: RegimeTier) -> f64 {
        match tier {
            RegimeTier::Normal => self.normal,
            RegimeTier::Warning => self.warning,
            RegimeTier::High => self.high,
            RegimeTier::Crisis => self.crisis,
        }
    }
}

impl Default for VixMultipliers {
    fn default() -> Self {
        Self {
            normal: 1.0,
            warning: 0.7,
            high: 0.4,
            crisis: 0.0,
        }
    }
}

/// Materialised engine configuration. Built once at initialisation from the
/// flat, enumerated key set of §6; there is no runtime reload (C9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub pairs: Vec<Pair>,
    pub lookback_period: usize,
    pub z_entry: f64,
    pub z_exit: f64,
    pub z_stop: f64,
    pub max_holding_days: i64,
    pub allocation_per_pair: f64,

    pub enable_adf_filter: bool,
    pub adf_pmax: f64,
    pub enable_half_life_filter: bool,
    pub half_life_max_days: f64,

    pub enable_spread_filter: bool,
    pub z_spread_critical: f64,

    pub vix_thresholds: VixThresholds,
    pub vix_multipliers: VixMultipliers,

    pub gross_leverage_max: f64,
}

impl EngineConfig {
    /// Validate the cross-field invariants the spec treats as hard config
    /// errors: entry/exit/stop ordering, positive allocation, ascending VIX
    /// cutoffs, and a non-empty pair universe.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.pairs.is_empty() {
            return Err(EngineError::Config("pairs must not be empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.pairs {
            if !seen.insert(p.name.clone()) {
                return Err(EngineError::Config(format!("duplicate pair name: {}", p.name)));
            }
        }
        if self.lookback_period < 2 {
            return Err(EngineError::Config("lookback_period must be >= 2".into()));
        }
        if !(self.z_stop > self.z_entry && self.z_entry > self.z_exit && self.z_exit >= 0.0) {
            return Err(EngineError::Config(format!(
                "require z_stop > z_entry > z_exit >= 0, got z_stop={}, z_entry={}, z_exit={}",
                self.z_stop, self.z_entry, self.z_exit
            )));
        }
        if self.max_holding_days <= 0 {
            return Err(EngineError::Config("max_holding_days must be positive".into()));
        }
        if !(self.allocation_per_pair > 0.0 && self.allocation_per_pair <= 1.0) {
            return Err(EngineError::Config("allocation_per_pair must be in (0, 1]".into()));
        }
        if self.adf_pmax <= 0.0 || self.adf_pmax >= 1.0 {
            return Err(EngineError::Config("adf_pmax must be in (0, 1)".into()));
        }
        if self.half_life_max_days <= 0.0 {
            return Err(EngineError::Config("half_life_max_days must be positive".into()));
        }
        let t = &self.vix_thresholds;
        if !(t.warning < t.high && t.high < t.crisis) {
            return Err(EngineError::Config(
                "vix_thresholds must be strictly increasing: warning < high < crisis".into(),
            ));
        }
        for (label, m) in [
            ("normal", self.vix_multipliers.normal),
            ("warning", self.vix_multipliers.warning),
            ("high", self.vix_multipliers.high),
            ("crisis", self.vix_multipliers.crisis),
        ] {
            if !(0.0..=1.0).contains(&m) {
                return Err(EngineError::Config(format!(
                    "vix_multipliers.{label} must be in [0, 1], got {m}"
                )));
            }
        }
        if self.gross_leverage_max <= 0.0 {
            return Err(EngineError::Config("gross_leverage_max must be positive".into()));
        }
        Ok(())
    }

    /// Build from a flat string-keyed map, rejecting unknown keys (§4.9).
    /// Intended for hosts that hand the engine a loosely-typed parameter bag
    /// (e.g. a QuantConnect `Parameters` dictionary) rather than native JSON.
    pub fn from_recognised_keys(raw: &HashMap<String, serde_json::Value>) -> Result<Self, EngineError> {
        const RECOGNISED: &[&str] = &[
            "pairs",
            "lookback_period",
            "z_entry",
            "z_exit",
            "z_stop",
            "max_holding_days",
            "allocation_per_pair",
            "enable_adf_filter",
            "adf_pmax",
            "enable_half_life_filter",
            "half_life_max_days",
            "enable_spread_filter",
            "z_spread_critical",
            "vix_thresholds",
            "vix_multipliers",
            "gross_leverage_max",
        ];
        for key in raw.keys() {
            if !RECOGNISED.contains(&key.as_str()) {
                return Err(EngineError::Config(format!("unrecognised config key: {key}")));
            }
        }
        let value = serde_json::Value::Object(raw.clone().into_iter().collect());
        let config: EngineConfig = serde_json::from_value(value)
            .map_err(|e| EngineError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
