//! Facility and simulation configuration structures.

use serde::{Deserialize, Serialize};

/// Facility configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// Number of resource units ("cabins") in the pool.
    pub cabins: u32,
}

/// Simulation run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Facility the clients share.
    pub facility: FacilityConfig,
    /// Number of group-A clients to spawn.
    pub clients_a: u32,
    /// Number of group-B clients to spawn.
    pub clients_b: u32,
    /// Upper bound of the random arrival stagger per client, milliseconds.
    pub arrival_stagger_ms: u64,
    /// Minimum hold duration once admitted, milliseconds.
    pub min_hold_ms: u64,
    /// Maximum hold duration once admitted, milliseconds.
    pub max_hold_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        // Mirrors the demo defaults: clients scale with the host, holds are
        // one to three seconds with staggered arrivals.
        let per_group = u32::try_from(num_cpus::get()).unwrap_or(4);
        Self {
            facility: FacilityConfig { cabins: 3 },
            clients_a: per_group,
            clients_b: per_group,
            arrival_stagger_ms: 300,
            min_hold_ms: 1000,
            max_hold_ms: 3000,
        }
    }
}

impl FacilityConfig {
    /// Validate facility configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.cabins == 0 {
            return Err("cabins must be greater than 0".into());
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// Validate the full simulation configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.facility.validate()?;
        if self.clients_a == 0 && self.clients_b == 0 {
            return Err("at least one client must be configured".into());
        }
        if self.max_hold_ms < self.min_hold_ms {
            return Err("max_hold_ms must not be less than min_hold_ms".into());
        }
        Ok(())
    }

    /// Parse a simulation configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_cabins_rejected() {
        let cfg = SimulationConfig {
            facility: FacilityConfig { cabins: 0 },
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().unwrap_err().contains("cabins"));
    }

    #[test]
    fn no_clients_rejected() {
        let cfg = SimulationConfig {
            clients_a: 0,
            clients_b: 0,
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().unwrap_err().contains("client"));
    }

    #[test]
    fn inverted_hold_bounds_rejected() {
        let cfg = SimulationConfig {
            min_hold_ms: 50,
            max_hold_ms: 10,
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().unwrap_err().contains("max_hold_ms"));
    }

    #[test]
    fn parses_json() {
        let cfg = SimulationConfig::from_json_str(
            r#"{
                "facility": { "cabins": 2 },
                "clients_a": 3,
                "clients_b": 4,
                "arrival_stagger_ms": 10,
                "min_hold_ms": 5,
                "max_hold_ms": 20
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.facility.cabins, 2);
        assert_eq!(cfg.clients_b, 4);
    }

    #[test]
    fn invalid_json_surfaces_parse_error() {
        let err = SimulationConfig::from_json_str("{").unwrap_err();
        assert!(err.contains("parse error"));
    }
}
