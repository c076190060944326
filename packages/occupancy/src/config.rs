//! Census configuration loading.
//!
//! The default configuration ships as `config/default.toml`, baked into
//! the binary via [`include_str!`]. Callers may load their own TOML with
//! [`parse_config_toml`]; any omitted key falls back to its default.

use ward_census_occupancy_models::CensusConfig;

use crate::CensusError;

/// Default configuration embedded at compile time.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Parses and validates a census configuration from TOML.
///
/// # Errors
///
/// Returns [`CensusError::Config`] if the TOML is malformed, or
/// [`CensusError::InvalidConfig`] if the closure thresholds overlap.
pub fn parse_config_toml(toml_str: &str) -> Result<CensusConfig, CensusError> {
    let mut config: CensusConfig = toml::from_str(toml_str)?;

    config.excluded_beds = config
        .excluded_beds
        .into_iter()
        .map(|bed| bed.to_lowercase())
        .collect();

    let thresholds = &config.thresholds;
    if thresholds.temporary_after_days >= thresholds.permanent_after_days {
        return Err(CensusError::InvalidConfig {
            message: format!(
                "temporary_after_days ({}) must be less than permanent_after_days ({})",
                thresholds.temporary_after_days, thresholds.permanent_after_days
            ),
        });
    }

    Ok(config)
}

/// Returns the embedded default configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (a compile-time guarantee
/// since the file is checked by tests).
#[must_use]
pub fn default_config() -> CensusConfig {
    parse_config_toml(DEFAULT_CONFIG_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse default.toml: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_matches_code_default() {
        assert_eq!(default_config(), CensusConfig::default());
    }

    #[test]
    fn omitted_keys_fall_back_to_defaults() {
        let config = parse_config_toml("include_permanently_closed = false").unwrap();
        assert!(!config.include_permanently_closed);
        assert_eq!(config.thresholds, CensusConfig::default().thresholds);
        assert_eq!(config.excluded_beds, CensusConfig::default().excluded_beds);
    }

    #[test]
    fn lowercases_excluded_beds() {
        let config = parse_config_toml(r#"excluded_beds = ["WAIT", "Chair"]"#).unwrap();
        assert!(config.excluded_beds.contains("wait"));
        assert!(config.excluded_beds.contains("chair"));
        assert_eq!(config.excluded_beds.len(), 2);
    }

    #[test]
    fn partial_thresholds_keep_other_default() {
        let config = parse_config_toml("[thresholds]\npermanent_after_days = 60").unwrap();
        assert_eq!(config.thresholds.permanent_after_days, 60);
        assert_eq!(config.thresholds.temporary_after_days, 2);
    }

    #[test]
    fn rejects_overlapping_thresholds() {
        let err = parse_config_toml(
            "[thresholds]\npermanent_after_days = 2\ntemporary_after_days = 2",
        )
        .unwrap_err();
        assert!(matches!(err, CensusError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = parse_config_toml("excluded_beds = 3").unwrap_err();
        assert!(matches!(err, CensusError::Config(_)));
    }
}
