//! # markweave-config
//!
//! Buffer sizing and growth settings for markweave, grouped by [`Family`].
//!
//! A [`SettingsRegistry`] starts out with built-in defaults, may be adjusted
//! during start-up (directly or from a TOML [`Config`] file) and is then
//! sealed. Every write is validated; after [`SettingsRegistry::seal`] all
//! writes fail with [`ConfigError::ConfigurationFrozen`].
//!
//! ```
//! use markweave_config::{Family, SettingsRegistry};
//!
//! let mut registry = SettingsRegistry::new();
//! registry.set_initial_buffer_length(Family::Builder, 64).unwrap();
//! registry.seal();
//!
//! assert!(registry.set_growth_factor(Family::Builder, 3.0).is_err());
//! assert_eq!(registry.get(Family::Builder).initial_buffer_length, 64);
//! ```

mod error;
mod family;
mod registry;
mod settings;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use family::Family;
pub use registry::SettingsRegistry;
pub use settings::{
    BUFFER_LENGTH_CEILING, FamilySettings, POOLED_ARRAY_CEILING, STACK_ALLOC_CEILING,
    SettingsWarning, WarningKind,
};

/// Partial settings for one family as written in the config file.
///
/// Missing keys keep the registry's current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_buffer_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_buffer_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_alloc_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pooled_array_length: Option<usize>,
}

impl FamilyOverrides {
    fn apply(&self, settings: &mut FamilySettings) {
        if let Some(v) = self.initial_buffer_length {
            settings.initial_buffer_length = v;
        }
        if let Some(v) = self.max_buffer_length {
            settings.max_buffer_length = v;
        }
        if let Some(v) = self.growth_factor {
            settings.growth_factor = v;
        }
        if let Some(v) = self.max_stack_alloc_length {
            settings.max_stack_alloc_length = v;
        }
        if let Some(v) = self.max_pooled_array_length {
            settings.max_pooled_array_length = v;
        }
    }
}

impl From<FamilySettings> for FamilyOverrides {
    fn from(s: FamilySettings) -> Self {
        Self {
            initial_buffer_length: Some(s.initial_buffer_length),
            max_buffer_length: Some(s.max_buffer_length),
            growth_factor: Some(s.growth_factor),
            max_stack_alloc_length: Some(s.max_stack_alloc_length),
            max_pooled_array_length: Some(s.max_pooled_array_length),
        }
    }
}

/// Settings file contents: one TOML table per family.
///
/// ```toml
/// [builder]
/// initial_buffer_length = 128
/// growth_factor = 1.5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub families: BTreeMap<Family, FamilyOverrides>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        log::info!(
            "Loaded settings for {} families from {}",
            config.families.len(),
            config_path.display()
        );
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markweave");
        PathBuf::from(config_dir.as_ref()).join("settings.toml")
    }

    /// Writes every family's overrides through the registry's validated
    /// setters. Stops at the first rejected family.
    pub fn apply_to(&self, registry: &mut SettingsRegistry) -> Result<(), ConfigError> {
        for (&family, overrides) in &self.families {
            registry.update(family, |settings| overrides.apply(settings))?;
        }
        Ok(())
    }

    /// A fresh, unsealed registry with this config applied over the defaults.
    pub fn to_registry(&self) -> Result<SettingsRegistry, ConfigError> {
        let mut registry = SettingsRegistry::new();
        self.apply_to(&mut registry)?;
        Ok(registry)
    }

    /// Every value of `registry`, spelled out in full.
    pub fn from_registry(registry: &SettingsRegistry) -> Self {
        let families = Family::ALL
            .iter()
            .map(|&family| (family, FamilyOverrides::from(*registry.get(family))))
            .collect();
        Self { families }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markweave/settings.toml"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[builder]
initial_buffer_length = 128
growth_factor = 1.5
"#,
        )
        .unwrap();

        let registry = config.to_registry().unwrap();
        let builder = registry.get(Family::Builder);

        assert_eq!(builder.initial_buffer_length, 128);
        assert_eq!(builder.growth_factor, 1.5);
        assert_eq!(
            builder.max_buffer_length,
            FamilySettings::defaults_for(Family::Builder).max_buffer_length
        );
        assert!(!registry.is_sealed());
    }

    #[test]
    fn test_unknown_family_is_a_parse_error() {
        let result: Result<Config, _> = toml::from_str("[strings]\ngrowth_factor = 2.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        let result: Result<Config, _> = toml::from_str("[float]\ngrowth = 2.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_length_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("settings.toml");
        std::fs::write(&config_file, "[integer]\ninitial_buffer_length = -4\n").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_invalid_values_are_rejected_when_applied() {
        let config: Config = toml::from_str(
            r#"
[integer]
max_stack_alloc_length = 512
max_pooled_array_length = 256
"#,
        )
        .unwrap();

        let result = config.to_registry();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidConfiguration {
                family: Family::Integer,
                ..
            })
        ));
    }

    #[test]
    fn test_apply_to_sealed_registry_fails() {
        let config: Config = toml::from_str("[float]\ngrowth_factor = 3.0\n").unwrap();
        let mut registry = SettingsRegistry::new();
        registry.seal();

        assert!(matches!(
            config.apply_to(&mut registry),
            Err(ConfigError::ConfigurationFrozen)
        ));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("settings.toml");
        let mut registry = SettingsRegistry::new();
        registry.set_initial_buffer_length(Family::Temporal, 48).unwrap();
        let original = Config::from_registry(&registry);

        original.save_to_path(&config_file).unwrap();
        let loaded = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded, original);
        let restored = loaded.to_registry().unwrap();
        assert_eq!(restored.get(Family::Temporal).initial_buffer_length, 48);
    }
}
