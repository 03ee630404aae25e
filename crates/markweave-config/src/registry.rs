use crate::{ConfigError, Family, FamilySettings, SettingsWarning};

/// Per-family settings, mutable during start-up and then sealed.
///
/// The registry is an explicit context object rather than a global: create
/// it once, adjust it, call [`seal`](Self::seal), then share it (typically
/// behind an `Arc`) with everything that materialises text. Every write is
/// validated against the whole record; a rejected write leaves the registry
/// unchanged.
#[derive(Debug, Clone)]
pub struct SettingsRegistry {
    families: [FamilySettings; Family::ALL.len()],
    sealed: bool,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self {
            families: Family::ALL.map(FamilySettings::defaults_for),
            sealed: false,
        }
    }

    pub fn get(&self, family: Family) -> &FamilySettings {
        &self.families[family.index()]
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Freezes every family. There is no way back.
    pub fn seal(&mut self) {
        if !self.sealed {
            log::info!("Settings registry sealed");
        }
        self.sealed = true;
    }

    /// Applies `change` to a copy of the family's record and stores it if it
    /// passes validation.
    pub fn update<F>(&mut self, family: Family, change: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut FamilySettings),
    {
        if self.sealed {
            return Err(ConfigError::ConfigurationFrozen);
        }

        let mut candidate = *self.get(family);
        change(&mut candidate);
        candidate.validate(family)?;

        for warning in candidate.warnings(family) {
            log::warn!("{warning}");
        }
        log::debug!("Updated {family} settings: {candidate:?}");

        self.families[family.index()] = candidate;
        Ok(())
    }

    pub fn set_initial_buffer_length(
        &mut self,
        family: Family,
        value: usize,
    ) -> Result<(), ConfigError> {
        self.update(family, |s| s.initial_buffer_length = value)
    }

    pub fn set_max_buffer_length(&mut self, family: Family, value: usize) -> Result<(), ConfigError> {
        self.update(family, |s| s.max_buffer_length = value)
    }

    pub fn set_growth_factor(&mut self, family: Family, value: f64) -> Result<(), ConfigError> {
        self.update(family, |s| s.growth_factor = value)
    }

    pub fn set_max_stack_alloc_length(
        &mut self,
        family: Family,
        value: usize,
    ) -> Result<(), ConfigError> {
        self.update(family, |s| s.max_stack_alloc_length = value)
    }

    pub fn set_max_pooled_array_length(
        &mut self,
        family: Family,
        value: usize,
    ) -> Result<(), ConfigError> {
        self.update(family, |s| s.max_pooled_array_length = value)
    }

    /// Soft warnings for every family, in [`Family::ALL`] order.
    pub fn warnings(&self) -> Vec<SettingsWarning> {
        Family::ALL
            .iter()
            .flat_map(|&family| self.get(family).warnings(family))
            .collect()
    }
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
