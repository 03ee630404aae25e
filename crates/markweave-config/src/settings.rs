use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Family};

/// Largest buffer (in chars) that may live on the call stack.
pub const STACK_ALLOC_CEILING: usize = 1024;

/// Largest buffer (in chars) the shared pool will hand out.
pub const POOLED_ARRAY_CEILING: usize = 1 << 20;

/// Largest buffer (in chars) any builder or formatter may grow to.
pub const BUFFER_LENGTH_CEILING: usize = 1 << 28;

/// Buffer sizing and growth thresholds for one [`Family`].
///
/// All lengths are counted in `char`s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilySettings {
    /// Capacity of the first attempt when no better estimate exists.
    pub initial_buffer_length: usize,
    /// Capacity past which growth stops and the attempt fails.
    pub max_buffer_length: usize,
    /// Multiplier applied to the capacity after each failed attempt.
    pub growth_factor: f64,
    /// Requests up to this size are served from the call stack.
    pub max_stack_alloc_length: usize,
    /// Requests up to this size are served from the shared pool.
    pub max_pooled_array_length: usize,
}

impl FamilySettings {
    pub const fn defaults_for(family: Family) -> Self {
        match family {
            Family::Builder => Self::new(256, 16 * 1024 * 1024, 2.0, 512, POOLED_ARRAY_CEILING),
            Family::Integer => Self::new(8, 256, 2.0, 256, 4096),
            Family::Float => Self::new(24, 1024, 2.0, 512, 4096),
            Family::Temporal => Self::new(32, 512, 2.0, 256, 4096),
            Family::Identifier => Self::new(40, 256, 2.0, 256, 4096),
            Family::Enumeration => Self::new(16, 4096, 2.0, 256, 4096),
        }
    }

    const fn new(
        initial_buffer_length: usize,
        max_buffer_length: usize,
        growth_factor: f64,
        max_stack_alloc_length: usize,
        max_pooled_array_length: usize,
    ) -> Self {
        Self {
            initial_buffer_length,
            max_buffer_length,
            growth_factor,
            max_stack_alloc_length,
            max_pooled_array_length,
        }
    }

    /// Checks every hard invariant, reporting the first violation.
    pub fn validate(&self, family: Family) -> Result<(), ConfigError> {
        let lengths = [
            ("initial_buffer_length", self.initial_buffer_length),
            ("max_buffer_length", self.max_buffer_length),
            ("max_stack_alloc_length", self.max_stack_alloc_length),
            ("max_pooled_array_length", self.max_pooled_array_length),
        ];
        for (name, value) in lengths {
            if value == 0 {
                return Err(ConfigError::invalid(family, format!("{name} must be positive")));
            }
        }

        if !self.growth_factor.is_finite() || self.growth_factor <= 1.0 {
            return Err(ConfigError::invalid(
                family,
                format!("growth_factor must be greater than 1.0, got {}", self.growth_factor),
            ));
        }

        // The first growth step must make progress on its own.
        let grown = (self.initial_buffer_length as f64 * self.growth_factor).floor();
        if grown <= self.initial_buffer_length as f64 {
            return Err(ConfigError::invalid(
                family,
                format!(
                    "growth_factor {} does not grow initial_buffer_length {}",
                    self.growth_factor, self.initial_buffer_length
                ),
            ));
        }

        if self.initial_buffer_length > self.max_buffer_length {
            return Err(ConfigError::invalid(
                family,
                format!(
                    "initial_buffer_length {} exceeds max_buffer_length {}",
                    self.initial_buffer_length, self.max_buffer_length
                ),
            ));
        }
        if self.max_buffer_length > BUFFER_LENGTH_CEILING {
            return Err(ConfigError::invalid(
                family,
                format!(
                    "max_buffer_length {} exceeds the ceiling of {BUFFER_LENGTH_CEILING}",
                    self.max_buffer_length
                ),
            ));
        }
        if self.max_stack_alloc_length > self.max_pooled_array_length {
            return Err(ConfigError::invalid(
                family,
                format!(
                    "max_stack_alloc_length {} exceeds max_pooled_array_length {}",
                    self.max_stack_alloc_length, self.max_pooled_array_length
                ),
            ));
        }
        if self.max_stack_alloc_length > STACK_ALLOC_CEILING {
            return Err(ConfigError::invalid(
                family,
                format!(
                    "max_stack_alloc_length {} exceeds the ceiling of {STACK_ALLOC_CEILING}",
                    self.max_stack_alloc_length
                ),
            ));
        }
        if self.max_pooled_array_length > POOLED_ARRAY_CEILING {
            return Err(ConfigError::invalid(
                family,
                format!(
                    "max_pooled_array_length {} exceeds the ceiling of {POOLED_ARRAY_CEILING}",
                    self.max_pooled_array_length
                ),
            ));
        }

        Ok(())
    }

    /// Values that are legal but probably a mistake.
    pub fn warnings(&self, family: Family) -> Vec<SettingsWarning> {
        let mut out = Vec::new();
        if self.initial_buffer_length < 4 {
            out.push(SettingsWarning::new(
                family,
                WarningKind::LowInitialLength(self.initial_buffer_length),
            ));
        }
        if self.max_buffer_length > 1 << 26 {
            out.push(SettingsWarning::new(
                family,
                WarningKind::HighMaxBufferLength(self.max_buffer_length),
            ));
        }
        if self.growth_factor < 1.25 {
            out.push(SettingsWarning::new(
                family,
                WarningKind::SlowGrowth(self.growth_factor),
            ));
        } else if self.growth_factor > 4.0 {
            out.push(SettingsWarning::new(
                family,
                WarningKind::AggressiveGrowth(self.growth_factor),
            ));
        }
        if self.max_stack_alloc_length < 32 {
            out.push(SettingsWarning::new(
                family,
                WarningKind::LowStackThreshold(self.max_stack_alloc_length),
            ));
        }
        out
    }

    /// Capacity for the attempt after one of `current` chars failed.
    ///
    /// Always strictly larger than `current` and never above
    /// `max_buffer_length`; `None` once the maximum has been tried.
    pub fn next_capacity(&self, current: usize) -> Option<usize> {
        if current >= self.max_buffer_length {
            return None;
        }
        let grown = (current as f64 * self.growth_factor).ceil();
        let grown = if grown >= self.max_buffer_length as f64 {
            self.max_buffer_length
        } else {
            grown as usize
        };
        Some(grown.max(current + 1).min(self.max_buffer_length))
    }
}

impl Default for FamilySettings {
    fn default() -> Self {
        Self::defaults_for(Family::Builder)
    }
}

/// A soft, non-fatal remark about a settings record.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsWarning {
    pub family: Family,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    LowInitialLength(usize),
    HighMaxBufferLength(usize),
    SlowGrowth(f64),
    AggressiveGrowth(f64),
    LowStackThreshold(usize),
}

impl SettingsWarning {
    fn new(family: Family, kind: WarningKind) -> Self {
        Self { family, kind }
    }
}

impl fmt::Display for SettingsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::LowInitialLength(v) => write!(
                f,
                "{}: initial_buffer_length {v} is unusually low and will cause many retries",
                self.family
            ),
            WarningKind::HighMaxBufferLength(v) => write!(
                f,
                "{}: max_buffer_length {v} is unusually high",
                self.family
            ),
            WarningKind::SlowGrowth(v) => write!(
                f,
                "{}: growth_factor {v} grows slowly and will cause many retries",
                self.family
            ),
            WarningKind::AggressiveGrowth(v) => write!(
                f,
                "{}: growth_factor {v} over-allocates aggressively",
                self.family
            ),
            WarningKind::LowStackThreshold(v) => write!(
                f,
                "{}: max_stack_alloc_length {v} pushes small buffers to the pool",
                self.family
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid_for_every_family() {
        for family in Family::ALL {
            let settings = FamilySettings::defaults_for(family);
            assert!(settings.validate(family).is_ok(), "{family} defaults rejected");
            assert!(settings.warnings(family).is_empty(), "{family} defaults warn");
        }
    }

    #[rstest]
    #[case::zero_initial(|s: &mut FamilySettings| s.initial_buffer_length = 0)]
    #[case::zero_max(|s: &mut FamilySettings| s.max_buffer_length = 0)]
    #[case::zero_stack(|s: &mut FamilySettings| s.max_stack_alloc_length = 0)]
    #[case::zero_pooled(|s: &mut FamilySettings| s.max_pooled_array_length = 0)]
    #[case::growth_one(|s: &mut FamilySettings| s.growth_factor = 1.0)]
    #[case::growth_below_one(|s: &mut FamilySettings| s.growth_factor = 0.5)]
    #[case::growth_nan(|s: &mut FamilySettings| s.growth_factor = f64::NAN)]
    #[case::initial_above_max(|s: &mut FamilySettings| s.initial_buffer_length = s.max_buffer_length + 1)]
    #[case::stack_above_pooled(|s: &mut FamilySettings| s.max_stack_alloc_length = s.max_pooled_array_length + 1)]
    #[case::stack_above_ceiling(|s: &mut FamilySettings| {
        s.max_pooled_array_length = 4096;
        s.max_stack_alloc_length = STACK_ALLOC_CEILING + 1;
    })]
    #[case::pooled_above_ceiling(|s: &mut FamilySettings| s.max_pooled_array_length = POOLED_ARRAY_CEILING + 1)]
    #[case::max_above_ceiling(|s: &mut FamilySettings| s.max_buffer_length = BUFFER_LENGTH_CEILING + 1)]
    fn rejects_invalid_records(#[case] mutate: fn(&mut FamilySettings)) {
        let mut settings = FamilySettings::default();
        mutate(&mut settings);
        assert!(matches!(
            settings.validate(Family::Builder),
            Err(ConfigError::InvalidConfiguration { family: Family::Builder, .. })
        ));
    }

    #[test]
    fn rejects_growth_that_cannot_progress_from_initial_length() {
        let mut settings = FamilySettings::default();
        settings.initial_buffer_length = 2;
        settings.growth_factor = 1.2;

        // floor(2 * 1.2) == 2, so the first retry would not grow.
        assert!(settings.validate(Family::Builder).is_err());

        settings.growth_factor = 1.5;
        assert!(settings.validate(Family::Builder).is_ok());
    }

    #[test]
    fn next_capacity_grows_geometrically_and_caps_at_max() {
        let mut settings = FamilySettings::default();
        settings.max_buffer_length = 100;

        assert_eq!(settings.next_capacity(10), Some(20));
        assert_eq!(settings.next_capacity(60), Some(100));
        assert_eq!(settings.next_capacity(100), None);
        assert_eq!(settings.next_capacity(150), None);
    }

    #[test]
    fn next_capacity_always_makes_progress() {
        let mut settings = FamilySettings::default();
        settings.growth_factor = 1.01;

        assert_eq!(settings.next_capacity(1), Some(2));
        assert_eq!(settings.next_capacity(10), Some(11));
    }

    #[test]
    fn warns_about_unusual_values() {
        let settings = FamilySettings {
            initial_buffer_length: 2,
            max_buffer_length: 1 << 27,
            growth_factor: 8.0,
            max_stack_alloc_length: 16,
            max_pooled_array_length: 4096,
        };
        let kinds: Vec<_> = settings
            .warnings(Family::Builder)
            .into_iter()
            .map(|w| w.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                WarningKind::LowInitialLength(2),
                WarningKind::HighMaxBufferLength(1 << 27),
                WarningKind::AggressiveGrowth(8.0),
                WarningKind::LowStackThreshold(16),
            ]
        );
    }

    #[test]
    fn warning_message_names_family_and_field() {
        let warning = SettingsWarning::new(Family::Float, WarningKind::SlowGrowth(1.1));
        let message = warning.to_string();
        assert!(message.starts_with("float:"));
        assert!(message.contains("growth_factor 1.1"));
    }
}
