use std::sync::Arc;

use markweave_config::SettingsRegistry;

use crate::builder::StringBuilder;
use crate::error::Result;
use crate::format::{FormatSpec, FormatValue, Locale, ValueNode};
use crate::node::{Fragment, Node};

/// Entry point that threads one sealed [`SettingsRegistry`] through value
/// leaves and builders.
///
/// Constructing a composer seals the registry, so settings cannot change
/// underneath nodes that have already memoised their lengths.
#[derive(Debug, Clone)]
pub struct Composer {
    registry: Arc<SettingsRegistry>,
}

impl Composer {
    pub fn new(mut registry: SettingsRegistry) -> Self {
        registry.seal();
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &SettingsRegistry {
        &self.registry
    }

    pub fn value<T>(&self, value: T) -> Fragment
    where
        T: FormatValue + Send + Sync + 'static,
    {
        self.value_with(value, FormatSpec::default(), Locale::default())
    }

    /// A value leaf using the registry's record for the value's family.
    pub fn value_with<T>(&self, value: T, spec: FormatSpec, locale: Locale) -> Fragment
    where
        T: FormatValue + Send + Sync + 'static,
    {
        let settings = *self.registry.get(T::FAMILY);
        Fragment::leaf(ValueNode::with_format(value, spec, locale).with_settings(settings))
    }

    pub fn builder(&self) -> StringBuilder<'static> {
        StringBuilder::from_registry(&self.registry)
    }

    pub fn render<N: Node + ?Sized>(&self, node: &N) -> Result<String> {
        self.builder().render(node)
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(SettingsRegistry::new())
    }
}
