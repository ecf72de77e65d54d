//! Stencil - expression gateway for UI templates
//!
//! Template engines hand every expression they find to an
//! [`ExpressionFactory`], which recognises `$` data paths on its own and
//! routes everything else to the expression provider installed for the
//! template's expression version.

pub mod path;
mod factory;

pub use factory::ExpressionFactory;
pub use path::{value_path, PATH_PREFIX};
pub use stencil_core::{ExprError, Value};
pub use stencil_plugin::{CompiledExpression, DataContext, ExpressionProvider, ExtensionRegistry};

use std::sync::Arc;

/// Main Stencil engine
pub struct Stencil {
    factory: ExpressionFactory,
    default_version: Option<String>,
}

impl Stencil {
    pub fn new(registry: ExtensionRegistry) -> Self {
        Self::with_registry(Arc::new(registry))
    }

    pub fn with_registry(registry: Arc<ExtensionRegistry>) -> Self {
        Self {
            factory: ExpressionFactory::new(registry),
            default_version: None,
        }
    }

    pub fn with_standard_provider() -> Self {
        Self::new(stencil_std::standard_registry())
    }

    /// Version used when a call does not name one.
    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    pub fn factory(&self) -> &ExpressionFactory {
        &self.factory
    }

    pub fn default_version(&self) -> Option<&str> {
        self.default_version.as_deref()
    }

    fn version<'a>(&'a self, version: Option<&'a str>) -> Option<&'a str> {
        version.or(self.default_version.as_deref())
    }

    pub fn is_true(&self, version: Option<&str>, value: &Value) -> Option<bool> {
        self.factory.is_true(self.version(version), value)
    }

    pub fn value_path(&self, expression: &Value) -> Option<String> {
        self.factory.value_path(expression)
    }

    pub fn create(
        &self,
        version: Option<&str>,
        expression: &Value,
    ) -> Result<Option<Box<dyn CompiledExpression>>, ExprError> {
        self.factory.create(self.version(version), expression)
    }

    pub fn resolve(
        &self,
        version: Option<&str>,
        expression: &Value,
        data: &DataContext,
    ) -> Result<Value, ExprError> {
        self.factory.resolve(self.version(version), expression, data)
    }

    pub fn test(
        &self,
        version: Option<&str>,
        expression: &Value,
        data: &DataContext,
    ) -> Result<Option<bool>, ExprError> {
        self.factory.test(self.version(version), expression, data)
    }

    pub fn describe(&self) -> Value {
        self.factory.registry().describe()
    }
}

impl Default for Stencil {
    fn default() -> Self {
        Self::with_standard_provider()
    }
}

/// Build a `Value::Object` from `key: value` pairs.
#[macro_export]
macro_rules! data {
    {} => { $crate::Value::Object(std::collections::BTreeMap::new()) };
    { $($key:ident : $value:expr),* $(,)? } => {{
        let mut map = std::collections::BTreeMap::new();
        $(
            map.insert(stringify!($key).to_string(), $crate::Value::from($value));
        )*
        $crate::Value::Object(map)
    }};
}
