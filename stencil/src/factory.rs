//! Expression factory
//!
//! Entry point for the template engine. Routes every call to the provider
//! the registry holds for the expression version and reports "nothing to
//! do" as an absent result: no provider installed, no expression given, or
//! not a data path. Provider errors come back exactly as the provider
//! produced them.

use crate::path;
use std::sync::Arc;
use stencil_core::{ExprError, Value};
use stencil_plugin::{CompiledExpression, DataContext, ExtensionRegistry};
use tracing::{debug, trace};

/// Routes expression calls to the installed provider
#[derive(Debug, Clone)]
pub struct ExpressionFactory {
    registry: Arc<ExtensionRegistry>,
}

impl ExpressionFactory {
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        Self { registry }
    }

    /// Factory over the process-wide registry.
    pub fn global() -> Self {
        Self::new(ExtensionRegistry::global())
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Truthiness of `value` as decided by the provider. `None` when no
    /// provider is installed.
    pub fn is_true(&self, version: Option<&str>, value: &Value) -> Option<bool> {
        let provider = self.registry.provider_for(version)?;
        let result = provider.is_true(version, value);
        trace!(?version, provider = provider.meta().name, result, "is_true");
        Some(result)
    }

    /// Data path of `expression` if it is a `$` reference. Never consults
    /// the registry.
    pub fn value_path(&self, expression: &Value) -> Option<String> {
        path::value_path(expression)
    }

    /// Compile `expression` with the provider for `version`.
    ///
    /// `Ok(None)` for a `Null` expression (the registry is not consulted)
    /// and when no provider is installed.
    pub fn create(
        &self,
        version: Option<&str>,
        expression: &Value,
    ) -> Result<Option<Box<dyn CompiledExpression>>, ExprError> {
        if expression.is_null() {
            return Ok(None);
        }

        let provider = match self.registry.provider_for(version) {
            Some(p) => p,
            None => {
                trace!(?version, "no expression provider installed");
                return Ok(None);
            }
        };

        match provider.create(version, expression) {
            Ok(compiled) => {
                trace!(?version, provider = provider.meta().name, "created expression");
                Ok(Some(compiled))
            }
            Err(e) => {
                debug!(?version, provider = provider.meta().name, error = %e, "expression rejected");
                Err(e)
            }
        }
    }

    /// Value of a binding, compiled and evaluated by the provider. Without a
    /// provider, `$` data paths are still looked up directly and anything
    /// else resolves to `Null`.
    pub fn resolve(
        &self,
        version: Option<&str>,
        expression: &Value,
        data: &DataContext,
    ) -> Result<Value, ExprError> {
        if let Some(compiled) = self.create(version, expression)? {
            return Ok(compiled.evaluate(data));
        }

        Ok(self
            .value_path(expression)
            .map_or(Value::Null, |path| data.get_path(&path)))
    }

    /// Resolve a conditional binding and test its truthiness. `Ok(None)`
    /// when no provider is installed.
    pub fn test(
        &self,
        version: Option<&str>,
        expression: &Value,
        data: &DataContext,
    ) -> Result<Option<bool>, ExprError> {
        let value = self.resolve(version, expression, data)?;
        Ok(self.is_true(version, &value))
    }
}
