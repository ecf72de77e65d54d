//! Plugin traits

use stencil_core::{ExprError, Value};
use crate::DataContext;
use serde::Serialize;

/// Metadata for an expression provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderMeta {
    pub name: &'static str,
    pub description: &'static str,
    /// Versions the provider accepts. Empty means "any version".
    pub versions: Vec<String>,
}

/// An expression compiled by a provider, ready to run against template data.
///
/// Each provider brings its own implementation; callers only ever see the
/// trait object and never inspect what is behind it.
pub trait CompiledExpression: Send + Sync + std::fmt::Debug {
    /// Evaluate against runtime data. Never panics: failures inside the
    /// expression resolve to a provider-documented default.
    fn evaluate(&self, data: &DataContext) -> Value;

    /// The source this expression was compiled from.
    fn source(&self) -> &Value;

    /// The expression version it was compiled for.
    fn version(&self) -> Option<&str>;
}

/// Expression engine plugin
pub trait ExpressionProvider: Send + Sync {
    fn meta(&self) -> ProviderMeta;

    /// Truthiness of a value under this provider's rules. Total: malformed
    /// input resolves to a default instead of failing.
    fn is_true(&self, version: Option<&str>, value: &Value) -> bool;

    /// Compile an expression source for `version`.
    fn create(
        &self,
        version: Option<&str>,
        expression: &Value,
    ) -> Result<Box<dyn CompiledExpression>, ExprError>;
}
