//! Standard expression provider

use crate::ast::Template;
use crate::eval::{truthy, Evaluator};
use crate::parser::{classify, parse_expr, TextKind};
use stencil_core::{ExprError, Value};
use std::collections::BTreeMap;
use stencil_plugin::{CompiledExpression, DataContext, ExpressionProvider, ProviderMeta};
use tracing::trace;

/// Provider for the built-in binding grammar.
///
/// Accepts every expression version unless restricted with
/// [`with_versions`](Self::with_versions). A missing version is always
/// accepted and means the default grammar.
#[derive(Debug, Clone, Default)]
pub struct StandardProvider {
    versions: Vec<String>,
}

impl StandardProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn supports(&self, version: Option<&str>) -> bool {
        match version {
            Some(v) => self.versions.is_empty() || self.versions.iter().any(|s| s == v),
            None => true,
        }
    }

    /// Compile a source into its template form.
    pub fn compile(&self, expression: &Value) -> Result<Template, ExprError> {
        match expression {
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(Template::Const(expression.clone())),
            Value::Text(text) => match classify(text) {
                TextKind::Expression => parse_expr(text)
                    .map(Template::Expr)
                    .map_err(|e| e.with_expression(text.as_str())),
                // `(optional)`, `!important`: labels that merely look like expressions
                TextKind::Candidate => Ok(parse_expr(text)
                    .map_or_else(|_| Template::Const(expression.clone()), Template::Expr)),
                TextKind::Literal => Ok(Template::Const(expression.clone())),
            },
            Value::List(items) => items
                .iter()
                .map(|item| self.compile(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Template::List),
            Value::Object(fields) => fields
                .iter()
                .map(|(k, v)| self.compile(v).map(|t| (k.clone(), t)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Template::Object),
        }
    }
}

impl ExpressionProvider for StandardProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "standard",
            description: "Built-in binding grammar: data paths, arithmetic, comparisons, logic, conditionals",
            versions: self.versions.clone(),
        }
    }

    fn is_true(&self, _version: Option<&str>, value: &Value) -> bool {
        truthy(value)
    }

    fn create(
        &self,
        version: Option<&str>,
        expression: &Value,
    ) -> Result<Box<dyn CompiledExpression>, ExprError> {
        if !self.supports(version) {
            return Err(ExprError::unsupported_version(version, &self.versions));
        }

        let template = self.compile(expression)?;
        trace!(?version, ?template, "compiled expression");

        Ok(Box::new(StandardExpression {
            source: expression.clone(),
            version: version.map(str::to_string),
            template,
        }))
    }
}

/// Expression compiled by [`StandardProvider`]
#[derive(Debug, Clone)]
pub struct StandardExpression {
    source: Value,
    version: Option<String>,
    template: Template,
}

impl StandardExpression {
    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl CompiledExpression for StandardExpression {
    fn evaluate(&self, data: &DataContext) -> Value {
        Evaluator::new().eval_template(&self.template, data)
    }

    fn source(&self) -> &Value {
        &self.source
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
