//! Expression evaluator
//!
//! Evaluation is total: a missing path, a type mismatch or a division by
//! zero yields `Null` instead of an error, so a broken binding renders as
//! empty rather than taking the template down.

use crate::ast::{BinOp, Expr, Template, UnaryOp};
use stencil_core::Value;
use stencil_plugin::DataContext;
use std::cmp::Ordering;

/// Truthiness used by the standard provider.
///
/// `Null`, `false`, `0`, `NaN`, `""`, `"false"`, `[]` and `{}` are false;
/// everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::Text(s) => !s.is_empty() && s != "false",
        Value::List(l) => !l.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Expression evaluator
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_template(&self, template: &Template, ctx: &DataContext) -> Value {
        match template {
            Template::Const(v) => v.clone(),
            Template::Expr(expr) => self.eval_expr(expr, ctx),
            Template::List(items) => {
                Value::List(items.iter().map(|t| self.eval_template(t, ctx)).collect())
            }
            Template::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, t)| (k.clone(), self.eval_template(t, ctx)))
                    .collect(),
            ),
        }
    }

    /// Evaluate single expression
    pub fn eval_expr(&self, expr: &Expr, ctx: &DataContext) -> Value {
        match expr {
            Expr::Literal(v) => v.clone(),

            Expr::Path(path) => ctx.get_path(path),

            Expr::Unary(op, inner) => {
                let v = self.eval_expr(inner, ctx);
                self.eval_unary_op(*op, v)
            }

            Expr::Binary(left, op, right) => {
                let l = self.eval_expr(left, ctx);
                let r = self.eval_expr(right, ctx);
                self.eval_binary_op(l, *op, r)
            }

            Expr::And(left, right) => {
                Value::Bool(truthy(&self.eval_expr(left, ctx)) && truthy(&self.eval_expr(right, ctx)))
            }

            Expr::Or(left, right) => {
                Value::Bool(truthy(&self.eval_expr(left, ctx)) || truthy(&self.eval_expr(right, ctx)))
            }

            Expr::Ternary(cond, then, otherwise) => {
                if truthy(&self.eval_expr(cond, ctx)) {
                    self.eval_expr(then, ctx)
                } else {
                    self.eval_expr(otherwise, ctx)
                }
            }

            Expr::Elvis(value, fallback) => match self.eval_expr(value, ctx) {
                Value::Null => self.eval_expr(fallback, ctx),
                v => v,
            },
        }
    }

    fn eval_binary_op(&self, left: Value, op: BinOp, right: Value) -> Value {
        match op {
            BinOp::Eq => Value::Bool(left == right),
            BinOp::Ne => Value::Bool(left != right),
            BinOp::Lt => Value::Bool(compare(&left, &right) == Some(Ordering::Less)),
            BinOp::Le => Value::Bool(matches!(
                compare(&left, &right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinOp::Gt => Value::Bool(compare(&left, &right) == Some(Ordering::Greater)),
            BinOp::Ge => Value::Bool(matches!(
                compare(&left, &right),
                Some(Ordering::Greater | Ordering::Equal)
            )),

            BinOp::Add => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Value::Number(l + r),
                (Value::Text(_), _) | (_, Value::Text(_)) => {
                    Value::Text(format!("{}{}", left.to_text(), right.to_text()))
                }
                _ => Value::Null,
            },

            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                let (l, r) = match (left.as_number(), right.as_number()) {
                    (Some(l), Some(r)) => (l, r),
                    _ => return Value::Null,
                };
                match op {
                    BinOp::Sub => Value::Number(l - r),
                    BinOp::Mul => Value::Number(l * r),
                    BinOp::Div if r == 0.0 => Value::Null,
                    BinOp::Div => Value::Number(l / r),
                    BinOp::Mod if r == 0.0 => Value::Null,
                    _ => Value::Number(l % r),
                }
            }
        }
    }

    fn eval_unary_op(&self, op: UnaryOp, value: Value) -> Value {
        match op {
            UnaryOp::Not => Value::Bool(!truthy(&value)),
            UnaryOp::Neg => match value.as_number() {
                Some(n) => Value::Number(-n),
                None => Value::Null,
            },
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Numbers compare numerically, texts lexically; anything else is unordered.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
