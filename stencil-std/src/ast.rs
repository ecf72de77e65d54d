//! Abstract Syntax Tree

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stencil_core::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),
    /// `$user.name`: the text after the `$`
    Path(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    /// `cond ? then : else`
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `value ?: fallback`
    Elvis(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp { Add, Sub, Mul, Div, Mod, Eq, Ne, Lt, Le, Gt, Ge }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp { Not, Neg }

/// Compiled form of an expression source. Structured sources keep their
/// shape; every text leaf is compiled on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Template {
    Const(Value),
    Expr(Expr),
    List(Vec<Template>),
    Object(BTreeMap<String, Template>),
}
