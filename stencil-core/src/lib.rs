//! Stencil Core - Fundamental types
//!
//! This crate provides the core types used throughout Stencil:
//! - `Value`: expression sources and evaluation results
//! - `ExprError`: structured errors reported by expression providers

mod value;
mod error;

pub use value::Value;
pub use error::{ExprError, Severity, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Value, ExprError, Severity};
    pub use crate::error::codes;
}
