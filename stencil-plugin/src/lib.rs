//! Stencil Plugin System
//!
//! Provides the seams for plugging expression engines into Stencil:
//! - `ExpressionProvider`: compiles expressions and decides truthiness
//! - `CompiledExpression`: a compiled expression, evaluated against data
//! - `ExtensionRegistry`: holds the active provider (and per-version ones)

mod traits;
mod registry;
mod context;

pub use traits::{ExpressionProvider, CompiledExpression, ProviderMeta};
pub use registry::ExtensionRegistry;
pub use context::{DataContext, PathSegment, parse_path};

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{
        ExpressionProvider, CompiledExpression, ProviderMeta,
        ExtensionRegistry, DataContext,
    };
    pub use stencil_core::prelude::*;
}
