//! Data-path references
//!
//! A textual expression starting with `$` is a lookup into the template
//! data, not something to compile. This is part of the template format and
//! works whether or not a provider is installed.

use stencil_core::Value;

/// Marker at position 0 of a data-path reference
pub const PATH_PREFIX: char = '$';

/// Strip the prefix from a data-path reference. Only the first character is
/// removed: `"$"` gives `""`, `"$$"` gives `"$"`.
pub fn strip_path_prefix(text: &str) -> Option<&str> {
    text.strip_prefix(PATH_PREFIX)
}

/// The data path of an expression source, if it is one.
pub fn value_path(expression: &Value) -> Option<String> {
    expression
        .as_text()
        .and_then(strip_path_prefix)
        .map(str::to_string)
}
