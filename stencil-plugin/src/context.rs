//! Data context
//!
//! Runtime data a compiled expression is evaluated against, plus the
//! path lookup shared by every provider and by data-path bindings.

use stencil_core::Value;
use std::collections::HashMap;

/// Data passed to compiled expressions
#[derive(Debug, Clone, Default)]
pub struct DataContext {
    pub data: Value,
    /// Host-supplied names (e.g. the current list index) that shadow
    /// top-level fields of `data`.
    pub variables: HashMap<String, Value>,
}

/// One step of a data path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment<'a> {
    Key(&'a str),
    Index(usize),
}

impl DataContext {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            variables: HashMap::new(),
        }
    }

    pub fn with_variables(mut self, vars: HashMap<String, Value>) -> Self {
        self.variables = vars;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn set_var(&mut self, name: String, value: Value) {
        self.variables.insert(name, value);
    }

    /// Look up a dotted/indexed path: `user.name`, `items[0].title`,
    /// `items.0.title`. The empty path is the whole data. Anything missing
    /// or malformed resolves to `Null`.
    pub fn get_path(&self, path: &str) -> Value {
        self.lookup(path).cloned().unwrap_or(Value::Null)
    }

    /// Borrowing variant of [`get_path`](Self::get_path).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let path = path.trim();
        if path.is_empty() {
            return Some(&self.data);
        }

        let segments = parse_path(path)?;
        let (first, rest) = segments.split_first()?;

        let root = match first {
            PathSegment::Key(name) => match self.variables.get(*name) {
                Some(v) => v,
                None => step(&self.data, first)?,
            },
            PathSegment::Index(_) => step(&self.data, first)?,
        };

        rest.iter().try_fold(root, |current, segment| step(current, segment))
    }
}

impl From<Value> for DataContext {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

fn step<'v>(value: &'v Value, segment: &PathSegment<'_>) -> Option<&'v Value> {
    match (segment, value) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(*key),
        (PathSegment::Key(key), Value::List(items)) => {
            key.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        (PathSegment::Index(i), Value::List(items)) => items.get(*i),
        (PathSegment::Index(i), Value::Object(map)) => map.get(&i.to_string()),
        _ => None,
    }
}

/// Split a path into segments. `None` when the path is malformed.
pub fn parse_path(path: &str) -> Option<Vec<PathSegment<'_>>> {
    let mut segments = Vec::new();

    for part in path.split('.') {
        let part = part.trim();
        if part.is_empty() {
            return None;
        }

        let (key, mut brackets) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }

        while !brackets.is_empty() {
            let close = brackets.find(']')?;
            if !brackets.starts_with('[') {
                return None;
            }
            let inner = brackets[1..close].trim();
            match inner.parse::<usize>() {
                Ok(i) => segments.push(PathSegment::Index(i)),
                Err(_) => segments.push(PathSegment::Key(unquote(inner)?)),
            }
            brackets = &brackets[close + 1..];
        }
    }

    Some(segments)
}

fn unquote(s: &str) -> Option<&str> {
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted {
        Some(&s[1..s.len() - 1])
    } else if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
