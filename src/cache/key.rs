//! Canonical cache key construction.
//!
//! Keys follow the grammar `prefix[":"name"="value]*` with names sorted, so
//! the same logical request always maps to the same key no matter in which
//! order its parameters were added.

use std::collections::BTreeMap;
use std::fmt;

/// Builder for a canonical cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
  prefix: String,
  params: BTreeMap<String, String>,
}

impl CacheKey {
  /// Start a key in the given namespace.
  pub fn new(prefix: impl Into<String>) -> Self {
    Self {
      prefix: prefix.into(),
      params: BTreeMap::new(),
    }
  }

  /// Add a parameter. Adding the same name twice keeps the last value.
  pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
    self.params.insert(name.into(), value.to_string());
    self
  }

  /// Add a parameter only when a value is present.
  pub fn param_opt<V: fmt::Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
    match value {
      Some(v) => self.param(name, v),
      None => self,
    }
  }

  /// Render the canonical string.
  pub fn build(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&escape(&self.prefix))?;
    // BTreeMap iterates in lexicographic name order
    for (name, value) in &self.params {
      write!(f, ":{}={}", escape(name), escape(value))?;
    }
    Ok(())
  }
}

/// Percent-escape the grammar's separators so distinct inputs cannot collide.
fn escape(s: &str) -> String {
  if !s.contains(['%', ':', '=']) {
    return s.to_string();
  }
  let mut out = String::with_capacity(s.len() + 4);
  for c in s.chars() {
    match c {
      '%' => out.push_str("%25"),
      ':' => out.push_str("%3A"),
      '=' => out.push_str("%3D"),
      c => out.push(c),
    }
  }
  out
}
