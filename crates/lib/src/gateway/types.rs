//! Types exchanged with the solving backend.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::llb::Definition;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// The call did not reach the backend or the backend rejected it.
  #[error("{call} failed: {message}")]
  Transport { call: &'static str, message: String },

  /// The result did not carry exactly one output reference.
  #[error("expected exactly one result reference, found {found}")]
  RefCount { found: usize },

  /// A file could not be read from a result reference.
  #[error("failed to read '{filename}': {message}")]
  Read { filename: String, message: String },

  /// The build deadline expired while a call was in flight.
  #[error("{call} exceeded the build deadline")]
  DeadlineExceeded { call: &'static str },
}

/// Options the backend hands the frontend at invocation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOpts {
  /// Free-form frontend options, e.g. `file`.
  pub opts: BTreeMap<String, String>,
  /// Client session that owns the local build context.
  pub session_id: String,
}

impl BuildOpts {
  pub fn opt(&self, key: &str) -> Option<&str> {
    self.opts.get(key).map(String::as_str).filter(|value| !value.is_empty())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveRequest {
  pub definition: Definition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
  pub filename: String,
}

impl ReadRequest {
  pub fn whole(filename: &str) -> Self {
    Self {
      filename: filename.to_string(),
    }
  }
}

/// Opaque handle to a filesystem snapshot held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
  pub id: String,
}

impl Reference {
  pub fn new(id: impl Into<String>) -> Self {
    Self { id: id.into() }
  }
}

impl std::fmt::Display for Reference {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.id)
  }
}

/// What the backend returns for a solve.
///
/// Metadata follows a read-modify-write contract: [`SolveResult::metadata`]
/// hands out a copy, and changes only take effect through
/// [`SolveResult::set_metadata`] or [`SolveResult::add_meta`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveResult {
  reference: Option<Reference>,
  refs: BTreeMap<String, Reference>,
  metadata: BTreeMap<String, Vec<u8>>,
}

impl SolveResult {
  pub fn new() -> Self {
    Self::default()
  }

  /// A result with a single, unnamed output.
  pub fn with_ref(reference: Reference) -> Self {
    Self {
      reference: Some(reference),
      ..Self::default()
    }
  }

  /// Add a named output, as multi-platform solves do.
  pub fn add_ref(&mut self, key: &str, reference: Reference) {
    self.refs.insert(key.to_string(), reference);
  }

  /// Number of output references carried.
  pub fn ref_count(&self) -> usize {
    usize::from(self.reference.is_some()) + self.refs.len()
  }

  /// The only output reference.
  ///
  /// Fails with [`GatewayError::RefCount`] on zero or several references.
  pub fn single_ref(&self) -> Result<Reference, GatewayError> {
    let found = self.ref_count();
    if found != 1 {
      return Err(GatewayError::RefCount { found });
    }
    match self.reference {
      Some(ref reference) => Ok(reference.clone()),
      None => self
        .refs
        .values()
        .next()
        .cloned()
        .ok_or(GatewayError::RefCount { found: 0 }),
    }
  }

  /// Bind `reference` as the sole output, dropping any named outputs.
  pub fn set_ref(&mut self, reference: Reference) {
    self.refs.clear();
    self.reference = Some(reference);
  }

  pub fn metadata(&self) -> BTreeMap<String, Vec<u8>> {
    self.metadata.clone()
  }

  pub fn meta(&self, key: &str) -> Option<&[u8]> {
    self.metadata.get(key).map(Vec::as_slice)
  }

  pub fn set_metadata(&mut self, metadata: BTreeMap<String, Vec<u8>>) {
    self.metadata = metadata;
  }

  pub fn add_meta(&mut self, key: &str, value: Vec<u8>) {
    self.metadata.insert(key.to_string(), value);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_ref_requires_exactly_one() {
    let empty = SolveResult::new();
    assert!(matches!(empty.single_ref(), Err(GatewayError::RefCount { found: 0 })));

    let single = SolveResult::with_ref(Reference::new("r1"));
    assert_eq!(single.single_ref().unwrap(), Reference::new("r1"));

    let mut multi = SolveResult::new();
    multi.add_ref("linux/amd64", Reference::new("a"));
    multi.add_ref("linux/arm64", Reference::new("b"));
    assert!(matches!(multi.single_ref(), Err(GatewayError::RefCount { found: 2 })));
  }

  #[test]
  fn single_named_ref_is_accepted() {
    let mut result = SolveResult::new();
    result.add_ref("linux/amd64", Reference::new("a"));
    assert_eq!(result.single_ref().unwrap(), Reference::new("a"));
  }

  #[test]
  fn set_ref_replaces_named_refs() {
    let mut result = SolveResult::new();
    result.add_ref("linux/amd64", Reference::new("a"));
    result.add_ref("linux/arm64", Reference::new("b"));

    result.set_ref(Reference::new("c"));

    assert_eq!(result.ref_count(), 1);
    assert_eq!(result.single_ref().unwrap(), Reference::new("c"));
  }

  #[test]
  fn metadata_copy_does_not_alias() {
    let mut result = SolveResult::new();
    result.add_meta("k", b"v1".to_vec());

    let mut copy = result.metadata();
    copy.insert("k".to_string(), b"v2".to_vec());
    assert_eq!(result.meta("k"), Some(&b"v1"[..]));

    result.set_metadata(copy);
    assert_eq!(result.meta("k"), Some(&b"v2"[..]));
  }

  #[test]
  fn empty_build_opt_counts_as_absent() {
    let opts = BuildOpts {
      opts: BTreeMap::from([("file".to_string(), String::new())]),
      ..BuildOpts::default()
    };
    assert_eq!(opts.opt("file"), None);
  }
}
