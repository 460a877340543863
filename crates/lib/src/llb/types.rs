use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::util::hash::Digest;

/// A backend capability an operation requires, e.g. `source.image`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CapId(pub String);

impl CapId {
  pub fn new(name: &str) -> Self {
    CapId(name.to_string())
  }
}

impl std::fmt::Display for CapId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for CapId {
  fn from(name: &str) -> Self {
    CapId::new(name)
  }
}

/// Capability names understood by the solving backend.
pub mod caps {
  pub const SOURCE_IMAGE: &str = "source.image";
  pub const SOURCE_LOCAL: &str = "source.local";
  pub const SOURCE_LOCAL_INCLUDE_PATTERNS: &str = "source.local.includepatterns";
  pub const SOURCE_LOCAL_SESSION_ID: &str = "source.local.sessionid";
  pub const SOURCE_LOCAL_SHARED_KEY_HINT: &str = "source.local.sharedkeyhint";
  pub const EXEC_META_BASE: &str = "exec.meta.base";
  pub const EXEC_MOUNT_BIND: &str = "exec.mount.bind";
  pub const META_DESCRIPTION: &str = "meta.description";
}

/// Reference to output `index` of an earlier operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
  pub digest: Digest,
  pub index: u64,
}

/// Reads content from a locator such as `docker-image://...` or `local://...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOp {
  pub identifier: String,
  pub attrs: BTreeMap<String, String>,
}

/// Process metadata for an exec operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
  pub args: Vec<String>,
  pub env: Vec<String>,
  pub cwd: String,
}

/// Binds an operation input to a path inside the exec'd process.
///
/// `input: None` mounts scratch, `output: None` discards the mount's changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
  pub input: Option<u64>,
  pub selector: String,
  pub dest: String,
  pub output: Option<u64>,
  pub readonly: bool,
}

impl Mount {
  /// Mount input `input` read-write at `dest`, producing output `output`.
  pub fn bind(input: u64, dest: &str, output: u64) -> Self {
    Self {
      input: Some(input),
      selector: String::new(),
      dest: dest.to_string(),
      output: Some(output),
      readonly: false,
    }
  }
}

/// Runs a command over mounted inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOp {
  pub meta: Meta,
  pub mounts: Vec<Mount>,
}

/// What an operation does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpPayload {
  Source(SourceOp),
  Exec(ExecOp),
}

/// A node in the build graph.
///
/// An operation without a payload is the terminal node of a definition: it
/// only selects which input the backend returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
  pub inputs: Vec<Input>,
  pub payload: Option<OpPayload>,
}

/// Side-channel data for an operation, keyed by the operation's digest.
///
/// Not part of the digest itself, so changing a description never changes
/// graph identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpMetadata {
  pub description: BTreeMap<String, String>,
  pub caps: BTreeMap<CapId, bool>,
}

impl OpMetadata {
  /// Record a required capability. Inserting twice is a no-op.
  pub fn require(&mut self, cap: CapId) {
    self.caps.insert(cap, true);
  }
}
