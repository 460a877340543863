//! Content digests for serialized graph operations.
//!
//! This module provides:
//! - `Digest`: a `sha256:<hex>` content address, used as graph edge target and
//!   as the metadata table key
//! - `hash_bytes()`: digest arbitrary bytes

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

const ALGORITHM: &str = "sha256";
const HEX_LEN: usize = 64;

/// A content digest of a serialized operation.
///
/// Identical bytes always yield the same digest.
///
/// # Format
///
/// `sha256:` followed by 64 lowercase hexadecimal characters, e.g.
/// `"sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
  /// Digest the given bytes.
  pub fn from_bytes(data: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Digest(format!("{:x}", hasher.finalize()))
  }

  /// The hex portion, without the algorithm prefix.
  pub fn hex(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Digest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}:{}", ALGORITHM, self.0)
  }
}

/// Error parsing a digest string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
  #[error("digest '{0}' has no algorithm prefix")]
  MissingAlgorithm(String),

  #[error("unsupported digest algorithm '{0}'")]
  UnsupportedAlgorithm(String),

  #[error("malformed digest hex '{0}'")]
  MalformedHex(String),
}

impl FromStr for Digest {
  type Err = HashError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (algorithm, hex) = s.split_once(':').ok_or_else(|| HashError::MissingAlgorithm(s.to_string()))?;
    if algorithm != ALGORITHM {
      return Err(HashError::UnsupportedAlgorithm(algorithm.to_string()));
    }
    let valid = hex.len() == HEX_LEN && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !valid {
      return Err(HashError::MalformedHex(hex.to_string()));
    }
    Ok(Digest(hex.to_string()))
  }
}

impl TryFrom<String> for Digest {
  type Error = HashError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Digest> for String {
  fn from(digest: Digest) -> Self {
    digest.to_string()
  }
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> Digest {
  Digest::from_bytes(data)
}
