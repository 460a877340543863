//! The operation graph and its builder.
//!
//! A [`Definition`] is an ordered list of encoded operations plus a metadata
//! table keyed by each operation's digest. Entries may only reference earlier
//! entries, so the graph is acyclic by construction. [`DefinitionBuilder`]
//! appends layers one at a time; each append is atomic.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::util::hash::Digest;

use super::layer::LayerConfig;
use super::types::{Op, OpMetadata};

/// Errors that can occur while constructing or reading a graph.
#[derive(Debug, Error)]
pub enum GraphError {
  /// An operation could not be serialized.
  #[error("failed to encode operation: {0}")]
  Encode(#[source] bincode::Error),

  /// An entry in the definition is not a valid operation.
  #[error("failed to decode operation at position {position}: {source}")]
  DecodeOp {
    position: usize,
    #[source]
    source: bincode::Error,
  },

  /// A source attribute could not be encoded.
  #[error("failed to encode source attribute '{key}': {source}")]
  EncodeAttr {
    key: String,
    #[source]
    source: serde_json::Error,
  },

  /// The definition bytes are malformed.
  #[error("failed to decode definition: {0}")]
  Decode(#[source] bincode::Error),

  /// A layer asked for the previous layer but nothing was appended yet.
  #[error("cannot link to previous layer: definition is empty")]
  NoPreviousLayer,

  /// An input names a digest that is not an earlier entry.
  #[error("operation {op} references {input}, which is not an earlier entry")]
  DanglingInput { op: Digest, input: Digest },

  /// A metadata entry has no matching operation.
  #[error("metadata for {0} does not match any operation")]
  OrphanMetadata(Digest),

  #[error("failed to write definition: {0}")]
  Io(#[from] std::io::Error),
}

/// Serialize an operation to its canonical bytes.
pub fn encode_op(op: &Op) -> Result<Vec<u8>, GraphError> {
  bincode::serialize(op).map_err(GraphError::Encode)
}

pub fn decode_op(bytes: &[u8], position: usize) -> Result<Op, GraphError> {
  bincode::deserialize(bytes).map_err(|source| GraphError::DecodeOp { position, source })
}

/// A build graph ready to submit to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
  /// Encoded operations, dependencies first.
  pub def: Vec<Vec<u8>>,
  /// Metadata keyed by the digest of the matching entry in `def`.
  pub metadata: BTreeMap<Digest, OpMetadata>,
}

impl Definition {
  /// Digest of the most recently appended entry.
  pub fn head(&self) -> Option<Digest> {
    self.def.last().map(|bytes| Digest::from_bytes(bytes))
  }

  pub fn len(&self) -> usize {
    self.def.len()
  }

  pub fn is_empty(&self) -> bool {
    self.def.is_empty()
  }

  /// Decode every entry, in order, alongside its digest.
  pub fn ops(&self) -> Result<Vec<(Digest, Op)>, GraphError> {
    self
      .def
      .iter()
      .enumerate()
      .map(|(position, bytes)| -> Result<(Digest, Op), GraphError> {
        Ok((Digest::from_bytes(bytes), decode_op(bytes, position)?))
      })
      .collect()
  }

  /// Check that every input and metadata key names an earlier entry.
  pub fn validate(&self) -> Result<(), GraphError> {
    let mut seen: HashSet<Digest> = HashSet::with_capacity(self.def.len());

    for (digest, op) in self.ops()? {
      if let Some(missing) = op.inputs.iter().find(|input| !seen.contains(&input.digest)) {
        return Err(GraphError::DanglingInput {
          op: digest,
          input: missing.digest.clone(),
        });
      }
      seen.insert(digest);
    }

    if let Some(orphan) = self.metadata.keys().find(|key| !seen.contains(*key)) {
      return Err(GraphError::OrphanMetadata(orphan.clone()));
    }

    Ok(())
  }

  pub fn encode(&self) -> Result<Vec<u8>, GraphError> {
    bincode::serialize(self).map_err(GraphError::Encode)
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, GraphError> {
    bincode::deserialize(bytes).map_err(GraphError::Decode)
  }

  /// Write the encoded definition, e.g. to stdout for inspection.
  pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), GraphError> {
    let bytes = self.encode()?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
  }
}

/// Append-only construction of a [`Definition`].
#[derive(Debug, Default)]
pub struct DefinitionBuilder {
  def: Definition,
}

impl DefinitionBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append one layer and return its digest.
  ///
  /// The layer's operation is encoded and digested, then the bytes and the
  /// metadata are committed together. Nothing is committed on error.
  pub fn add_layer(&mut self, layer: LayerConfig) -> Result<Digest, GraphError> {
    let previous = self.def.head();
    let (op, metadata) = layer.into_parts(previous.as_ref())?;

    let bytes = encode_op(&op)?;
    let digest = Digest::from_bytes(&bytes);

    debug!(
      digest = %digest,
      position = self.def.def.len(),
      inputs = op.inputs.len(),
      "appended layer"
    );

    self.def.def.push(bytes);
    self.def.metadata.insert(digest.clone(), metadata);

    Ok(digest)
  }

  /// Validate and return the finished graph.
  pub fn finish(self) -> Result<Definition, GraphError> {
    self.def.validate()?;
    Ok(self.def)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::llb::types::{Input, OpPayload, caps};
  use crate::util::hash::hash_bytes;

  fn alpine() -> LayerConfig {
    LayerConfig::new().source("docker-image://docker.io/library/alpine:latest").cap(caps::SOURCE_IMAGE)
  }

  #[test]
  fn identical_layers_produce_identical_bytes() {
    let mut a = DefinitionBuilder::new();
    let mut b = DefinitionBuilder::new();

    let da = a.add_layer(alpine().description("base")).unwrap();
    let db = b.add_layer(alpine().description("base")).unwrap();

    assert_eq!(da, db);
    assert_eq!(a.finish().unwrap().def, b.finish().unwrap().def);
  }

  #[test]
  fn digest_is_computed_from_committed_bytes() {
    let mut builder = DefinitionBuilder::new();
    let digest = builder.add_layer(alpine()).unwrap();
    let def = builder.finish().unwrap();

    assert_eq!(digest, Digest::from_bytes(&def.def[0]));
    assert!(def.metadata.contains_key(&digest));
  }

  #[test]
  fn metadata_does_not_affect_digest() {
    let mut a = DefinitionBuilder::new();
    let mut b = DefinitionBuilder::new();

    let da = a.add_layer(alpine().description("one")).unwrap();
    let db = b.add_layer(alpine().description("two")).unwrap();

    assert_eq!(da, db);
  }

  #[test]
  fn chain_links_each_layer_to_its_predecessor() {
    let mut builder = DefinitionBuilder::new();
    let mut digests = vec![builder.add_layer(alpine()).unwrap()];
    for step in ["apk add curl", "echo done"] {
      let digest = builder.add_layer(LayerConfig::new().exec(step).input_from_prev()).unwrap();
      digests.push(digest);
    }
    digests.push(builder.add_layer(LayerConfig::new().input_from_prev()).unwrap());

    let def = builder.finish().unwrap();
    let ops = def.ops().unwrap();
    assert_eq!(ops.len(), 4);
    assert!(ops[0].1.inputs.is_empty());

    for k in 1..ops.len() {
      assert_eq!(ops[k].0, digests[k]);
      assert_eq!(
        ops[k].1.inputs,
        vec![Input {
          digest: digests[k - 1].clone(),
          index: 0,
        }]
      );
    }
  }

  #[test]
  fn failed_append_commits_nothing() {
    let mut builder = DefinitionBuilder::new();
    let err = builder.add_layer(LayerConfig::new().input_from_prev()).unwrap_err();

    assert!(matches!(err, GraphError::NoPreviousLayer));
    assert!(builder.finish().unwrap().is_empty());
  }

  #[test]
  fn finish_rejects_dangling_input() {
    let unknown = hash_bytes(b"not in graph");
    let mut builder = DefinitionBuilder::new();
    builder.add_layer(LayerConfig::new().input(unknown.clone(), 0)).unwrap();

    match builder.finish().unwrap_err() {
      GraphError::DanglingInput { input, .. } => assert_eq!(input, unknown),
      other => panic!("Expected DanglingInput, got {:?}", other),
    }
  }

  #[test]
  fn validate_rejects_forward_reference() {
    let mut builder = DefinitionBuilder::new();
    builder.add_layer(alpine()).unwrap();
    builder.add_layer(LayerConfig::new().input_from_prev()).unwrap();
    let mut def = builder.finish().unwrap();

    def.def.reverse();

    assert!(matches!(def.validate(), Err(GraphError::DanglingInput { .. })));
  }

  #[test]
  fn validate_rejects_orphan_metadata() {
    let mut def = Definition::default();
    let stray = hash_bytes(b"stray");
    def.metadata.insert(stray.clone(), OpMetadata::default());

    match def.validate() {
      Err(GraphError::OrphanMetadata(digest)) => assert_eq!(digest, stray),
      other => panic!("Expected OrphanMetadata, got {:?}", other),
    }
  }

  #[test]
  fn encoded_definition_decodes_to_same_graph() {
    let mut builder = DefinitionBuilder::new();
    builder.add_layer(alpine().description("base")).unwrap();
    builder.add_layer(LayerConfig::new().input_from_prev()).unwrap();
    let def = builder.finish().unwrap();

    let mut out = Vec::new();
    def.write_to(&mut out).unwrap();

    assert_eq!(out, def.encode().unwrap());
    let decoded = Definition::decode(&out).unwrap();
    assert_eq!(decoded, def);
    decoded.validate().unwrap();
  }

  #[test]
  fn decode_rejects_garbage() {
    let def = Definition {
      def: vec![vec![0xff, 0xff, 0xff, 0xff, 0xff]],
      metadata: BTreeMap::new(),
    };
    assert!(matches!(def.ops(), Err(GraphError::DecodeOp { position: 0, .. })));
  }

  #[test]
  fn ops_preserve_payload() {
    let mut builder = DefinitionBuilder::new();
    builder.add_layer(alpine()).unwrap();
    let ops = builder.finish().unwrap().ops().unwrap();

    match &ops[0].1.payload {
      Some(OpPayload::Source(source)) => {
        assert_eq!(source.identifier, "docker-image://docker.io/library/alpine:latest");
      }
      other => panic!("Expected Source payload, got {:?}", other),
    }
  }
}
