//! Typed layer configuration.
//!
//! A [`LayerConfig`] collects everything one appended operation needs: the
//! payload, its inputs, a human-readable description, and the capabilities the
//! backend must support. Builder calls compose in order and the last payload
//! set wins, so new operation kinds plug into the same append primitive.

use std::collections::{BTreeMap, BTreeSet};

use crate::consts::{DESC_CUSTOM_NAME, DESC_DOCKERFILE_COMMAND};
use crate::util::hash::Digest;

use super::definition::GraphError;
use super::types::{CapId, ExecOp, Input, Meta, Mount, Op, OpMetadata, OpPayload, SourceOp, caps};

/// An input edge, possibly still pointing at "whatever was appended last".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRef {
  Explicit(Input),
  Previous,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerConfig {
  payload: Option<OpPayload>,
  inputs: Vec<InputRef>,
  description: Option<String>,
  caps: BTreeSet<CapId>,
}

impl LayerConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn source(self, locator: &str) -> Self {
    self.source_with_attrs(locator, BTreeMap::new())
  }

  pub fn source_with_attrs(mut self, locator: &str, attrs: BTreeMap<String, String>) -> Self {
    self.payload = Some(OpPayload::Source(SourceOp {
      identifier: locator.to_string(),
      attrs,
    }));
    self
  }

  /// Run `cmd` through `/bin/sh -c` in `/`, with input 0 mounted at `/`.
  pub fn exec(self, cmd: &str) -> Self {
    let meta = Meta {
      args: vec!["/bin/sh".to_string(), "-c".to_string(), cmd.to_string()],
      env: Vec::new(),
      cwd: "/".to_string(),
    };
    self.exec_with(meta, vec![Mount::bind(0, "/", 0)])
  }

  pub fn exec_with(mut self, meta: Meta, mounts: Vec<Mount>) -> Self {
    self.payload = Some(OpPayload::Exec(ExecOp { meta, mounts }));
    self
  }

  pub fn input(mut self, digest: Digest, index: u64) -> Self {
    self.inputs.push(InputRef::Explicit(Input { digest, index }));
    self
  }

  /// Depend on output 0 of the most recently appended layer.
  pub fn input_from_prev(mut self) -> Self {
    self.inputs.push(InputRef::Previous);
    self
  }

  pub fn description(mut self, text: &str) -> Self {
    self.description = Some(text.to_string());
    self
  }

  pub fn cap(mut self, name: impl Into<CapId>) -> Self {
    self.caps.insert(name.into());
    self
  }

  /// Materialize the operation and its metadata.
  ///
  /// `previous` is the digest of the last committed entry, if any.
  pub(crate) fn into_parts(self, previous: Option<&Digest>) -> Result<(Op, OpMetadata), GraphError> {
    let mut inputs = Vec::with_capacity(self.inputs.len());
    for input in self.inputs {
      match input {
        InputRef::Explicit(input) => inputs.push(input),
        InputRef::Previous => {
          let digest = previous.ok_or(GraphError::NoPreviousLayer)?;
          inputs.push(Input {
            digest: digest.clone(),
            index: 0,
          });
        }
      }
    }

    let mut metadata = OpMetadata::default();
    if let Some(text) = self.description {
      metadata.description = BTreeMap::from([
        (DESC_DOCKERFILE_COMMAND.to_string(), text.clone()),
        (DESC_CUSTOM_NAME.to_string(), text),
      ]);
    }
    for cap in self.caps {
      metadata.require(cap);
    }
    if let Some(OpPayload::Exec(ref exec)) = self.payload {
      metadata.require(caps::EXEC_META_BASE.into());
      if exec.mounts.iter().any(|m| m.input.is_some()) {
        metadata.require(caps::EXEC_MOUNT_BIND.into());
      }
    }

    let op = Op {
      inputs,
      payload: self.payload,
    };
    Ok((op, metadata))
  }
}
