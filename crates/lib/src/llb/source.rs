//! Local-context sources.
//!
//! A local source exposes files from the client's build context to the
//! backend. It is how the frontend reads the artifact it turns into history.

use std::collections::BTreeMap;

use super::definition::{Definition, DefinitionBuilder, GraphError};
use super::layer::LayerConfig;
use super::types::caps;

pub const ATTR_INCLUDE_PATTERNS: &str = "local.includepattern";
pub const ATTR_SESSION: &str = "local.session";
pub const ATTR_SHARED_KEY_HINT: &str = "local.sharedkeyhint";

/// Builder for a `local://<name>` source node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSource {
  name: String,
  include_patterns: Vec<String>,
  session_id: Option<String>,
  shared_key_hint: Option<String>,
  custom_name: Option<String>,
}

impl LocalSource {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      ..Self::default()
    }
  }

  /// Only transfer files matching `pattern`.
  pub fn include_pattern(mut self, pattern: &str) -> Self {
    self.include_patterns.push(pattern.to_string());
    self
  }

  /// Tie the read to the client session that owns the files.
  pub fn session_id(mut self, id: &str) -> Self {
    self.session_id = Some(id.to_string());
    self
  }

  /// Let the backend share transferred content across builds with the same
  /// hint. Only a cache hint.
  pub fn shared_key_hint(mut self, hint: &str) -> Self {
    self.shared_key_hint = Some(hint.to_string());
    self
  }

  pub fn custom_name(mut self, name: &str) -> Self {
    self.custom_name = Some(name.to_string());
    self
  }

  pub fn identifier(&self) -> String {
    format!("local://{}", self.name)
  }

  /// The source layer, with one capability per attribute it sets.
  pub fn layer(&self) -> Result<LayerConfig, GraphError> {
    let mut attrs = BTreeMap::new();
    let mut required = vec![caps::SOURCE_LOCAL];

    if !self.include_patterns.is_empty() {
      let patterns = serde_json::to_string(&self.include_patterns).map_err(|source| GraphError::EncodeAttr {
        key: ATTR_INCLUDE_PATTERNS.to_string(),
        source,
      })?;
      attrs.insert(ATTR_INCLUDE_PATTERNS.to_string(), patterns);
      required.push(caps::SOURCE_LOCAL_INCLUDE_PATTERNS);
    }
    if let Some(ref session) = self.session_id {
      attrs.insert(ATTR_SESSION.to_string(), session.clone());
      required.push(caps::SOURCE_LOCAL_SESSION_ID);
    }
    if let Some(ref hint) = self.shared_key_hint {
      attrs.insert(ATTR_SHARED_KEY_HINT.to_string(), hint.clone());
      required.push(caps::SOURCE_LOCAL_SHARED_KEY_HINT);
    }

    let mut layer = LayerConfig::new().source_with_attrs(&self.identifier(), attrs);
    if let Some(ref name) = self.custom_name {
      layer = layer.description(name).cap(caps::META_DESCRIPTION);
    }
    for cap in required {
      layer = layer.cap(cap);
    }
    Ok(layer)
  }

  /// A complete single-output definition reading this source.
  pub fn marshal(&self) -> Result<Definition, GraphError> {
    let mut builder = DefinitionBuilder::new();
    builder.add_layer(self.layer()?)?;
    builder.add_layer(LayerConfig::new().input_from_prev())?;
    builder.finish()
  }
}
