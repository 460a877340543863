use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An OCI image configuration, as stored under `containerimage.config`.
///
/// Fields this crate does not model are kept in `extra` so a decode/encode
/// cycle does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created: Option<DateTime<Utc>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,

  #[serde(default, deserialize_with = "null_as_default")]
  pub architecture: String,

  #[serde(default, deserialize_with = "null_as_default")]
  pub os: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub variant: Option<String>,

  /// Runtime configuration (entrypoint, env, ...), passed through untouched.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub config: Option<serde_json::Value>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rootfs: Option<RootFs>,

  #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
  pub history: Vec<History>,

  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootFs {
  #[serde(rename = "type", default, deserialize_with = "null_as_default")]
  pub kind: String,

  #[serde(default, deserialize_with = "null_as_default")]
  pub diff_ids: Vec<String>,
}

/// One entry of an image's build history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created: Option<DateTime<Utc>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_by: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,

  /// Set when the step changed no files.
  #[serde(default, skip_serializing_if = "is_false")]
  pub empty_layer: bool,
}

fn is_false(value: &bool) -> bool {
  !*value
}

/// Configs written by other tools carry explicit `null` for empty fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
