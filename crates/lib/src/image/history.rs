//! Synthetic history derived from artifact lines.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::META_IMAGE_CONFIG;
use crate::gateway::SolveResult;

use super::types::{History, ImageConfig};

#[derive(Debug, Error)]
pub enum HistoryError {
  #[error("failed to encode image config: {0}")]
  Encode(#[source] serde_json::Error),
}

/// Decode an existing image config, starting fresh if it is absent or
/// unreadable.
pub fn decode_image_config(raw: Option<&[u8]>) -> ImageConfig {
  let Some(raw) = raw else {
    return ImageConfig::default();
  };
  match serde_json::from_slice(raw) {
    Ok(config) => config,
    Err(e) => {
      warn!(error = %e, bytes = raw.len(), "ignoring undecodable image config");
      ImageConfig::default()
    }
  }
}

/// One empty-layer entry per line, last line first.
///
/// Entry `i` is stamped `now - i` seconds, so timestamps strictly decrease
/// along the list.
pub fn derive_history(mut lines: Vec<String>, now: DateTime<Utc>) -> Vec<History> {
  lines.reverse();
  lines
    .into_iter()
    .enumerate()
    .map(|(index, line)| History {
      created: Some(now - TimeDelta::seconds(index as i64)),
      created_by: Some(line),
      empty_layer: true,
      ..History::default()
    })
    .collect()
}

/// Replace the result's image history with entries derived from `lines`.
///
/// Any history already present is discarded. Encoding the updated config must
/// succeed; decoding the previous one need not.
pub fn synthesize_history(
  mut result: SolveResult,
  lines: Vec<String>,
  now: DateTime<Utc>,
) -> Result<SolveResult, HistoryError> {
  let mut metadata = result.metadata();

  let mut image = decode_image_config(metadata.get(META_IMAGE_CONFIG).map(Vec::as_slice));
  image.history = derive_history(lines, now);

  let encoded = serde_json::to_vec(&image).map_err(HistoryError::Encode)?;
  debug!(entries = image.history.len(), bytes = encoded.len(), "synthesized image history");

  metadata.insert(META_IMAGE_CONFIG.to_string(), encoded);
  result.set_metadata(metadata);
  Ok(result)
}
