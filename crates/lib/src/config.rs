//! Frontend configuration.
//!
//! Options arrive from the backend as a string map ([`BuildOpts`]); the CLI
//! adds a build-wide timeout on top.

use std::time::Duration;

use crate::consts::{DEFAULT_ARTIFACT_FILE, DEFAULT_BASE_IMAGE, OPT_BASE_IMAGE, OPT_FILE, OPT_SHARED_KEY_HINT};
use crate::gateway::BuildOpts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendOptions {
  /// Artifact file read from the local context.
  pub file: String,
  /// Cache-sharing hint for the artifact read.
  pub shared_key_hint: String,
  /// Source locator of the base layer.
  pub base_image: String,
  /// Deadline applied to every backend call of one build.
  pub timeout: Option<Duration>,
}

impl Default for FrontendOptions {
  fn default() -> Self {
    Self {
      file: DEFAULT_ARTIFACT_FILE.to_string(),
      shared_key_hint: DEFAULT_ARTIFACT_FILE.to_string(),
      base_image: DEFAULT_BASE_IMAGE.to_string(),
      timeout: None,
    }
  }
}

impl FrontendOptions {
  /// Read recognised keys, falling back to defaults for absent or empty ones.
  pub fn from_build_opts(opts: &BuildOpts) -> Self {
    let defaults = Self::default();
    Self {
      file: opts.opt(OPT_FILE).map(str::to_string).unwrap_or(defaults.file),
      shared_key_hint: opts
        .opt(OPT_SHARED_KEY_HINT)
        .map(str::to_string)
        .unwrap_or(defaults.shared_key_hint),
      base_image: opts.opt(OPT_BASE_IMAGE).map(str::to_string).unwrap_or(defaults.base_image),
      timeout: defaults.timeout,
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}
