//! An in-process gateway backed by a local directory.
//!
//! Every solve returns one reference whose snapshot is the gateway's root
//! directory. Used by `poemkit preview` to run the whole build path without a
//! backend, and by tests.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::consts::META_IMAGE_CONFIG;

use super::{BuildOpts, Gateway, GatewayError, ReadRequest, Reference, SolveRequest, SolveResult};

pub struct LocalGateway {
  root: PathBuf,
  opts: BuildOpts,
  image_config: Option<Vec<u8>>,
  issued: Mutex<HashSet<Reference>>,
}

impl LocalGateway {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      opts: BuildOpts::default(),
      image_config: None,
      issued: Mutex::new(HashSet::new()),
    }
  }

  pub fn with_opts(mut self, opts: BuildOpts) -> Self {
    self.opts = opts;
    self
  }

  /// Seed every solve result with this image config, as a backend does when
  /// the graph starts from an image.
  pub fn with_image_config(mut self, config: Vec<u8>) -> Self {
    self.image_config = Some(config);
    self
  }

  fn is_issued(&self, reference: &Reference) -> bool {
    self.issued.lock().map(|issued| issued.contains(reference)).unwrap_or(false)
  }

  /// Resolve `filename` inside the root, refusing paths that escape it.
  fn resolve(&self, filename: &str) -> Result<PathBuf, GatewayError> {
    let relative = Path::new(filename);
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || filename.is_empty() {
      return Err(GatewayError::Read {
        filename: filename.to_string(),
        message: "path must be relative to the snapshot root".to_string(),
      });
    }
    Ok(self.root.join(relative))
  }
}

impl Gateway for LocalGateway {
  fn build_opts(&self) -> BuildOpts {
    self.opts.clone()
  }

  async fn solve(&self, request: SolveRequest) -> Result<SolveResult, GatewayError> {
    let definition = request.definition;
    definition.validate().map_err(|e| GatewayError::Transport {
      call: "solve",
      message: e.to_string(),
    })?;

    let Some(head) = definition.head() else {
      debug!("empty definition solved to an empty result");
      return Ok(SolveResult::new());
    };

    let reference = Reference::new(head.to_string());
    self
      .issued
      .lock()
      .map_err(|e| GatewayError::Transport {
        call: "solve",
        message: e.to_string(),
      })?
      .insert(reference.clone());

    info!(ops = definition.len(), reference = %reference, "solved definition");

    let mut result = SolveResult::with_ref(reference);
    if let Some(ref config) = self.image_config {
      result.add_meta(META_IMAGE_CONFIG, config.clone());
    }
    Ok(result)
  }

  async fn read_file(&self, reference: &Reference, request: ReadRequest) -> Result<Vec<u8>, GatewayError> {
    if !self.is_issued(reference) {
      return Err(GatewayError::Transport {
        call: "read_file",
        message: format!("unknown reference {}", reference),
      });
    }

    let path = self.resolve(&request.filename)?;
    tokio::fs::read(&path).await.map_err(|e| GatewayError::Read {
      filename: request.filename,
      message: e.to_string(),
    })
  }
}
