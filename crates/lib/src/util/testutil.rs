//! Test utilities for poemkit-lib.
//!
//! [`ScriptedGateway`] answers every solve with a canned result and serves
//! files from memory, so protocol-shape failures can be provoked on demand.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::gateway::{BuildOpts, Gateway, GatewayError, ReadRequest, Reference, SolveRequest, SolveResult};

#[derive(Default)]
pub struct ScriptedGateway {
  pub opts: BuildOpts,
  pub result: SolveResult,
  pub files: BTreeMap<String, Vec<u8>>,
  pub solve_failure: Option<String>,
  pub delay: Option<Duration>,
  pub requests: Mutex<Vec<SolveRequest>>,
}

impl ScriptedGateway {
  /// A gateway whose solves yield one reference and which serves `files`.
  pub fn with_files(files: &[(&str, &str)]) -> Self {
    Self {
      result: SolveResult::with_ref(Reference::new("ref-0")),
      files: files
        .iter()
        .map(|(name, content)| (name.to_string(), content.as_bytes().to_vec()))
        .collect(),
      ..Self::default()
    }
  }

  pub fn with_opt(mut self, key: &str, value: &str) -> Self {
    self.opts.opts.insert(key.to_string(), value.to_string());
    self
  }

  pub fn solved(&self) -> Vec<SolveRequest> {
    self.requests.lock().unwrap().clone()
  }
}

impl Gateway for ScriptedGateway {
  fn build_opts(&self) -> BuildOpts {
    self.opts.clone()
  }

  async fn solve(&self, request: SolveRequest) -> Result<SolveResult, GatewayError> {
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    self.requests.lock().unwrap().push(request);
    if let Some(ref message) = self.solve_failure {
      return Err(GatewayError::Transport {
        call: "solve",
        message: message.clone(),
      });
    }
    Ok(self.result.clone())
  }

  async fn read_file(&self, _reference: &Reference, request: ReadRequest) -> Result<Vec<u8>, GatewayError> {
    self.files.get(&request.filename).cloned().ok_or_else(|| GatewayError::Read {
      filename: request.filename.clone(),
      message: "no such file".to_string(),
    })
  }
}
