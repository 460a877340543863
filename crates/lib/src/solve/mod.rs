//! Solve-protocol client.
//!
//! Two round-trips to the backend:
//! - [`read_artifact`] solves a one-node local-source graph and reads the
//!   artifact file out of its snapshot
//! - [`submit_graph`] solves a fully built graph and binds its single output
//!
//! Every call runs under a [`Deadline`]. Failures are never retried.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::FrontendOptions;
use crate::consts::{LOCAL_CONTEXT_NAME, READ_ARTIFACT_NAME};
use crate::gateway::{Gateway, GatewayError, ReadRequest, SolveRequest, SolveResult};
use crate::llb::{Definition, GraphError, LocalSource};

/// Errors that can occur during a solve round-trip.
#[derive(Debug, Error)]
pub enum SolveError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Gateway(#[from] GatewayError),
}

/// Point in time after which in-flight backend calls are abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
  pub fn none() -> Self {
    Deadline(None)
  }

  pub fn after(timeout: Duration) -> Self {
    Deadline(Some(Instant::now() + timeout))
  }

  pub fn from_timeout(timeout: Option<Duration>) -> Self {
    timeout.map(Self::after).unwrap_or_default()
  }

  /// Run one backend call, failing with `DeadlineExceeded` once the deadline
  /// passes. The call's future is dropped on expiry.
  pub async fn run<T, F>(self, call: &'static str, fut: F) -> Result<T, GatewayError>
  where
    F: Future<Output = Result<T, GatewayError>>,
  {
    match self.0 {
      None => fut.await,
      Some(at) => tokio::time::timeout_at(at, fut)
        .await
        .map_err(|_| GatewayError::DeadlineExceeded { call })?,
    }
  }
}

/// Split artifact content into lines, dropping the first (header) line.
///
/// Splits on `\n` only, so a trailing newline yields a trailing empty line.
pub fn artifact_lines(content: &[u8]) -> Vec<String> {
  String::from_utf8_lossy(content)
    .split('\n')
    .skip(1)
    .map(str::to_string)
    .collect()
}

/// Fetch the artifact named by `options.file` from the client's context.
pub async fn read_artifact<G: Gateway>(
  gateway: &G,
  options: &FrontendOptions,
  deadline: Deadline,
) -> Result<Vec<String>, SolveError> {
  let session_id = gateway.build_opts().session_id;
  let definition = LocalSource::new(LOCAL_CONTEXT_NAME)
    .include_pattern(&options.file)
    .session_id(&session_id)
    .shared_key_hint(&options.shared_key_hint)
    .custom_name(READ_ARTIFACT_NAME)
    .marshal()?;

  debug!(file = %options.file, session = %session_id, "reading artifact");

  let result = deadline.run("solve", gateway.solve(SolveRequest { definition })).await?;
  let reference = result.single_ref()?;

  let content = deadline
    .run("read_file", gateway.read_file(&reference, ReadRequest::whole(&options.file)))
    .await?;

  let lines = artifact_lines(&content);
  info!(file = %options.file, bytes = content.len(), lines = lines.len(), "read artifact");
  Ok(lines)
}

/// Solve `definition` and bind its single output onto the result.
pub async fn submit_graph<G: Gateway>(
  gateway: &G,
  definition: Definition,
  deadline: Deadline,
) -> Result<SolveResult, SolveError> {
  let ops = definition.len();
  let mut result = deadline.run("solve", gateway.solve(SolveRequest { definition })).await?;

  let reference = result.single_ref()?;
  result.set_ref(reference.clone());

  info!(ops, reference = %reference, "graph solved");
  Ok(result)
}
