//! The frontend build path.
//!
//! Wires the pieces together for one build invocation:
//! 1. Read the artifact lines from the client's context
//! 2. Build the two-layer graph
//! 3. Solve it and bind the single output
//! 4. Replace the image history with entries derived from the lines
//!
//! Any error aborts the build; nothing is retried.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::config::FrontendOptions;
use crate::gateway::{Gateway, SolveResult};
use crate::image::{HistoryError, synthesize_history};
use crate::llb::{Definition, DefinitionBuilder, GraphError, LayerConfig, caps};
use crate::solve::{Deadline, SolveError, read_artifact, submit_graph};

#[derive(Debug, Error)]
pub enum FrontendError {
  #[error("failed to construct build graph: {0}")]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Solve(#[from] SolveError),

  #[error(transparent)]
  History(#[from] HistoryError),
}

/// The graph this frontend builds: the base image, then a terminal layer
/// selecting it as the output.
pub fn poem_graph(options: &FrontendOptions) -> Result<Definition, GraphError> {
  let mut builder = DefinitionBuilder::new();
  builder.add_layer(LayerConfig::new().source(&options.base_image).cap(caps::SOURCE_IMAGE))?;
  builder.add_layer(LayerConfig::new().input_from_prev())?;
  builder.finish()
}

/// Run one build against `gateway`.
pub async fn build<G: Gateway>(gateway: &G, options: &FrontendOptions) -> Result<SolveResult, FrontendError> {
  let deadline = Deadline::from_timeout(options.timeout);
  info!(file = %options.file, base = %options.base_image, "starting build");

  let lines = read_artifact(gateway, options, deadline).await?;
  let definition = poem_graph(options)?;
  let result = submit_graph(gateway, definition, deadline).await?;
  let result = synthesize_history(result, lines, Utc::now())?;

  info!("build complete");
  Ok(result)
}
