//! Implementation of the `poemkit llb` command.
//!
//! Builds the graph the frontend would submit and writes it to stdout instead
//! of solving it.

use std::io;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use poemkit_lib::config::FrontendOptions;
use poemkit_lib::frontend::poem_graph;
use poemkit_lib::llb::{Definition, Op, OpMetadata};

use crate::output::print_json;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DumpFormat {
  /// The encoded definition, as sent to the backend
  #[default]
  Binary,
  /// A readable view of each operation and its metadata
  Json,
}

#[derive(Serialize)]
struct OpView {
  digest: String,
  op: Op,
  metadata: Option<OpMetadata>,
}

fn graph_view(definition: &Definition) -> Result<Vec<OpView>> {
  let ops = definition.ops().context("Failed to decode definition")?;
  Ok(
    ops
      .into_iter()
      .map(|(digest, op)| OpView {
        metadata: definition.metadata.get(&digest).cloned(),
        digest: digest.to_string(),
        op,
      })
      .collect(),
  )
}

pub fn cmd_llb(format: DumpFormat, opts: Vec<(String, String)>) -> Result<()> {
  let options = FrontendOptions::from_build_opts(&super::build_opts(opts));
  let definition = poem_graph(&options).context("Failed to build graph")?;

  match format {
    DumpFormat::Binary => definition
      .write_to(io::stdout().lock())
      .context("Failed to write definition")?,
    DumpFormat::Json => print_json(&graph_view(&definition)?)?,
  }

  Ok(())
}
