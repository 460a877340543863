//! Implementation of the `poemkit preview` command.
//!
//! Runs the complete build path against a local directory, so the history a
//! backend build would produce can be inspected without one.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use poemkit_lib::config::FrontendOptions;
use poemkit_lib::consts::{META_IMAGE_CONFIG, OPT_FILE};
use poemkit_lib::frontend::build;
use poemkit_lib::gateway::LocalGateway;
use poemkit_lib::image::ImageConfig;

use crate::output::{OutputFormat, print_entry, print_json, print_stat, print_success, truncate_digest};

pub fn cmd_preview(
  context: &Path,
  file: Option<String>,
  mut opts: Vec<(String, String)>,
  timeout: Option<u64>,
  format: OutputFormat,
) -> Result<()> {
  if !context.is_dir() {
    bail!("Context directory not found: {}", context.display());
  }
  if let Some(file) = file {
    opts.push((OPT_FILE.to_string(), file));
  }

  let build_opts = super::build_opts(opts);
  let mut options = FrontendOptions::from_build_opts(&build_opts);
  if let Some(secs) = timeout {
    options = options.with_timeout(Duration::from_secs(secs));
  }

  let gateway = LocalGateway::new(context).with_opts(build_opts);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt.block_on(build(&gateway, &options)).context("Build failed")?;

  let reference = result.single_ref().context("Build produced no single result")?;
  let raw = result
    .meta(META_IMAGE_CONFIG)
    .context("Build result carries no image config")?;
  let image: ImageConfig = serde_json::from_slice(raw).context("Failed to decode image config")?;
  info!(reference = %reference, entries = image.history.len(), "preview complete");

  if format.is_json() {
    return print_json(&image);
  }

  print_success(&format!("Built {} from {}", options.file, context.display()));
  print_stat("Reference", truncate_digest(&reference.id));
  print_stat("History", &image.history.len().to_string());
  println!();
  for entry in &image.history {
    let created = entry.created.map(|t| t.to_rfc3339()).unwrap_or_default();
    print_entry(&created, entry.created_by.as_deref().unwrap_or(""));
  }

  Ok(())
}
