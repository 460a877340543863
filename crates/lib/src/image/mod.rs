//! Image configuration and history synthesis.
//!
//! The backend attaches the built image's OCI config to the solve result as
//! JSON under `containerimage.config`. This module decodes it, rewrites its
//! history from artifact lines, and writes it back.

pub mod history;
mod types;

pub use history::{HistoryError, decode_image_config, derive_history, synthesize_history};
pub use types::*;
