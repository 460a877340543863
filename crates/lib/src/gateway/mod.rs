//! The backend solve protocol.
//!
//! The frontend never executes graphs itself. It hands a [`Definition`] to a
//! [`Gateway`], gets back a [`SolveResult`] holding references to filesystem
//! snapshots, and reads files out of those snapshots. How the gateway reaches
//! the backend is up to the implementation.
//!
//! [`Definition`]: crate::llb::Definition

pub mod local;
mod types;

use std::future::Future;

pub use local::LocalGateway;
pub use types::*;

/// A connection to a solving backend.
pub trait Gateway: Sync {
  /// Options supplied by the backend for this invocation.
  fn build_opts(&self) -> BuildOpts;

  /// Execute a definition and return its result.
  fn solve(&self, request: SolveRequest) -> impl Future<Output = Result<SolveResult, GatewayError>> + Send;

  /// Read a file from a result reference's snapshot.
  fn read_file(
    &self,
    reference: &Reference,
    request: ReadRequest,
  ) -> impl Future<Output = Result<Vec<u8>, GatewayError>> + Send;
}
