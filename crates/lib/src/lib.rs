//! poemkit-lib: build-graph construction and solve-protocol client
//!
//! This crate provides the core of a build frontend:
//! - `llb`: content-addressed operation graphs and their builder
//! - `gateway`: the narrow request/response protocol to a solving backend
//! - `solve`: artifact fetch and graph submission over a gateway
//! - `image`: image config decoding and synthetic history
//! - `frontend`: the build path tying the above together

pub mod config;
pub mod consts;
pub mod frontend;
pub mod gateway;
pub mod image;
pub mod llb;
pub mod solve;
pub mod util;
