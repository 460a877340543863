mod llb;
mod preview;

use std::collections::BTreeMap;

use poemkit_lib::gateway::BuildOpts;

pub use llb::{DumpFormat, cmd_llb};
pub use preview::cmd_preview;

/// Session id used when no backend session exists.
const LOCAL_SESSION: &str = "local";

fn build_opts(opts: Vec<(String, String)>) -> BuildOpts {
  BuildOpts {
    opts: opts.into_iter().collect::<BTreeMap<_, _>>(),
    session_id: LOCAL_SESSION.to_string(),
  }
}
