//! Configuration loader and schema types.
//!
//! Settings come from an optional TOML file and `WAVETUNE__*` environment
//! variables, layered over struct defaults.

mod load;
mod schema;

pub use load::{default_download_dir, default_log_path};
pub use schema::*;
