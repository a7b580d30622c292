//! Track catalog: the remote search API and the audio stream endpoint.
//!
//! The catalog is an external collaborator; this module only knows the
//! request/response shapes and runs requests off the UI thread.

mod client;
mod download;
mod model;
mod worker;

pub use client::*;
pub use download::*;
pub use model::*;
pub use worker::*;

#[cfg(test)]
mod tests;
