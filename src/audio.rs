//! Audio playback and signal processing.
//!
//! `transport` owns playback state, `session` ties a track to its media and
//! signal graph, `graph`/`source` build and run the equalizer chain, and
//! `engine` is the `rodio` host behind the `media` traits.

mod biquad;
mod engine;
mod eq;
mod graph;
mod media;
mod session;
mod source;
mod transport;

pub use engine::{EngineOptions, RodioEngine};
pub use eq::*;
pub use graph::{GraphPort, SignalGraph, SignalGraphManager, StageSpec};
pub use media::*;
pub use session::PlaybackSession;
pub use transport::*;

#[cfg(test)]
mod tests;
