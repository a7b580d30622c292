use std::fmt;
use std::sync::mpsc::Sender;
use std::time::Duration;

use super::graph::GraphPort;
use crate::error::PlayerError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(pub u64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of one playback session. Strictly increasing per process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// No output yet; waiting for the first explicit play.
    Suspended,
    Running,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Metadata is known and the media can start.
    Loaded { duration: Duration },
    /// Peaks for the waveform view are available.
    WaveformReady { peaks: Vec<f32> },
    /// Playback advanced. `seq` increases per media.
    Tick { seq: u64, position: Duration },
    /// Played to the end.
    Ended,
    /// Loading failed; the session stays without audio.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEnvelope {
    pub session: SessionId,
    pub event: MediaEvent,
}

pub type MediaEvents = Sender<MediaEnvelope>;

/// One loaded audio stream.
pub trait MediaResource {
    fn id(&self) -> MediaId;

    /// Start or resume output. Fails when the media is not loaded yet or the
    /// host refuses to produce sound.
    fn play(&mut self) -> Result<(), PlayerError>;

    fn pause(&mut self);

    /// Stop for good: cancel loading, silence output, release the device.
    fn stop(&mut self);

    fn is_stopped(&self) -> bool;

    /// Effective output level in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError>;

    /// Sequence number of the last `Tick` this media has issued.
    fn tick_seq(&self) -> u64;

    /// The attachment point for this media's signal graph.
    fn graph_port(&self) -> &GraphPort;
}

/// The process-wide audio context.
pub trait AudioEngine {
    fn state(&self) -> EngineState;

    /// Leave `Suspended`. Idempotent once running.
    fn resume(&mut self) -> Result<(), PlayerError>;

    /// Start loading `url` as a new media resource that reports to `events`
    /// under `session`.
    fn open_media(&mut self, session: SessionId, url: &str, events: MediaEvents) -> Box<dyn MediaResource>;
}
