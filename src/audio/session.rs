use tracing::info;

use super::graph::SignalGraphManager;
use super::media::{AudioEngine, MediaEvents, MediaResource, SessionId};
use crate::catalog::TrackDescriptor;
use crate::error::PlayerError;

/// One selected track with its media and graph. Never reused: selecting
/// another track closes this one first.
pub struct PlaybackSession {
    id: SessionId,
    track: TrackDescriptor,
    source_url: String,
    media: Box<dyn MediaResource>,
    graph: SignalGraphManager,
}

impl PlaybackSession {
    pub fn open(
        engine: &mut dyn AudioEngine,
        id: SessionId,
        track: TrackDescriptor,
        source_url: String,
        events: MediaEvents,
        graph: SignalGraphManager,
    ) -> Self {
        let media = engine.open_media(id, &source_url, events);
        info!(session = %id, media = %media.id(), track = %track.id, "playback session opened");
        Self {
            id,
            track,
            source_url,
            media,
            graph,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn track(&self) -> &TrackDescriptor {
        &self.track
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn media_mut(&mut self) -> &mut dyn MediaResource {
        self.media.as_mut()
    }

    pub fn graph(&self) -> &SignalGraphManager {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SignalGraphManager {
        &mut self.graph
    }

    /// Lazily attach the signal graph to this session's media.
    pub fn ensure_graph(&mut self) -> Result<(), PlayerError> {
        self.graph.ensure_initialized(self.media.as_ref()).map(|_| ())
    }

    /// Stop the media and release the session.
    pub fn close(mut self) {
        self.media.stop();
        info!(session = %self.id, "playback session closed");
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if !self.media.is_stopped() {
            self.media.stop();
        }
    }
}
