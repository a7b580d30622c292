use thiserror::Error;

use crate::audio::MediaId;
use crate::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum PlayerError {
    /// Search or stream fetch failed. Recoverable, never fatal to playback.
    #[error("network failure: {0}")]
    Network(#[from] CatalogError),

    /// The host refused to start or resume audio output.
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),

    /// A second media resource tried to bind an already-bound graph.
    #[error("signal graph is bound to media {bound}, refusing to bind media {requested}")]
    GraphBindingConflict { bound: MediaId, requested: MediaId },

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("seek failed: {0}")]
    Seek(String),

    /// Play was requested before the media finished loading.
    #[error("media is not loaded yet")]
    NotLoaded,
}

impl PlayerError {
    /// Whether this error invalidates the whole playback session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::GraphBindingConflict { .. })
    }
}
