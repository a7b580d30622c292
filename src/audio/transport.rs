//! Transport Controller.
//!
//! Owns the logical playback state and is the only place that talks to both
//! the media resource and the waveform view, so the two can never disagree
//! about position or play/pause. Media events arrive on one channel and are
//! applied in `pump`; events from a previous session are dropped there.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::eq::{BAND_COUNT, EqualizerBand, bands_with_gains};
use super::graph::SignalGraphManager;
use super::media::{AudioEngine, EngineState, MediaEnvelope, MediaEvent, SessionId};
use super::session::PlaybackSession;
use crate::catalog::{Catalog, TrackDescriptor};
use crate::error::PlayerError;
use crate::waveform::{Waveform, fraction};

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<TrackDescriptor>,
    pub source_url: Option<String>,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    /// Remembered level; unaffected by mute.
    pub volume: f32,
    pub is_muted: bool,
}

impl PlaybackState {
    fn idle(volume: f32) -> Self {
        Self {
            current_track: None,
            source_url: None,
            is_playing: false,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume,
            is_muted: volume == 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportPhase {
    /// No track selected.
    Idle,
    /// Source set, metadata not known yet.
    Loading,
    Paused,
    Playing,
}

/// Things the status line should hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportNotice {
    Ready(TrackDescriptor),
    Ended,
    LoadFailed(String),
    PlaybackRejected(String),
    SessionFailed(String),
}

#[derive(Debug, Copy, Clone)]
pub struct TransportOptions {
    pub initial_volume: f32,
    pub filter_q: f32,
    pub autoplay: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            filter_q: 1.0,
            autoplay: true,
        }
    }
}

pub struct Transport {
    engine: Box<dyn AudioEngine>,
    catalog: Arc<dyn Catalog>,
    options: TransportOptions,
    state: PlaybackState,
    phase: TransportPhase,
    session: Option<PlaybackSession>,
    waveform: Waveform,
    events_tx: Sender<MediaEnvelope>,
    events_rx: Receiver<MediaEnvelope>,
    next_session: u64,
    last_tick_seq: u64,
    play_when_ready: bool,
    /// Last non-zero volume, restored on unmute.
    audible_volume: f32,
    /// Equalizer gains carried from the previous session into the next one.
    carried_gains: [f32; BAND_COUNT],
}

fn sanitize_volume(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

impl Transport {
    pub fn new(engine: Box<dyn AudioEngine>, catalog: Arc<dyn Catalog>, options: TransportOptions) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let volume = sanitize_volume(options.initial_volume);
        Self {
            engine,
            catalog,
            options,
            state: PlaybackState::idle(volume),
            phase: TransportPhase::Idle,
            session: None,
            waveform: Waveform::new(),
            events_tx,
            events_rx,
            next_session: 0,
            last_tick_seq: 0,
            play_when_ready: false,
            audible_volume: if volume > 0.0 { volume } else { 1.0 },
            carried_gains: [0.0; BAND_COUNT],
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> TransportPhase {
        self.phase
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    fn effective_volume(&self) -> f32 {
        if self.state.is_muted { 0.0 } else { self.state.volume }
    }

    /// Replace the current session with one for `track` and start loading it.
    ///
    /// The previous media is stopped before the new one is opened, so two
    /// tracks can never sound at once.
    pub fn select_track(&mut self, track: TrackDescriptor) {
        let url = self.catalog.stream_url(&track.id);
        self.close_session();

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let graph = SignalGraphManager::with_gains(self.options.filter_q, self.carried_gains);
        let mut session = PlaybackSession::open(
            self.engine.as_mut(),
            id,
            track.clone(),
            url.clone(),
            self.events_tx.clone(),
            graph,
        );
        session.media_mut().set_volume(self.effective_volume());
        self.waveform.load(session.source_url());
        self.session = Some(session);

        self.last_tick_seq = 0;
        self.play_when_ready = self.options.autoplay;
        self.state.current_track = Some(track);
        self.state.source_url = Some(url);
        self.state.is_playing = false;
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = 0.0;
        self.phase = TransportPhase::Loading;
        debug!(session = %id, "transport -> loading");
    }

    /// Flip between playing and paused. No-op without a track.
    ///
    /// While loading this toggles whether playback starts once ready.
    pub fn toggle_play(&mut self) -> Result<(), PlayerError> {
        match self.phase {
            TransportPhase::Idle => Ok(()),
            TransportPhase::Loading => {
                self.play_when_ready = !self.play_when_ready;
                Ok(())
            }
            TransportPhase::Playing => {
                self.pause();
                Ok(())
            }
            TransportPhase::Paused => self.start_playback(),
        }
    }

    fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.media_mut().pause();
        }
        self.waveform.pause();
        self.state.is_playing = false;
        self.phase = TransportPhase::Paused;
        debug!("transport -> paused");
    }

    /// Graph first, then the engine, then media and waveform in that order.
    fn start_playback(&mut self) -> Result<(), PlayerError> {
        let graph_result = match self.session.as_mut() {
            Some(session) => session.ensure_graph(),
            None => return Ok(()),
        };
        if let Err(e) = graph_result {
            self.fail_session(&e);
            return Err(e);
        }

        if self.engine.state() == EngineState::Suspended {
            if let Err(e) = self.engine.resume() {
                warn!(error = %e, "audio engine refused to resume");
                self.state.is_playing = false;
                self.phase = TransportPhase::Paused;
                return Err(e);
            }
        }

        let finished = self.state.duration_seconds > 0.0
            && self.state.position_seconds >= self.state.duration_seconds;
        if finished {
            self.seek(0.0);
        }

        let play_result = match self.session.as_mut() {
            Some(session) => session.media_mut().play(),
            None => return Ok(()),
        };
        if let Err(e) = play_result {
            warn!(error = %e, "media refused to play");
            self.state.is_playing = false;
            self.phase = TransportPhase::Paused;
            return Err(e);
        }

        self.waveform.play();
        self.state.is_playing = true;
        self.phase = TransportPhase::Playing;
        debug!("transport -> playing");
        Ok(())
    }

    /// Apply a position report. Suppressed until the duration is known.
    pub fn on_position_tick(&mut self, position_seconds: f64, duration_seconds: f64) {
        if self.session.is_none() || !(duration_seconds > 0.0) || position_seconds.is_nan() {
            return;
        }
        let position = position_seconds.clamp(0.0, duration_seconds);
        self.state.duration_seconds = duration_seconds;
        self.state.position_seconds = position;
        // The waveform view is driven independently, so keep it in step.
        self.waveform.seek_to(fraction(position, duration_seconds));
    }

    /// Jump to `position_seconds`, clamped into `[0, duration]`.
    pub fn seek(&mut self, position_seconds: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let duration = self.state.duration_seconds;
        let target = if position_seconds.is_nan() || duration <= 0.0 {
            0.0
        } else {
            position_seconds.clamp(0.0, duration)
        };
        let media = session.media_mut();
        if let Err(e) = media.seek(Duration::from_secs_f64(target)) {
            warn!(error = %e, target, "seek failed");
        }
        // Ticks issued before the seek still report the old position.
        self.last_tick_seq = self.last_tick_seq.max(media.tick_seq());
        self.state.position_seconds = target;
        self.waveform.seek_to(fraction(target, duration));
    }

    /// Seek gesture from the waveform view.
    pub fn seek_fraction(&mut self, fraction: f64) {
        let f = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        self.seek(f * self.state.duration_seconds);
    }

    pub fn scrub(&mut self, delta_seconds: f64) {
        self.seek(self.state.position_seconds + delta_seconds);
    }

    /// Set the volume, clamped into `[0, 1]`. Zero means muted, anything
    /// else means unmuted.
    pub fn set_volume(&mut self, volume: f32) {
        let v = sanitize_volume(volume);
        self.state.volume = v;
        self.state.is_muted = v == 0.0;
        if v > 0.0 {
            self.audible_volume = v;
        }
        if let Some(session) = self.session.as_mut() {
            session.media_mut().set_volume(v);
        }
    }

    pub fn nudge_volume(&mut self, delta: f32) {
        self.set_volume(self.state.volume + delta);
    }

    /// Mute keeps the stored volume so unmute can restore it.
    pub fn toggle_mute(&mut self) {
        if self.state.is_muted {
            let restore = if self.state.volume > 0.0 {
                self.state.volume
            } else {
                self.audible_volume
            };
            self.state.volume = restore;
            self.state.is_muted = false;
            if let Some(session) = self.session.as_mut() {
                session.media_mut().set_volume(restore);
            }
        } else {
            self.state.is_muted = true;
            if let Some(session) = self.session.as_mut() {
                session.media_mut().set_volume(0.0);
            }
        }
    }

    /// Route an equalizer change to the current session's graph.
    /// Returns whether the change took effect.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> bool {
        match self.session.as_mut() {
            Some(session) => session.graph_mut().set_band_gain(index, gain_db),
            None => false,
        }
    }

    /// Whether equalizer changes currently take effect.
    pub fn equalizer_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.graph().is_initialized())
    }

    pub fn bands(&self) -> [EqualizerBand; BAND_COUNT] {
        match &self.session {
            Some(session) => *session.graph().bands(),
            None => bands_with_gains(self.carried_gains),
        }
    }

    /// Apply every pending media event in arrival order.
    pub fn pump(&mut self) -> Vec<TransportNotice> {
        let mut notices = Vec::new();
        while let Ok(envelope) = self.events_rx.try_recv() {
            let current = self.session.as_ref().map(PlaybackSession::id);
            if current != Some(envelope.session) {
                debug!(session = %envelope.session, "dropping stale media event");
                continue;
            }
            self.apply(envelope.event, &mut notices);
        }
        notices
    }

    fn apply(&mut self, event: MediaEvent, notices: &mut Vec<TransportNotice>) {
        match event {
            MediaEvent::Loaded { duration } => {
                if self.phase != TransportPhase::Loading {
                    return;
                }
                self.state.duration_seconds = duration.as_secs_f64();
                self.phase = TransportPhase::Paused;
                if let Some(track) = self.session.as_ref().map(|s| s.track().clone()) {
                    info!(track = %track.id, duration = self.state.duration_seconds, "media ready");
                    notices.push(TransportNotice::Ready(track));
                }
                if std::mem::take(&mut self.play_when_ready) {
                    if let Err(e) = self.start_playback() {
                        notices.push(Self::notice_for(e));
                    }
                }
            }
            MediaEvent::WaveformReady { peaks } => {
                self.waveform.on_ready(peaks);
            }
            MediaEvent::Tick { seq, position } => {
                if seq <= self.last_tick_seq {
                    return;
                }
                self.last_tick_seq = seq;
                let duration = self.state.duration_seconds;
                self.on_position_tick(position.as_secs_f64(), duration);
            }
            MediaEvent::Ended => {
                self.state.is_playing = false;
                self.state.position_seconds = self.state.duration_seconds;
                self.phase = TransportPhase::Paused;
                self.waveform.pause();
                self.waveform.seek_to(1.0);
                notices.push(TransportNotice::Ended);
            }
            MediaEvent::Failed(message) => {
                self.play_when_ready = false;
                self.state.is_playing = false;
                if self.phase == TransportPhase::Loading {
                    self.phase = TransportPhase::Paused;
                }
                notices.push(TransportNotice::LoadFailed(message));
            }
        }
    }

    fn notice_for(e: PlayerError) -> TransportNotice {
        if e.is_session_fatal() {
            TransportNotice::SessionFailed(e.to_string())
        } else {
            TransportNotice::PlaybackRejected(e.to_string())
        }
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.carried_gains = session.graph().gains();
            session.close();
        }
    }

    /// Tear down a session after an invariant violation. The app keeps going.
    fn fail_session(&mut self, e: &PlayerError) {
        error!(error = %e, "playback session failed");
        self.close_session();
        self.waveform.unload();
        self.play_when_ready = false;
        let is_muted = self.state.is_muted;
        self.state = PlaybackState {
            is_muted,
            ..PlaybackState::idle(self.state.volume)
        };
        self.phase = TransportPhase::Idle;
    }

    /// Stop everything; used on exit.
    pub fn shutdown(&mut self) {
        self.close_session();
        self.waveform.dispose();
        self.state.is_playing = false;
        self.phase = TransportPhase::Idle;
    }
}
