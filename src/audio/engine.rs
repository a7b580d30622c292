//! `rodio`-backed audio engine.
//!
//! The output stream is the process-wide audio context. It is opened on the
//! first `resume` and kept for the life of the process; every media resource
//! mixes into it through its own `Sink`.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, info, warn};

use super::graph::GraphPort;
use super::media::{
    AudioEngine, EngineState, MediaEnvelope, MediaEvent, MediaEvents, MediaId, MediaResource, SessionId,
};
use super::source::{EqSource, SharedSamples};
use crate::catalog::Catalog;
use crate::error::PlayerError;
use crate::waveform::compute_peaks;

#[derive(Debug, Copy, Clone)]
pub struct EngineOptions {
    /// Interval between position ticks.
    pub tick: Duration,
    /// Number of peak columns computed for the waveform view.
    pub waveform_buckets: usize,
}

pub struct RodioEngine {
    catalog: Arc<dyn Catalog>,
    options: EngineOptions,
    stream: Option<OutputStream>,
    mixer: Arc<OnceLock<Mixer>>,
    next_media: u64,
}

impl RodioEngine {
    pub fn new(catalog: Arc<dyn Catalog>, options: EngineOptions) -> Self {
        Self {
            catalog,
            options,
            stream: None,
            mixer: Arc::new(OnceLock::new()),
            next_media: 0,
        }
    }
}

impl AudioEngine for RodioEngine {
    fn state(&self) -> EngineState {
        if self.stream.is_some() {
            EngineState::Running
        } else {
            EngineState::Suspended
        }
    }

    fn resume(&mut self) -> Result<(), PlayerError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::PlaybackRejected(format!("no audio output device: {e}")))?;
        // rodio logs to stderr when the stream is dropped, which would tear
        // through the TUI on exit.
        stream.log_on_drop(false);
        let _ = self.mixer.set(stream.mixer().clone());
        self.stream = Some(stream);
        info!("audio output opened");
        Ok(())
    }

    fn open_media(&mut self, session: SessionId, url: &str, events: MediaEvents) -> Box<dyn MediaResource> {
        self.next_media += 1;
        let id = MediaId(self.next_media);
        debug!(media = %id, %session, url, "opening media");
        Box::new(RodioMedia::open(
            id,
            session,
            url.to_string(),
            self.catalog.clone(),
            self.mixer.clone(),
            events,
            self.options,
        ))
    }
}

/// Fully decoded stream, kept in memory so seeking is exact. Every sink
/// reads the same buffer.
struct DecodedAudio {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
    duration: Duration,
}

fn decode(bytes: Vec<u8>) -> Result<DecodedAudio, PlayerError> {
    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| PlayerError::Decode(e.to_string()))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.collect();
    if samples.is_empty() || channels == 0 || sample_rate == 0 {
        return Err(PlayerError::Decode("stream contains no audio".to_string()));
    }
    let frames = samples.len() / usize::from(channels);
    let duration = Duration::from_secs_f64(frames as f64 / f64::from(sample_rate));
    Ok(DecodedAudio {
        samples: samples.into(),
        channels,
        sample_rate,
        duration,
    })
}

pub struct RodioMedia {
    id: MediaId,
    session: SessionId,
    port: Arc<GraphPort>,
    mixer: Arc<OnceLock<Mixer>>,
    decoded: Arc<OnceLock<DecodedAudio>>,
    cancelled: Arc<AtomicBool>,
    events: MediaEvents,
    tick: Duration,
    sink: Option<Arc<Sink>>,
    ticker_stop: Arc<AtomicBool>,
    /// Shared by every ticker of this media so sequence numbers never repeat.
    tick_seq: Arc<AtomicU64>,
    volume: f32,
    start_at: Duration,
    stopped: bool,
}

impl RodioMedia {
    fn open(
        id: MediaId,
        session: SessionId,
        url: String,
        catalog: Arc<dyn Catalog>,
        mixer: Arc<OnceLock<Mixer>>,
        events: MediaEvents,
        options: EngineOptions,
    ) -> Self {
        let media = Self {
            id,
            session,
            port: Arc::new(GraphPort::default()),
            mixer,
            decoded: Arc::new(OnceLock::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
            events,
            tick: options.tick,
            sink: None,
            ticker_stop: Arc::new(AtomicBool::new(true)),
            tick_seq: Arc::new(AtomicU64::new(0)),
            volume: 1.0,
            start_at: Duration::ZERO,
            stopped: false,
        };
        media.spawn_loader(url, catalog, options.waveform_buckets);
        media
    }

    fn spawn_loader(&self, url: String, catalog: Arc<dyn Catalog>, buckets: usize) {
        let session = self.session;
        let decoded = self.decoded.clone();
        let cancelled = self.cancelled.clone();
        let events = self.events.clone();
        thread::spawn(move || {
            let result = catalog
                .fetch_audio(&url)
                .map_err(PlayerError::from)
                .and_then(|audio| decode(audio.bytes));

            if cancelled.load(Ordering::Acquire) {
                debug!(%session, "load finished after cancel, discarding");
                return;
            }

            let send = |event| {
                let _ = events.send(MediaEnvelope { session, event });
            };
            match result {
                Ok(audio) => {
                    let duration = audio.duration;
                    let peaks = compute_peaks(&audio.samples, audio.channels, buckets);
                    let _ = decoded.set(audio);
                    send(MediaEvent::Loaded { duration });
                    send(MediaEvent::WaveformReady { peaks });
                }
                Err(e) => {
                    warn!(%session, %url, error = %e, "media load failed");
                    send(MediaEvent::Failed(e.to_string()));
                }
            }
        });
    }

    fn stop_ticker(&mut self) {
        self.ticker_stop.store(true, Ordering::Release);
    }

    fn spawn_ticker(&mut self, sink: Arc<Sink>) {
        self.stop_ticker();
        let stop = Arc::new(AtomicBool::new(false));
        self.ticker_stop = stop.clone();

        let session = self.session;
        let events = self.events.clone();
        let tick = self.tick;
        let tick_seq = self.tick_seq.clone();
        thread::spawn(move || {
            loop {
                thread::sleep(tick);
                if stop.load(Ordering::Acquire) {
                    break;
                }
                let seq = tick_seq.fetch_add(1, Ordering::AcqRel) + 1;
                let position = sink.get_pos();
                let tick_sent = events.send(MediaEnvelope {
                    session,
                    event: MediaEvent::Tick { seq, position },
                });
                if tick_sent.is_err() {
                    break;
                }
                if sink.empty() {
                    let _ = events.send(MediaEnvelope {
                        session,
                        event: MediaEvent::Ended,
                    });
                    break;
                }
            }
        });
    }

    /// Build a sink over the decoded samples, filtered through the graph port.
    fn start_sink(&mut self) -> Result<(), PlayerError> {
        let audio = self.decoded.get().ok_or(PlayerError::NotLoaded)?;
        let mixer = self
            .mixer
            .get()
            .ok_or_else(|| PlayerError::PlaybackRejected("audio engine is suspended".to_string()))?;

        let buffer = SharedSamples::new(audio.channels, audio.sample_rate, audio.samples.clone());
        let sink = Sink::connect_new(mixer);
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(EqSource::new(buffer, self.port.clone()));
        if !self.start_at.is_zero() {
            sink.try_seek(self.start_at)
                .map_err(|e| PlayerError::Seek(e.to_string()))?;
        }
        sink.play();

        let sink = Arc::new(sink);
        self.spawn_ticker(sink.clone());
        self.sink = Some(sink);
        Ok(())
    }

    fn live_sink(&self) -> Option<&Arc<Sink>> {
        self.sink.as_ref().filter(|s| !s.empty())
    }
}

impl MediaResource for RodioMedia {
    fn id(&self) -> MediaId {
        self.id
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        if self.stopped {
            return Err(PlayerError::PlaybackRejected("media was stopped".to_string()));
        }
        if let Some(sink) = self.live_sink() {
            sink.play();
            return Ok(());
        }
        // Either never started or drained to the end: start a fresh sink.
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.start_sink()
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.stop_ticker();
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        if !self.stopped {
            debug!(media = %self.id, session = %self.session, "media stopped");
        }
        self.stopped = true;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        match self.live_sink() {
            Some(sink) => sink
                .try_seek(position)
                .map_err(|e| PlayerError::Seek(e.to_string())),
            None => {
                self.start_at = position;
                Ok(())
            }
        }
    }

    fn tick_seq(&self) -> u64 {
        self.tick_seq.load(Ordering::Acquire)
    }

    fn graph_port(&self) -> &GraphPort {
        &self.port
    }
}

impl Drop for RodioMedia {
    fn drop(&mut self) {
        self.stop();
    }
}
