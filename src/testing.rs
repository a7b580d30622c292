//! In-process stand-ins for the network and the audio host.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;

use crate::audio::{
    AudioEngine, EngineState, GraphPort, MediaEnvelope, MediaEvent, MediaEvents, MediaId, MediaResource,
    SessionId,
};
use crate::catalog::{AudioBytes, Catalog, CatalogError, TrackDescriptor};
use crate::error::PlayerError;

pub fn track(id: &str) -> TrackDescriptor {
    TrackDescriptor {
        id: id.to_string(),
        title: format!("Title {id}"),
        artist: format!("Artist {id}"),
        thumbnail: String::new(),
    }
}

pub struct FakeCatalog {
    tracks: Vec<TrackDescriptor>,
    fail: bool,
    searches: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn with_tracks(tracks: Vec<TrackDescriptor>) -> Self {
        Self {
            tracks,
            fail: false,
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_tracks(Vec::new())
        }
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

impl Catalog for FakeCatalog {
    fn search(&self, query: &str) -> Result<Vec<TrackDescriptor>, CatalogError> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(CatalogError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(self.tracks.clone())
    }

    fn stream_url(&self, id: &str) -> String {
        format!("http://fake/get_audio/{id}")
    }

    fn fetch_audio(&self, _url: &str) -> Result<AudioBytes, CatalogError> {
        if self.fail {
            return Err(CatalogError::Status(StatusCode::BAD_GATEWAY));
        }
        Ok(AudioBytes {
            bytes: vec![0; 16],
            content_type: Some("audio/mpeg".to_string()),
        })
    }
}

/// Observable state of one fake media resource.
#[derive(Debug, Default)]
pub struct MediaProbe {
    pub playing: Cell<bool>,
    pub stopped: Cell<bool>,
    pub volume: Cell<f32>,
    pub position: Cell<Duration>,
    pub plays: Cell<u32>,
    pub reject_play: Cell<bool>,
    /// Highest tick sequence number emitted so far.
    pub tick_seq: Cell<u64>,
}

pub struct FakeMedia {
    id: MediaId,
    port: Arc<GraphPort>,
    probe: Rc<MediaProbe>,
}

impl FakeMedia {
    /// A media resource not attached to any engine.
    pub fn detached(id: u64) -> Self {
        Self {
            id: MediaId(id),
            port: Arc::new(GraphPort::default()),
            probe: Rc::new(MediaProbe::default()),
        }
    }

    /// A media resource attached to someone else's port.
    pub fn on_port(id: u64, port: Arc<GraphPort>) -> Self {
        Self {
            id: MediaId(id),
            port,
            probe: Rc::new(MediaProbe::default()),
        }
    }

    pub fn port(&self) -> Arc<GraphPort> {
        self.port.clone()
    }

    /// Another media sharing this one's port, as a buggy host might hand out.
    pub fn sharing_port_with(&self, id: u64) -> Self {
        Self::on_port(id, self.port.clone())
    }
}

impl MediaResource for FakeMedia {
    fn id(&self) -> MediaId {
        self.id
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        if self.probe.reject_play.get() {
            return Err(PlayerError::PlaybackRejected("denied by test".into()));
        }
        if self.probe.stopped.get() {
            return Err(PlayerError::PlaybackRejected("media was stopped".into()));
        }
        self.probe.playing.set(true);
        self.probe.plays.set(self.probe.plays.get() + 1);
        Ok(())
    }

    fn pause(&mut self) {
        self.probe.playing.set(false);
    }

    fn stop(&mut self) {
        self.probe.playing.set(false);
        self.probe.stopped.set(true);
    }

    fn is_stopped(&self) -> bool {
        self.probe.stopped.get()
    }

    fn set_volume(&mut self, volume: f32) {
        self.probe.volume.set(volume);
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.probe.position.set(position);
        Ok(())
    }

    fn tick_seq(&self) -> u64 {
        self.probe.tick_seq.get()
    }

    fn graph_port(&self) -> &GraphPort {
        &self.port
    }
}

/// One media opened through the fake engine.
#[derive(Clone)]
pub struct OpenedMedia {
    pub session: SessionId,
    pub url: String,
    pub probe: Rc<MediaProbe>,
    pub port: Arc<GraphPort>,
    events: MediaEvents,
}

impl OpenedMedia {
    pub fn emit(&self, event: MediaEvent) {
        if let MediaEvent::Tick { seq, .. } = event {
            self.probe.tick_seq.set(self.probe.tick_seq.get().max(seq));
        }
        self.events
            .send(MediaEnvelope {
                session: self.session,
                event,
            })
            .unwrap();
    }

    pub fn is_audible(&self) -> bool {
        self.probe.playing.get() && !self.probe.stopped.get()
    }
}

#[derive(Default)]
pub struct EngineProbe {
    pub running: Cell<bool>,
    pub resumes: Cell<u32>,
    pub contexts_created: Cell<u32>,
    pub reject_resume: Cell<bool>,
    pub opened: RefCell<Vec<OpenedMedia>>,
}

impl EngineProbe {
    pub fn media(&self, index: usize) -> OpenedMedia {
        self.opened.borrow()[index].clone()
    }

    pub fn opened_count(&self) -> usize {
        self.opened.borrow().len()
    }
}

pub struct FakeEngine {
    probe: Rc<EngineProbe>,
    next_media: u64,
}

impl FakeEngine {
    pub fn new() -> (Self, Rc<EngineProbe>) {
        let probe = Rc::new(EngineProbe::default());
        (
            Self {
                probe: probe.clone(),
                next_media: 0,
            },
            probe,
        )
    }
}

impl AudioEngine for FakeEngine {
    fn state(&self) -> EngineState {
        if self.probe.running.get() {
            EngineState::Running
        } else {
            EngineState::Suspended
        }
    }

    fn resume(&mut self) -> Result<(), PlayerError> {
        self.probe.resumes.set(self.probe.resumes.get() + 1);
        if self.probe.reject_resume.get() {
            return Err(PlayerError::PlaybackRejected("no user gesture".into()));
        }
        if !self.probe.running.get() {
            self.probe.contexts_created.set(self.probe.contexts_created.get() + 1);
            self.probe.running.set(true);
        }
        Ok(())
    }

    fn open_media(&mut self, session: SessionId, url: &str, events: MediaEvents) -> Box<dyn MediaResource> {
        self.next_media += 1;
        let media = FakeMedia::detached(self.next_media);
        self.probe.opened.borrow_mut().push(OpenedMedia {
            session,
            url: url.to_string(),
            probe: media.probe.clone(),
            port: media.port(),
            events,
        });
        Box::new(media)
    }
}
