use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::{App, Focus};
use crate::audio::{Transport, TransportNotice};
use crate::catalog::{Catalog, DownloadOutcome, SearchOutcome, spawn_download, spawn_search};
use crate::config;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    catalog: Arc<dyn Catalog>,
    search_tx: Sender<SearchOutcome>,
    search_rx: Receiver<SearchOutcome>,
    download_tx: Sender<DownloadOutcome>,
    download_rx: Receiver<DownloadOutcome>,
    /// Where the waveform was drawn last frame, for click-to-seek.
    pub waveform_area: Rect,
}

impl EventLoopState {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        let (search_tx, search_rx) = mpsc::channel();
        let (download_tx, download_rx) = mpsc::channel();
        Self {
            catalog,
            search_tx,
            search_rx,
            download_tx,
            download_rx,
            waveform_area: Rect::default(),
        }
    }
}

/// Main terminal event loop: handles input, UI drawing and results coming
/// back from workers and media. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    transport: &mut Transport,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        drain_background(app, transport, state);

        terminal.draw(|f| state.waveform_area = ui::draw(f, app, transport, settings))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key_event(key, settings, app, transport, state);
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, transport, state),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Apply everything that arrived from workers and the media since last frame.
pub fn drain_background(app: &mut App, transport: &mut Transport, state: &EventLoopState) {
    while let Ok(outcome) = state.search_rx.try_recv() {
        app.finish_search(outcome);
    }

    while let Ok(outcome) = state.download_rx.try_recv() {
        match outcome.result {
            Ok(path) => {
                info!(id = %outcome.track.id, path = %path.display(), "download saved");
                app.set_status(format!("Saved {}", path.display()));
            }
            Err(e) => app.set_status(format!("Download of {} failed: {e}", outcome.track.display())),
        }
    }

    for notice in transport.pump() {
        app.set_status(notice_text(&notice));
    }
}

fn notice_text(notice: &TransportNotice) -> String {
    match notice {
        TransportNotice::Ready(track) => format!("Ready: {}", track.display()),
        TransportNotice::Ended => "Finished".to_string(),
        TransportNotice::LoadFailed(msg) => format!("Could not load track: {msg}"),
        TransportNotice::PlaybackRejected(msg) => msg.clone(),
        TransportNotice::SessionFailed(msg) => format!("Playback reset: {msg}"),
    }
}

fn toggle_play(app: &mut App, transport: &mut Transport) {
    if let Err(e) = transport.toggle_play() {
        app.set_status(e.to_string());
    }
}

fn handle_mouse_event(mouse: MouseEvent, transport: &mut Transport, state: &EventLoopState) {
    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        if let Some(fraction) = ui::click_fraction(state.waveform_area, mouse.column, mouse.row) {
            transport.seek_fraction(fraction);
        }
    }
}

pub fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    transport: &mut Transport,
    state: &mut EventLoopState,
) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.focus {
        Focus::Search => handle_search_key(key, app, state),
        Focus::Results => handle_results_key(key, settings, app, transport, state),
        Focus::Equalizer => handle_equalizer_key(key, settings, app, transport),
    }
}

fn handle_search_key(key: KeyEvent, app: &mut App, state: &mut EventLoopState) {
    match key.code {
        KeyCode::Esc => {
            if app.has_results() {
                app.focus_results();
            }
        }
        KeyCode::Backspace => app.pop_query_char(),
        KeyCode::Enter => {
            if let Some((seq, query)) = app.begin_search() {
                spawn_search(state.catalog.clone(), seq, query, state.search_tx.clone());
            }
        }
        KeyCode::Char(c) => {
            if !c.is_control() {
                app.push_query_char(c);
            }
        }
        _ => {}
    }
}

fn handle_results_key(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    transport: &mut Transport,
    state: &mut EventLoopState,
) {
    let scrub = settings.controls.scrub_seconds as f64;
    let step = settings.controls.volume_step;
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') => app.focus_search(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => {
            if let Some(track) = app.selected_track().cloned() {
                app.set_status(format!("Loading {}", track.display()));
                transport.select_track(track);
            }
        }
        KeyCode::Char(' ') | KeyCode::Char('p') => toggle_play(app, transport),
        KeyCode::Char('h') | KeyCode::Left => transport.scrub(-scrub),
        KeyCode::Char('l') | KeyCode::Right => transport.scrub(scrub),
        KeyCode::Char('+') | KeyCode::Char('=') => transport.nudge_volume(step),
        KeyCode::Char('-') => transport.nudge_volume(-step),
        KeyCode::Char('m') => transport.toggle_mute(),
        KeyCode::Char('d') => {
            if let Some(track) = app.selected_track().cloned() {
                app.set_status(format!("Downloading {}", track.display()));
                spawn_download(
                    state.catalog.clone(),
                    track,
                    settings.download_dir(),
                    state.download_tx.clone(),
                );
            }
        }
        KeyCode::Char('e') => app.toggle_equalizer(),
        _ => {}
    }
}

fn handle_equalizer_key(key: KeyEvent, settings: &config::Settings, app: &mut App, transport: &mut Transport) {
    let band = app.eq_band;
    let current = transport.bands()[band].gain_db;
    let step = settings.controls.gain_step_db;
    let target = match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc | KeyCode::Char('e') => {
            app.toggle_equalizer();
            return;
        }
        KeyCode::Char('h') | KeyCode::Left => {
            app.prev_band();
            return;
        }
        KeyCode::Char('l') | KeyCode::Right => {
            app.next_band();
            return;
        }
        KeyCode::Char(' ') => {
            toggle_play(app, transport);
            return;
        }
        KeyCode::Char('k') | KeyCode::Up => current + step,
        KeyCode::Char('j') | KeyCode::Down => current - step,
        KeyCode::Char('0') => 0.0,
        _ => return,
    };
    if !transport.set_band_gain(band, target) {
        app.set_status("Equalizer is inactive until playback starts");
    }
}
