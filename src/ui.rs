//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph, Widget, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Focus};
use crate::audio::{EqualizerBand, FilterShape, Transport, TransportPhase};
use crate::config::{ControlsSettings, Settings, TimeField, UiSettings};
use crate::waveform::WaveformStatus;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("enter", "play selected");
    map.insert("space", "play/pause");
    // h/l, +/- and the equalizer step are filled dynamically from config.
    map.insert("m", "mute");
    map.insert("d", "download");
    map.insert("e", "equalizer");
    map.insert("/", "search");
    map.insert("q", "quit");
    map.insert("click", "seek");
    map
});

/// Render the controls help text for the focused pane.
fn controls_text(focus: Focus, controls: &ControlsSettings) -> String {
    match focus {
        Focus::Search => "[type] query | [enter] search | [esc] results".to_string(),
        Focus::Equalizer => format!(
            "[h/l] band | [j/k] gain -/+{}dB | [0] reset band | [esc] back",
            controls.gain_step_db
        ),
        Focus::Results => {
            // Keep the rendered order stable and human-friendly.
            let order = [
                "j/k", "enter", "space", "h/l", "+/-", "m", "d", "e", "/", "click", "q",
            ];
            order
                .iter()
                .filter_map(|k| match *k {
                    "h/l" => Some(format!("[h/l] scrub -/+{}s", controls.scrub_seconds)),
                    "+/-" => Some(format!(
                        "[+/-] volume {}%",
                        (controls.volume_step * 100.0).round()
                    )),
                    _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
                })
                .collect::<Vec<String>>()
                .join(" | ")
        }
    }
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn seconds(s: f64) -> Duration {
    if s.is_finite() && s > 0.0 {
        Duration::from_secs_f64(s)
    } else {
        Duration::ZERO
    }
}

/// Build the time text (elapsed/total/remaining) per `UiSettings`.
fn time_text(elapsed: Duration, total: Option<Duration>, ui: &UiSettings) -> Option<String> {
    if ui.time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.time_separator))
    }
}

/// One-line summary of the transport for the status box.
fn transport_text(transport: &Transport, ui: &UiSettings) -> String {
    let state = transport.state();
    let mut parts: Vec<String> = Vec::new();

    let phase = match transport.phase() {
        TransportPhase::Idle => "Stopped",
        TransportPhase::Loading => "Loading",
        TransportPhase::Paused => "Paused",
        TransportPhase::Playing => "Playing",
    };
    parts.push(format!(" {phase}"));

    if let Some(track) = &state.current_track {
        let total = (state.duration_seconds > 0.0).then(|| seconds(state.duration_seconds));
        match time_text(seconds(state.position_seconds), total, ui) {
            Some(time) => parts.push(format!("{} [{}]", track.display(), time)),
            None => parts.push(track.display()),
        }
    }

    if state.is_muted {
        parts.push("Vol: muted".to_string());
    } else {
        parts.push(format!("Vol: {:.0}%", state.volume * 100.0));
    }

    parts.join(" • ")
}

const BAR_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Column bars of the current peaks, split into played and unplayed parts.
pub struct WaveformView<'a> {
    pub columns: &'a [f32],
    pub progress: f64,
    pub played: Style,
    pub unplayed: Style,
}

impl Widget for WaveformView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let height = usize::from(area.height);
        let played_cols = (self.progress.clamp(0.0, 1.0) * f64::from(area.width)).round() as usize;

        for (col, &peak) in self.columns.iter().take(usize::from(area.width)).enumerate() {
            let style = if col < played_cols { self.played } else { self.unplayed };
            // Eighths of a cell, at least one so silence still shows a baseline.
            let eighths = ((peak.clamp(0.0, 1.0) * (height * 8) as f32).round() as usize).max(1);
            let x = area.x + col as u16;
            for row in 0..height {
                let filled = eighths.saturating_sub(row * 8).min(8);
                if filled == 0 {
                    break;
                }
                let y = area.y + area.height - 1 - row as u16;
                buf.set_string(x, y, BAR_GLYPHS[filled - 1].to_string(), style);
            }
        }
    }
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

fn result_line<'a>(title: &'a str, query: &str) -> Line<'a> {
    let Some(positions) = App::fuzzy_match_positions(title, query).filter(|p| !p.is_empty()) else {
        return Line::from(title);
    };
    let mut spans = Vec::new();
    let mut pos_iter = positions.into_iter().peekable();
    for (ci, ch) in title.chars().enumerate() {
        if pos_iter.peek() == Some(&ci) {
            pos_iter.next();
            spans.push(Span::styled(ch.to_string(), Style::default().add_modifier(Modifier::BOLD)));
        } else {
            spans.push(Span::raw(ch.to_string()));
        }
    }
    Line::from(spans)
}

fn equalizer_lines(bands: &[EqualizerBand], cursor: Option<usize>, active: bool) -> Vec<Line<'static>> {
    let cell = |i: usize, text: String| {
        let span = Span::raw(format!("{text:^7}"));
        if !active {
            span.dark_gray()
        } else if cursor == Some(i) {
            span.reversed()
        } else {
            span
        }
    };
    let labels = bands
        .iter()
        .enumerate()
        .map(|(i, b)| cell(i, b.label()))
        .collect::<Vec<_>>();
    let gains = bands
        .iter()
        .enumerate()
        .map(|(i, b)| cell(i, format!("{:+.1}", b.gain_db)))
        .collect::<Vec<_>>();
    let mut lines = vec![Line::from(labels), Line::from(gains)];
    match cursor.filter(|&i| i < bands.len()) {
        _ if !active => lines.push(Line::from(" inactive until playback starts".dark_gray())),
        Some(i) => lines.push(
            Line::from(format!(
                " {} Hz {}",
                bands[i].frequency,
                FilterShape::for_band(i, bands.len()).label()
            ))
            .dark_gray(),
        ),
        None => {}
    }
    lines
}

/// Render the entire UI into the provided `frame`.
///
/// Returns the inner area of the waveform panel so mouse clicks can be
/// mapped back to a seek fraction.
pub fn draw(frame: &mut Frame, app: &App, transport: &Transport, settings: &Settings) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(6),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" wavetune ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Search box
    let searching = if app.searching { " (searching...)" } else { "" };
    let cursor = if app.focus == Focus::Search { "_" } else { "" };
    let search = Paragraph::new(format!("{}{}", app.query, cursor)).block(focused_block(
        " search ",
        app.focus == Focus::Search,
    ).title_bottom(searching));
    frame.render_widget(search, chunks[1]);

    // Results list
    {
        // Center the selected item when possible by creating a visible window.
        let total = app.results.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let playing_id = transport.state().current_track.as_ref().map(|t| t.id.as_str());
        let titles: Vec<String> = app.results[start..end].iter().map(|t| t.display()).collect();
        let visible_items: Vec<ListItem> = app.results[start..end]
            .iter()
            .zip(&titles)
            .map(|(track, title)| {
                let item = ListItem::new(result_line(title, &app.results_query));
                if Some(track.id.as_str()) == playing_id {
                    item.style(Style::default().fg(Color::Cyan))
                } else {
                    item
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(focused_block(" results ", app.focus == Focus::Results))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Waveform
    let waveform = transport.waveform();
    let wave_title = match waveform.status() {
        WaveformStatus::Loading => " waveform (loading) ",
        _ => " waveform ",
    };
    let wave_block = Block::default().borders(Borders::ALL).title(wave_title);
    let wave_area = wave_block.inner(chunks[3]);
    frame.render_widget(wave_block, chunks[3]);
    let columns = waveform.columns(usize::from(wave_area.width));
    frame.render_widget(
        WaveformView {
            columns: &columns,
            progress: waveform.progress(),
            played: Style::default().fg(Color::Cyan),
            unplayed: Style::default().fg(Color::DarkGray),
        },
        wave_area,
    );

    // Transport and status
    let mut status_lines = vec![Line::from(transport_text(transport, &settings.ui))];
    if let Some(msg) = &app.status {
        status_lines.push(Line::from(format!(" {msg}")).italic());
    }
    let status_par = Paragraph::new(status_lines)
        .block(Block::bordered().title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[4]);

    // Equalizer
    let cursor = (app.focus == Focus::Equalizer).then_some(app.eq_band);
    let eq = Paragraph::new(equalizer_lines(
        &transport.bands(),
        cursor,
        transport.equalizer_active(),
    ))
    .block(focused_block(" equalizer ", app.focus == Focus::Equalizer));
    frame.render_widget(eq, chunks[5]);

    let footer = Paragraph::new(controls_text(app.focus, &settings.controls))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[6]);

    wave_area
}

/// Fraction of `area`'s width at column `x`, if `(x, y)` falls inside it.
pub fn click_fraction(area: Rect, x: u16, y: u16) -> Option<f64> {
    let inside = x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height;
    if !inside || area.width == 0 {
        return None;
    }
    Some(f64::from(x - area.x) / f64::from(area.width))
}
