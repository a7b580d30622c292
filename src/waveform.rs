//! Waveform Renderer adapter.
//!
//! Mirrors the transport visually: which source is loaded, whether it plays,
//! and how far along it is. The transport is the only caller of the mutating
//! methods. Peak data is released on `dispose`, which also runs on drop.

use tracing::debug;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaveformStatus {
    Empty,
    Loading,
    Ready,
    Disposed,
}

#[derive(Debug)]
pub struct Waveform {
    url: Option<String>,
    peaks: Vec<f32>,
    status: WaveformStatus,
    playing: bool,
    progress: f64,
}

impl Default for Waveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Waveform {
    pub fn new() -> Self {
        Self {
            url: None,
            peaks: Vec::new(),
            status: WaveformStatus::Empty,
            playing: false,
            progress: 0.0,
        }
    }

    /// Replace whatever is shown with a pending visualization of `url`.
    /// Completion arrives later through `on_ready`.
    pub fn load(&mut self, url: &str) {
        if self.status == WaveformStatus::Disposed {
            debug!(url, "waveform disposed, ignoring load");
            return;
        }
        self.url = Some(url.to_string());
        self.peaks.clear();
        self.status = WaveformStatus::Loading;
        self.playing = false;
        self.progress = 0.0;
    }

    /// Ready notification for the pending load. Ignored unless loading.
    pub fn on_ready(&mut self, peaks: Vec<f32>) -> bool {
        if self.status != WaveformStatus::Loading {
            return false;
        }
        self.peaks = peaks;
        self.status = WaveformStatus::Ready;
        true
    }

    pub fn play(&mut self) {
        if self.status != WaveformStatus::Disposed {
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn seek_to(&mut self, fraction: f64) {
        if self.status == WaveformStatus::Disposed {
            return;
        }
        self.progress = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    }

    /// Drop the current visualization but stay usable.
    pub fn unload(&mut self) {
        if self.status == WaveformStatus::Disposed {
            return;
        }
        self.url = None;
        self.peaks = Vec::new();
        self.status = WaveformStatus::Empty;
        self.playing = false;
        self.progress = 0.0;
    }

    /// Release rendering resources for good.
    pub fn dispose(&mut self) {
        if self.status == WaveformStatus::Disposed {
            return;
        }
        self.unload();
        self.status = WaveformStatus::Disposed;
    }

    pub fn status(&self) -> WaveformStatus {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    /// Peaks resampled to `width` columns (max of each column's range).
    pub fn columns(&self, width: usize) -> Vec<f32> {
        if width == 0 || self.peaks.is_empty() {
            return Vec::new();
        }
        let n = self.peaks.len();
        (0..width)
            .map(|col| {
                let start = col * n / width;
                let end = ((col + 1) * n / width).max(start + 1).min(n);
                self.peaks[start..end].iter().copied().fold(0.0, f32::max)
            })
            .collect()
    }
}

impl Drop for Waveform {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// `position / duration`, or 0 while the duration is unknown.
pub fn fraction(position: f64, duration: f64) -> f64 {
    if duration > 0.0 && position.is_finite() {
        (position / duration).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Absolute peak per bucket over interleaved samples, normalized so the
/// loudest bucket is 1.0.
pub fn compute_peaks(samples: &[f32], channels: u16, buckets: usize) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    let frames = samples.len() / channels;
    if frames == 0 || buckets == 0 {
        return Vec::new();
    }
    let buckets = buckets.min(frames);
    let mut peaks = vec![0.0f32; buckets];
    for (frame, chunk) in samples.chunks_exact(channels).enumerate() {
        let bucket = frame * buckets / frames;
        let peak = chunk.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak > peaks[bucket] {
            peaks[bucket] = peak;
        }
    }
    let max = peaks.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        peaks.iter_mut().for_each(|p| *p /= max);
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_then_ready_shows_peaks() {
        let mut w = Waveform::new();
        w.load("http://x/get_audio/a");
        assert_eq!(w.status(), WaveformStatus::Loading);
        assert!(w.on_ready(vec![0.5, 1.0]));
        assert_eq!(w.status(), WaveformStatus::Ready);
        assert_eq!(w.peaks(), &[0.5, 1.0]);
        assert_eq!(w.url(), Some("http://x/get_audio/a"));
    }

    #[test]
    fn ready_without_pending_load_is_ignored() {
        let mut w = Waveform::new();
        assert!(!w.on_ready(vec![1.0]));
        assert!(w.peaks().is_empty());
    }

    #[test]
    fn load_replaces_previous_visualization() {
        let mut w = Waveform::new();
        w.load("a");
        w.on_ready(vec![1.0; 4]);
        w.play();
        w.seek_to(0.5);

        w.load("b");
        assert_eq!(w.status(), WaveformStatus::Loading);
        assert!(w.peaks().is_empty());
        assert!(!w.is_playing());
        assert_eq!(w.progress(), 0.0);
    }

    #[test]
    fn seek_to_clamps_fraction() {
        let mut w = Waveform::new();
        w.seek_to(1.7);
        assert_eq!(w.progress(), 1.0);
        w.seek_to(-0.2);
        assert_eq!(w.progress(), 0.0);
        w.seek_to(f64::NAN);
        assert_eq!(w.progress(), 0.0);
    }

    #[test]
    fn dispose_releases_and_ignores_later_calls() {
        let mut w = Waveform::new();
        w.load("a");
        w.on_ready(vec![1.0; 8]);
        w.dispose();
        assert_eq!(w.status(), WaveformStatus::Disposed);
        assert!(w.peaks().is_empty());

        w.load("b");
        w.play();
        assert_eq!(w.status(), WaveformStatus::Disposed);
        assert!(!w.is_playing());
        assert_eq!(w.url(), None);
    }

    #[test]
    fn fraction_guards_unknown_duration() {
        assert_eq!(fraction(10.0, 0.0), 0.0);
        assert_eq!(fraction(30.0, 120.0), 0.25);
        assert_eq!(fraction(500.0, 120.0), 1.0);
    }

    #[test]
    fn compute_peaks_normalizes_per_bucket() {
        // Stereo: 4 frames, loudest sample on the right channel of frame 3.
        let samples = [0.1, -0.2, 0.0, 0.05, 0.3, 0.1, -0.1, -0.6];
        let peaks = compute_peaks(&samples, 2, 2);
        assert_eq!(peaks.len(), 2);
        assert!((peaks[0] - 0.2 / 0.6).abs() < 1e-6);
        assert!((peaks[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn compute_peaks_never_exceeds_frame_count() {
        let peaks = compute_peaks(&[0.5, 0.25, 1.0], 1, 100);
        assert_eq!(peaks, vec![0.5, 0.25, 1.0]);
        assert!(compute_peaks(&[], 2, 10).is_empty());
    }

    #[test]
    fn columns_resample_by_max() {
        let mut w = Waveform::new();
        w.load("a");
        w.on_ready(vec![0.1, 0.9, 0.2, 0.4]);
        assert_eq!(w.columns(2), vec![0.9, 0.4]);
        assert_eq!(w.columns(8).len(), 8);
        assert!(w.columns(0).is_empty());
    }
}
