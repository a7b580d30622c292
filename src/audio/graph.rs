//! Signal Graph Manager.
//!
//! A graph is the ordered chain `source -> stage[0] -> ... -> stage[N-1] -> output`.
//! It is built lazily, at most once per media resource, and afterwards only
//! stage gains change. The audio thread sees the graph through the media's
//! `GraphPort`, a write-once slot: a port that already carries a graph can
//! never be re-bound.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::{debug, error, info};

use super::eq::{BAND_COUNT, BAND_FREQUENCIES, EqualizerBand, FilterShape, bands_with_gains, clamp_gain};
use super::media::{MediaId, MediaResource};
use crate::error::PlayerError;

/// Immutable description of one filter stage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StageSpec {
    pub shape: FilterShape,
    pub frequency: f32,
    pub q: f32,
}

/// Gains shared between the control side and the audio thread.
///
/// Readers poll `generation` and re-read the gains when it moves.
#[derive(Debug)]
pub struct SharedGains {
    gains: [AtomicU32; BAND_COUNT],
    generation: AtomicU64,
}

impl SharedGains {
    pub fn new(initial: [f32; BAND_COUNT]) -> Self {
        Self {
            gains: std::array::from_fn(|i| AtomicU32::new(clamp_gain(initial[i]).to_bits())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn get(&self, index: usize) -> f32 {
        f32::from_bits(self.gains[index].load(Ordering::Relaxed))
    }

    pub fn set(&self, index: usize, gain_db: f32) {
        self.gains[index].store(gain_db.to_bits(), Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Release);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> [f32; BAND_COUNT] {
        std::array::from_fn(|i| self.get(i))
    }
}

/// What a bound port carries: the stage layout plus live gains.
#[derive(Debug)]
pub struct GraphBinding {
    media: MediaId,
    stages: Vec<StageSpec>,
    gains: SharedGains,
}

impl GraphBinding {
    pub fn media(&self) -> MediaId {
        self.media
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn gains(&self) -> &SharedGains {
        &self.gains
    }
}

/// Write-once attachment point between a media resource and its graph.
#[derive(Debug, Default)]
pub struct GraphPort {
    slot: OnceLock<Arc<GraphBinding>>,
}

impl GraphPort {
    /// Bind `binding`. On a taken port, returns the binding already there.
    fn bind(&self, binding: Arc<GraphBinding>) -> Result<(), Arc<GraphBinding>> {
        match self.slot.set(binding) {
            Ok(()) => Ok(()),
            Err(rejected) => Err(self.slot.get().cloned().unwrap_or(rejected)),
        }
    }

    pub fn binding(&self) -> Option<&Arc<GraphBinding>> {
        self.slot.get()
    }

    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }
}

/// Control-side handle to a built graph.
#[derive(Debug)]
pub struct SignalGraph {
    binding: Arc<GraphBinding>,
}

impl SignalGraph {
    pub fn media(&self) -> MediaId {
        self.binding.media
    }

    pub fn stage_count(&self) -> usize {
        self.binding.stages.len()
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.binding.stages
    }

    pub fn binding(&self) -> &Arc<GraphBinding> {
        &self.binding
    }
}

/// Owns the graph of one playback session and its per-stage gains.
#[derive(Debug)]
pub struct SignalGraphManager {
    q: f32,
    /// Display mirror of the live gains. Derived, not authoritative.
    bands: [EqualizerBand; BAND_COUNT],
    graph: Option<SignalGraph>,
}

impl SignalGraphManager {
    pub fn new(q: f32) -> Self {
        Self::with_gains(q, [0.0; BAND_COUNT])
    }

    /// A manager whose graph, once built, starts from `gains`.
    pub fn with_gains(q: f32, gains: [f32; BAND_COUNT]) -> Self {
        Self {
            q,
            bands: bands_with_gains(gains),
            graph: None,
        }
    }

    /// Build the graph for `media` unless it already exists.
    ///
    /// Calling this again with the same media is a no-op. Any attempt to
    /// bind a different media, or a media whose port already belongs to some
    /// other graph, fails with `GraphBindingConflict`.
    pub fn ensure_initialized(&mut self, media: &dyn MediaResource) -> Result<&SignalGraph, PlayerError> {
        let requested = media.id();
        if let Some(graph) = &self.graph {
            if graph.media() != requested {
                error!(bound = %graph.media(), %requested, "graph already bound to another media");
                return Err(PlayerError::GraphBindingConflict {
                    bound: graph.media(),
                    requested,
                });
            }
            return Ok(self.graph.as_ref().expect("graph checked present above"));
        }

        let stages: Vec<StageSpec> = BAND_FREQUENCIES
            .iter()
            .enumerate()
            .map(|(i, &frequency)| StageSpec {
                shape: FilterShape::for_band(i, BAND_COUNT),
                frequency,
                q: self.q,
            })
            .collect();
        let binding = Arc::new(GraphBinding {
            media: requested,
            stages,
            gains: SharedGains::new(self.gains()),
        });

        if let Err(existing) = media.graph_port().bind(binding.clone()) {
            error!(bound = %existing.media(), %requested, "media port already carries a graph");
            return Err(PlayerError::GraphBindingConflict {
                bound: existing.media(),
                requested,
            });
        }

        info!(media = %requested, stages = binding.stages.len(), "signal graph built");
        Ok(self.graph.insert(SignalGraph { binding }))
    }

    /// Set one band's gain, clamped to ±12 dB.
    ///
    /// Before the graph exists the equalizer is inert: the change is dropped
    /// and `false` is returned. Out-of-range indices are ignored the same way.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> bool {
        let Some(graph) = &self.graph else {
            debug!(index, gain_db, "equalizer inert until first playback, dropping gain");
            return false;
        };
        if index >= BAND_COUNT {
            return false;
        }
        let gain = clamp_gain(gain_db);
        graph.binding.gains.set(index, gain);
        self.bands[index].gain_db = gain;
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    pub fn graph(&self) -> Option<&SignalGraph> {
        self.graph.as_ref()
    }

    pub fn bands(&self) -> &[EqualizerBand; BAND_COUNT] {
        &self.bands
    }

    /// Current gains: the live values once built, the seed values before.
    pub fn gains(&self) -> [f32; BAND_COUNT] {
        match &self.graph {
            Some(graph) => graph.binding.gains.snapshot(),
            None => self.bands.map(|b| b.gain_db),
        }
    }
}
