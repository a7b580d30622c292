//! Audio-thread side of the signal graph.
//!
//! `EqSource` wraps a decoded source and runs it through the filter chain
//! bound to its `GraphPort`. Until a graph is bound it passes samples through
//! untouched; once bound, it follows gain changes by watching the shared
//! generation counter.

use std::sync::Arc;
use std::time::Duration;

use rodio::source::SeekError;
use rodio::{ChannelCount, Sample, SampleRate, Source};

use super::biquad::{BiquadState, Coefficients};
use super::graph::{GraphBinding, GraphPort};

struct Chain {
    binding: Arc<GraphBinding>,
    generation: u64,
    coefficients: Vec<Coefficients>,
    /// `stage * channels + channel`
    states: Vec<BiquadState>,
}

impl Chain {
    fn new(binding: Arc<GraphBinding>, channels: usize, sample_rate: u32) -> Self {
        let stage_count = binding.stages().len();
        let mut chain = Self {
            binding,
            generation: u64::MAX,
            coefficients: vec![Coefficients::IDENTITY; stage_count],
            states: vec![BiquadState::default(); stage_count * channels],
        };
        chain.refresh(sample_rate);
        chain
    }

    fn refresh(&mut self, sample_rate: u32) {
        let generation = self.binding.gains().generation();
        if generation == self.generation {
            return;
        }
        for (i, (stage, coeffs)) in self
            .binding
            .stages()
            .iter()
            .zip(self.coefficients.iter_mut())
            .enumerate()
        {
            let gain = self.binding.gains().get(i);
            *coeffs = Coefficients::design(stage.shape, stage.frequency, gain, stage.q, sample_rate);
        }
        self.generation = generation;
    }

    #[inline]
    fn process(&mut self, channel: usize, channels: usize, sample: Sample) -> Sample {
        let mut x = sample;
        for (stage, coeffs) in self.coefficients.iter().enumerate() {
            x = self.states[stage * channels + channel].process(coeffs, x);
        }
        x
    }

    fn reset(&mut self) {
        self.states.iter_mut().for_each(BiquadState::reset);
    }
}

pub struct EqSource<S> {
    inner: S,
    port: Arc<GraphPort>,
    chain: Option<Chain>,
    channel: usize,
}

impl<S: Source> EqSource<S> {
    pub fn new(inner: S, port: Arc<GraphPort>) -> Self {
        Self {
            inner,
            port,
            chain: None,
            channel: 0,
        }
    }

    fn channel_count(&self) -> usize {
        usize::from(self.inner.channels()).max(1)
    }

    /// Called at frame boundaries only, so every channel of a frame sees the
    /// same coefficients.
    fn refresh(&mut self) {
        let sample_rate = self.inner.sample_rate();
        match &mut self.chain {
            Some(chain) => chain.refresh(sample_rate),
            None => {
                if let Some(binding) = self.port.binding() {
                    let channels = self.channel_count();
                    self.chain = Some(Chain::new(binding.clone(), channels, sample_rate));
                }
            }
        }
    }
}

impl<S: Source> Iterator for EqSource<S> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let sample = self.inner.next()?;
        let channels = self.channel_count();
        if self.channel == 0 {
            self.refresh();
        }
        let out = match &mut self.chain {
            Some(chain) => chain.process(self.channel, channels, sample),
            None => sample,
        };
        self.channel = (self.channel + 1) % channels;
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: Source> Source for EqSource<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.inner.try_seek(pos)?;
        if let Some(chain) = &mut self.chain {
            chain.reset();
        }
        self.channel = 0;
        Ok(())
    }
}

/// Decoded interleaved samples shared between every sink of one media.
pub struct SharedSamples {
    samples: Arc<[Sample]>,
    channels: ChannelCount,
    sample_rate: SampleRate,
    pos: usize,
}

impl SharedSamples {
    pub fn new(channels: ChannelCount, sample_rate: SampleRate, samples: Arc<[Sample]>) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
            pos: 0,
        }
    }

    fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels).max(1)
    }
}

impl Iterator for SharedSamples {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let sample = *self.samples.get(self.pos)?;
        self.pos += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.samples.len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl Source for SharedSamples {
    fn current_span_len(&self) -> Option<usize> {
        Some(self.samples.len().saturating_sub(self.pos))
    }

    fn channels(&self) -> ChannelCount {
        self.channels
    }

    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.frames() as f64 / f64::from(self.sample_rate.max(1)),
        ))
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        let frame = (pos.as_secs_f64() * f64::from(self.sample_rate)) as usize;
        self.pos = frame.min(self.frames()) * usize::from(self.channels);
        Ok(())
    }
}
