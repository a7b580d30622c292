//! RBJ cookbook biquads, Direct Form II Transposed.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use super::eq::FilterShape;

/// Normalized biquad coefficients (`a0 == 1`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Coefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Coefficients {
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design one equalizer stage.
    ///
    /// Shelving stages use a unit shelf slope and ignore `q`. The corner
    /// frequency is kept below Nyquist so the filter stays stable at low
    /// sample rates.
    pub fn design(shape: FilterShape, frequency: f32, gain_db: f32, q: f32, sample_rate: u32) -> Self {
        let fs = f64::from(sample_rate.max(1));
        let f0 = f64::from(frequency).clamp(1.0, fs * 0.45);
        let a = 10.0_f64.powf(f64::from(gain_db) / 40.0);
        let w0 = 2.0 * PI * f0 / fs;
        let (sin_w0, cos_w0) = w0.sin_cos();

        let (b0, b1, b2, a0, a1, a2) = match shape {
            FilterShape::Peaking => {
                let alpha = sin_w0 / (2.0 * f64::from(q.max(0.01)));
                (
                    1.0 + alpha * a,
                    -2.0 * cos_w0,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_w0,
                    1.0 - alpha / a,
                )
            }
            FilterShape::LowShelf => {
                let alpha = sin_w0 / 2.0 / FRAC_1_SQRT_2;
                let k = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + k),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - k),
                    (a + 1.0) + (a - 1.0) * cos_w0 + k,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - k,
                )
            }
            FilterShape::HighShelf => {
                let alpha = sin_w0 / 2.0 / FRAC_1_SQRT_2;
                let k = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + k),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - k),
                    (a + 1.0) - (a - 1.0) * cos_w0 + k,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - k,
                )
            }
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Per-channel filter memory.
#[derive(Debug, Default, Copy, Clone)]
pub struct BiquadState {
    z1: f64,
    z2: f64,
}

impl BiquadState {
    #[inline]
    pub fn process(&mut self, c: &Coefficients, input: f32) -> f32 {
        let x = f64::from(input);
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        // Flush denormals so silence after a loud passage stays cheap.
        if self.z1.abs() < 1e-20 {
            self.z1 = 0.0;
        }
        if self.z2.abs() < 1e-20 {
            self.z2 = 0.0;
        }
        y as f32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a sine through the filter and return the steady-state gain in dB.
    fn measured_gain_db(c: &Coefficients, freq: f64, sample_rate: u32) -> f64 {
        let fs = f64::from(sample_rate);
        let mut state = BiquadState::default();
        let total = sample_rate as usize;
        let settle = total / 2;
        let mut peak_in = 0.0_f64;
        let mut peak_out = 0.0_f64;
        for n in 0..total {
            let x = (2.0 * PI * freq * n as f64 / fs).sin() as f32;
            let y = state.process(c, x);
            if n >= settle {
                peak_in = peak_in.max(f64::from(x.abs()));
                peak_out = peak_out.max(f64::from(y.abs()));
            }
        }
        20.0 * (peak_out / peak_in).log10()
    }

    #[test]
    fn zero_gain_is_transparent_for_every_shape() {
        for shape in [FilterShape::LowShelf, FilterShape::Peaking, FilterShape::HighShelf] {
            let c = Coefficients::design(shape, 1000.0, 0.0, 1.0, 44_100);
            let mut state = BiquadState::default();
            for n in 0..512 {
                let x = ((n as f32) * 0.37).sin();
                let y = state.process(&c, x);
                assert!((x - y).abs() < 1e-4, "{shape:?} altered sample {n}: {x} -> {y}");
            }
        }
    }

    #[test]
    fn peaking_boost_hits_center_frequency() {
        let c = Coefficients::design(FilterShape::Peaking, 1000.0, 12.0, 1.0, 44_100);
        let at_center = measured_gain_db(&c, 1000.0, 44_100);
        let far_away = measured_gain_db(&c, 60.0, 44_100);
        assert!((at_center - 12.0).abs() < 0.5, "center gain {at_center}");
        assert!(far_away.abs() < 1.0, "far gain {far_away}");
    }

    #[test]
    fn low_shelf_cuts_below_corner_only() {
        let c = Coefficients::design(FilterShape::LowShelf, 250.0, -12.0, 1.0, 48_000);
        let low = measured_gain_db(&c, 30.0, 48_000);
        let high = measured_gain_db(&c, 8000.0, 48_000);
        assert!((low + 12.0).abs() < 1.0, "low gain {low}");
        assert!(high.abs() < 0.5, "high gain {high}");
    }

    #[test]
    fn high_shelf_boosts_above_corner_only() {
        let c = Coefficients::design(FilterShape::HighShelf, 2000.0, 6.0, 1.0, 48_000);
        let low = measured_gain_db(&c, 100.0, 48_000);
        let high = measured_gain_db(&c, 15_000.0, 48_000);
        assert!(low.abs() < 0.5, "low gain {low}");
        assert!((high - 6.0).abs() < 0.75, "high gain {high}");
    }

    #[test]
    fn corner_above_nyquist_stays_stable() {
        let c = Coefficients::design(FilterShape::HighShelf, 16_000.0, 12.0, 1.0, 22_050);
        let mut state = BiquadState::default();
        let mut y = 0.0;
        for n in 0..10_000 {
            y = state.process(&c, if n % 2 == 0 { 1.0 } else { -1.0 });
        }
        assert!(y.is_finite());
        assert!(y.abs() < 10.0);
    }

    #[test]
    fn reset_clears_memory() {
        let c = Coefficients::design(FilterShape::Peaking, 500.0, 9.0, 1.0, 44_100);
        let mut state = BiquadState::default();
        state.process(&c, 1.0);
        state.reset();
        let fresh = BiquadState::default().process(&c, 0.0);
        assert_eq!(state.process(&c, 0.0), fresh);
    }
}
