pub const BAND_COUNT: usize = 10;

pub const BAND_FREQUENCIES: [f32; BAND_COUNT] = [
    32.0, 64.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;

/// Frequency response of one filter stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterShape {
    LowShelf,
    Peaking,
    HighShelf,
}

impl FilterShape {
    /// Shelving at the two boundary bands, peaking everywhere in between.
    pub fn for_band(index: usize, band_count: usize) -> Self {
        if index == 0 {
            Self::LowShelf
        } else if index + 1 >= band_count {
            Self::HighShelf
        } else {
            Self::Peaking
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LowShelf => "low shelf",
            Self::Peaking => "peaking",
            Self::HighShelf => "high shelf",
        }
    }
}

/// Clamp a gain to the allowed range. NaN is treated as flat.
pub fn clamp_gain(gain_db: f32) -> f32 {
    if gain_db.is_nan() {
        0.0
    } else {
        gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EqualizerBand {
    pub frequency: f32,
    pub gain_db: f32,
}

impl EqualizerBand {
    /// Short label for the UI, e.g. `32`, `1k`, `16k`.
    pub fn label(&self) -> String {
        if self.frequency >= 1000.0 {
            format!("{}k", (self.frequency / 1000.0).round() as u32)
        } else {
            format!("{}", self.frequency.round() as u32)
        }
    }
}

/// All bands at 0 dB.
pub fn flat_bands() -> [EqualizerBand; BAND_COUNT] {
    BAND_FREQUENCIES.map(|frequency| EqualizerBand {
        frequency,
        gain_db: 0.0,
    })
}

/// Bands carrying the given gains (clamped).
pub fn bands_with_gains(gains: [f32; BAND_COUNT]) -> [EqualizerBand; BAND_COUNT] {
    let mut bands = flat_bands();
    for (band, gain) in bands.iter_mut().zip(gains) {
        band.gain_db = clamp_gain(gain);
    }
    bands
}
