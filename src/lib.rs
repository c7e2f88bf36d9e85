pub mod protocol;
pub mod modulation;
pub mod spectrum;
pub mod sync;
pub mod codec;
pub mod modem;
pub mod audio;
pub mod error;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use protocol::*;
pub use modulation::*;
pub use spectrum::*;
pub use sync::*;
pub use codec::*;
pub use modem::*;
pub use audio::*;
pub use error::*;

pub const SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_SYMBOL_DURATION_MS: u32 = 150;
pub const DEFAULT_SILENCE_DURATION_MS: u32 = 100;
pub const DEFAULT_MARKER_DURATION_MS: u32 = 200;
pub const BASE_FREQUENCY: f32 = 1200.0;
pub const FREQUENCY_STEP: f32 = 50.0;
pub const FREQUENCY_TOLERANCE: f32 = 15.0;
pub const START_MARKER_FREQUENCY: f32 = 500.0;
pub const END_MARKER_FREQUENCY: f32 = 8000.0;
pub const FFT_SIZE: usize = 8192;

/// Modem parameters shared by every stage of the pipeline.
///
/// Encoder and decoder must agree on all of these; nothing is negotiated
/// over the air.
#[derive(Debug, Clone)]
pub struct Config {
    pub sample_rate: u32,
    pub symbol_duration_ms: u32,
    /// Gap after every symbol tone.
    pub silence_duration_ms: u32,
    pub marker_duration_ms: u32,
    /// Silence next to each marker, as a multiple of the inter-symbol gap.
    pub boundary_silence_factor: u32,
    pub base_frequency: f32,
    pub frequency_step: f32,
    pub tolerance: f32,
    pub start_marker_frequency: f32,
    pub end_marker_frequency: f32,
    pub fft_size: usize,
    /// Number of offset FFT windows averaged per estimate.
    pub analysis_windows: usize,
    /// Mean absolute amplitude below which a window counts as silence.
    pub amplitude_threshold: f32,
    /// Fraction of a slot within which a repeated symbol is discarded.
    pub repeat_threshold_ratio: f32,
    pub fade_ms: u32,
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            symbol_duration_ms: DEFAULT_SYMBOL_DURATION_MS,
            silence_duration_ms: DEFAULT_SILENCE_DURATION_MS,
            marker_duration_ms: DEFAULT_MARKER_DURATION_MS,
            boundary_silence_factor: 2,
            base_frequency: BASE_FREQUENCY,
            frequency_step: FREQUENCY_STEP,
            tolerance: FREQUENCY_TOLERANCE,
            start_marker_frequency: START_MARKER_FREQUENCY,
            end_marker_frequency: END_MARKER_FREQUENCY,
            fft_size: FFT_SIZE,
            analysis_windows: 4,
            amplitude_threshold: 0.01,
            repeat_threshold_ratio: 0.75,
            fade_ms: 10,
            volume: 1.0,
        }
    }
}

impl Config {
    pub fn samples_for_ms(&self, duration_ms: u32) -> usize {
        (self.sample_rate as f64 * duration_ms as f64 / 1000.0).round() as usize
    }

    pub fn symbol_samples(&self) -> usize {
        self.samples_for_ms(self.symbol_duration_ms)
    }

    pub fn silence_samples(&self) -> usize {
        self.samples_for_ms(self.silence_duration_ms)
    }

    pub fn marker_samples(&self) -> usize {
        self.samples_for_ms(self.marker_duration_ms)
    }

    pub fn boundary_silence_samples(&self) -> usize {
        self.samples_for_ms(self.silence_duration_ms * self.boundary_silence_factor)
    }

    /// Tone plus trailing gap.
    pub fn slot_samples(&self) -> usize {
        self.symbol_samples() + self.silence_samples()
    }

    pub fn fade_samples(&self) -> usize {
        self.samples_for_ms(self.fade_ms)
    }

    pub fn repeat_threshold(&self) -> f32 {
        self.slot_samples() as f32 * self.repeat_threshold_ratio
    }

    pub fn frequency_resolution(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(FskError::InvalidConfig(msg)) };

        if self.sample_rate == 0 {
            return invalid("sample rate must be non-zero".into());
        }
        if self.symbol_duration_ms == 0 || self.silence_duration_ms == 0 || self.marker_duration_ms == 0 {
            return invalid("symbol, silence and marker durations must be non-zero".into());
        }
        if self.boundary_silence_factor == 0 {
            return invalid("boundary silence factor must be at least 1".into());
        }
        if self.fft_size < 4 || self.analysis_windows == 0 {
            return invalid(format!(
                "fft size {} / analysis windows {} too small",
                self.fft_size, self.analysis_windows
            ));
        }
        if !(self.amplitude_threshold > 0.0 && self.amplitude_threshold < 1.0) {
            return invalid(format!("amplitude threshold {} not in (0, 1)", self.amplitude_threshold));
        }
        if !(self.repeat_threshold_ratio > 0.0 && self.repeat_threshold_ratio <= 1.0) {
            return invalid(format!("repeat threshold ratio {} not in (0, 1]", self.repeat_threshold_ratio));
        }
        if !(self.volume > 0.0 && self.volume <= 1.0) {
            return invalid(format!("volume {} not in (0, 1]", self.volume));
        }
        if self.tolerance <= 0.0 {
            return invalid("frequency tolerance must be positive".into());
        }
        if self.frequency_step <= 2.0 * self.tolerance {
            return invalid(format!(
                "frequency step {} Hz leaves overlapping bands at tolerance {} Hz",
                self.frequency_step, self.tolerance
            ));
        }
        if self.frequency_step <= self.frequency_resolution() {
            return invalid(format!(
                "frequency step {} Hz is not above the FFT resolution {:.2} Hz",
                self.frequency_step,
                self.frequency_resolution()
            ));
        }

        let map = SymbolMap::new(self);
        if self.base_frequency - self.tolerance <= 0.0 || map.highest_frequency() + self.tolerance >= self.nyquist() {
            return invalid(format!(
                "symbol bands {}..{} Hz do not fit below Nyquist {} Hz",
                self.base_frequency,
                map.highest_frequency(),
                self.nyquist()
            ));
        }

        // A marker must never decode as a symbol nor a symbol as a marker.
        let guard = (MARKER_TOLERANCE_FACTOR + 1.0) * self.tolerance;
        for marker in [Marker::Start, Marker::End] {
            let freq = marker.frequency(self);
            if freq <= 0.0 || freq >= self.nyquist() {
                return invalid(format!("{:?} marker {} Hz outside (0, Nyquist)", marker, freq));
            }
            if map.distance_to_nearest_band(freq) <= guard {
                return invalid(format!("{:?} marker {} Hz collides with a symbol band", marker, freq));
            }
        }
        if (self.start_marker_frequency - self.end_marker_frequency).abs() <= 2.0 * MARKER_TOLERANCE_FACTOR * self.tolerance {
            return invalid("start and end markers are indistinguishable".into());
        }

        Ok(())
    }
}
