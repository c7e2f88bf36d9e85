use crate::spectrum::{RustFftTransform, SpectralEstimator, SpectralTransform};
use crate::{Config, Marker};
use log::debug;

/// Payload span inside a recording, `start..end` in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    pub start: usize,
    pub end: usize,
}

impl Boundaries {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Mean absolute amplitude below `threshold`. An empty window is silent.
pub fn is_silence(samples: &[f32], threshold: f32) -> bool {
    if samples.is_empty() {
        return true;
    }
    let mean = samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32;
    mean < threshold
}

pub struct BoundaryLocator<T: SpectralTransform = RustFftTransform> {
    config: Config,
    estimator: SpectralEstimator<T>,
}

impl BoundaryLocator<RustFftTransform> {
    pub fn new(config: Config) -> Self {
        let estimator = SpectralEstimator::new(&config);
        Self { config, estimator }
    }
}

impl<T: SpectralTransform> BoundaryLocator<T> {
    pub fn with_estimator(config: Config, estimator: SpectralEstimator<T>) -> Self {
        Self { config, estimator }
    }

    /// First stride-aligned offset at or after `from` whose marker-length
    /// window peaks at the marker frequency.
    pub fn find_marker(&self, samples: &[f32], marker: Marker, from: usize) -> Option<usize> {
        let window = self.config.marker_samples();
        let stride = (window / 4).max(1);

        let mut i = from;
        while i + window < samples.len() {
            let freq = self.estimator.peak_frequency(&samples[i..i + window]);
            if marker.matches(&self.config, freq) {
                debug!("{:?} marker at sample {} ({:.1} Hz)", marker, i, freq);
                return Some(i);
            }
            i += stride;
        }

        None
    }

    pub fn locate(&self, samples: &[f32]) -> Option<Boundaries> {
        let start_marker = self.find_marker(samples, Marker::Start, 0)?;
        let start = self.first_sound_after(samples, start_marker + self.config.marker_samples())?;

        let end_marker = self.find_marker(samples, Marker::End, start)?;
        let end = self.last_sound_before(samples, end_marker, start)?;

        debug!("payload spans samples {}..{}", start, end);
        Some(Boundaries { start, end })
    }

    fn first_sound_after(&self, samples: &[f32], from: usize) -> Option<usize> {
        let window = self.config.symbol_samples();
        let step = (window / 2).max(1);

        let mut pos = from;
        while pos + window < samples.len() {
            if !is_silence(&samples[pos..pos + window], self.config.amplitude_threshold) {
                return Some(pos);
            }
            pos += step;
        }

        None
    }

    /// Trailing edge of the last non-silent symbol window ending at or
    /// before `marker_at`, searching no further back than `floor`.
    fn last_sound_before(&self, samples: &[f32], marker_at: usize, floor: usize) -> Option<usize> {
        let window = self.config.symbol_samples();
        let step = (window / 2).max(1);

        let mut pos = marker_at.checked_sub(window)?;
        while pos > floor {
            if !is_silence(&samples[pos..pos + window], self.config.amplitude_threshold) {
                return Some(pos + window);
            }
            pos = pos.saturating_sub(step);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToneSynthesizer;

    fn transmission(config: &Config, symbols: &[u8]) -> Vec<f32> {
        let synth = ToneSynthesizer::new(config.clone());
        let mut samples = synth.start_marker();
        for &symbol in symbols {
            let freq = config.base_frequency + symbol as f32 * config.frequency_step;
            samples.extend(synth.tone(freq, config.symbol_duration_ms));
            samples.extend(synth.silence(config.silence_samples()));
        }
        samples.extend(synth.end_marker());
        samples
    }

    #[test]
    fn test_is_silence() {
        assert!(is_silence(&[0.0; 100], 0.01));
        assert!(is_silence(&[0.005, -0.005, 0.009], 0.01));
        assert!(!is_silence(&[0.5, -0.5], 0.01));
        assert!(is_silence(&[], 0.01));
    }

    #[test]
    fn test_locate_brackets_payload() {
        let config = Config::default();
        let locator = BoundaryLocator::new(config.clone());
        let samples = transmission(&config, b"aa");

        let boundaries = locator.locate(&samples).expect("markers present");

        let first_tone = config.marker_samples() + config.boundary_silence_samples();
        let last_tone_end = first_tone + config.slot_samples() + config.symbol_samples();
        let end_tone = last_tone_end + config.silence_samples() + config.boundary_silence_samples();

        assert!(boundaries.start > config.marker_samples());
        assert!(boundaries.start <= first_tone);
        assert!(boundaries.end >= last_tone_end);
        assert!(boundaries.end < end_tone);
        assert!(!boundaries.is_empty());
    }

    #[test]
    fn test_find_marker_at_buffer_start() {
        let config = Config::default();
        let locator = BoundaryLocator::new(config.clone());
        let samples = transmission(&config, b"x");

        assert_eq!(locator.find_marker(&samples, Marker::Start, 0), Some(0));
        assert!(locator.find_marker(&samples, Marker::End, 0).is_some());
    }

    #[test]
    fn test_silence_only() {
        let config = Config::default();
        let locator = BoundaryLocator::new(config);
        assert_eq!(locator.locate(&vec![0.0; 44100]), None);
        assert_eq!(locator.locate(&[]), None);
    }

    #[test]
    fn test_start_marker_without_end_marker() {
        let config = Config::default();
        let synth = ToneSynthesizer::new(config.clone());
        let locator = BoundaryLocator::new(config.clone());

        let mut samples = synth.start_marker();
        samples.extend(synth.tone(config.base_frequency + 120.0 * config.frequency_step, config.symbol_duration_ms));
        samples.extend(synth.silence(20000));

        assert!(locator.find_marker(&samples, Marker::Start, 0).is_some());
        assert_eq!(locator.locate(&samples), None);
    }

    #[test]
    fn test_end_marker_without_start_marker() {
        let config = Config::default();
        let synth = ToneSynthesizer::new(config.clone());
        let locator = BoundaryLocator::new(config.clone());

        let mut samples = synth.silence(10000);
        samples.extend(synth.tone(config.base_frequency + 97.0 * config.frequency_step, config.symbol_duration_ms));
        samples.extend(synth.end_marker());

        assert_eq!(locator.locate(&samples), None);
    }

    #[test]
    fn test_leading_silence_shifts_boundaries() {
        let config = Config::default();
        let locator = BoundaryLocator::new(config.clone());
        let clean = transmission(&config, b"hi");

        let mut delayed = vec![0.0f32; 12345];
        delayed.extend_from_slice(&clean);
        delayed.extend(std::iter::repeat(0.0).take(5000));

        let boundaries = locator.locate(&delayed).expect("markers present");
        let first_tone = 12345 + config.marker_samples() + config.boundary_silence_samples();
        let last_tone_end = first_tone + config.slot_samples() + config.symbol_samples();

        // The marker can be matched a stride early, so the start may fall
        // inside the marker tail, but never before the transmission.
        assert!(boundaries.start >= 12345);
        assert!(boundaries.start <= first_tone);
        assert!(boundaries.end >= last_tone_end);
    }
}
