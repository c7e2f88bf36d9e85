use crate::{Config, Marker};
use std::f32::consts::PI;

pub struct ToneSynthesizer {
    config: Config,
}

impl ToneSynthesizer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Sine wave starting at zero phase, `round(duration * sample_rate)` samples long.
    pub fn tone(&self, frequency: f32, duration_ms: u32) -> Vec<f32> {
        let num_samples = self.config.samples_for_ms(duration_ms);
        let sample_rate = self.config.sample_rate as f32;

        (0..num_samples)
            .map(|i| (2.0 * PI * frequency * (i as f32 / sample_rate)).sin())
            .collect()
    }

    pub fn silence(&self, num_samples: usize) -> Vec<f32> {
        vec![0.0f32; num_samples]
    }

    pub fn marker_tone(&self, marker: Marker) -> Vec<f32> {
        self.tone(marker.frequency(&self.config), self.config.marker_duration_ms)
    }

    pub fn start_marker(&self) -> Vec<f32> {
        let mut samples = self.marker_tone(Marker::Start);
        samples.extend(self.silence(self.config.boundary_silence_samples()));
        samples
    }

    pub fn end_marker(&self) -> Vec<f32> {
        let mut samples = self.silence(self.config.boundary_silence_samples());
        samples.extend(self.marker_tone(Marker::End));
        samples.extend(self.silence(self.config.silence_samples()));
        samples
    }

    /// Scale to the configured volume relative to the peak and fade both
    /// ends linearly so playback starts and stops without clicks.
    pub fn prepare_for_playback(&self, samples: &mut [f32]) {
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            let gain = self.config.volume / peak;
            for sample in samples.iter_mut() {
                *sample *= gain;
            }
        }

        let fade_samples = self.config.fade_samples().min(samples.len() / 2);
        if fade_samples < 2 {
            return;
        }

        let len = samples.len();
        for i in 0..fade_samples {
            let gain = i as f32 / (fade_samples - 1) as f32;
            samples[i] *= gain;
            samples[len - 1 - i] *= gain;
        }
    }
}
