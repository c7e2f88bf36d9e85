use crate::Config;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Windowed magnitude spectrum of one fixed-size frame.
pub trait SpectralTransform {
    fn size(&self) -> usize;

    /// `frame.len()` equals `size()`; the result has `size()` bins.
    fn magnitude_spectrum(&self, frame: &[f32]) -> Vec<f32>;
}

/// Symmetric Blackman window of `size` points.
pub fn blackman_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|n| {
            let x = n as f64 / denom;
            (0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()) as f32
        })
        .collect()
}

#[derive(Clone)]
pub struct RustFftTransform {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl RustFftTransform {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        Self {
            fft,
            window: blackman_window(size),
        }
    }
}

impl SpectralTransform for RustFftTransform {
    fn size(&self) -> usize {
        self.window.len()
    }

    fn magnitude_spectrum(&self, frame: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        buffer.resize(self.window.len(), Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer.iter().map(|c| c.norm()).collect()
    }
}

/// Dominant-frequency estimator averaging several offset FFT frames.
///
/// Symbol slots are shorter than the FFT and rarely aligned with a frame
/// boundary, so a single frame's spectrum is noisy; averaging the magnitude
/// spectra of up to `analysis_windows` evenly spaced frames steadies the peak.
#[derive(Clone)]
pub struct SpectralEstimator<T: SpectralTransform = RustFftTransform> {
    transform: T,
    sample_rate: f32,
    windows: usize,
}

impl SpectralEstimator<RustFftTransform> {
    pub fn new(config: &Config) -> Self {
        Self::with_transform(config, RustFftTransform::new(config.fft_size))
    }
}

impl<T: SpectralTransform> SpectralEstimator<T> {
    pub fn with_transform(config: &Config, transform: T) -> Self {
        Self {
            transform,
            sample_rate: config.sample_rate as f32,
            windows: config.analysis_windows.max(1),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.transform.size()
    }

    pub fn frequency_resolution(&self) -> f32 {
        self.sample_rate / self.fft_size() as f32
    }

    /// Averaged magnitude over the strictly positive bins `1 .. fft_size / 2`.
    pub fn averaged_spectrum(&self, segment: &[f32]) -> Vec<f32> {
        let n = self.fft_size();
        let padded;
        let segment = if segment.len() < n {
            let mut samples = segment.to_vec();
            samples.resize(n, 0.0);
            padded = samples;
            &padded[..]
        } else {
            segment
        };

        let positive_bins = (n / 2).saturating_sub(1);
        let step = segment.len() / (self.windows + 1);
        let mut average = vec![0.0f32; positive_bins];
        let mut frames = 0usize;

        for i in 0..self.windows {
            let start = i * step;
            let end = start + n;
            if end > segment.len() {
                break;
            }

            let spectrum = self.transform.magnitude_spectrum(&segment[start..end]);
            for (acc, magnitude) in average.iter_mut().zip(spectrum.iter().skip(1)) {
                *acc += magnitude;
            }
            frames += 1;
        }

        if frames > 1 {
            for acc in average.iter_mut() {
                *acc /= frames as f32;
            }
        }

        average
    }

    pub fn peak_frequency(&self, segment: &[f32]) -> f32 {
        let average = self.averaged_spectrum(segment);

        let mut peak_bin = 0usize;
        let mut peak_magnitude = f32::NEG_INFINITY;
        for (i, &magnitude) in average.iter().enumerate() {
            if magnitude > peak_magnitude {
                peak_magnitude = magnitude;
                peak_bin = i;
            }
        }

        (peak_bin + 1) as f32 * self.frequency_resolution()
    }
}
