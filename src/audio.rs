use crate::error::{FskError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use log::error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blocking playback of a mono buffer.
pub trait AudioSink {
    fn play(&mut self, samples: &[f32]) -> Result<()>;
}

/// Blocking mono capture of `duration` worth of samples.
pub trait AudioSource {
    fn capture(&mut self, duration: Duration) -> Result<Vec<f32>>;
}

fn samples_for_duration(sample_rate: u32, duration: Duration) -> usize {
    (duration.as_secs_f64() * sample_rate as f64).round() as usize
}

fn mono_config(sample_rate: u32) -> StreamConfig {
    StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    }
}

pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
}

impl AudioOutput {
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| FskError::AudioDevice("No output device found".into()))?;

        Ok(Self {
            device,
            config: mono_config(sample_rate),
        })
    }
}

impl AudioSink for AudioOutput {
    fn play(&mut self, samples: &[f32]) -> Result<()> {
        let samples = Arc::new(samples.to_vec());
        let finished = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));

        let samples_clone = Arc::clone(&samples);
        let finished_clone = Arc::clone(&finished);
        let failed_clone = Arc::clone(&failed);
        let mut position = 0usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for sample in data.iter_mut() {
                        if position < samples_clone.len() {
                            *sample = samples_clone[position];
                            position += 1;
                        } else {
                            *sample = 0.0;
                            finished_clone.store(true, Ordering::Release);
                        }
                    }
                },
                move |err| {
                    error!("Audio output error: {}", err);
                    failed_clone.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| FskError::AudioDevice(e.to_string()))?;

        stream
            .play()
            .map_err(|e| FskError::AudioDevice(e.to_string()))?;

        while !finished.load(Ordering::Acquire) {
            if failed.load(Ordering::Acquire) {
                return Err(FskError::AudioDevice("output stream failed during playback".into()));
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        // Let the device drain its last buffer.
        std::thread::sleep(Duration::from_millis(100));

        Ok(())
    }
}

pub struct AudioInput {
    device: Device,
    config: StreamConfig,
}

impl AudioInput {
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| FskError::AudioDevice("No input device found".into()))?;

        Ok(Self {
            device,
            config: mono_config(sample_rate),
        })
    }
}

impl AudioSource for AudioInput {
    fn capture(&mut self, duration: Duration) -> Result<Vec<f32>> {
        let num_samples = samples_for_duration(self.config.sample_rate.0, duration);
        let samples = Arc::new(Mutex::new(Vec::with_capacity(num_samples)));
        let failed = Arc::new(AtomicBool::new(false));

        let samples_clone = Arc::clone(&samples);
        let failed_clone = Arc::clone(&failed);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = samples_clone.lock() {
                        samples.extend_from_slice(data);
                    }
                },
                move |err| {
                    error!("Audio input error: {}", err);
                    failed_clone.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| FskError::AudioDevice(e.to_string()))?;

        stream
            .play()
            .map_err(|e| FskError::AudioDevice(e.to_string()))?;

        std::thread::sleep(duration);

        drop(stream);

        if failed.load(Ordering::Acquire) {
            return Err(FskError::AudioDevice("input stream failed during capture".into()));
        }

        let mut result = samples
            .lock()
            .map_err(|_| FskError::AudioDevice("capture buffer poisoned".into()))?
            .clone();
        result.truncate(num_samples);
        Ok(result)
    }
}

pub fn list_audio_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let Ok(name) = device.name() {
                devices.push(format!("Output: {}", name));
            }
        }
    }

    if let Ok(input_devices) = host.input_devices() {
        for device in input_devices {
            if let Ok(name) = device.name() {
                devices.push(format!("Input: {}", name));
            }
        }
    }

    devices
}

/// Mono WAV file standing in for a speaker or microphone.
pub struct WavFile {
    path: PathBuf,
    sample_rate: u32,
}

impl WavFile {
    pub fn new(path: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            path: path.into(),
            sample_rate,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes 16-bit PCM.
    pub fn write_samples(&self, samples: &[f32]) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(&self.path, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;

        Ok(())
    }

    pub fn read_samples(&self) -> Result<Vec<f32>> {
        let mut reader = hound::WavReader::open(&self.path)?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(FskError::UnsupportedWav(format!(
                "{} channels, only mono is supported",
                spec.channels
            )));
        }
        if spec.sample_rate != self.sample_rate {
            return Err(FskError::UnsupportedWav(format!(
                "sample rate {} Hz, expected {} Hz",
                spec.sample_rate, self.sample_rate
            )));
        }

        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()?,
            (hound::SampleFormat::Int, bits @ 8..=32) => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<Vec<f32>, _>>()?
            }
            (format, bits) => {
                return Err(FskError::UnsupportedWav(format!("{:?} with {} bits", format, bits)));
            }
        };

        Ok(samples)
    }
}

impl AudioSink for WavFile {
    fn play(&mut self, samples: &[f32]) -> Result<()> {
        self.write_samples(samples)
    }
}

impl AudioSource for WavFile {
    fn capture(&mut self, duration: Duration) -> Result<Vec<f32>> {
        let mut samples = self.read_samples()?;
        samples.truncate(samples_for_duration(self.sample_rate, duration));
        Ok(samples)
    }
}

/// In-memory sink/source: whatever is played is heard by the next capture,
/// after `preroll` samples of silence.
#[derive(Debug, Clone)]
pub struct Loopback {
    sample_rate: u32,
    preroll: usize,
    recorded: Vec<f32>,
}

impl Loopback {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_preroll(sample_rate, 0)
    }

    pub fn with_preroll(sample_rate: u32, preroll: usize) -> Self {
        Self {
            sample_rate,
            preroll,
            recorded: Vec::new(),
        }
    }

    pub fn recorded(&self) -> &[f32] {
        &self.recorded
    }
}

impl AudioSink for Loopback {
    fn play(&mut self, samples: &[f32]) -> Result<()> {
        self.recorded.extend_from_slice(samples);
        Ok(())
    }
}

impl AudioSource for Loopback {
    fn capture(&mut self, duration: Duration) -> Result<Vec<f32>> {
        let mut samples = vec![0.0f32; self.preroll];
        samples.extend_from_slice(&self.recorded);
        samples.resize(samples_for_duration(self.sample_rate, duration), 0.0);
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_capture_window() {
        let mut loopback = Loopback::with_preroll(1000, 10);
        loopback.play(&[0.5; 20]).unwrap();

        let captured = loopback.capture(Duration::from_millis(100)).unwrap();
        assert_eq!(captured.len(), 100);
        assert!(captured[..10].iter().all(|&s| s == 0.0));
        assert!(captured[10..30].iter().all(|&s| s == 0.5));
        assert!(captured[30..].iter().all(|&s| s == 0.0));

        let short = loopback.capture(Duration::from_millis(15)).unwrap();
        assert_eq!(short.len(), 15);
    }

    #[test]
    fn test_wav_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut wav = WavFile::new(dir.path().join("tone.wav"), 8000);

        let samples: Vec<f32> = (0..800).map(|i| ((i as f32) * 0.05).sin() * 0.8).collect();
        wav.play(&samples).unwrap();

        let read = wav.capture(Duration::from_secs(1)).unwrap();
        assert_eq!(read.len(), samples.len());
        for (a, b) in samples.iter().zip(read.iter()) {
            assert!((a - b).abs() < 1e-3);
        }

        let truncated = wav.capture(Duration::from_millis(50)).unwrap();
        assert_eq!(truncated.len(), 400);
    }

    #[test]
    fn test_wav_sample_rate_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        WavFile::new(&path, 8000).write_samples(&[0.0; 10]).unwrap();

        let err = WavFile::new(&path, 44100).read_samples().unwrap_err();
        assert!(matches!(err, FskError::UnsupportedWav(_)));
    }

    #[test]
    fn test_wav_missing_file() {
        let err = WavFile::new("/nonexistent/fsk-modem.wav", 8000).read_samples().unwrap_err();
        assert!(matches!(err, FskError::Wav(_)));
    }
}
