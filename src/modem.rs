//! End-to-end encode/decode, plus the glue to audio collaborators.

use crate::audio::{AudioSink, AudioSource};
use crate::codec::SymbolStreamCodec;
use crate::error::Result;
use crate::spectrum::SpectralEstimator;
use crate::sync::{BoundaryLocator, Boundaries};
use crate::Config;
use log::{debug, info, warn};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Idle,
    SearchingStart,
    InPayload(Boundaries),
    Done(Boundaries),
    Failed,
}

/// Result of a decode attempt. Missing boundaries mean no transmission was
/// found; that is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub boundaries: Option<Boundaries>,
}

impl Decoded {
    pub fn is_failed(&self) -> bool {
        self.boundaries.is_none()
    }

    pub fn diagnostic(&self) -> Option<&'static str> {
        if self.is_failed() {
            Some("could not detect start/end markers in the recording")
        } else {
            None
        }
    }
}

pub struct FskModem {
    config: Config,
    codec: SymbolStreamCodec,
    locator: BoundaryLocator,
}

impl FskModem {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let estimator = SpectralEstimator::new(&config);
        Ok(Self {
            codec: SymbolStreamCodec::with_estimator(config.clone(), estimator.clone()),
            locator: BoundaryLocator::with_estimator(config.clone(), estimator),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn codec(&self) -> &SymbolStreamCodec {
        &self.codec
    }

    pub fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.codec.encode(text)
    }

    /// Encoded samples scaled and faded for a speaker.
    pub fn encode_for_playback(&self, text: &str) -> Result<Vec<f32>> {
        let mut samples = self.codec.encode(text)?;
        self.codec.synthesizer().prepare_for_playback(&mut samples);
        Ok(samples)
    }

    pub fn decode(&self, samples: &[f32]) -> Decoded {
        let mut text = String::new();
        let mut state = DecodeState::Idle;

        loop {
            debug!("decode state {:?}", state);
            state = match state {
                DecodeState::Idle => DecodeState::SearchingStart,
                DecodeState::SearchingStart => match self.locator.locate(samples) {
                    Some(boundaries) => DecodeState::InPayload(boundaries),
                    None => DecodeState::Failed,
                },
                DecodeState::InPayload(boundaries) => {
                    text = self.codec.decode_payload(&samples[boundaries.start..boundaries.end]);
                    DecodeState::Done(boundaries)
                }
                DecodeState::Done(boundaries) => {
                    info!(
                        "decoded {} characters from samples {}..{}",
                        text.len(),
                        boundaries.start,
                        boundaries.end
                    );
                    return Decoded {
                        text,
                        boundaries: Some(boundaries),
                    };
                }
                DecodeState::Failed => {
                    warn!("could not detect start/end markers in {} samples", samples.len());
                    return Decoded {
                        text: String::new(),
                        boundaries: None,
                    };
                }
            };
        }
    }

    /// Nothing is played if `text` cannot be encoded.
    pub fn transmit<S: AudioSink + ?Sized>(&self, text: &str, sink: &mut S) -> Result<()> {
        let samples = self.encode_for_playback(text)?;
        info!(
            "transmitting {} characters, {:.2} s of audio",
            text.chars().count(),
            samples.len() as f32 / self.config.sample_rate as f32
        );
        sink.play(&samples)
    }

    pub fn receive<S: AudioSource + ?Sized>(&self, source: &mut S, duration: Duration) -> Result<Decoded> {
        let samples = source.capture(duration)?;
        info!("captured {} samples", samples.len());
        Ok(self.decode(&samples))
    }
}
