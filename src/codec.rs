use crate::error::{FskError, Result};
use crate::protocol::{SymbolMap, NUM_SYMBOLS};
use crate::spectrum::{RustFftTransform, SpectralEstimator, SpectralTransform};
use crate::sync::is_silence;
use crate::{Config, ToneSynthesizer};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Silence,
    /// Non-silent slot; `None` when the peak matched no symbol band.
    Tone(Option<u8>),
}

/// Rejects a symbol that reappears less than `threshold` samples after it
/// was last accepted. FFT smearing across a slot edge can make one tone
/// register in two neighbouring slots.
#[derive(Debug, Clone)]
pub struct RepeatFilter {
    threshold: f32,
    last_accepted: [Option<usize>; NUM_SYMBOLS],
}

impl RepeatFilter {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last_accepted: [None; NUM_SYMBOLS],
        }
    }

    pub fn accept(&mut self, symbol: u8, offset: usize) -> bool {
        let Some(last) = self.last_accepted.get_mut(symbol as usize) else {
            return false;
        };

        if let Some(previous) = *last {
            if (offset.saturating_sub(previous) as f32) < self.threshold {
                return false;
            }
        }

        *last = Some(offset);
        true
    }
}

pub struct SymbolStreamCodec<T: SpectralTransform = RustFftTransform> {
    config: Config,
    map: SymbolMap,
    synth: ToneSynthesizer,
    estimator: SpectralEstimator<T>,
}

impl SymbolStreamCodec<RustFftTransform> {
    pub fn new(config: Config) -> Self {
        let estimator = SpectralEstimator::new(&config);
        Self::with_estimator(config, estimator)
    }
}

impl<T: SpectralTransform> SymbolStreamCodec<T> {
    pub fn with_estimator(config: Config, estimator: SpectralEstimator<T>) -> Self {
        Self {
            map: SymbolMap::new(&config),
            synth: ToneSynthesizer::new(config.clone()),
            estimator,
            config,
        }
    }

    pub fn symbol_map(&self) -> &SymbolMap {
        &self.map
    }

    pub fn synthesizer(&self) -> &ToneSynthesizer {
        &self.synth
    }

    /// Every character is checked before any audio is produced, so an
    /// unsupported character yields an error and no partial buffer.
    pub fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let frequencies = text
            .chars()
            .enumerate()
            .map(|(position, character)| {
                self.map
                    .to_frequency(character as u32)
                    .map_err(|_| FskError::UnsupportedCharacter { character, position })
            })
            .collect::<Result<Vec<f32>>>()?;

        let mut samples = self.synth.start_marker();
        samples.reserve(frequencies.len() * self.config.slot_samples());

        for freq in &frequencies {
            samples.extend(self.synth.tone(*freq, self.config.symbol_duration_ms));
            samples.extend(self.synth.silence(self.config.silence_samples()));
        }

        samples.extend(self.synth.end_marker());

        debug!("encoded {} symbols into {} samples", frequencies.len(), samples.len());
        Ok(samples)
    }

    pub fn classify_slot(&self, segment: &[f32]) -> Slot {
        if is_silence(segment, self.config.amplitude_threshold) {
            return Slot::Silence;
        }

        let freq = self.estimator.peak_frequency(segment);
        let symbol = self.map.to_symbol(freq);
        debug!("slot peak {:.1} Hz -> {:?}", freq, symbol);
        Slot::Tone(symbol)
    }

    /// Decode a payload already trimmed to its boundaries.
    ///
    /// Slots advance by a fixed step and are never re-aligned to tone
    /// edges; a silent window moves on by one symbol length, a tone by a
    /// whole slot.
    pub fn decode_payload(&self, payload: &[f32]) -> String {
        let symbol_samples = self.config.symbol_samples();
        let slot_samples = self.config.slot_samples();
        let mut filter = RepeatFilter::new(self.config.repeat_threshold());
        let mut text = String::new();

        let mut i = 0usize;
        while i + symbol_samples < payload.len() {
            match self.classify_slot(&payload[i..i + symbol_samples]) {
                Slot::Silence => {
                    i += symbol_samples;
                    continue;
                }
                Slot::Tone(Some(symbol)) => {
                    if filter.accept(symbol, i) {
                        text.push(symbol as char);
                    } else {
                        debug!("dropped repeat of {:?} at sample {}", symbol as char, i);
                    }
                }
                Slot::Tone(None) => {}
            }
            i += slot_samples;
        }

        text
    }
}
