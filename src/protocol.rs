use crate::error::{FskError, Result};
use crate::Config;

/// Largest symbol the alphabet can carry (7-bit ASCII).
pub const MAX_SYMBOL: u8 = 127;
pub const NUM_SYMBOLS: usize = MAX_SYMBOL as usize + 1;

/// Markers are matched with a wider window than symbols.
pub const MARKER_TOLERANCE_FACTOR: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start,
    End,
}

impl Marker {
    pub fn frequency(&self, config: &Config) -> f32 {
        match self {
            Marker::Start => config.start_marker_frequency,
            Marker::End => config.end_marker_frequency,
        }
    }

    pub fn matches(&self, config: &Config, frequency: f32) -> bool {
        (frequency - self.frequency(config)).abs() < config.tolerance * MARKER_TOLERANCE_FACTOR
    }
}

/// Maps symbols to band centres `base + symbol * step` and back.
#[derive(Debug, Clone)]
pub struct SymbolMap {
    base: f32,
    step: f32,
    tolerance: f32,
}

impl SymbolMap {
    pub fn new(config: &Config) -> Self {
        Self {
            base: config.base_frequency,
            step: config.frequency_step,
            tolerance: config.tolerance,
        }
    }

    pub fn to_frequency(&self, symbol: u32) -> Result<f32> {
        if symbol > MAX_SYMBOL as u32 {
            return Err(FskError::SymbolOutOfRange(symbol));
        }
        Ok(self.base + symbol as f32 * self.step)
    }

    /// Resolve a measured frequency to the nearest band, if it lies within
    /// tolerance of that band's centre.
    pub fn to_symbol(&self, frequency: f32) -> Option<u8> {
        let code = ((frequency - self.base) / self.step).round();
        if !(0.0..=MAX_SYMBOL as f32).contains(&code) {
            return None;
        }

        let expected = self.base + code * self.step;
        if (frequency - expected).abs() > self.tolerance {
            return None;
        }

        Some(code as u8)
    }

    pub fn frequencies(&self) -> Vec<f32> {
        (0..NUM_SYMBOLS).map(|i| self.base + i as f32 * self.step).collect()
    }

    pub fn highest_frequency(&self) -> f32 {
        self.base + MAX_SYMBOL as f32 * self.step
    }

    pub fn distance_to_nearest_band(&self, frequency: f32) -> f32 {
        let code = ((frequency - self.base) / self.step)
            .round()
            .clamp(0.0, MAX_SYMBOL as f32);
        (frequency - (self.base + code * self.step)).abs()
    }
}
