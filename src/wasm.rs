#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::{Config, FskModem};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct FskModemWasm {
    config: Config,
}

#[cfg(target_arch = "wasm32")]
impl FskModemWasm {
    fn modem(&self) -> Result<FskModem, JsValue> {
        FskModem::new(self.config.clone()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl FskModemWasm {
    /// `sample_rate` should match the page's `AudioContext`.
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: u32) -> Self {
        console_error_panic_hook::set_once();

        Self {
            config: Config {
                sample_rate,
                ..Default::default()
            },
        }
    }

    #[wasm_bindgen]
    pub fn set_volume(&mut self, volume: f32) {
        self.config.volume = volume.clamp(0.01, 1.0);
    }

    /// Playback-ready samples for `text`.
    #[wasm_bindgen]
    pub fn encode(&self, text: &str) -> Result<Vec<f32>, JsValue> {
        self.modem()?
            .encode_for_playback(text)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Decoded text, or an empty string when no transmission is found.
    #[wasm_bindgen]
    pub fn decode(&self, samples: &[f32]) -> Result<String, JsValue> {
        Ok(self.modem()?.decode(samples).text)
    }

    #[wasm_bindgen]
    pub fn get_frequencies(&self) -> Vec<f32> {
        crate::SymbolMap::new(&self.config).frequencies()
    }

    #[wasm_bindgen]
    pub fn get_sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    #[wasm_bindgen]
    pub fn get_symbol_duration_samples(&self) -> u32 {
        self.config.symbol_samples() as u32
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
}
