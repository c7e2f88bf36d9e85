use thiserror::Error;

#[derive(Error, Debug)]
pub enum FskError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Symbol {0} is outside the supported range 0..=127")]
    SymbolOutOfRange(u32),

    #[error("Unsupported character {character:?} at position {position}")]
    UnsupportedCharacter { character: char, position: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedWav(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FskError {
    /// True for errors caused by input outside the symbol alphabet.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            FskError::SymbolOutOfRange(_) | FskError::UnsupportedCharacter { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FskError>;
