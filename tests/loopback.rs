//! End-to-end encode → audio → decode checks on synthetic buffers.

use fsk_modem_core::{
    AudioSink, BoundaryLocator, Config, FskError, FskModem, Loopback, ToneSynthesizer, WavFile,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

fn modem() -> FskModem {
    FskModem::new(Config::default()).expect("default config is valid")
}

#[test]
fn test_roundtrip_text() {
    let modem = modem();
    for text in ["", "a", "hello", "Hello, World!", "0123456789", "~}|{"] {
        let samples = modem.encode(text).unwrap();
        assert_eq!(modem.decode(&samples).text, text, "round trip of {:?}", text);
    }
}

#[test]
fn test_roundtrip_repeated_characters() {
    let modem = modem();
    for text in ["aa", "aaa", "abba", "zz top"] {
        let samples = modem.encode(text).unwrap();
        assert_eq!(modem.decode(&samples).text, text);
    }
}

#[test]
fn test_roundtrip_every_symbol() {
    let modem = modem();
    let text: String = (0u8..=127).map(char::from).collect();

    let samples = modem.encode(&text).unwrap();
    let decoded = modem.decode(&samples);
    assert_eq!(decoded.text, text);
}

#[test]
fn test_empty_text_still_has_markers() {
    let modem = modem();
    let samples = modem.encode("").unwrap();
    assert!(!samples.is_empty());
    assert_eq!(modem.decode(&samples).text, "");
}

#[test]
fn test_domain_rejection_produces_no_audio() {
    let modem = modem();
    let err = modem.encode("snow ☃").unwrap_err();
    assert!(matches!(err, FskError::UnsupportedCharacter { character: '☃', position: 5 }));

    let mut loopback = Loopback::new(modem.config().sample_rate);
    assert!(modem.transmit("\u{80}", &mut loopback).is_err());
    assert!(loopback.recorded().is_empty());
}

#[test]
fn test_silence_only_recording() {
    let modem = modem();
    let silence = vec![0.0f32; 3 * 44100];

    let locator = BoundaryLocator::new(Config::default());
    assert_eq!(locator.locate(&silence), None);

    let decoded = modem.decode(&silence);
    assert_eq!(decoded.text, "");
    assert!(decoded.is_failed());
}

#[test]
fn test_truncated_transmission_fails_softly() {
    let modem = modem();
    let samples = modem.encode("cut short").unwrap();

    // Drop the end marker.
    let cut = samples.len() - modem.config().marker_samples() * 2;
    let decoded = modem.decode(&samples[..cut]);
    assert_eq!(decoded.text, "");
    assert!(decoded.diagnostic().is_some());
}

#[test]
fn test_decodes_inside_longer_recording() {
    let modem = modem();
    let samples = modem.encode("hi there").unwrap();

    for preroll in [1, 777, 12345, 30000] {
        let mut loopback = Loopback::with_preroll(modem.config().sample_rate, preroll);
        loopback.play(&samples).unwrap();

        let decoded = modem.receive(&mut loopback, Duration::from_secs(6)).unwrap();
        assert_eq!(decoded.text, "hi there", "preroll {}", preroll);
    }
}

#[test]
fn test_decodes_playback_conditioned_audio() {
    let config = Config {
        volume: 0.5,
        ..Default::default()
    };
    let modem = FskModem::new(config).unwrap();
    let samples = modem.encode_for_playback("fade test").unwrap();

    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!((peak - 0.5).abs() < 1e-3);
    assert_eq!(modem.decode(&samples).text, "fade test");
}

#[test]
fn test_decodes_with_low_level_noise() {
    let modem = modem();
    let mut rng = StdRng::seed_from_u64(7);

    let mut samples = vec![0.0f32; 3000];
    samples.extend(modem.encode("hi there").unwrap());
    for sample in samples.iter_mut() {
        *sample += rng.gen_range(-0.01..0.01);
    }

    assert_eq!(modem.decode(&samples).text, "hi there");
}

#[test]
fn test_alternate_sample_rate() {
    let config = Config {
        sample_rate: 22050,
        fft_size: 4096,
        ..Default::default()
    };
    let modem = FskModem::new(config).unwrap();

    for text in ["alt rate", "zz", "~"] {
        let samples = modem.encode(text).unwrap();
        assert_eq!(modem.decode(&samples).text, text);
    }
}

#[test]
fn test_wav_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let modem = modem();
    let mut wav = WavFile::new(dir.path().join("message.wav"), modem.config().sample_rate);

    modem.transmit("via wav", &mut wav).unwrap();
    let decoded = modem.receive(&mut wav, Duration::from_secs(30)).unwrap();
    assert_eq!(decoded.text, "via wav");
}

#[test]
fn test_start_marker_only() {
    let config = Config::default();
    let synth = ToneSynthesizer::new(config.clone());

    let mut samples = synth.start_marker();
    samples.extend(synth.tone(config.base_frequency + 72.0 * config.frequency_step, config.symbol_duration_ms));
    samples.extend(synth.silence(config.slot_samples() * 3));

    assert_eq!(BoundaryLocator::new(config.clone()).locate(&samples), None);
    assert_eq!(FskModem::new(config).unwrap().decode(&samples).text, "");
}
