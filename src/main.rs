use anyhow::Result;
use clap::{Parser, Subcommand};
use fsk_modem_core::{
    audio::{list_audio_devices, AudioInput, AudioOutput, Loopback, WavFile},
    Config, Decoded, FskModem, SAMPLE_RATE,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fsk-modem")]
#[command(about = "Send and receive text as audible FSK tones", long_about = None)]
#[command(version)]
struct Cli {
    /// Sample rate used for synthesis and capture
    #[arg(long, global = true, default_value_t = SAMPLE_RATE)]
    sample_rate: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode text and play it through the speakers
    Encode {
        /// Text to transmit (7-bit ASCII)
        #[arg(long, short)]
        text: String,

        /// Write a WAV file instead of playing
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Peak volume level (0.0 - 1.0)
        #[arg(long, default_value = "1.0")]
        volume: f32,
    },

    /// Record from the microphone and decode the transmission
    Decode {
        /// Recording duration in seconds
        #[arg(long, short, required_unless_present = "input")]
        duration: Option<f32>,

        /// Decode a WAV file instead of recording
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// List available audio devices
    Devices,

    /// Encode and decode in memory without touching audio hardware
    Test {
        /// Test message
        #[arg(default_value = "Hello, FSK!")]
        message: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config {
        sample_rate: cli.sample_rate,
        ..Default::default()
    };

    match cli.command {
        Commands::Encode { text, output, volume } => {
            let config = Config { volume, ..config };
            encode_text(&text, output, config)?;
        }

        Commands::Decode { duration, input } => {
            let decoded = decode_recording(duration, input, config)?;
            print_decoded(&decoded);
        }

        Commands::Devices => {
            let devices = list_audio_devices();
            println!("Available audio devices:");
            for device in devices {
                println!("  {}", device);
            }
        }

        Commands::Test { message } => {
            println!("Running loopback test with message: {}", message);
            run_test(&message, config)?;
        }
    }

    Ok(())
}

fn encode_text(text: &str, output: Option<PathBuf>, config: Config) -> Result<()> {
    let modem = FskModem::new(config)?;

    eprintln!("Encoding: {}", text);
    match output {
        Some(path) => {
            let mut wav = WavFile::new(path, modem.config().sample_rate);
            modem.transmit(text, &mut wav)?;
            eprintln!("Wrote {}", wav.path().display());
        }
        None => {
            let mut speaker = AudioOutput::new(modem.config().sample_rate)?;
            eprintln!("Transmitting...");
            modem.transmit(text, &mut speaker)?;
            eprintln!("Transmission complete!");
        }
    }

    Ok(())
}

fn decode_recording(duration: Option<f32>, input: Option<PathBuf>, config: Config) -> Result<Decoded> {
    let modem = FskModem::new(config)?;

    let decoded = match input {
        Some(path) => {
            let wav = WavFile::new(path, modem.config().sample_rate);
            eprintln!("Reading {}...", wav.path().display());
            modem.decode(&wav.read_samples()?)
        }
        None => {
            let seconds = duration.unwrap_or_default();
            if !seconds.is_finite() || seconds <= 0.0 {
                anyhow::bail!("recording duration must be a positive number of seconds");
            }

            let mut microphone = AudioInput::new(modem.config().sample_rate)?;
            eprintln!("Recording for {} seconds...", seconds);
            modem.receive(&mut microphone, Duration::try_from_secs_f32(seconds)?)?
        }
    };

    Ok(decoded)
}

fn print_decoded(decoded: &Decoded) {
    if let Some(diagnostic) = decoded.diagnostic() {
        eprintln!("Warning: {}", diagnostic);
    }

    println!("\nDecoded text:");
    println!("{}", "-".repeat(40));
    println!("{}", decoded.text);
    println!("{}", "-".repeat(40));
}

fn run_test(message: &str, config: Config) -> Result<()> {
    let modem = FskModem::new(config)?;
    let mut loopback = Loopback::with_preroll(modem.config().sample_rate, modem.config().sample_rate as usize / 4);

    modem.transmit(message, &mut loopback)?;
    let recorded = loopback.recorded().len();
    let duration = Duration::from_secs_f64(recorded as f64 / modem.config().sample_rate as f64 + 1.0);

    println!("Audio samples: {}", recorded);
    println!("Duration: {:.1} ms", recorded as f32 * 1000.0 / modem.config().sample_rate as f32);

    let decoded = modem.receive(&mut loopback, duration)?;
    println!("\nDecoded message: {}", decoded.text);

    if decoded.text == message {
        println!("\n✓ Test PASSED: Messages match!");
    } else {
        println!("\n✗ Test FAILED: Messages don't match!");
        std::process::exit(1);
    }

    Ok(())
}
