use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use lector_gateway::api::ApiServer;
use lector_gateway::audio::{AudioSettings, LocalPlayback, SampleBuffer, ScheduledSink};
use lector_gateway::stream::{StreamMessage, StreamReceiver};
use lector_gateway::{
    CameraClient, Config, OcrClient, ReadAloudProvider, RecentWords, RepeatProvider,
    ResultProvider, TtsClient,
};

/// Lector - camera-to-speech read-aloud gateway
#[derive(Parser)]
#[command(name = "lector", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long, env = "LECTOR_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Capture, recognize, and speak once on the local speakers
    Read {
        /// Capture without the flash LED
        #[arg(long)]
        no_flash: bool,
    },
    /// Test camera capture
    TestCamera {
        /// Where to save the captured JPEG
        #[arg(short, long, default_value = "capture.jpg")]
        output: PathBuf,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,lector_gateway=info",
        1 => "info,lector_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Read { no_flash } => read_once(&config, !no_flash).await,
            Command::TestCamera { output } => test_camera(&config, &output).await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::TestSpeaker => test_speaker(&config),
        };
    }

    let port = cli.port.unwrap_or(config.server.port);
    tracing::info!(
        port,
        camera = %config.camera_url,
        sample_rate = config.audio.sample_rate_hz,
        "starting lector gateway"
    );

    let (read_aloud, repeat) = build_providers(&config, true)?;
    let server = ApiServer::new(config.audio, read_aloud, repeat, port);

    tracing::info!("lector gateway ready - open http://localhost:{port}/ and press a button");
    server.run().await?;

    Ok(())
}

/// Construct the two button-bound providers over shared clients
fn build_providers(
    config: &Config,
    flash: bool,
) -> anyhow::Result<(Arc<dyn ResultProvider>, Arc<dyn ResultProvider>)> {
    let camera = Arc::new(CameraClient::new(&config.camera_url));
    let ocr = Arc::new(
        OcrClient::new(config.api_keys.openrouter.clone().unwrap_or_default())?
            .with_model(config.ocr.model.clone()),
    );
    let tts = Arc::new(
        TtsClient::new(
            config.tts_url.clone(),
            config.api_keys.google.clone().unwrap_or_default(),
        )?
        .with_voice(config.tts.language_code.clone(), config.tts.voice.clone())
        .with_speed(config.tts.speed),
    );
    let memory = Arc::new(Mutex::new(RecentWords::default()));

    let read_aloud = Arc::new(
        ReadAloudProvider::new(
            camera,
            ocr,
            Arc::clone(&tts),
            Arc::clone(&memory),
            config.audio,
        )
        .with_flash(flash),
    );
    let repeat = Arc::new(RepeatProvider::new(tts, memory, config.audio));

    Ok((read_aloud, repeat))
}

/// One-shot pipeline with local playback
async fn read_once(config: &Config, flash: bool) -> anyhow::Result<()> {
    let (read_aloud, _) = build_providers(config, flash)?;

    println!("Capturing and recognizing...");
    let Some(result) = read_aloud.fetch().await? else {
        println!("Nothing to read.");
        return Ok(());
    };

    println!("Words: {}", result.words.join(" "));
    play_buffer(&config.audio, result.samples)?;
    Ok(())
}

/// Play a sample buffer on the local speakers through the same framing
/// and scheduling path the websocket stream uses
fn play_buffer(audio: &AudioSettings, samples: SampleBuffer) -> anyhow::Result<()> {
    let pcm = samples.into_linear16_bytes();
    let frames = pcm.len() / 2 / usize::from(audio.channels.max(1));
    #[allow(clippy::cast_precision_loss)]
    let seconds = frames as f64 / f64::from(audio.sample_rate_hz);

    let sink = ScheduledSink::new(audio.sample_rate_hz);
    let mut receiver = StreamReceiver::new(sink.clone());
    receiver.on_message(StreamMessage::header(audio));
    for chunk in audio.frame(&pcm) {
        receiver.on_chunk(chunk);
    }

    let playback = LocalPlayback::new(audio)?;
    playback.run(&sink, Duration::from_secs_f64(seconds + 2.0))?;
    Ok(())
}

/// Test camera capture
async fn test_camera(config: &Config, output: &PathBuf) -> anyhow::Result<()> {
    println!("Capturing from {} ...", config.camera_url);

    let camera = CameraClient::new(&config.camera_url);
    let jpeg = camera.capture(true).await?;

    std::fs::write(output, &jpeg)?;
    println!("Saved {} bytes to {}", jpeg.len(), output.display());

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TtsClient::new(
        config.tts_url.clone(),
        config.api_keys.google.clone().unwrap_or_default(),
    )?
    .with_voice(config.tts.language_code.clone(), config.tts.voice.clone())
    .with_speed(config.tts.speed);

    println!("Synthesizing speech...");
    let samples = tts.synthesize(text, &config.audio).await?;
    println!("Got {} samples", samples.len());

    println!("Playing audio...");
    play_buffer(&config.audio, samples)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker(config: &Config) -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = config.audio.sample_rate_hz;
    let frequency = 440.0_f32;
    let num_samples = sample_rate as usize * 2;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let samples: Vec<i16> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let value = (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3; // 30% volume
            (value * f32::from(i16::MAX)) as i16
        })
        .collect();

    println!("Playing {num_samples} samples at {sample_rate} Hz...");
    play_buffer(&config.audio, SampleBuffer::I16(samples))?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}
