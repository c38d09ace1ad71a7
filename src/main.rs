use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use vavi::api::ApiServerBuilder;
use vavi::conversation::{
    ConsoleTranscript, ConversationEnd, LineSource, MicrophoneSource, run_conversation,
};
use vavi::video::VideoMode;
use vavi::voice::{
    AudioCapture, AudioPlayback, DetectorSettings, Microphone, PLAYBACK_SAMPLE_RATE, SpeechToText,
    Speaker, TextToSpeech, rms,
};
use vavi::{Assistant, Config};

/// VAVI - voice and text command assistant
#[derive(Parser)]
#[command(name = "vavi", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Video mode: "interactive" opens the browser, "api" returns the link
    #[arg(long, global = true)]
    video_mode: Option<VideoMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and web UI (default)
    Serve {
        /// Interface to bind (loopback by default)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory holding index.html
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Voice conversation through the microphone and speakers
    Listen,
    /// Text conversation on stdin
    Chat {
        /// Also speak every reply
        #[arg(long)]
        speak: bool,
    },
    /// Answer one utterance and exit
    Ask {
        /// What to say
        #[arg(required = true, num_args = 1..)]
        utterance: Vec<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hi, I am VAVI. How can I help you?")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,vavi=info",
        1 => "info,vavi=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
        static_dir: None,
    });

    match command {
        Command::TestMic { duration } => return test_mic(duration).await,
        Command::TestSpeaker => return test_speaker().await,
        _ => {}
    }

    let mut config = Config::load()?;
    if cli.video_mode.is_some() {
        config.video_mode = cli.video_mode;
    }
    tracing::debug!(?config, "loaded configuration");

    match command {
        Command::Serve {
            host,
            port,
            static_dir,
        } => serve(config, host, port, static_dir).await,
        Command::Listen => listen(config).await,
        Command::Chat { speak } => chat(config, speak).await,
        Command::Ask { utterance } => ask(&config, &utterance.join(" ")).await,
        Command::TestTts { text } => test_tts(&config, &text).await,
        Command::TestMic { .. } | Command::TestSpeaker => Ok(()),
    }
}

async fn serve(
    config: Config,
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let assistant = Arc::new(Assistant::from_config(&config, VideoMode::Api)?);

    let mut builder =
        ApiServerBuilder::new(assistant, config.api_server.port).config(&config.api_server);
    if let Some(host) = host {
        builder = builder.host(host);
    }
    if let Some(port) = port {
        builder = builder.port(port);
    }
    if static_dir.is_some() {
        builder = builder.static_dir(static_dir);
    }

    builder.build().run().await?;
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn listen(config: Config) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(&config, VideoMode::Interactive)?;

    let stt = SpeechToText::from_config(&config.voice, &config.api_keys)?;
    let microphone = Microphone::new(DetectorSettings::from(&config.voice))?;
    let mut source = MicrophoneSource::new(microphone, stt);

    let speaker = Arc::new(Speaker::from_config(config.voice, config.api_keys));
    let mut transcript = ConsoleTranscript::spoken(speaker);

    let end = converse(&assistant, &mut source, &mut transcript).await;
    tracing::info!(?end, "voice conversation finished");
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn chat(config: Config, speak: bool) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(&config, VideoMode::Interactive)?;

    let mut source = LineSource::stdin();
    let mut transcript = if speak {
        ConsoleTranscript::spoken(Arc::new(Speaker::from_config(config.voice, config.api_keys)))
    } else {
        ConsoleTranscript::text()
    };

    let end = converse(&assistant, &mut source, &mut transcript).await;
    tracing::info!(?end, "text conversation finished");
    Ok(())
}

/// Run a conversation that Ctrl-C ends politely
#[allow(clippy::future_not_send)]
async fn converse(
    assistant: &Assistant,
    source: &mut dyn vavi::conversation::UtteranceSource,
    transcript: &mut dyn vavi::conversation::Transcript,
) -> ConversationEnd {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(()).await;
        }
    });

    run_conversation(assistant, source, transcript, &mut shutdown_rx).await
}

async fn ask(config: &Config, utterance: &str) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config, VideoMode::Interactive)?;
    println!("{}", assistant.process(utterance).await);
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("Sample rate: {} Hz", vavi::voice::SAMPLE_RATE);
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..PLAYBACK_SAMPLE_RATE * 2)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {PLAYBACK_SAMPLE_RATE} Hz...", samples.len());
    playback.play(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test TTS output with the configured provider
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;

    println!("Synthesizing speech with {:?}...", tts.provider());
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    AudioPlayback::new()?.play_mp3(&mp3_data).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
