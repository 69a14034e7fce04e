// ABOUTME: levelcast demo binary
// ABOUTME: Feeds a synthetic capture source through the analyzer and serves the widget feed

use clap::Parser;
use levelcast::analyzer::{AnalysisConfig, BandAnalyzer};
use levelcast::capture::{spawn_capture_engine, CaptureSource, SilenceSource, TestToneSource};
use levelcast::server::{ServerConfig, ServerRegistry};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "levelcast")]
#[command(author, version, about = "12-band audio level feed for browser widgets", long_about = None)]
struct Args {
    /// Test tone frequency in Hz (0 for silence)
    #[arg(short, long, default_value = "440.0")]
    frequency: f64,

    /// Sample rate in Hz
    #[arg(short, long, default_value = "48000")]
    sample_rate: u32,

    /// Widget feed port
    #[arg(short, long, default_value = "9450")]
    port: u16,

    /// Linear gain applied to raw magnitudes
    #[arg(long, default_value = "3.0")]
    gain: f32,

    /// Noise floor below which levels are zeroed
    #[arg(long, default_value = "0.0005")]
    noise_floor: f32,

    /// Rising smoothing factor (0-1)
    #[arg(long, default_value = "0.7")]
    attack: f32,

    /// Falling smoothing factor (0-1)
    #[arg(long, default_value = "0.3")]
    release: f32,

    /// Audio chunk interval in milliseconds
    #[arg(long, default_value = "20")]
    chunk_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        "levelcast=debug"
    } else {
        "levelcast=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    tracing::info!("levelcast v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Widget feed: ws://127.0.0.1:{}", args.port);

    let registry = ServerRegistry::new(ServerConfig::new().port(args.port));
    registry.ensure_started();

    let analyzer = Arc::new(BandAnalyzer::new(args.sample_rate, registry.levels()));
    analyzer.apply_config(AnalysisConfig::new(
        args.gain,
        args.noise_floor,
        args.attack,
        args.release,
    ));

    let source: Box<dyn CaptureSource> = if args.frequency > 0.0 {
        tracing::info!(
            "Audio: {} Hz test tone at {} Hz sample rate",
            args.frequency,
            args.sample_rate
        );
        Box::new(TestToneSource::new(args.frequency, args.sample_rate))
    } else {
        tracing::info!("Audio: silence");
        Box::new(SilenceSource::new(args.sample_rate))
    };

    let (capture_task, capture_shutdown) =
        spawn_capture_engine(source, Arc::clone(&analyzer), args.chunk_ms);

    tracing::info!("Press Ctrl+C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }

    let _ = capture_shutdown.send(true);
    let _ = capture_task.await;
    registry.shutdown().await;

    tracing::info!("Shutdown complete");
}
