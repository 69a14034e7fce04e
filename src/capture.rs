// ABOUTME: Capture source abstraction and pull-based capture engine
// ABOUTME: Feeds planar PCM chunks into the analyzer and retries lost sources

use crate::analyzer::BandAnalyzer;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// How often a lost capture source is re-acquired.
const REACQUIRE_INTERVAL: Duration = Duration::from_secs(1);

/// Trait for host-side capture sources delivering planar mono PCM.
pub trait CaptureSource: Send {
    /// Sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Read the next chunk of `frames` samples.
    /// Returns None when the source is no longer available.
    fn read_chunk(&mut self, frames: usize) -> Option<Vec<f32>>;

    /// Try to re-acquire an unavailable source. Returns true on success.
    fn reacquire(&mut self) -> bool {
        false
    }
}

/// Test tone source (generates a sine wave)
pub struct TestToneSource {
    frequency: f64,
    sample_rate: u32,
    phase: f64,
    amplitude: f64,
}

impl TestToneSource {
    /// Create a new test tone source
    ///
    /// # Arguments
    /// * `frequency` - Tone frequency in Hz (e.g., 440.0 for A4)
    /// * `sample_rate` - Sample rate in Hz (e.g., 48000)
    pub fn new(frequency: f64, sample_rate: u32) -> Self {
        Self {
            frequency,
            sample_rate,
            phase: 0.0,
            // 50% amplitude to leave visual headroom
            amplitude: 0.5,
        }
    }

    /// Set the amplitude (0.0 to 1.0)
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }
}

impl CaptureSource for TestToneSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_chunk(&mut self, frames: usize) -> Option<Vec<f32>> {
        let mut samples = Vec::with_capacity(frames);
        let phase_increment = 2.0 * PI * self.frequency / self.sample_rate as f64;

        for _ in 0..frames {
            samples.push((self.phase.sin() * self.amplitude) as f32);
            self.phase += phase_increment;
            if self.phase >= 2.0 * PI {
                self.phase -= 2.0 * PI;
            }
        }

        Some(samples)
    }

    fn reacquire(&mut self) -> bool {
        true // a synthetic tone is always available
    }
}

/// Silence source (generates silence)
pub struct SilenceSource {
    sample_rate: u32,
}

impl SilenceSource {
    /// Create a new silence source
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl CaptureSource for SilenceSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_chunk(&mut self, frames: usize) -> Option<Vec<f32>> {
        Some(vec![0.0; frames])
    }

    fn reacquire(&mut self) -> bool {
        true
    }
}

/// Pull-based capture engine.
///
/// Runs a fixed-cadence loop that reads one chunk per tick from the source
/// and hands it to the analyzer. When the source reports itself unavailable
/// the engine marks itself not-capturing and retries acquisition roughly once
/// per second; losing the source is never an error.
pub struct CaptureEngine {
    source: Box<dyn CaptureSource>,
    analyzer: Arc<BandAnalyzer>,
    chunk_interval: Duration,
    frames_per_chunk: usize,
    capturing: bool,
}

impl CaptureEngine {
    /// Create a new capture engine pulling `chunk_interval_ms` worth of
    /// samples per tick.
    pub fn new(source: Box<dyn CaptureSource>, analyzer: Arc<BandAnalyzer>, chunk_interval_ms: u64) -> Self {
        let sample_rate = source.sample_rate();
        let frames_per_chunk = (sample_rate as u64 * chunk_interval_ms / 1000) as usize;

        Self {
            source,
            analyzer,
            chunk_interval: Duration::from_millis(chunk_interval_ms),
            frames_per_chunk,
            capturing: true,
        }
    }

    /// Whether the source was available at the last tick.
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Run the capture loop
    ///
    /// This should be spawned as a separate task
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.chunk_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_retry = Instant::now();

        log::info!(
            "Capture engine started: {}ms chunks, {} frames/chunk",
            self.chunk_interval.as_millis(),
            self.frames_per_chunk
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.capturing {
                        match self.source.read_chunk(self.frames_per_chunk) {
                            Some(chunk) => {
                                let frames = chunk.len();
                                self.analyzer.process(&[&chunk], frames);
                            }
                            None => {
                                log::warn!(
                                    "Capture source lost, retrying every {}s",
                                    REACQUIRE_INTERVAL.as_secs()
                                );
                                self.capturing = false;
                                last_retry = Instant::now();
                            }
                        }
                    } else if last_retry.elapsed() >= REACQUIRE_INTERVAL {
                        last_retry = Instant::now();
                        if self.source.reacquire() {
                            log::info!("Capture source re-acquired");
                            self.capturing = true;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("Capture engine shutting down");
                        break;
                    }
                }
            }
        }
    }
}

/// Spawn a capture engine task
pub fn spawn_capture_engine(
    source: Box<dyn CaptureSource>,
    analyzer: Arc<BandAnalyzer>,
    chunk_interval_ms: u64,
) -> (tokio::task::JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut engine = CaptureEngine::new(source, analyzer, chunk_interval_ms);
        engine.run(shutdown_rx).await;
    });

    (handle, shutdown_tx)
}
