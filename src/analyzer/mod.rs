// ABOUTME: Streaming 12-band energy analyzer
// ABOUTME: Converts planar PCM buffers into smoothed, bounded visual levels

mod bands;
mod config;
mod levels;

pub use bands::{BandPlan, BandSpec, BAND_COUNT, REFERENCE_FREQUENCIES};
pub use config::AnalysisConfig;
pub use levels::{LevelState, SharedLevels};

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Streaming band-energy analyzer.
///
/// Converts one buffer of mono PCM samples at a time (the first available
/// channel of a planar buffer) into an updated aggregate level and 12 smoothed
/// band levels in [`SharedLevels`]. `process` may be called from any thread
/// the host owns; configuration and smoothed state are internally
/// synchronized.
pub struct BandAnalyzer {
    plan: BandPlan,
    config: ArcSwap<AnalysisConfig>,
    levels: Arc<SharedLevels>,
}

impl BandAnalyzer {
    /// Create an analyzer for the given sample rate, writing into `levels`.
    pub fn new(sample_rate: u32, levels: Arc<SharedLevels>) -> Self {
        Self {
            plan: BandPlan::new(sample_rate),
            config: ArcSwap::from_pointee(AnalysisConfig::default()),
            levels,
        }
    }

    /// The band plan derived for this analyzer's sample rate.
    pub fn plan(&self) -> &BandPlan {
        &self.plan
    }

    /// The shared level state this analyzer writes into.
    pub fn levels(&self) -> Arc<SharedLevels> {
        Arc::clone(&self.levels)
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> AnalysisConfig {
        **self.config.load()
    }

    /// Replace the analysis configuration.
    ///
    /// Inputs are clamped to their documented ranges before storing. The new
    /// snapshot takes effect on the next processed buffer; smoothed state is
    /// not reset. Boundary values are valid, never an error.
    pub fn apply_config(&self, config: AnalysisConfig) {
        self.config.store(Arc::new(config.clamped()));
    }

    /// Process one planar buffer of `frames` samples per channel.
    ///
    /// The mono signal is taken from the first non-empty plane. An empty
    /// buffer, or a buffer where no plane carries data, is a no-op.
    pub fn process(&self, planes: &[&[f32]], frames: usize) {
        if frames == 0 {
            return;
        }
        let Some(plane) = planes.iter().find(|p| !p.is_empty()) else {
            return;
        };
        let mono = &plane[..frames.min(plane.len())];
        let config = **self.config.load();

        let mut sum_sq = 0.0f32;
        for &v in mono {
            sum_sq += v * v;
        }
        let rms = (sum_sq / mono.len() as f32).sqrt();

        // Single-bin Goertzel power estimate per band, normalized by buffer length
        let mut band_power = [0.0f32; BAND_COUNT];
        for (power, band) in band_power.iter_mut().zip(self.plan.bands()) {
            let coef = band.coefficient;
            let mut s1 = 0.0f32;
            let mut s2 = 0.0f32;
            for &x in mono {
                let s = x + coef * s1 - s2;
                s2 = s1;
                s1 = s;
            }
            let raw = s2 * s2 + s1 * s1 - coef * s1 * s2;
            *power = raw.max(0.0) / mono.len() as f32;
        }

        let mut state = self.levels.lock();
        state.aggregate = shape(rms * config.gain, state.aggregate, &config);
        for (level, power) in state.bands.iter_mut().zip(band_power) {
            *level = shape(power * config.gain, *level, &config);
        }
    }
}

/// Noise gate, clamp, square-root companding, then attack/release smoothing
/// against the previously stored value.
fn shape(raw: f32, prev: f32, config: &AnalysisConfig) -> f32 {
    let mut x = raw;
    if x < config.noise_floor {
        x = 0.0;
    }
    x = x.clamp(0.0, 1.0);
    x = x.sqrt();
    if x > prev {
        prev * (1.0 - config.attack) + x * config.attack
    } else {
        prev * (1.0 - config.release) + x * config.release
    }
}
