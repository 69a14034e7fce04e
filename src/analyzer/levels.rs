// ABOUTME: Shared level state written by the analyzer and read by the broadcast loop
// ABOUTME: The lock is held only long enough to copy the 13 floats

use crate::analyzer::bands::BAND_COUNT;
use parking_lot::{Mutex, MutexGuard};

/// Smoothed output levels, all clamped to `[0, 1]`.
///
/// No history is retained: every processed buffer overwrites the previous
/// value, and the broadcast loop reads whatever is current (conflation, not
/// buffering).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelState {
    /// Overall loudness estimate from the buffer RMS. Computed and smoothed
    /// like the bands but never transmitted.
    pub aggregate: f32,
    /// Per-band levels, low frequency first
    pub bands: [f32; BAND_COUNT],
}

/// Mutex-guarded [`LevelState`] shared between the analysis and broadcast paths.
#[derive(Debug, Default)]
pub struct SharedLevels {
    inner: Mutex<LevelState>,
}

impl SharedLevels {
    /// Create zeroed level state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out the current levels.
    pub fn snapshot(&self) -> LevelState {
        *self.inner.lock()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LevelState> {
        self.inner.lock()
    }
}
