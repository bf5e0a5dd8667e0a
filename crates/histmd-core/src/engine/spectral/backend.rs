//! Shared FFT plan cache.
//!
//! Plan creation is serialized through a process-wide lock; the returned plans
//! are immutable and may execute concurrently from any thread.

use crate::engine::error::{EngineError, Result};

/// Whether this build carries the FFT backend.
pub const fn is_available() -> bool {
    cfg!(feature = "fft")
}

pub(crate) fn require(operation: &'static str) -> Result<()> {
    if is_available() {
        Ok(())
    } else {
        Err(EngineError::BackendUnavailable(operation))
    }
}

#[cfg(feature = "fft")]
mod planner {
    use rustfft::{Fft, FftPlanner};
    use std::sync::{Arc, LazyLock, Mutex, PoisonError};

    static PLANNER: LazyLock<Mutex<FftPlanner<f64>>> =
        LazyLock::new(|| Mutex::new(FftPlanner::new()));

    fn with_planner<T>(f: impl FnOnce(&mut FftPlanner<f64>) -> T) -> T {
        // A poisoned planner still holds valid plans.
        let mut guard = PLANNER.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub(crate) fn forward(len: usize) -> Arc<dyn Fft<f64>> {
        with_planner(|p| p.plan_fft_forward(len))
    }

    pub(crate) fn inverse(len: usize) -> Arc<dyn Fft<f64>> {
        with_planner(|p| p.plan_fft_inverse(len))
    }
}

#[cfg(feature = "fft")]
pub(crate) use planner::{forward, inverse};
