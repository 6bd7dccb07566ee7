// Copyright 2018-2026 the Deno authors. MIT license.

use crate::error::FastTimerError;

/// Target coalescing granularity in milliseconds. Requests at or below this
/// delay are not worth coalescing and go straight to a host timer.
pub const RESOLUTION_MS: u64 = 1000;

/// Amount the virtual clock advances on every pass.
pub const TICK_MS: u64 = tick_for(RESOLUTION_MS);

/// Smallest resolution that still produces a non-zero tick.
const MIN_RESOLUTION_MS: u64 = 4;

const fn tick_for(resolution_ms: u64) -> u64 {
  (resolution_ms / 2).saturating_sub(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastTimersOptions {
  /// Delays at or below this value bypass the engine. The engine ticks every
  /// `resolution_ms / 2 - 1` milliseconds.
  pub resolution_ms: u64,
}

impl Default for FastTimersOptions {
  fn default() -> Self {
    Self {
      resolution_ms: RESOLUTION_MS,
    }
  }
}

impl FastTimersOptions {
  pub fn tick_ms(&self) -> u64 {
    tick_for(self.resolution_ms)
  }

  pub fn validate(&self) -> Result<(), FastTimerError> {
    if self.resolution_ms < MIN_RESOLUTION_MS {
      return Err(FastTimerError::InvalidResolution {
        min: MIN_RESOLUTION_MS,
        actual: self.resolution_ms,
      });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn default_constants() {
    assert_eq!(RESOLUTION_MS, 1000);
    assert_eq!(TICK_MS, 499);
    let options = FastTimersOptions::default();
    assert_eq!(options.tick_ms(), TICK_MS);
    assert!(options.validate().is_ok());
  }

  #[test]
  fn rejects_zero_tick() {
    let options = FastTimersOptions { resolution_ms: 3 };
    assert_eq!(
      options.validate(),
      Err(FastTimerError::InvalidResolution { min: 4, actual: 3 })
    );
    let options = FastTimersOptions { resolution_ms: 4 };
    assert_eq!(options.tick_ms(), 1);
    assert!(options.validate().is_ok());
  }
}
