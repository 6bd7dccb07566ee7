// Copyright 2018-2026 the Deno authors. MIT license.

use deno_error::JsError;
use thiserror::Error;

/// Failure reported by a [`HostTimers`](crate::HostTimers) implementation
/// when it cannot hand out a real timer.
#[derive(Debug, Clone, Error, JsError, PartialEq, Eq)]
#[class(generic)]
pub enum HostTimerError {
  #[error("no async runtime is available to drive host timers")]
  NoRuntime,
  #[error("host timer capacity exhausted ({limit} live timers)")]
  Exhausted { limit: usize },
}

#[derive(Debug, Clone, Error, JsError, PartialEq, Eq)]
pub enum FastTimerError {
  #[class(inherit)]
  #[error(transparent)]
  Host(#[from] HostTimerError),
  #[class(type)]
  #[error(
    "timer resolution must be at least {min}ms to yield a non-zero tick, got {actual}ms"
  )]
  InvalidResolution { min: u64, actual: u64 },
  #[class(type)]
  #[error("host timer cannot be refreshed in place or was cancelled")]
  RefreshUnsupported,
}
