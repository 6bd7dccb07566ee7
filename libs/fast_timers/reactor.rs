// Copyright 2018-2026 the Deno authors. MIT license.

//! Host timer abstraction.
//!
//! The coalescing engine never measures time itself. It relies on exactly one
//! real timer from the host to drive its cadence, and on the same host for
//! short, precise timers that are not worth coalescing. The default
//! implementation (`reactor-tokio` feature) delegates to tokio.

use std::rc::Rc;

use crate::error::HostTimerError;

/// Callback run by the host when a timer elapses. The same callback runs
/// again every time the timer is refreshed and elapses anew.
pub type HostCallback = Rc<dyn Fn()>;

/// The timer primitive the engine consumes from its host.
pub trait HostTimers: 'static {
  type Handle;

  /// Create a one-shot timer that calls `callback` after `delay_ms`.
  fn create(
    &self,
    delay_ms: u64,
    callback: HostCallback,
  ) -> Result<Self::Handle, HostTimerError>;

  /// Cancel a timer. Cancelling an elapsed or already cancelled timer is a
  /// no-op.
  fn cancel(&self, handle: &Self::Handle);

  /// Rearm a timer in place so it elapses `delay_ms` from now, whether or not
  /// it already fired. Returns `false` if the host has no in-place rearm or
  /// the timer was cancelled, in which case the caller must create a new
  /// timer instead.
  fn refresh(&self, _handle: &Self::Handle) -> bool {
    false
  }

  /// Mark a timer as not keeping the process alive on its own. Returns
  /// `false` if the host has no such concept; the request is then a no-op.
  fn unref(&self, _handle: &Self::Handle) -> bool {
    false
  }
}

/// The default host, selected by feature flags.
#[cfg(feature = "reactor-tokio")]
pub type DefaultHost = crate::reactor_tokio::TokioHost;
