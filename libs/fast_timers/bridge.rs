// Copyright 2018-2026 the Deno authors. MIT license.

use crate::error::HostTimerError;
use crate::reactor::HostCallback;
use crate::reactor::HostTimers;

/// Owns the single host timer that drives the engine's passes.
pub(crate) struct Bridge<H: HostTimers> {
  handle: Option<H::Handle>,
  period_ms: u64,
  on_tick: HostCallback,
}

impl<H: HostTimers> Bridge<H> {
  pub fn new(period_ms: u64, on_tick: HostCallback) -> Self {
    Self {
      handle: None,
      period_ms,
      on_tick,
    }
  }

  pub fn is_running(&self) -> bool {
    self.handle.is_some()
  }

  /// Start the host timer unless one is already pending.
  pub fn ensure_running(&mut self, host: &H) -> Result<(), HostTimerError> {
    if self.handle.is_some() {
      return Ok(());
    }
    self.start(host)
  }

  /// Arm the host timer to fire one period from now, rearming the existing
  /// timer in place when the host allows it.
  pub fn refresh_or_start(&mut self, host: &H) -> Result<(), HostTimerError> {
    if let Some(handle) = &self.handle {
      if host.refresh(handle) {
        return Ok(());
      }
      log::debug!("host timer cannot be rearmed in place; recreating");
      host.cancel(handle);
      self.handle = None;
    }
    self.start(host)
  }

  fn start(&mut self, host: &H) -> Result<(), HostTimerError> {
    let handle = host.create(self.period_ms, self.on_tick.clone())?;
    if !host.unref(&handle) {
      log::debug!("host timer cannot be unrefed; it may keep the process alive");
    }
    log::debug!("tick timer started with a {}ms period", self.period_ms);
    self.handle = Some(handle);
    Ok(())
  }

  /// Cancel the host timer. Used both when the active set runs dry and on
  /// reset.
  pub fn stop(&mut self, host: &H) {
    if let Some(handle) = self.handle.take() {
      host.cancel(&handle);
      log::debug!("tick timer stopped");
    }
  }
}
