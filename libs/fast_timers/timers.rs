// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::FastTimer;
use crate::engine::FastTimers;
use crate::error::FastTimerError;
use crate::options::FastTimersOptions;
use crate::reactor::HostTimers;

/// Entry point for deferred callbacks.
///
/// Delays above the configured resolution are coalesced onto the shared tick
/// timer; shorter ones get their own precise host timer, since coalescing
/// them would only add jitter.
pub struct Timers<H: HostTimers> {
  engine: FastTimers<H>,
}

/// Handle returned by [`Timers::schedule`]. Dropping it does not cancel the
/// timer.
pub enum TimerHandle<H: HostTimers> {
  Native(H::Handle),
  Fast(FastTimer<H>),
}

impl<H: HostTimers> TimerHandle<H> {
  pub fn is_coalesced(&self) -> bool {
    matches!(self, TimerHandle::Fast(_))
  }
}

impl<H: HostTimers> fmt::Debug for TimerHandle<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TimerHandle::Native(_) => f.write_str("TimerHandle::Native"),
      TimerHandle::Fast(timer) => {
        f.debug_tuple("TimerHandle::Fast").field(timer).finish()
      }
    }
  }
}

impl<H: HostTimers> Timers<H> {
  pub fn new(host: H) -> Self {
    Self {
      engine: FastTimers::new(host),
    }
  }

  pub fn with_options(
    host: H,
    options: FastTimersOptions,
  ) -> Result<Self, FastTimerError> {
    Ok(Self {
      engine: FastTimers::with_options(host, options)?,
    })
  }

  pub fn engine(&self) -> &FastTimers<H> {
    &self.engine
  }

  pub fn schedule(
    &self,
    delay_ms: u64,
    callback: impl FnMut() + 'static,
  ) -> Result<TimerHandle<H>, FastTimerError> {
    if delay_ms <= self.engine.options().resolution_ms {
      let callback = RefCell::new(callback);
      let handle = self.engine.host().create(
        delay_ms,
        Rc::new(move || {
          if let Ok(mut callback) = callback.try_borrow_mut() {
            callback();
          }
        }),
      )?;
      return Ok(TimerHandle::Native(handle));
    }
    Ok(TimerHandle::Fast(self.engine.create(delay_ms, callback)?))
  }

  pub fn schedule_with_arg<A: 'static>(
    &self,
    delay_ms: u64,
    mut callback: impl FnMut(&A) + 'static,
    arg: A,
  ) -> Result<TimerHandle<H>, FastTimerError> {
    self.schedule(delay_ms, move || callback(&arg))
  }

  /// Coalesce regardless of the delay.
  pub fn schedule_coalesced(
    &self,
    delay_ms: u64,
    callback: impl FnMut() + 'static,
  ) -> Result<FastTimer<H>, FastTimerError> {
    self.engine.create(delay_ms, callback)
  }

  pub fn schedule_coalesced_with_arg<A: 'static>(
    &self,
    delay_ms: u64,
    callback: impl FnMut(&A) + 'static,
    arg: A,
  ) -> Result<FastTimer<H>, FastTimerError> {
    self.engine.create_with_arg(delay_ms, callback, arg)
  }

  pub fn cancel(&self, handle: &TimerHandle<H>) {
    match handle {
      TimerHandle::Native(handle) => self.engine.host().cancel(handle),
      TimerHandle::Fast(timer) => timer.cancel(),
    }
  }

  pub fn cancel_coalesced(&self, timer: &FastTimer<H>) {
    timer.cancel();
  }

  /// Restart a timer's window. Precise timers need a host that can rearm in
  /// place, and cannot be refreshed once cancelled.
  pub fn refresh(
    &self,
    handle: &TimerHandle<H>,
  ) -> Result<(), FastTimerError> {
    match handle {
      TimerHandle::Native(handle) => {
        if self.engine.host().refresh(handle) {
          Ok(())
        } else {
          Err(FastTimerError::RefreshUnsupported)
        }
      }
      TimerHandle::Fast(timer) => timer.refresh(),
    }
  }

  /// Virtual time of the coalescing engine in milliseconds.
  pub fn now(&self) -> u64 {
    self.engine.now()
  }

  pub fn tick(&self, extra_delay_ms: u64) {
    self.engine.tick(extra_delay_ms);
  }

  pub fn reset(&self) {
    self.engine.reset();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::options::RESOLUTION_MS;
  use crate::reactor_manual::ManualHost;
  use pretty_assertions::assert_eq;
  use std::cell::Cell;

  fn counter() -> (Rc<Cell<usize>>, impl FnMut() + 'static) {
    let count = Rc::new(Cell::new(0));
    let callback = {
      let count = count.clone();
      move || count.set(count.get() + 1)
    };
    (count, callback)
  }

  #[test]
  fn short_delays_bypass_the_engine() {
    let host = ManualHost::new();
    let timers = Timers::new(host.clone());
    let (count, callback) = counter();
    let handle = timers.schedule(RESOLUTION_MS, callback).unwrap();
    assert!(!handle.is_coalesced());
    assert_eq!(timers.engine().active_count(), 0);
    assert!(!timers.engine().is_bridge_running());

    host.advance(RESOLUTION_MS - 1);
    assert_eq!(count.get(), 0);
    host.advance(1);
    assert_eq!(count.get(), 1);
  }

  #[test]
  fn long_delays_are_coalesced() {
    let host = ManualHost::new();
    let timers = Timers::new(host.clone());
    let fired_at = Rc::new(Cell::new(None));
    let handle = {
      let fired_at = fired_at.clone();
      let host = host.clone();
      timers
        .schedule(RESOLUTION_MS + 1, move || fired_at.set(Some(host.now())))
        .unwrap()
    };
    assert!(handle.is_coalesced());
    assert!(timers.engine().is_bridge_running());

    host.advance(5000);
    // Ticks at 499, 998, 1497: fires on the third, then the bridge lapses.
    assert_eq!(fired_at.get(), Some(1497));
    assert!(!timers.engine().is_bridge_running());
    assert_eq!(host.live_timers(), 0);
  }

  #[test]
  fn cancel_dispatches_by_kind() {
    let host = ManualHost::new();
    let timers = Timers::new(host.clone());
    let (native_count, native) = counter();
    let (fast_count, fast) = counter();
    let native = timers.schedule(10, native).unwrap();
    let fast = timers.schedule(3000, fast).unwrap();
    timers.cancel(&native);
    timers.cancel(&fast);
    timers.cancel(&fast);
    host.advance(10_000);
    assert_eq!(native_count.get(), 0);
    assert_eq!(fast_count.get(), 0);
    assert_eq!(timers.engine().active_count(), 0);
  }

  #[test]
  fn coalesced_entry_points_ignore_threshold() {
    let timers = Timers::new(ManualHost::new());
    let seen = Rc::new(Cell::new(0));
    let timer = {
      let seen = seen.clone();
      timers
        .schedule_coalesced_with_arg(10, move |n: &u32| seen.set(*n), 7)
        .unwrap()
    };
    assert_eq!(timers.engine().active_count(), 1);
    timers.tick(0);
    timers.tick(0);
    assert_eq!(seen.get(), 7);
    timers.cancel_coalesced(&timer);
    assert_eq!(timers.now(), 998);
  }

  #[test]
  fn refresh_native_needs_host_support() {
    let host = ManualHost::with_capabilities(false, false);
    let timers = Timers::new(host.clone());
    let (_, callback) = counter();
    let handle = timers.schedule(10, callback).unwrap();
    assert_eq!(
      timers.refresh(&handle),
      Err(FastTimerError::RefreshUnsupported)
    );

    let host = ManualHost::new();
    let timers = Timers::new(host.clone());
    let (count, mut callback) = counter();
    let handle = timers
      .schedule_with_arg(10, move |_: &()| callback(), ())
      .unwrap();
    host.advance(5);
    timers.refresh(&handle).unwrap();
    host.advance(9);
    assert_eq!(count.get(), 0);
    host.advance(1);
    assert_eq!(count.get(), 1);
  }

  #[test]
  fn host_failure_surfaces_from_schedule() {
    let host = ManualHost::new();
    let timers = Timers::new(host.clone());
    host.fail_next_creates(2);
    assert!(matches!(
      timers.schedule(10, || {}),
      Err(FastTimerError::Host(_))
    ));
    assert!(matches!(
      timers.schedule(5000, || {}),
      Err(FastTimerError::Host(_))
    ));
    assert_eq!(timers.engine().active_count(), 0);
  }
}
