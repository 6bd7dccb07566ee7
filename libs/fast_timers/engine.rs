// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::rc::Weak;

use crate::active_set::ActiveSet;
use crate::bridge::Bridge;
use crate::error::FastTimerError;
use crate::options::FastTimersOptions;
use crate::reactor::HostCallback;
use crate::reactor::HostTimers;
use crate::record::TimerRecord;
use crate::record::TimerState;

/// Coalescing timer engine.
///
/// All watched timers share one host timer that fires every tick. Each firing
/// runs a pass that advances a virtual clock by exactly one tick, whatever the
/// real elapsed time, and fires every timer whose delay has elapsed on that
/// clock. A timer registered at virtual time `t` fires at a virtual time in
/// `[t + delay, t + delay + tick)`.
///
/// The engine is single-threaded. Cloning it shares the same state.
pub struct FastTimers<H: HostTimers> {
  inner: Rc<Inner<H>>,
}

impl<H: HostTimers> Clone for FastTimers<H> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

struct Inner<H: HostTimers> {
  host: H,
  options: FastTimersOptions,
  clock: Cell<u64>,
  active: RefCell<ActiveSet>,
  bridge: RefCell<Bridge<H>>,
  in_pass: Cell<bool>,
  // Bumped by `reset` so a pass interrupted by one can bail out.
  epoch: Cell<u64>,
}

/// Handle to a coalesced timer. Dropping it does not cancel the timer.
pub struct FastTimer<H: HostTimers> {
  record: Rc<TimerRecord>,
  engine: Rc<Inner<H>>,
}

impl<H: HostTimers> Clone for FastTimer<H> {
  fn clone(&self) -> Self {
    Self {
      record: self.record.clone(),
      engine: self.engine.clone(),
    }
  }
}

impl<H: HostTimers> fmt::Debug for FastTimer<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.record.fmt(f)
  }
}

impl<H: HostTimers> FastTimer<H> {
  /// Restart the timer's window. The timer is watched again if it had fired
  /// or been cancelled, and its delay is measured from the next pass.
  pub fn refresh(&self) -> Result<(), FastTimerError> {
    self.engine.refresh(&self.record)
  }

  /// Stop the timer from firing. Safe to call any number of times, including
  /// after the timer fired.
  pub fn cancel(&self) {
    self.record.cancel();
  }

  pub fn state(&self) -> TimerState {
    self.record.state()
  }

  pub fn delay_ms(&self) -> u64 {
    self.record.delay_ms()
  }
}

impl<H: HostTimers> FastTimers<H> {
  pub fn new(host: H) -> Self {
    Self::build(host, FastTimersOptions::default())
  }

  pub fn with_options(
    host: H,
    options: FastTimersOptions,
  ) -> Result<Self, FastTimerError> {
    options.validate()?;
    Ok(Self::build(host, options))
  }

  fn build(host: H, options: FastTimersOptions) -> Self {
    let inner = Rc::new_cyclic(|weak: &Weak<Inner<H>>| {
      let weak = weak.clone();
      let on_tick: HostCallback = Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
          inner.run_pass(0);
        }
      });
      Inner {
        host,
        options,
        clock: Cell::new(0),
        active: RefCell::default(),
        bridge: RefCell::new(Bridge::new(options.tick_ms(), on_tick)),
        in_pass: Cell::new(false),
        epoch: Cell::new(0),
      }
    });
    Self { inner }
  }

  pub fn host(&self) -> &H {
    &self.inner.host
  }

  pub fn options(&self) -> FastTimersOptions {
    self.inner.options
  }

  /// Register `callback` to run once `delay_ms` virtual milliseconds have
  /// passed. Fails if the tick timer is not running and cannot be started.
  pub fn create(
    &self,
    delay_ms: u64,
    callback: impl FnMut() + 'static,
  ) -> Result<FastTimer<H>, FastTimerError> {
    let timer = FastTimer {
      record: Rc::new(TimerRecord::new(delay_ms, Box::new(callback))),
      engine: self.inner.clone(),
    };
    timer.refresh()?;
    Ok(timer)
  }

  pub fn create_with_arg<A: 'static>(
    &self,
    delay_ms: u64,
    mut callback: impl FnMut(&A) + 'static,
    arg: A,
  ) -> Result<FastTimer<H>, FastTimerError> {
    self.create(delay_ms, move || callback(&arg))
  }

  /// Current virtual time in milliseconds.
  pub fn now(&self) -> u64 {
    self.inner.clock.get()
  }

  /// Run one pass right away, after moving the virtual clock forward by
  /// `extra_delay_ms` on top of the regular tick.
  pub fn tick(&self, extra_delay_ms: u64) {
    self.inner.run_pass(extra_delay_ms);
  }

  /// Stop the tick timer, forget every watched timer and rewind the virtual
  /// clock to zero. Forgotten timers can be refreshed again.
  pub fn reset(&self) {
    let inner = &self.inner;
    inner.bridge.borrow_mut().stop(&inner.host);
    for record in inner.active.borrow_mut().drain() {
      record.detach();
    }
    inner.clock.set(0);
    inner.epoch.set(inner.epoch.get() + 1);
  }

  /// Number of timers currently watched, including ones already cancelled but
  /// not yet swept.
  pub fn active_count(&self) -> usize {
    self.inner.active.borrow().len()
  }

  pub fn is_bridge_running(&self) -> bool {
    self.inner.bridge.borrow().is_running()
  }
}

impl<H: HostTimers> Drop for Inner<H> {
  fn drop(&mut self) {
    self.bridge.get_mut().stop(&self.host);
  }
}

impl<H: HostTimers> Inner<H> {
  fn refresh(&self, record: &Rc<TimerRecord>) -> Result<(), FastTimerError> {
    // Nothing enters the active set unless the tick timer is running.
    self.bridge.borrow_mut().ensure_running(&self.host)?;
    if record.state() == TimerState::NotScheduled {
      self.active.borrow_mut().push(record.clone());
    }
    record.set_state(TimerState::PendingActivation);
    Ok(())
  }

  fn run_pass(&self, extra_delay_ms: u64) {
    if self.in_pass.replace(true) {
      log::warn!("timer pass requested from inside a timer callback; ignored");
      return;
    }
    let tick = self.options.tick_ms();
    let now = self
      .clock
      .get()
      .saturating_add(extra_delay_ms)
      .saturating_add(tick);
    self.clock.set(now);
    let epoch = self.epoch.get();

    // Records pushed by callbacks land past `scanned` and wait for the next
    // pass.
    let scanned = self.active.borrow().len();
    let mut live = scanned;
    let mut index = 0;
    let mut fired = 0;
    while index < live {
      let next = self.active.borrow().get(index);
      let Some(record) = next else {
        break;
      };
      match record.state() {
        TimerState::PendingActivation => record.activate(now - tick),
        TimerState::Active if record.is_due(now) => {
          record.fire();
          fired += 1;
          if self.epoch.get() != epoch {
            log::debug!("timers reset from a callback; pass abandoned");
            self.in_pass.set(false);
            return;
          }
        }
        _ => {}
      }
      if record.state() == TimerState::PendingRemoval {
        record.detach();
        live -= 1;
        // Re-examine this index: it now holds the last unvisited record.
        self.active.borrow_mut().swap_out(index, live);
      } else {
        index += 1;
      }
    }

    let remaining = {
      let mut active = self.active.borrow_mut();
      active.finish_pass(live, scanned);
      active.len()
    };
    self.in_pass.set(false);
    log::trace!("timer pass at {now}ms: {fired} fired, {remaining} watched");

    let mut bridge = self.bridge.borrow_mut();
    if remaining == 0 {
      bridge.stop(&self.host);
    } else if let Err(err) = bridge.refresh_or_start(&self.host) {
      log::error!(
        "failed to rearm the tick timer, {remaining} timers wait for the next refresh: {err}"
      );
    }
  }
}
