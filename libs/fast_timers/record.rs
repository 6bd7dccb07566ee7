// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;

/// Lifecycle of a coalesced timer.
///
/// ```text
/// NotScheduled --refresh--> PendingActivation --pass--> Active
/// Active --pass, expired--> PendingRemoval --pass, swept--> NotScheduled
/// cancel: PendingActivation | Active --> PendingRemoval
/// refresh: Active | PendingRemoval --> PendingActivation
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
  /// Not watched by the engine.
  NotScheduled,
  /// Watched; the next pass stamps its anchor.
  PendingActivation,
  /// Watched; fires once the virtual clock reaches `anchor + delay`.
  Active,
  /// Still in the active set, swept on the next visit without firing.
  PendingRemoval,
}

pub(crate) struct TimerRecord {
  state: Cell<TimerState>,
  delay_ms: u64,
  anchor: Cell<Option<u64>>,
  callback: RefCell<Box<dyn FnMut()>>,
}

impl fmt::Debug for TimerRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TimerRecord")
      .field("state", &self.state.get())
      .field("delay_ms", &self.delay_ms)
      .field("anchor", &self.anchor.get())
      .finish_non_exhaustive()
  }
}

impl TimerRecord {
  pub fn new(delay_ms: u64, callback: Box<dyn FnMut()>) -> Self {
    Self {
      state: Cell::new(TimerState::NotScheduled),
      delay_ms,
      anchor: Cell::new(None),
      callback: RefCell::new(callback),
    }
  }

  pub fn state(&self) -> TimerState {
    self.state.get()
  }

  pub fn set_state(&self, state: TimerState) {
    self.state.set(state);
  }

  pub fn delay_ms(&self) -> u64 {
    self.delay_ms
  }

  #[cfg(test)]
  pub fn anchor(&self) -> Option<u64> {
    self.anchor.get()
  }

  pub fn activate(&self, anchor: u64) {
    self.anchor.set(Some(anchor));
    self.state.set(TimerState::Active);
  }

  pub fn is_due(&self, now: u64) -> bool {
    match self.anchor.get() {
      Some(anchor) => now >= anchor.saturating_add(self.delay_ms),
      None => false,
    }
  }

  /// Stop watching this record. The next pass that visits it sweeps it
  /// without firing. No-op once the record is no longer watched.
  pub fn cancel(&self) {
    if self.state.get() != TimerState::NotScheduled {
      self.state.set(TimerState::PendingRemoval);
    }
    self.anchor.set(None);
  }

  pub fn detach(&self) {
    self.state.set(TimerState::NotScheduled);
    self.anchor.set(None);
  }

  /// Mark the record as fired and run its callback. The state flips before
  /// the callback runs so a `refresh()` from inside the callback keeps the
  /// record watched.
  pub fn fire(&self) {
    self.state.set(TimerState::PendingRemoval);
    self.anchor.set(None);
    match self.callback.try_borrow_mut() {
      Ok(mut callback) => callback(),
      Err(_) => log::warn!("timer callback re-entered while running; skipped"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;

  fn record(delay_ms: u64) -> (TimerRecord, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    let record = {
      let count = count.clone();
      TimerRecord::new(delay_ms, Box::new(move || count.set(count.get() + 1)))
    };
    (record, count)
  }

  #[test]
  fn due_only_when_active_and_elapsed() {
    let (record, _) = record(2000);
    assert!(!record.is_due(u64::MAX));
    record.activate(499);
    assert!(!record.is_due(2498));
    assert!(record.is_due(2499));
  }

  #[test]
  fn cancel_is_idempotent_and_clears_anchor() {
    let (record, count) = record(2000);
    record.cancel();
    assert_eq!(record.state(), TimerState::NotScheduled);

    record.set_state(TimerState::PendingActivation);
    record.activate(0);
    record.cancel();
    record.cancel();
    assert_eq!(record.state(), TimerState::PendingRemoval);
    assert_eq!(record.anchor(), None);
    assert!(!record.is_due(u64::MAX));
    assert_eq!(count.get(), 0);
  }

  #[test]
  fn fire_marks_removal_before_running() {
    let (record, count) = record(10);
    record.activate(0);
    record.fire();
    assert_eq!(count.get(), 1);
    assert_eq!(record.state(), TimerState::PendingRemoval);
    assert_eq!(record.anchor(), None);
  }
}
