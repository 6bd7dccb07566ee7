// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::HostTimerError;
use crate::reactor::HostCallback;
use crate::reactor::HostTimers;

/// A deterministic host whose clock only moves when [`ManualHost::advance`]
/// is called.
///
/// Cloning shares the same clock and timer table, so a clone can be handed to
/// an engine while the original drives time and inspects state.
#[derive(Clone)]
pub struct ManualHost {
  state: Rc<RefCell<ManualState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManualTimerId(u64);

struct ManualTimer {
  id: ManualTimerId,
  delay_ms: u64,
  deadline: u64,
  armed: bool,
  refed: bool,
  callback: HostCallback,
}

struct ManualState {
  now: u64,
  next_id: u64,
  timers: Vec<ManualTimer>,
  supports_refresh: bool,
  supports_unref: bool,
  failing_creates: usize,
  created: usize,
  cancelled: usize,
}

impl Default for ManualHost {
  fn default() -> Self {
    Self::new()
  }
}

impl ManualHost {
  /// A host that supports in-place rearm and unref.
  pub fn new() -> Self {
    Self::with_capabilities(true, true)
  }

  pub fn with_capabilities(supports_refresh: bool, supports_unref: bool) -> Self {
    Self {
      state: Rc::new(RefCell::new(ManualState {
        now: 0,
        next_id: 0,
        timers: Vec::new(),
        supports_refresh,
        supports_unref,
        failing_creates: 0,
        created: 0,
        cancelled: 0,
      })),
    }
  }

  /// Make the next `count` calls to `create` fail as if the host ran out of
  /// timers.
  pub fn fail_next_creates(&self, count: usize) {
    self.state.borrow_mut().failing_creates = count;
  }

  pub fn now(&self) -> u64 {
    self.state.borrow().now
  }

  /// Move the clock forward by `ms`, running every timer that elapses on the
  /// way in deadline order. Callbacks may create, refresh or cancel timers;
  /// timers they arm inside the window also run.
  pub fn advance(&self, ms: u64) {
    let target = self.state.borrow().now + ms;
    while let Some(callback) = self.pop_due(target) {
      callback();
    }
    self.state.borrow_mut().now = target;
  }

  fn pop_due(&self, target: u64) -> Option<HostCallback> {
    let mut state = self.state.borrow_mut();
    let timer = state
      .timers
      .iter_mut()
      .filter(|timer| timer.armed && timer.deadline <= target)
      .min_by_key(|timer| (timer.deadline, timer.id.0))?;
    timer.armed = false;
    let deadline = timer.deadline;
    let callback = timer.callback.clone();
    state.now = deadline;
    Some(callback)
  }

  /// Timers that were created and not cancelled, whether or not they fired.
  pub fn live_timers(&self) -> usize {
    self.state.borrow().timers.len()
  }

  /// Timers that are waiting to fire.
  pub fn armed_timers(&self) -> usize {
    self.state.borrow().timers.iter().filter(|t| t.armed).count()
  }

  /// Whether any pending timer would keep a process alive on its own.
  pub fn has_ref_timers(&self) -> bool {
    self
      .state
      .borrow()
      .timers
      .iter()
      .any(|timer| timer.armed && timer.refed)
  }

  pub fn created_count(&self) -> usize {
    self.state.borrow().created
  }

  pub fn cancelled_count(&self) -> usize {
    self.state.borrow().cancelled
  }
}

impl HostTimers for ManualHost {
  type Handle = ManualTimerId;

  fn create(
    &self,
    delay_ms: u64,
    callback: HostCallback,
  ) -> Result<ManualTimerId, HostTimerError> {
    let mut state = self.state.borrow_mut();
    if state.failing_creates > 0 {
      state.failing_creates -= 1;
      return Err(HostTimerError::Exhausted {
        limit: state.timers.len(),
      });
    }
    let id = ManualTimerId(state.next_id);
    state.next_id += 1;
    state.created += 1;
    let deadline = state.now + delay_ms;
    state.timers.push(ManualTimer {
      id,
      delay_ms,
      deadline,
      armed: true,
      refed: true,
      callback,
    });
    Ok(id)
  }

  fn cancel(&self, handle: &ManualTimerId) {
    let mut state = self.state.borrow_mut();
    let before = state.timers.len();
    state.timers.retain(|timer| timer.id != *handle);
    if state.timers.len() != before {
      state.cancelled += 1;
    }
  }

  fn refresh(&self, handle: &ManualTimerId) -> bool {
    let mut state = self.state.borrow_mut();
    if !state.supports_refresh {
      return false;
    }
    let now = state.now;
    match state.timers.iter_mut().find(|timer| timer.id == *handle) {
      Some(timer) => {
        timer.deadline = now + timer.delay_ms;
        timer.armed = true;
        true
      }
      None => false,
    }
  }

  fn unref(&self, handle: &ManualTimerId) -> bool {
    let mut state = self.state.borrow_mut();
    if !state.supports_unref {
      return false;
    }
    match state.timers.iter_mut().find(|timer| timer.id == *handle) {
      Some(timer) => {
        timer.refed = false;
        true
      }
      None => false,
    }
  }
}
