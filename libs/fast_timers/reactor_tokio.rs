// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::task::LocalSet;
use tokio::time::Instant;

use crate::error::HostTimerError;
use crate::reactor::HostCallback;
use crate::reactor::HostTimers;

/// Host backed by tokio timers.
///
/// Every timer is a task on the host's own [`LocalSet`], so callbacks may
/// hold `!Send` state and timers can be created from any context on the
/// runtime thread. Timers only make progress while that set is driven, e.g.
/// through `host.local_set().run_until(..)`.
#[derive(Debug, Default, Clone)]
pub struct TokioHost {
  local_set: Rc<LocalSet>,
}

impl TokioHost {
  pub fn new() -> Self {
    Self::default()
  }

  /// Spawn timers onto an existing set instead of a private one.
  pub fn with_local_set(local_set: Rc<LocalSet>) -> Self {
    Self { local_set }
  }

  pub fn local_set(&self) -> &LocalSet {
    &self.local_set
  }
}

/// A timer backed by a tokio [`Sleep`](tokio::time::Sleep) that is reset over
/// a control channel. Dropping the handle does not cancel the timer.
#[derive(Debug)]
pub struct TokioTimer {
  control: mpsc::UnboundedSender<Instant>,
  task: JoinHandle<()>,
  delay: Duration,
  // `abort` only takes effect the next time the task is polled.
  cancelled: Cell<bool>,
}

impl HostTimers for TokioHost {
  type Handle = TokioTimer;

  fn create(
    &self,
    delay_ms: u64,
    callback: HostCallback,
  ) -> Result<TokioTimer, HostTimerError> {
    if tokio::runtime::Handle::try_current().is_err() {
      return Err(HostTimerError::NoRuntime);
    }
    let delay = Duration::from_millis(delay_ms);
    let (control, rx) = mpsc::unbounded_channel();
    let task = self.local_set.spawn_local(run_timer(
      Instant::now() + delay,
      rx,
      callback,
    ));
    Ok(TokioTimer {
      control,
      task,
      delay,
      cancelled: Cell::new(false),
    })
  }

  fn cancel(&self, handle: &TokioTimer) {
    handle.cancelled.set(true);
    handle.task.abort();
  }

  fn refresh(&self, handle: &TokioTimer) -> bool {
    !handle.cancelled.get()
      && !handle.task.is_finished()
      && handle.control.send(Instant::now() + handle.delay).is_ok()
  }

  fn unref(&self, _handle: &TokioTimer) -> bool {
    // A tokio runtime never waits on spawned tasks before shutting down.
    true
  }
}

async fn run_timer(
  deadline: Instant,
  mut control: mpsc::UnboundedReceiver<Instant>,
  callback: HostCallback,
) {
  let sleep = tokio::time::sleep_until(deadline);
  tokio::pin!(sleep);
  let mut armed = true;
  let mut attached = true;
  loop {
    tokio::select! {
      () = &mut sleep, if armed => {
        armed = false;
        callback();
      }
      next = control.recv(), if attached => match next {
        Some(deadline) => {
          sleep.as_mut().reset(deadline);
          armed = true;
        }
        None => attached = false,
      },
      else => break,
    }
  }
}
