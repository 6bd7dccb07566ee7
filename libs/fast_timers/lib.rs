// Copyright 2018-2026 the Deno authors. MIT license.

//! Coalesced low-precision timers.
//!
//! Programs that keep many long, imprecise timeouts around (keep-alive
//! windows, idle reapers, retry backoffs) pay for one host timer per timeout
//! even though none of them needs millisecond precision. [`FastTimers`]
//! multiplexes all of them onto a single host timer that ticks every
//! `TICK_MS` milliseconds, and fires each timer within one tick of its
//! deadline. [`Timers`] is the front door: it routes short delays to precise
//! host timers and everything else through the engine.
//!
//! Everything here is single-threaded. Hosts abstract over the real timer
//! primitive; [`TokioHost`] is the default and [`ManualHost`] drives time by
//! hand.

mod active_set;
mod bridge;
mod engine;
mod error;
mod options;
mod reactor;
mod reactor_manual;
#[cfg(feature = "reactor-tokio")]
mod reactor_tokio;
mod record;
mod timers;

pub use engine::FastTimer;
pub use engine::FastTimers;
pub use error::FastTimerError;
pub use error::HostTimerError;
pub use options::FastTimersOptions;
pub use options::RESOLUTION_MS;
pub use options::TICK_MS;
#[cfg(feature = "reactor-tokio")]
pub use reactor::DefaultHost;
pub use reactor::HostCallback;
pub use reactor::HostTimers;
pub use reactor_manual::ManualHost;
pub use reactor_manual::ManualTimerId;
#[cfg(feature = "reactor-tokio")]
pub use reactor_tokio::TokioHost;
#[cfg(feature = "reactor-tokio")]
pub use reactor_tokio::TokioTimer;
pub use record::TimerState;
pub use timers::TimerHandle;
pub use timers::Timers;
