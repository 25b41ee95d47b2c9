//! Background timer for soft/hard search budgets.
//!
//! The keeper thread only flips flags; the search polls them at node
//! boundaries. Soft means "do not start another iteration", hard means
//! "abort now and return the best move so far".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{trace, warn};

use crate::errors::{ChessError, ChessResult};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
pub struct TimeFlags {
    soft: AtomicBool,
    hard: AtomicBool,
}

impl TimeFlags {
    #[inline]
    pub fn soft_reached(&self) -> bool {
        self.soft.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn hard_reached(&self) -> bool {
        self.hard.load(Ordering::Relaxed)
    }

    #[inline]
    fn set_soft(&self) {
        self.soft.store(true, Ordering::Relaxed);
    }

    /// Hard implies soft.
    #[inline]
    fn set_hard(&self) {
        self.soft.store(true, Ordering::Relaxed);
        self.hard.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBudget {
    pub soft: Option<Duration>,
    pub hard: Option<Duration>,
}

impl TimeBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_millis(soft_ms: Option<u64>, hard_ms: Option<u64>) -> Self {
        Self {
            soft: soft_ms.map(Duration::from_millis),
            hard: hard_ms.map(Duration::from_millis),
        }
    }

    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.soft.is_none() && self.hard.is_none()
    }
}

/// Owns the timer thread. Dropping the keeper stops and joins it.
#[derive(Debug)]
pub struct TimeKeeper {
    flags: Arc<TimeFlags>,
    started_at: Instant,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TimeKeeper {
    /// Start timing now. No thread is spawned for an unlimited budget.
    pub fn start(budget: TimeBudget, poll_interval: Duration) -> ChessResult<Self> {
        let flags = Arc::new(TimeFlags::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let started_at = Instant::now();

        let handle = if budget.is_unlimited() {
            None
        } else {
            let flags = Arc::clone(&flags);
            let shutdown = Arc::clone(&shutdown);
            let poll = poll_interval.max(Duration::from_millis(1));
            let handle = thread::Builder::new()
                .name("gambit-time-keeper".to_owned())
                .spawn(move || run_timer(budget, poll, started_at, &flags, &shutdown))
                .map_err(|e| ChessError::Worker(format!("failed to spawn time keeper: {e}")))?;
            Some(handle)
        };

        Ok(Self {
            flags,
            started_at,
            shutdown,
            handle,
        })
    }

    #[inline]
    pub fn flags(&self) -> Arc<TimeFlags> {
        Arc::clone(&self.flags)
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("time keeper thread panicked");
            }
        }
    }
}

impl Drop for TimeKeeper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_timer(
    budget: TimeBudget,
    poll: Duration,
    started_at: Instant,
    flags: &TimeFlags,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let elapsed = started_at.elapsed();

        if let Some(soft) = budget.soft {
            if elapsed >= soft && !flags.soft_reached() {
                trace!("soft time limit reached after {} ms", elapsed.as_millis());
                flags.set_soft();
            }
        }
        if let Some(hard) = budget.hard {
            if elapsed >= hard {
                trace!("hard time limit reached after {} ms", elapsed.as_millis());
                flags.set_hard();
                return;
            }
        }

        thread::park_timeout(poll);
    }
}
