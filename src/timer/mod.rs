mod browser;
mod virtual_clock;

pub use browser::BrowserScheduler;
pub use virtual_clock::VirtualScheduler;

use std::rc::Rc;

/// Id handed out by a [`Scheduler`] for one outstanding timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeoutId(pub i64);

/// Generation of a [`ScopedTimer`]. A callback only acts if its token is still current.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// Source of one-shot timeouts on the UI thread.
///
/// Callbacks are `FnOnce` and never `Send`: everything runs on the single event loop.
pub trait Scheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimeoutId;

    fn clear_timeout(&self, id: TimeoutId);

    fn now_ms(&self) -> i64;
}

/// A single cancellable timeout owned by one component.
///
/// Re-scheduling cancels the previous timeout. `cancel` is synchronous and reports whether
/// a callback was outstanding, so owners can flush on dispose before the deferred callback
/// could ever run. Dropping the timer cancels it.
pub struct ScopedTimer {
    scheduler: Rc<dyn Scheduler>,
    armed: Option<(TimerToken, TimeoutId)>,
    generation: u64,
}

impl ScopedTimer {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            armed: None,
            generation: 0,
        }
    }

    /// Arm the timer. The callback receives the token it was scheduled with; pass it to
    /// [`ScopedTimer::take_if_current`] before acting.
    pub fn schedule(&mut self, delay_ms: u32, callback: impl FnOnce(TimerToken) + 'static) -> TimerToken {
        self.cancel();

        self.generation = self.generation.wrapping_add(1);
        let token = TimerToken(self.generation);
        let id = self
            .scheduler
            .set_timeout(delay_ms, Box::new(move || callback(token)));
        self.armed = Some((token, id));
        token
    }

    /// Returns true if a timeout was outstanding.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some((_, id)) => {
                self.scheduler.clear_timeout(id);
                true
            }
            None => false,
        }
    }

    /// Disarm if `token` is the live generation. Stale callbacks get `false`.
    pub fn take_if_current(&mut self, token: TimerToken) -> bool {
        match self.armed {
            Some((current, _)) if current == token => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.scheduler
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
