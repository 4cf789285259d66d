use super::{Scheduler, TimeoutId};
use std::cell::RefCell;
use std::collections::BTreeMap;

type Callback = Box<dyn FnOnce()>;

/// Deterministic clock for driving timers without a browser.
///
/// Time only moves through [`VirtualScheduler::advance`]. Due callbacks run in deadline
/// order (ties by scheduling order) with the clock set to their deadline, and may schedule
/// further timeouts that fire within the same advance.
#[derive(Default)]
pub struct VirtualScheduler {
    inner: RefCell<Inner>,
}

#[derive(Default)]
struct Inner {
    now_ms: i64,
    next_id: i64,
    // (deadline, id) -> callback
    queue: BTreeMap<(i64, i64), Callback>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        let target = self.inner.borrow().now_ms + i64::from(ms);

        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.keys().next().copied() {
                    Some(key) if key.0 <= target => {
                        inner.now_ms = key.0;
                        inner.queue.remove(&key)
                    }
                    _ => {
                        inner.now_ms = target;
                        None
                    }
                }
            };

            // Borrow released: callbacks may schedule or clear timeouts.
            match due {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

impl Scheduler for VirtualScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimeoutId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        let deadline = inner.now_ms + i64::from(delay_ms);
        inner.queue.insert((deadline, id), callback);
        TimeoutId(id)
    }

    fn clear_timeout(&self, id: TimeoutId) {
        self.inner
            .borrow_mut()
            .queue
            .retain(|(_, queued), _| *queued != id.0);
    }

    fn now_ms(&self) -> i64 {
        self.inner.borrow().now_ms
    }
}
