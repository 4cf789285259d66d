//! Smoothing filter for live collection snapshots.
//!
//! Multi-step writes (a trigger that deletes then recreates documents, for instance) make
//! live listeners emit transient partial snapshots. Showing them makes tables flash empty
//! and refill. Growth is never spurious in that failure mode, so grow/same-length updates
//! pass through immediately while shrinks are held back for a stabilization window and
//! dropped if a newer snapshot arrives first.

use crate::timer::{Scheduler, ScopedTimer};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub const DEFAULT_WINDOW_MS: u32 = 2000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber<T> = Rc<dyn Fn(&[T])>;

struct Inner<T> {
    deferred: Vec<T>,
    latest: Vec<T>,
    emitted_len: usize,
    pending_update: bool,
    last_immediate: bool,
    window_ms: u32,
    timer: ScopedTimer,
    subscribers: Vec<(SubscriberId, Subscriber<T>)>,
    next_subscriber: u64,
    disposed: bool,
}

/// Republishes a raw record sequence, never shrinking before the shrink has persisted for
/// the whole window.
pub struct SequenceStabilizer<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for SequenceStabilizer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> SequenceStabilizer<T> {
    pub fn new(initial: Vec<T>, window_ms: u32, scheduler: Rc<dyn Scheduler>) -> Self {
        let emitted_len = initial.len();
        Self {
            inner: Rc::new(RefCell::new(Inner {
                deferred: initial.clone(),
                latest: initial,
                emitted_len,
                pending_update: false,
                last_immediate: true,
                window_ms,
                timer: ScopedTimer::new(scheduler),
                subscribers: Vec::new(),
                next_subscriber: 0,
                disposed: false,
            })),
        }
    }

    /// Feed a new raw snapshot.
    pub fn update(&self, raw: Vec<T>) {
        self.evaluate(Some(raw));
    }

    /// Change the window; re-evaluates the latest raw snapshot under the new window.
    pub fn set_window_ms(&self, window_ms: u32) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.window_ms == window_ms {
                return;
            }
            inner.window_ms = window_ms;
        }
        self.evaluate(None);
    }

    /// The stabilized sequence as currently published.
    pub fn current(&self) -> Vec<T> {
        self.inner.borrow().deferred.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while a shrink is being held back.
    pub fn is_pending(&self) -> bool {
        self.inner.borrow().pending_update
    }

    pub fn window_ms(&self) -> u32 {
        self.inner.borrow().window_ms
    }

    pub fn subscribe(&self, subscriber: impl Fn(&[T]) + 'static) -> SubscriberId {
        let mut inner = self.inner.borrow_mut();
        inner.next_subscriber += 1;
        let id = SubscriberId(inner.next_subscriber);
        inner.subscribers.push((id, Rc::new(subscriber)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.borrow_mut().subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Tear down: cancels the shrink timer and flushes a value still waiting on it, then
    /// drops all subscribers. Later updates are ignored.
    pub fn dispose(&self) {
        let flush = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            let cancelled = inner.timer.cancel();
            cancelled && inner.pending_update
        };

        if flush {
            log::debug!("stabilizer disposed with a pending shrink; flushing");
            Self::perform_update(&self.inner);
        }

        let mut inner = self.inner.borrow_mut();
        inner.disposed = true;
        inner.subscribers.clear();
    }

    fn evaluate(&self, raw: Option<Vec<T>>) {
        // Teardown of the previous evaluation comes first.
        let flush_previous = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.timer.cancel();
            inner.pending_update && inner.last_immediate
        };
        if flush_previous {
            Self::perform_update(&self.inner);
        }

        let (immediate, window_ms) = {
            let mut inner = self.inner.borrow_mut();
            if let Some(raw) = raw {
                inner.latest = raw;
            }
            inner.pending_update = true;
            let immediate = inner.latest.len() >= inner.emitted_len;
            inner.last_immediate = immediate;
            (immediate, inner.window_ms)
        };

        if immediate {
            Self::perform_update(&self.inner);
            return;
        }

        log::trace!("holding back shrink for {window_ms}ms");
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        self.inner
            .borrow_mut()
            .timer
            .schedule(window_ms, move |token| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if !inner.borrow_mut().timer.take_if_current(token) {
                    return;
                }
                Self::perform_update(&inner);
            });
    }

    fn perform_update(inner: &Rc<RefCell<Inner<T>>>) {
        let (snapshot, subscribers) = {
            let mut inner = inner.borrow_mut();
            inner.deferred = inner.latest.clone();
            inner.emitted_len = inner.deferred.len();
            inner.pending_update = false;
            let subscribers: Vec<Subscriber<T>> =
                inner.subscribers.iter().map(|(_, s)| s.clone()).collect();
            (inner.deferred.clone(), subscribers)
        };

        for subscriber in subscribers {
            subscriber(&snapshot);
        }
    }
}

impl<T> Drop for Inner<T> {
    // Runs before the timer field drops, so a held-back shrink still reaches subscribers.
    fn drop(&mut self) {
        if self.disposed || !self.timer.cancel() || !self.pending_update {
            return;
        }
        log::debug!("stabilizer dropped with a pending shrink; flushing");
        self.deferred = std::mem::take(&mut self.latest);
        self.emitted_len = self.deferred.len();
        self.pending_update = false;
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.deferred);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::VirtualScheduler;
    use proptest::prelude::*;

    fn setup(initial: usize) -> (Rc<VirtualScheduler>, SequenceStabilizer<usize>, Rc<RefCell<Vec<(i64, usize)>>>) {
        let clock = Rc::new(VirtualScheduler::new());
        let stabilizer = SequenceStabilizer::new((0..initial).collect(), DEFAULT_WINDOW_MS, clock.clone());
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let c = clock.clone();
        stabilizer.subscribe(move |items| l.borrow_mut().push((c.now_ms(), items.len())));
        (clock, stabilizer, log)
    }

    fn seq(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn growth_is_immediate() {
        let (_clock, s, log) = setup(2);
        s.update(seq(5));
        assert_eq!(s.len(), 5);
        s.update(seq(5));
        assert_eq!(*log.borrow(), vec![(0, 5), (0, 5)]);
        assert!(!s.is_pending());
    }

    #[test]
    fn regrow_preempts_pending_shrink() {
        let (clock, s, log) = setup(5);
        clock.advance(10);
        s.update(seq(0));
        assert_eq!(s.len(), 5);
        clock.advance(40);
        s.update(seq(5));
        clock.advance(10);

        assert_eq!(s.len(), 5);
        clock.advance(5000);
        assert!(log.borrow().iter().all(|(_, len)| *len == 5));
        assert_eq!(clock.pending_count(), 0);
    }

    #[test]
    fn shrink_surfaces_after_full_window() {
        let (clock, s, log) = setup(5);
        s.update(seq(0));
        clock.advance(1999);
        assert_eq!(s.len(), 5);
        assert!(s.is_pending());

        clock.advance(1);
        assert_eq!(s.len(), 0);
        assert_eq!(log.borrow().last(), Some(&(2000, 0)));
    }

    #[test]
    fn consecutive_shrinks_reset_the_window() {
        let (clock, s, _log) = setup(5);
        s.update(seq(3));
        clock.advance(1500);
        s.update(seq(2));
        clock.advance(1500);
        assert_eq!(s.len(), 5);
        clock.advance(500);
        assert_eq!(s.current(), seq(2));
    }

    #[test]
    fn window_change_re_evaluates_pending_shrink() {
        let (clock, s, _log) = setup(4);
        s.update(seq(1));
        clock.advance(100);
        s.set_window_ms(200);
        assert_eq!(s.window_ms(), 200);
        clock.advance(199);
        assert_eq!(s.len(), 4);
        clock.advance(1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn dispose_flushes_pending_shrink_and_stops() {
        let (clock, s, log) = setup(5);
        s.update(seq(1));
        s.dispose();

        assert_eq!(s.len(), 1);
        assert_eq!(log.borrow().last(), Some(&(0, 1)));
        assert_eq!(clock.pending_count(), 0);

        s.update(seq(9));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn dropping_last_handle_flushes_pending_shrink() {
        let (clock, s, log) = setup(5);
        s.update(seq(2));
        assert!(s.is_pending());
        drop(s);

        assert_eq!(log.borrow().last(), Some(&(0, 2)));
        assert_eq!(clock.pending_count(), 0);
        clock.advance(5000);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn dropping_after_dispose_emits_nothing_more() {
        let (_clock, s, log) = setup(5);
        s.update(seq(2));
        s.dispose();
        drop(s);
        assert_eq!(*log.borrow(), vec![(0, 2)]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let (_clock, s, log) = setup(0);
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let id = s.subscribe(move |_| *h.borrow_mut() += 1);
        s.update(seq(1));
        s.unsubscribe(id);
        s.update(seq(2));
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(log.borrow().len(), 2);
    }

    proptest! {
        #[test]
        fn output_never_shrinks_before_window(
            steps in prop::collection::vec((0u32..3000, 0usize..8), 1..40)
        ) {
            let clock = Rc::new(VirtualScheduler::new());
            let s = SequenceStabilizer::new(seq(4), DEFAULT_WINDOW_MS, clock.clone());
            let updates: Rc<RefCell<Vec<(i64, usize)>>> = Rc::new(RefCell::new(Vec::new()));
            // (time, len, number of raw updates seen so far)
            let emitted: Rc<RefCell<Vec<(i64, usize, usize)>>> = Rc::new(RefCell::new(Vec::new()));

            let (c, u, e) = (clock.clone(), updates.clone(), emitted.clone());
            s.subscribe(move |items| {
                e.borrow_mut().push((c.now_ms(), items.len(), u.borrow().len()));
            });

            for (delay, len) in steps {
                clock.advance(delay);
                updates.borrow_mut().push((clock.now_ms(), len));
                s.update(seq(len));
            }
            clock.advance(DEFAULT_WINDOW_MS);

            let updates = updates.borrow();
            let mut previous = 4usize;
            for &(at, len, seen) in emitted.borrow().iter() {
                if len < previous {
                    // The shrink comes from the newest raw update, which has stood
                    // unchallenged for a full window.
                    let (t, raw_len) = updates[seen - 1];
                    prop_assert_eq!(raw_len, len);
                    prop_assert!(at - t >= i64::from(DEFAULT_WINDOW_MS));
                }
                previous = len;
            }

            // Once the feed goes quiet, output converges on the latest raw snapshot.
            prop_assert_eq!(s.len(), updates.last().map(|u| u.1).unwrap_or(4));
        }
    }
}
