//! Floating inline editor for a single table cell.
//!
//! The editor is headless: the popup component feeds it measurements, pointer and widget
//! events, and renders whatever position it reports. Edits are debounced and written back
//! through a [`CommitSink`] only when they are valid and actually change the record.

mod commit;

pub use commit::{CommitSink, StoreCommitSink};

use crate::config::DEFAULT_COMMIT_DEBOUNCE_MS;
use crate::geometry::{clamp_position, initial_position, Placement, Point, Rect, Size, ViewportProvider};
use crate::models::{Entity, EntityStatus, EntityValues};
use crate::store::SaveEntityRequest;
use crate::timer::{Scheduler, ScopedTimer, TimerToken};
use crate::util::snapshot_differs;
use crate::validation::{errors_cleared, FieldErrors};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum EditorState {
    Closed,
    Open,
    Dragging,
    /// Only observable from inside [`CommitSink::commit`].
    Committing,
}

/// Transient state of one open popup.
#[derive(Clone, Debug)]
struct EditorSession {
    record: Option<Entity>,
    field_key: String,
    anchor: Rect,
    panel: Option<Size>,
    position: Option<Point>,
    placement: Option<Placement>,
    pending: Option<EntityValues>,
    errors: FieldErrors,
    drag_offset: Option<Point>,
}

impl EditorSession {
    fn new(record: Entity, field_key: String, anchor: Rect) -> Self {
        Self {
            record: Some(record),
            field_key,
            anchor,
            panel: None,
            position: None,
            placement: None,
            pending: None,
            errors: FieldErrors::new(),
            drag_offset: None,
        }
    }
}

struct Inner {
    state: EditorState,
    session: Option<EditorSession>,
    /// Last target, kept so caller-controlled visibility can reopen it.
    last_target: Option<(Entity, String, Rect)>,
    timer: ScopedTimer,
    debounce_ms: u32,
    viewport: Rc<dyn ViewportProvider>,
    sink: Rc<dyn CommitSink>,
    on_dismiss: Option<Rc<dyn Fn()>>,
}

#[derive(Clone)]
pub struct PopupEditor {
    inner: Rc<RefCell<Inner>>,
}

impl PopupEditor {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        viewport: Rc<dyn ViewportProvider>,
        sink: Rc<dyn CommitSink>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: EditorState::Closed,
                session: None,
                last_target: None,
                timer: ScopedTimer::new(scheduler),
                debounce_ms: DEFAULT_COMMIT_DEBOUNCE_MS,
                viewport,
                sink,
                on_dismiss: None,
            })),
        }
    }

    pub fn with_debounce_ms(self, debounce_ms: u32) -> Self {
        self.inner.borrow_mut().debounce_ms = debounce_ms;
        self
    }

    /// Called when the user hits the dismiss button, so the caller can flip its own
    /// visibility state.
    pub fn set_on_dismiss(&self, on_dismiss: impl Fn() + 'static) {
        self.inner.borrow_mut().on_dismiss = Some(Rc::new(on_dismiss));
    }

    pub fn state(&self) -> EditorState {
        self.inner.borrow().state
    }

    pub fn is_open(&self) -> bool {
        self.state() != EditorState::Closed
    }

    pub fn position(&self) -> Option<Point> {
        self.inner.borrow().session.as_ref().and_then(|s| s.position)
    }

    pub fn placement(&self) -> Option<Placement> {
        self.inner.borrow().session.as_ref().and_then(|s| s.placement)
    }

    pub fn field_key(&self) -> Option<String> {
        self.inner.borrow().session.as_ref().map(|s| s.field_key.clone())
    }

    pub fn record(&self) -> Option<Entity> {
        self.inner.borrow().session.as_ref().and_then(|s| s.record.clone())
    }

    pub fn pending_values(&self) -> Option<EntityValues> {
        self.inner.borrow().session.as_ref().and_then(|s| s.pending.clone())
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.inner
            .borrow()
            .session
            .as_ref()
            .map(|s| s.errors.clone())
            .unwrap_or_default()
    }

    /// Start editing `field_key` of `record`, anchored at `anchor`. No-op without a record.
    /// A session that is already open is closed first (flushing its pending edit).
    pub fn open(&self, record: Option<Entity>, field_key: impl Into<String>, anchor: Rect) {
        let Some(record) = record else {
            log::debug!("popup open ignored: no record");
            return;
        };
        self.close();

        let field_key = field_key.into();
        log::debug!("popup open {}/{} field {field_key}", record.path, record.id);

        let mut inner = self.inner.borrow_mut();
        inner.last_target = Some((record.clone(), field_key.clone(), anchor));
        inner.session = Some(EditorSession::new(record, field_key, anchor));
        inner.state = EditorState::Open;
    }

    /// Caller-controlled visibility. `false` closes (with flush), `true` reopens the last
    /// target if the editor is closed.
    pub fn set_open(&self, open: bool) {
        if !open {
            self.close();
            return;
        }
        if self.is_open() {
            return;
        }
        let target = self.inner.borrow().last_target.clone();
        if let Some((record, field_key, anchor)) = target {
            self.open(Some(record), field_key, anchor);
        }
    }

    /// The panel has been laid out. The first measurement of a session picks the initial
    /// position; later ones only re-clamp.
    pub fn measure_panel(&self, panel: Size) {
        let mut inner = self.inner.borrow_mut();
        let viewport = inner.viewport.size();
        let Some(session) = inner.session.as_mut() else {
            return;
        };

        session.panel = Some(panel);
        match session.position {
            None => {
                let (position, placement) = initial_position(session.anchor, panel, viewport);
                log::trace!("popup placed at {position:?} ({placement:?})");
                session.position = Some(position);
                session.placement = Some(placement);
            }
            Some(position) => {
                session.position = Some(clamp_position(position, panel, viewport));
            }
        }
    }

    /// Re-clamp the current position to the current viewport. Placement is kept.
    pub fn handle_resize(&self) {
        let mut inner = self.inner.borrow_mut();
        let viewport = inner.viewport.size();
        let Some(session) = inner.session.as_mut() else {
            return;
        };
        if let (Some(position), Some(panel)) = (session.position, session.panel) {
            session.position = Some(clamp_position(position, panel, viewport));
        }
    }

    /// Move the panel's origin to `point`, clamped. Ignored before the panel is measured.
    pub fn move_to(&self, point: Point) {
        let mut inner = self.inner.borrow_mut();
        let viewport = inner.viewport.size();
        let Some(session) = inner.session.as_mut() else {
            return;
        };
        if let Some(panel) = session.panel {
            session.position = Some(clamp_position(point, panel, viewport));
        }
    }

    pub fn begin_drag(&self, pointer: Point) {
        let mut inner = self.inner.borrow_mut();
        if inner.state != EditorState::Open {
            return;
        }
        let Some(session) = inner.session.as_mut() else {
            return;
        };
        let Some(position) = session.position else {
            return;
        };
        session.drag_offset = Some(pointer.offset_from(position));
        inner.state = EditorState::Dragging;
    }

    pub fn drag_to(&self, pointer: Point) {
        let offset = {
            let inner = self.inner.borrow();
            if inner.state != EditorState::Dragging {
                return;
            }
            inner.session.as_ref().and_then(|s| s.drag_offset)
        };
        if let Some(offset) = offset {
            self.move_to(pointer.offset_from(offset));
        }
    }

    pub fn end_drag(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.state != EditorState::Dragging {
            return;
        }
        if let Some(session) = inner.session.as_mut() {
            session.drag_offset = None;
        }
        inner.state = EditorState::Open;
    }

    /// The field widget reported new form values and errors.
    ///
    /// Values become the pending edit only once the session field's errors are cleared;
    /// each accepted report restarts the debounce.
    pub fn report(&self, values: EntityValues, errors: FieldErrors) {
        let debounce_ms = {
            let mut inner = self.inner.borrow_mut();
            let debounce_ms = inner.debounce_ms;
            let Some(session) = inner.session.as_mut() else {
                return;
            };

            let cleared = errors_cleared(errors.get(&session.field_key));
            session.errors = errors;
            if !cleared {
                log::trace!("auto-submit withheld: {} has errors", session.field_key);
                return;
            }
            session.pending = Some(values);
            debounce_ms
        };

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        self.inner
            .borrow_mut()
            .timer
            .schedule(debounce_ms, move |token| {
                if let Some(inner) = weak.upgrade() {
                    PopupEditor { inner }.on_debounce(token);
                }
            });
    }

    /// Replace the record snapshot, e.g. from a live listener. `None` marks the record as
    /// gone; later commits become no-ops.
    pub fn update_record(&self, record: Option<Entity>) {
        let mut inner = self.inner.borrow_mut();
        if let Some(session) = inner.session.as_mut() {
            session.record = record;
        }
    }

    /// Flush any pending edit, then end the session.
    pub fn close(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.session.is_none() {
                return;
            }
            inner.timer.cancel();
        }

        self.flush_pending();

        let mut inner = self.inner.borrow_mut();
        inner.session = None;
        inner.state = EditorState::Closed;
        log::debug!("popup closed");
    }

    /// The dismiss affordance: close, then tell the caller.
    pub fn dismiss(&self) {
        let on_dismiss = self.inner.borrow().on_dismiss.clone();
        self.close();
        if let Some(on_dismiss) = on_dismiss {
            on_dismiss();
        }
    }

    /// Hook for clicks outside the panel. Visibility belongs to the caller, so this does
    /// nothing.
    pub fn on_outside_click(&self) {
        log::trace!("outside click ignored");
    }

    /// While open, the hosting table should not treat clicks as deselection.
    pub fn prevents_outside_click(&self) -> bool {
        self.is_open()
    }

    fn on_debounce(&self, token: TimerToken) {
        if !self.inner.borrow_mut().timer.take_if_current(token) {
            return;
        }
        self.flush_pending();
    }

    /// Commit the pending value if the record still exists and the value changed.
    /// Returns whether a commit went out.
    fn flush_pending(&self) -> bool {
        let (request, sink, resume) = {
            let mut inner = self.inner.borrow_mut();
            let resume = inner.state;
            let Some(request) = inner.take_commit() else {
                return false;
            };
            inner.state = EditorState::Committing;
            (request, inner.sink.clone(), resume)
        };

        log::debug!("committing {}/{}", request.path, request.id);
        sink.commit(request);

        let mut inner = self.inner.borrow_mut();
        if inner.state == EditorState::Committing {
            inner.state = resume;
        }
        true
    }
}

impl Inner {
    /// Take the pending value as a write request if the record still exists and the value
    /// changed. The record snapshot takes the committed values.
    fn take_commit(&mut self) -> Option<SaveEntityRequest> {
        let session = self.session.as_mut()?;
        let pending = session.pending.take()?;
        let Some(record) = session.record.as_mut() else {
            log::debug!("pending edit dropped: record no longer exists");
            return None;
        };
        if !snapshot_differs(Some(&record.values), &pending) {
            return None;
        }

        record.values = pending.clone();
        Some(SaveEntityRequest {
            path: record.path.clone(),
            id: record.id.clone(),
            values: pending,
            status: EntityStatus::Existing,
        })
    }
}

impl Drop for Inner {
    // Runs before the timer field drops, so a debounced edit is written, not discarded.
    fn drop(&mut self) {
        self.timer.cancel();
        if let Some(request) = self.take_commit() {
            log::debug!("committing {}/{} on drop", request.path, request.id);
            self.sink.commit(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FixedViewport, Horizontal, Vertical};
    use crate::timer::VirtualScheduler;
    use crate::validation::FieldError;
    use serde_json::json;

    struct Harness {
        clock: Rc<VirtualScheduler>,
        viewport: Rc<FixedViewport>,
        commits: Rc<RefCell<Vec<SaveEntityRequest>>>,
        editor: PopupEditor,
    }

    fn values(v: serde_json::Value) -> EntityValues {
        v.as_object().cloned().expect("object")
    }

    fn lamp() -> Entity {
        Entity::new("products", "p1", values(json!({"name": "Lamp", "price": 12})))
    }

    fn harness() -> Harness {
        let clock = Rc::new(VirtualScheduler::new());
        let viewport = Rc::new(FixedViewport::new(Size::new(1000.0, 800.0)));
        let commits = Rc::new(RefCell::new(Vec::new()));
        let c = commits.clone();
        let sink: Rc<dyn CommitSink> = Rc::new(move |req: SaveEntityRequest| c.borrow_mut().push(req));
        let editor = PopupEditor::new(clock.clone(), viewport.clone(), sink);
        Harness {
            clock,
            viewport,
            commits,
            editor,
        }
    }

    fn open_name(h: &Harness) {
        h.editor.open(Some(lamp()), "name", Rect::new(100.0, 200.0, 150.0, 40.0));
        h.editor.measure_panel(Size::new(200.0, 100.0));
    }

    fn entries_error(entries: Vec<Option<&str>>) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.insert(
            "name".into(),
            FieldError::Entries(entries.into_iter().map(|e| e.map(String::from)).collect()),
        );
        errors
    }

    #[test]
    fn open_without_record_is_noop() {
        let h = harness();
        h.editor.open(None, "name", Rect::default());
        assert_eq!(h.editor.state(), EditorState::Closed);
        assert!(!h.editor.prevents_outside_click());
    }

    #[test]
    fn initial_position_uses_roomier_side() {
        let h = harness();
        open_name(&h);

        let placement = h.editor.placement().expect("placed");
        assert_eq!(placement.horizontal, Horizontal::Right);
        assert_eq!(placement.vertical, Vertical::Below);
        let pos = h.editor.position().expect("positioned");
        assert!((0.0..=800.0).contains(&pos.x));
        assert!((0.0..=700.0).contains(&pos.y));
    }

    #[test]
    fn resize_reclamps_and_keeps_placement() {
        let h = harness();
        open_name(&h);
        let before = h.editor.placement();

        h.viewport.resize(Size::new(250.0, 200.0));
        h.editor.handle_resize();

        assert_eq!(h.editor.position(), Some(Point::new(50.0, 100.0)));
        assert_eq!(h.editor.placement(), before);
    }

    #[test]
    fn drag_moves_and_clamps() {
        let h = harness();
        open_name(&h);
        let start = h.editor.position().expect("positioned");

        h.editor.begin_drag(Point::new(start.x + 10.0, start.y + 10.0));
        assert_eq!(h.editor.state(), EditorState::Dragging);

        h.editor.drag_to(Point::new(start.x + 60.0, start.y + 30.0));
        assert_eq!(h.editor.position(), Some(Point::new(start.x + 50.0, start.y + 20.0)));

        h.editor.drag_to(Point::new(5000.0, -400.0));
        assert_eq!(h.editor.position(), Some(Point::new(800.0, 0.0)));

        h.editor.end_drag();
        assert_eq!(h.editor.state(), EditorState::Open);
    }

    #[test]
    fn debounced_commit_uses_latest_value() {
        let h = harness();
        open_name(&h);

        h.editor.report(values(json!({"name": "Lam", "price": 12})), FieldErrors::new());
        h.clock.advance(200);
        h.editor.report(values(json!({"name": "Lamp!", "price": 12})), FieldErrors::new());
        h.clock.advance(299);
        assert!(h.commits.borrow().is_empty());

        h.clock.advance(1);
        let commits = h.commits.borrow();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].values.get("name"), Some(&json!("Lamp!")));
        assert_eq!(commits[0].status, EntityStatus::Existing);
        assert_eq!((commits[0].path.as_str(), commits[0].id.as_str()), ("products", "p1"));
    }

    #[test]
    fn errors_withhold_until_cleared_then_commit_once() {
        let h = harness();
        open_name(&h);

        h.editor.report(values(json!({"name": "", "price": 12})), entries_error(vec![None, Some("too short")]));
        h.clock.advance(1000);
        assert!(h.commits.borrow().is_empty());
        assert!(h.editor.pending_values().is_none());

        h.editor.report(values(json!({"name": "Desk", "price": 12})), entries_error(vec![None, None]));
        h.clock.advance(300);
        h.clock.advance(5000);

        let commits = h.commits.borrow();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].values.get("name"), Some(&json!("Desk")));
    }

    #[test]
    fn errors_on_other_fields_do_not_block() {
        let h = harness();
        open_name(&h);

        let mut errors = FieldErrors::new();
        errors.insert("price".into(), FieldError::Message("bad".into()));
        h.editor.report(values(json!({"name": "Desk", "price": 12})), errors);
        h.clock.advance(300);
        assert_eq!(h.commits.borrow().len(), 1);
        assert!(h.editor.field_errors().contains_key("price"));
    }

    #[test]
    fn empty_message_on_open_field_does_not_block() {
        let h = harness();
        open_name(&h);

        let mut errors = FieldErrors::new();
        errors.insert("name".into(), FieldError::Message(String::new()));
        h.editor.report(values(json!({"name": "Desk", "price": 12})), errors);
        h.clock.advance(300);
        assert_eq!(h.commits.borrow().len(), 1);
    }

    #[test]
    fn deep_equal_values_never_commit() {
        let h = harness();
        open_name(&h);

        h.editor.report(values(json!({"price": 12.0, "name": "Lamp"})), FieldErrors::new());
        h.clock.advance(1000);
        h.editor.close();
        assert!(h.commits.borrow().is_empty());
    }

    #[test]
    fn close_flushes_pending_once_synchronously() {
        let h = harness();
        open_name(&h);

        h.editor.report(values(json!({"name": "Shade", "price": 12})), FieldErrors::new());
        h.editor.close();
        assert_eq!(h.commits.borrow().len(), 1);
        assert_eq!(h.editor.state(), EditorState::Closed);

        h.clock.advance(1000);
        assert_eq!(h.commits.borrow().len(), 1);
        assert_eq!(h.clock.pending_count(), 0);
    }

    #[test]
    fn committed_value_is_not_recommitted() {
        let h = harness();
        open_name(&h);

        let edited = values(json!({"name": "Shade", "price": 12}));
        h.editor.report(edited.clone(), FieldErrors::new());
        h.clock.advance(300);
        h.editor.report(edited, FieldErrors::new());
        h.clock.advance(300);
        h.editor.close();
        assert_eq!(h.commits.borrow().len(), 1);
    }

    #[test]
    fn absent_record_degrades_to_noop() {
        let h = harness();
        open_name(&h);

        h.editor.report(values(json!({"name": "Gone", "price": 12})), FieldErrors::new());
        h.editor.update_record(None);
        h.clock.advance(300);
        h.editor.close();
        assert!(h.commits.borrow().is_empty());
    }

    #[test]
    fn dismiss_flushes_then_notifies_caller() {
        let h = harness();
        open_name(&h);
        let visible = Rc::new(RefCell::new(true));
        let v = visible.clone();
        let commits = h.commits.clone();
        h.editor.set_on_dismiss(move || {
            // The flush already happened when the caller hears about it.
            assert_eq!(commits.borrow().len(), 1);
            *v.borrow_mut() = false;
        });

        h.editor.report(values(json!({"name": "Shade", "price": 12})), FieldErrors::new());
        h.editor.dismiss();
        assert!(!*visible.borrow());
        assert_eq!(h.editor.state(), EditorState::Closed);
    }

    #[test]
    fn set_open_reopens_last_target() {
        let h = harness();
        open_name(&h);
        h.editor.set_open(false);
        assert!(!h.editor.is_open());

        h.editor.set_open(true);
        assert_eq!(h.editor.state(), EditorState::Open);
        assert_eq!(h.editor.field_key().as_deref(), Some("name"));
        // Fresh session: position waits for a new measurement.
        assert!(h.editor.position().is_none());
    }

    #[test]
    fn reopening_flushes_previous_session() {
        let h = harness();
        open_name(&h);
        h.editor.report(values(json!({"name": "Shade", "price": 12})), FieldErrors::new());

        h.editor.open(Some(lamp()), "price", Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(h.commits.borrow().len(), 1);
        assert_eq!(h.editor.field_key().as_deref(), Some("price"));
    }

    #[test]
    fn dropping_last_handle_commits_pending_edit() {
        let h = harness();
        open_name(&h);
        h.editor.report(values(json!({"name": "Shade", "price": 12})), FieldErrors::new());

        let Harness { clock, commits, editor, .. } = h;
        drop(editor);
        assert_eq!(commits.borrow().len(), 1);
        assert_eq!(commits.borrow()[0].values.get("name"), Some(&json!("Shade")));

        clock.advance(1000);
        assert_eq!(commits.borrow().len(), 1);
        assert_eq!(clock.pending_count(), 0);
    }

    #[test]
    fn dropping_after_close_commits_nothing_more() {
        let h = harness();
        open_name(&h);
        h.editor.report(values(json!({"name": "Shade", "price": 12})), FieldErrors::new());
        h.editor.close();

        let Harness { commits, editor, .. } = h;
        drop(editor);
        assert_eq!(commits.borrow().len(), 1);
    }

    #[test]
    fn outside_click_keeps_editor_open() {
        let h = harness();
        open_name(&h);
        assert!(h.editor.prevents_outside_click());
        h.editor.on_outside_click();
        assert!(h.editor.is_open());
    }

    #[test]
    fn sink_observes_committing_state() {
        let clock = Rc::new(VirtualScheduler::new());
        let viewport = Rc::new(FixedViewport::new(Size::new(1000.0, 800.0)));
        let slot: Rc<RefCell<Option<PopupEditor>>> = Rc::new(RefCell::new(None));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (s, seen2) = (slot.clone(), seen.clone());
        let sink: Rc<dyn CommitSink> = Rc::new(move |_req: SaveEntityRequest| {
            if let Some(editor) = s.borrow().as_ref() {
                seen2.borrow_mut().push(editor.state());
            }
        });
        let editor = PopupEditor::new(clock.clone(), viewport, sink).with_debounce_ms(50);
        *slot.borrow_mut() = Some(editor.clone());

        editor.open(Some(lamp()), "name", Rect::new(0.0, 0.0, 10.0, 10.0));
        editor.report(values(json!({"name": "Shade", "price": 12})), FieldErrors::new());
        clock.advance(50);

        assert_eq!(*seen.borrow(), vec![EditorState::Committing]);
        assert_eq!(editor.state(), EditorState::Open);
        slot.borrow_mut().take();
    }
}
