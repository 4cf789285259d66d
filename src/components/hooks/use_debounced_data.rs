use crate::stabilizer::SequenceStabilizer;
use crate::timer::BrowserScheduler;
use leptos::prelude::*;
use std::rc::Rc;

/// Stabilized view of a live collection signal.
///
/// Growth shows up right away; a shrink only shows up once it has held for `window_ms`.
/// The stabilizer is disposed with the owning component, flushing a pending shrink.
pub fn use_debounced_data<T>(raw: Signal<Vec<T>>, window_ms: Signal<u32>) -> ReadSignal<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let initial = raw.get_untracked();
    let stabilized = RwSignal::new(initial.clone());

    let stabilizer = SequenceStabilizer::new(initial, window_ms.get_untracked(), Rc::new(BrowserScheduler));
    stabilizer.subscribe(move |items: &[T]| {
        // The timer can outlive the owner by a tick.
        let _ = stabilized.try_set(items.to_vec());
    });
    let handle = StoredValue::new_local(stabilizer);

    Effect::new(move |_| {
        let items = raw.get();
        handle.with_value(|s| s.update(items));
    });

    Effect::new(move |_| {
        let ms = window_ms.get();
        handle.with_value(|s| {
            if s.window_ms() != ms {
                s.set_window_ms(ms);
            }
        });
    });

    on_cleanup(move || {
        let _ = handle.try_with_value(|s| s.dispose());
    });

    stabilized.read_only()
}
