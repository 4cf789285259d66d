use super::{Scheduler, TimeoutId};
use wasm_bindgen::JsCast;

/// `window.setTimeout` backed scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimeoutId {
        let Some(win) = web_sys::window() else {
            log::warn!("no window; timeout of {delay_ms}ms dropped");
            return TimeoutId(0);
        };

        let cb = wasm_bindgen::closure::Closure::once_into_js(move || callback());
        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                i32::try_from(delay_ms).unwrap_or(i32::MAX),
            )
            .unwrap_or(0);

        TimeoutId(i64::from(tid))
    }

    fn clear_timeout(&self, id: TimeoutId) {
        let Ok(handle) = i32::try_from(id.0) else {
            return;
        };
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(handle);
        }
    }

    fn now_ms(&self) -> i64 {
        crate::util::now_ms()
    }
}
