use super::Size;
use std::cell::Cell;

/// Supplies the current viewport dimensions. The editor knows nothing else about layout.
pub trait ViewportProvider {
    fn size(&self) -> Size;
}

/// Reads `window.innerWidth` / `window.innerHeight`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserViewport;

impl ViewportProvider for BrowserViewport {
    fn size(&self) -> Size {
        let Some(win) = web_sys::window() else {
            return Size::default();
        };
        let width = win
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or_default();
        let height = win
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or_default();
        Size::new(width, height)
    }
}

/// A viewport whose size is set by hand.
#[derive(Debug, Default)]
pub struct FixedViewport {
    size: Cell<Size>,
}

impl FixedViewport {
    pub fn new(size: Size) -> Self {
        Self {
            size: Cell::new(size),
        }
    }

    pub fn resize(&self, size: Size) {
        self.size.set(size);
    }
}

impl ViewportProvider for FixedViewport {
    fn size(&self) -> Size {
        self.size.get()
    }
}
