//! Screen-space math for the floating editor.

mod viewport;

pub use viewport::{BrowserViewport, FixedViewport, ViewportProvider};

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in viewport coordinates (a `DOMRect` in the browser).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vertical {
    Above,
    Below,
}

/// Side of the anchor cell the panel was opened on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub horizontal: Horizontal,
    pub vertical: Vertical,
}

/// Pick the side of `cell` with more room and the unclamped anchor point for it.
pub fn initial_anchor(cell: Rect, viewport: Size) -> (Point, Placement) {
    let horizontal = if cell.left() < viewport.width - cell.right() {
        Horizontal::Right
    } else {
        Horizontal::Left
    };
    let vertical = if cell.top() < viewport.height - cell.bottom() {
        Vertical::Below
    } else {
        Vertical::Above
    };

    let x = match horizontal {
        Horizontal::Right => cell.x + cell.width / 2.0,
        Horizontal::Left => cell.x - cell.width / 2.0,
    };
    let y = match vertical {
        Vertical::Below => cell.y + cell.height / 2.0,
        Vertical::Above => cell.y - cell.height / 2.0,
    };

    (Point::new(x, y), Placement { horizontal, vertical })
}

/// Clamp `point` so a panel of size `panel` placed there stays inside the viewport.
///
/// When the panel is larger than the viewport the origin wins (`0`).
pub fn clamp_position(point: Point, panel: Size, viewport: Size) -> Point {
    Point::new(
        point.x.min(viewport.width - panel.width).max(0.0),
        point.y.min(viewport.height - panel.height).max(0.0),
    )
}

/// Initial popup position: side selection followed by clamping.
pub fn initial_position(cell: Rect, panel: Size, viewport: Size) -> (Point, Placement) {
    let (anchor, placement) = initial_anchor(cell, viewport);
    (clamp_position(anchor, panel, viewport), placement)
}
