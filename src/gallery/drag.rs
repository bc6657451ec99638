//! Pointer session tracking for photo cards.
//!
//! A press on a card opens a session. The session becomes a drag once the
//! pointer travels past [`DRAG_THRESHOLD_PX`]; releasing without ever crossing
//! it counts as a click. One pointer means at most one session at a time.

use crate::layout::Position;
use crate::models::PhotoId;

/// Pointer travel (in pixels) before a press turns into a drag.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// Pixel displacement accumulated since the press.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragDelta {
    pub dx: f64,
    pub dy: f64,
}

impl DragDelta {
    pub const ZERO: DragDelta = DragDelta { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn distance(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

/// Size of the board the photo percentages refer to, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// State of the single pointer over the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerSession {
    #[default]
    Idle,
    Pressed(PhotoId),
    Dragging(PhotoId),
}

impl PointerSession {
    #[cfg(test)]
    pub fn photo(&self) -> Option<PhotoId> {
        match self {
            Self::Idle => None,
            Self::Pressed(id) | Self::Dragging(id) => Some(*id),
        }
    }

    pub fn is_dragging(&self, id: PhotoId) -> bool {
        *self == Self::Dragging(id)
    }
}

/// What a pointer release resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Press and release without travel: open the photo.
    Click(PhotoId),
    /// A drag finished and left the photo at `position`.
    Dropped { id: PhotoId, position: Position },
    /// Nothing to do (no session, or the photo vanished mid-drag).
    Ignored,
}

/// Shifts `base` by a pixel delta expressed against `container`, rounding to
/// whole percentages.
pub fn displaced(base: (i32, i32), delta: DragDelta, container: ContainerSize) -> (i32, i32) {
    if !container.is_usable() {
        return base;
    }
    let dx_pct = delta.dx / container.width * 100.0;
    let dy_pct = delta.dy / container.height * 100.0;
    (
        (f64::from(base.0) + dx_pct).round() as i32,
        (f64::from(base.1) + dy_pct).round() as i32,
    )
}
