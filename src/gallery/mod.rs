//! Photo board core: layout per viewport mode, stacking order, the entrance
//! latch and pointer sessions. Nothing here touches GTK.

pub mod drag;
pub mod engine;
pub mod error;
pub mod visibility;

pub use drag::{ContainerSize, DragDelta, PointerOutcome, PointerSession};
pub use engine::{EntrancePhase, GalleryEngine, RenderItem};
pub use error::LayoutError;
pub use visibility::{visible_fraction, VisibilityWatch};
