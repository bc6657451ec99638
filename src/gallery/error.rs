use thiserror::Error;

use crate::layout::ViewportMode;
use crate::models::PhotoId;

/// Configuration defects in the photo catalog or its layout tables.
///
/// These are authoring mistakes, not runtime faults: the board refuses to lay
/// out a mode rather than drawing a photo at a made-up position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("photo {id} has no entry in the {mode} layout table")]
    MissingEntry { mode: ViewportMode, id: PhotoId },

    #[error("photo {0} is listed more than once")]
    DuplicateId(PhotoId),

    #[error("photo catalog is empty")]
    EmptyCatalog,
}
