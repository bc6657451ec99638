use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::layout::{Position, ViewportMode};

/// Stable identifier of a pinned photo, unique across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub u32);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static description of a photo before any layout is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: PhotoId,
    pub src: PathBuf,
    pub caption: String,
    /// Desktop-only photos are dropped from the mobile board.
    pub desktop_only: bool,
}

impl CatalogEntry {
    pub fn new(id: u32, src: impl Into<PathBuf>, caption: impl Into<String>) -> Self {
        Self {
            id: PhotoId(id),
            src: src.into(),
            caption: caption.into(),
            desktop_only: false,
        }
    }

    pub fn desktop_only(mut self) -> Self {
        self.desktop_only = true;
        self
    }

    pub fn visible_in(&self, mode: ViewportMode) -> bool {
        match mode {
            ViewportMode::Desktop => true,
            ViewportMode::Mobile => !self.desktop_only,
        }
    }
}

/// A photo placed on the board for the current viewport mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoItem {
    pub id: PhotoId,
    pub src: PathBuf,
    pub caption: String,
    pub desktop_only: bool,
    /// Authored position from the layout table of the active mode.
    pub position: Position,
    pub z_index: u32,
    /// Where a drag left the photo, in whole percentages. Session only.
    pub moved_to: Option<(i32, i32)>,
}

impl PhotoItem {
    pub fn placed(entry: &CatalogEntry, position: Position, z_index: u32) -> Self {
        Self {
            id: entry.id,
            src: entry.src.clone(),
            caption: entry.caption.clone(),
            desktop_only: entry.desktop_only,
            position,
            z_index,
            moved_to: None,
        }
    }

    /// Position the board should draw: the authored one, shifted by any drag.
    pub fn displayed_position(&self) -> Position {
        match self.moved_to {
            Some((x, y)) => Position { x, y, ..self.position },
            None => self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_only_entries_are_hidden_on_mobile() {
        let entry = CatalogEntry::new(1, "activity/1.webp", "Visit").desktop_only();
        assert!(entry.visible_in(ViewportMode::Desktop));
        assert!(!entry.visible_in(ViewportMode::Mobile));

        let shared = CatalogEntry::new(2, "activity/2.webp", "Expo");
        assert!(shared.visible_in(ViewportMode::Mobile));
    }

    #[test]
    fn displayed_position_follows_drag_but_keeps_rotation_and_size() {
        let entry = CatalogEntry::new(3, "activity/3.webp", "Lab");
        let mut item = PhotoItem::placed(&entry, Position::new(62, 12, -3, 235, 180), 3);
        assert_eq!(item.displayed_position(), item.position);

        item.moved_to = Some((40, 55));
        let shown = item.displayed_position();
        assert_eq!((shown.x, shown.y), (40, 55));
        assert_eq!(shown.rotation, -3);
        assert_eq!((shown.width, shown.height), (235, 180));
        assert_eq!(item.position.x, 62);
    }
}
