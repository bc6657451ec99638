use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gallery::LayoutError;
use crate::models::{Catalog, PhotoId};

/// Viewports at or below this width (in layout units) use the mobile board.
pub const MOBILE_BREAKPOINT: u32 = 768;

/// Coarse screen classification driving which photos and table apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportMode {
    Desktop,
    Mobile,
}

impl ViewportMode {
    pub fn from_width(width: f64, breakpoint: u32) -> Self {
        if width <= f64::from(breakpoint) {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for ViewportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authored placement of one photo.
///
/// `x`/`y` are percentages of the board's width/height and locate the card's
/// centre; `rotation` is in degrees; `width`/`height` are the photo size in
/// layout units (the caption strip is added on top of `height`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
    pub width: u32,
    pub height: u32,
}

impl Position {
    pub const fn new(x: i32, y: i32, rotation: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            rotation,
            width,
            height,
        }
    }
}

/// Per-mode mapping from photo id to its authored position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutTable {
    entries: BTreeMap<PhotoId, Position>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous entry when `id` was already present.
    pub fn insert(&mut self, id: PhotoId, position: Position) -> Option<Position> {
        self.entries.insert(id, position)
    }

    pub fn get(&self, id: PhotoId) -> Option<&Position> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(u32, Position)> for LayoutTable {
    fn from_iter<I: IntoIterator<Item = (u32, Position)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(id, position)| (PhotoId(id), position))
                .collect(),
        }
    }
}

/// The desktop and mobile tables injected into the gallery engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTables {
    pub desktop: LayoutTable,
    pub mobile: LayoutTable,
}

impl LayoutTables {
    pub fn new(desktop: LayoutTable, mobile: LayoutTable) -> Self {
        Self { desktop, mobile }
    }

    pub fn for_mode(&self, mode: ViewportMode) -> &LayoutTable {
        match mode {
            ViewportMode::Desktop => &self.desktop,
            ViewportMode::Mobile => &self.mobile,
        }
    }

    /// Checks that every photo visible in a mode has an entry in that mode's table.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), LayoutError> {
        for mode in [ViewportMode::Desktop, ViewportMode::Mobile] {
            let table = self.for_mode(mode);
            if let Some(entry) = catalog.visible_in(mode).find(|e| table.get(e.id).is_none()) {
                return Err(LayoutError::MissingEntry { mode, id: entry.id });
            }
        }
        Ok(())
    }
}

impl Default for LayoutTables {
    fn default() -> Self {
        let desktop = [
            (1, Position::new(9, 13, -8, 240, 180)),
            (2, Position::new(35, 16, 5, 230, 175)),
            (3, Position::new(62, 12, -3, 235, 180)),
            (4, Position::new(88, 13, 7, 225, 170)),
            (8, Position::new(11, 87, 6, 235, 180)),
            (9, Position::new(36, 86, -5, 230, 175)),
            (10, Position::new(65, 85, 4, 250, 185)),
            (11, Position::new(92, 79, -6, 225, 175)),
        ];
        let mobile = [
            (2, Position::new(79, 104, 5, 140, 110)),
            (3, Position::new(23, 20, -3, 140, 110)),
            (4, Position::new(74, 6, 7, 140, 110)),
            (9, Position::new(26, 117, -5, 140, 110)),
            (10, Position::new(24, 69, 4, 140, 110)),
            (11, Position::new(82, 50, -6, 140, 110)),
        ];
        Self {
            desktop: desktop.into_iter().collect(),
            mobile: mobile.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogEntry;

    #[test]
    fn breakpoint_width_is_mobile() {
        assert_eq!(ViewportMode::from_width(768.0, MOBILE_BREAKPOINT), ViewportMode::Mobile);
        assert_eq!(ViewportMode::from_width(320.0, MOBILE_BREAKPOINT), ViewportMode::Mobile);
        assert_eq!(ViewportMode::from_width(768.5, MOBILE_BREAKPOINT), ViewportMode::Desktop);
        assert_eq!(ViewportMode::from_width(1440.0, MOBILE_BREAKPOINT), ViewportMode::Desktop);
    }

    #[test]
    fn builtin_tables_have_expected_sizes() {
        let tables = LayoutTables::default();
        assert_eq!(tables.desktop.len(), 8);
        assert_eq!(tables.mobile.len(), 6);
        assert_eq!(
            tables.mobile.get(PhotoId(2)),
            Some(&Position::new(79, 104, 5, 140, 110))
        );
        assert!(tables.mobile.get(PhotoId(1)).is_none());
    }

    #[test]
    fn builtin_tables_cover_builtin_catalog() {
        assert_eq!(LayoutTables::default().validate(&Catalog::builtin()), Ok(()));
    }

    #[test]
    fn validate_reports_first_missing_entry_with_mode() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new(1, "1.webp", "one").desktop_only(),
            CatalogEntry::new(5, "5.webp", "five"),
        ])
        .unwrap();
        let desktop: LayoutTable = [
            (1, Position::new(10, 10, 0, 100, 80)),
            (5, Position::new(50, 50, 0, 100, 80)),
        ]
        .into_iter()
        .collect();
        let tables = LayoutTables::new(desktop, LayoutTable::new());

        assert_eq!(
            tables.validate(&catalog),
            Err(LayoutError::MissingEntry {
                mode: ViewportMode::Mobile,
                id: PhotoId(5),
            })
        );
    }

    #[test]
    fn insert_returns_replaced_entry() {
        let mut table = LayoutTable::new();
        assert!(table.insert(PhotoId(7), Position::new(1, 2, 3, 4, 5)).is_none());
        let previous = table.insert(PhotoId(7), Position::new(9, 9, 9, 9, 9));
        assert_eq!(previous, Some(Position::new(1, 2, 3, 4, 5)));
        assert_eq!(table.len(), 1);
    }
}
