use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use super::drag::{
    displaced, ContainerSize, DragDelta, PointerOutcome, PointerSession, DRAG_THRESHOLD_PX,
};
use super::LayoutError;
use crate::layout::{LayoutTables, Position, ViewportMode};
use crate::models::{Catalog, PhotoId, PhotoItem};

/// Starting value of the stacking counter; kept above the photo count.
pub const INITIAL_HIGHEST_Z: u32 = 12;

/// Entrance latch state shared by every card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrancePhase {
    /// Cards sit in a centred pile.
    Stacked,
    /// Cards have been thrown to their layout positions. Never reverts.
    Scattered,
}

/// Everything the presentation layer needs to draw one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderItem {
    pub id: PhotoId,
    /// Position in `photos`, used to stagger the entrance.
    pub index: usize,
    pub src: PathBuf,
    pub caption: String,
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
    pub width: u32,
    pub height: u32,
    pub z_index: u32,
    pub is_selected: bool,
    pub is_dragging: bool,
}

/// Layout, stacking and interaction state of the photo board.
///
/// Single-threaded by construction: every method runs on the UI thread in
/// response to one input event.
#[derive(Debug)]
pub struct GalleryEngine {
    catalog: Catalog,
    tables: LayoutTables,
    mode: Option<ViewportMode>,
    photos: Vec<PhotoItem>,
    highest_z: u32,
    entrance: EntrancePhase,
    selected: Option<PhotoItem>,
    pointer: PointerSession,
    // Displayed position of each photo when its drag began.
    drag_origins: HashMap<PhotoId, (i32, i32)>,
}

impl GalleryEngine {
    /// Creates an engine with no mode applied yet; call
    /// [`set_viewport_mode`](Self::set_viewport_mode) before drawing.
    pub fn new(catalog: Catalog, tables: LayoutTables) -> Self {
        let floor = u32::try_from(catalog.len()).unwrap_or(u32::MAX).saturating_add(1);
        Self {
            catalog,
            tables,
            mode: None,
            photos: Vec::new(),
            highest_z: INITIAL_HIGHEST_Z.max(floor),
            entrance: EntrancePhase::Stacked,
            selected: None,
            pointer: PointerSession::Idle,
            drag_origins: HashMap::new(),
        }
    }

    /// Rebuilds the photo set for `mode`.
    ///
    /// Returns `Ok(false)` when `mode` is already active, leaving stacking and
    /// drag positions alone. On a missing layout entry nothing changes.
    pub fn set_viewport_mode(&mut self, mode: ViewportMode) -> Result<bool, LayoutError> {
        if self.mode == Some(mode) {
            return Ok(false);
        }

        let table = self.tables.for_mode(mode);
        let photos = self
            .catalog
            .visible_in(mode)
            .enumerate()
            .map(|(index, entry)| -> Result<PhotoItem, LayoutError> {
                let position = table
                    .get(entry.id)
                    .copied()
                    .ok_or(LayoutError::MissingEntry { mode, id: entry.id })?;
                let z_index = u32::try_from(index + 1).unwrap_or(u32::MAX);
                Ok(PhotoItem::placed(entry, position, z_index))
            })
            .collect::<Result<Vec<_>, LayoutError>>()?;

        debug!(%mode, photos = photos.len(), "Rebuilt photo board");
        self.photos = photos;
        self.mode = Some(mode);
        self.drag_origins.clear();
        Ok(true)
    }

    /// Fires the entrance latch. Returns true only for the call that flipped it.
    pub fn trigger_entrance_once(&mut self) -> bool {
        if self.entrance == EntrancePhase::Scattered {
            return false;
        }
        self.entrance = EntrancePhase::Scattered;
        debug!("Entrance latch fired");
        true
    }

    /// Raises `id` above every other photo and returns its new z-index.
    ///
    /// Unknown ids are ignored: a drag can race a mode switch that removed the photo.
    pub fn bring_to_front(&mut self, id: PhotoId) -> Option<u32> {
        let Some(photo) = self.photos.iter_mut().find(|photo| photo.id == id) else {
            trace!(%id, "bring_to_front on a photo that is not on the board");
            return None;
        };
        self.highest_z += 1;
        photo.z_index = self.highest_z;
        Some(self.highest_z)
    }

    /// Starts dragging `id`: snapshots its displayed position and raises it.
    pub fn begin_drag(&mut self, id: PhotoId) -> bool {
        let Some(origin) = self
            .photo(id)
            .map(|photo| photo.displayed_position())
            .map(|position| (position.x, position.y))
        else {
            trace!(%id, "begin_drag on a photo that is not on the board");
            return false;
        };
        self.drag_origins.insert(id, origin);
        self.bring_to_front(id);
        true
    }

    /// Ends a drag of `id` and returns where the photo now sits.
    ///
    /// The pixel delta is taken against the container size at release time.
    /// The result only lives until the next mode rebuild.
    pub fn end_drag(
        &mut self,
        id: PhotoId,
        delta: DragDelta,
        container: ContainerSize,
    ) -> Option<Position> {
        let origin = self.drag_origins.remove(&id);
        let Some(photo) = self.photos.iter_mut().find(|photo| photo.id == id) else {
            trace!(%id, "end_drag on a photo that is not on the board");
            return None;
        };
        let base = origin.unwrap_or_else(|| {
            let shown = photo.displayed_position();
            (shown.x, shown.y)
        });
        let moved_to = displaced(base, delta, container);
        photo.moved_to = Some(moved_to);
        Some(photo.displayed_position())
    }

    /// Opens `id` in the full view, or clears the selection with `None`.
    ///
    /// Returns the selected photo. Unknown ids leave the selection unchanged.
    pub fn select_photo(&mut self, id: Option<PhotoId>) -> Option<&PhotoItem> {
        match id {
            None => self.selected = None,
            Some(id) => match self.photos.iter().find(|photo| photo.id == id) {
                Some(photo) => self.selected = Some(photo.clone()),
                None => trace!(%id, "select_photo on a photo that is not on the board"),
            },
        }
        self.selected.as_ref()
    }

    /// Pointer went down on `id`. Ignored while another session is open.
    pub fn pointer_pressed(&mut self, id: PhotoId) -> bool {
        if self.pointer != PointerSession::Idle || self.photo(id).is_none() {
            return false;
        }
        self.pointer = PointerSession::Pressed(id);
        true
    }

    /// Pointer moved by `delta` since the press.
    ///
    /// Returns true when this motion turned the press into a drag.
    pub fn pointer_moved(&mut self, delta: DragDelta) -> bool {
        match self.pointer {
            PointerSession::Pressed(id) if delta.distance() >= DRAG_THRESHOLD_PX => {
                if self.begin_drag(id) {
                    self.pointer = PointerSession::Dragging(id);
                    true
                } else {
                    self.pointer = PointerSession::Idle;
                    false
                }
            }
            _ => false,
        }
    }

    /// Pointer went up: a drag drops the photo, an untravelled press selects it.
    pub fn pointer_released(&mut self, delta: DragDelta, container: ContainerSize) -> PointerOutcome {
        match std::mem::take(&mut self.pointer) {
            PointerSession::Idle => PointerOutcome::Ignored,
            PointerSession::Pressed(id) => {
                if self.select_photo(Some(id)).is_some_and(|photo| photo.id == id) {
                    PointerOutcome::Click(id)
                } else {
                    PointerOutcome::Ignored
                }
            }
            PointerSession::Dragging(id) => match self.end_drag(id, delta, container) {
                Some(position) => PointerOutcome::Dropped { id, position },
                None => PointerOutcome::Ignored,
            },
        }
    }

    pub fn pointer(&self) -> PointerSession {
        self.pointer
    }

    pub fn mode(&self) -> Option<ViewportMode> {
        self.mode
    }

    pub fn photos(&self) -> &[PhotoItem] {
        &self.photos
    }

    pub fn photo(&self, id: PhotoId) -> Option<&PhotoItem> {
        self.photos.iter().find(|photo| photo.id == id)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[cfg(test)]
    pub fn highest_z(&self) -> u32 {
        self.highest_z
    }

    pub fn has_animated(&self) -> bool {
        self.entrance == EntrancePhase::Scattered
    }

    pub fn entrance(&self) -> EntrancePhase {
        self.entrance
    }

    pub fn selected(&self) -> Option<&PhotoItem> {
        self.selected.as_ref()
    }

    /// Snapshot of the board for drawing, in `photos` order.
    pub fn render_items(&self) -> Vec<RenderItem> {
        let selected = self.selected.as_ref().map(|photo| photo.id);
        self.photos
            .iter()
            .enumerate()
            .map(|(index, photo)| {
                let shown = photo.displayed_position();
                RenderItem {
                    id: photo.id,
                    index,
                    src: photo.src.clone(),
                    caption: photo.caption.clone(),
                    x: shown.x,
                    y: shown.y,
                    rotation: shown.rotation,
                    width: shown.width,
                    height: shown.height,
                    z_index: photo.z_index,
                    is_selected: selected == Some(photo.id),
                    is_dragging: self.pointer.is_dragging(photo.id),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutTable;
    use crate::models::CatalogEntry;

    fn builtin_engine() -> GalleryEngine {
        GalleryEngine::new(Catalog::builtin(), LayoutTables::default())
    }

    fn desktop_engine() -> GalleryEngine {
        let mut engine = builtin_engine();
        engine.set_viewport_mode(ViewportMode::Desktop).unwrap();
        engine
    }

    fn ids(engine: &GalleryEngine) -> Vec<u32> {
        engine.photos().iter().map(|photo| photo.id.0).collect()
    }

    fn z_of(engine: &GalleryEngine, id: u32) -> u32 {
        engine.photo(PhotoId(id)).unwrap().z_index
    }

    #[test]
    fn desktop_mode_lays_out_all_eight_photos() {
        let engine = desktop_engine();
        assert_eq!(ids(&engine), vec![1, 2, 3, 4, 8, 9, 10, 11]);

        let first = engine.photo(PhotoId(1)).unwrap();
        assert_eq!((first.position.x, first.position.y, first.position.rotation), (9, 13, -8));
        let zs: Vec<u32> = engine.photos().iter().map(|photo| photo.z_index).collect();
        assert_eq!(zs, (1..=8).collect::<Vec<u32>>());
    }

    #[test]
    fn mobile_mode_uses_subset_and_mobile_table() {
        let mut engine = desktop_engine();
        assert!(engine.set_viewport_mode(ViewportMode::Mobile).unwrap());

        assert_eq!(ids(&engine), vec![2, 3, 4, 9, 10, 11]);
        assert!(engine.photo(PhotoId(1)).is_none());
        let second = engine.photo(PhotoId(2)).unwrap();
        assert_eq!((second.position.x, second.position.y, second.position.rotation), (79, 104, 5));
        assert_eq!((second.position.width, second.position.height), (140, 110));
    }

    #[test]
    fn same_mode_twice_keeps_stacking() {
        let mut engine = desktop_engine();
        engine.bring_to_front(PhotoId(4));
        let before = engine.photos().to_vec();

        assert!(!engine.set_viewport_mode(ViewportMode::Desktop).unwrap());
        assert_eq!(engine.photos(), before.as_slice());
    }

    #[test]
    fn missing_layout_entry_aborts_rebuild() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new(1, "1.webp", "one"),
            CatalogEntry::new(2, "2.webp", "two"),
        ])
        .unwrap();
        let desktop: LayoutTable = [
            (1, Position::new(10, 10, 0, 100, 80)),
            (2, Position::new(60, 40, 3, 100, 80)),
        ]
        .into_iter()
        .collect();
        let mobile: LayoutTable = [(1, Position::new(20, 20, 0, 50, 40))].into_iter().collect();
        let mut engine = GalleryEngine::new(catalog, LayoutTables::new(desktop, mobile));
        engine.set_viewport_mode(ViewportMode::Desktop).unwrap();

        let err = engine.set_viewport_mode(ViewportMode::Mobile).unwrap_err();
        assert_eq!(
            err,
            LayoutError::MissingEntry {
                mode: ViewportMode::Mobile,
                id: PhotoId(2),
            }
        );
        assert_eq!(engine.mode(), Some(ViewportMode::Desktop));
        assert_eq!(ids(&engine), vec![1, 2]);
    }

    #[test]
    fn bring_to_front_order_follows_call_order() {
        let mut engine = desktop_engine();
        let calls = [3, 9, 3, 1, 11, 9];
        for id in calls {
            engine.bring_to_front(PhotoId(id));
            let top = engine.photos().iter().map(|photo| photo.z_index).max().unwrap();
            assert_eq!(z_of(&engine, id), top);
        }

        // Last call wins; earlier distinct ids keep their relative order.
        assert!(z_of(&engine, 9) > z_of(&engine, 11));
        assert!(z_of(&engine, 11) > z_of(&engine, 1));
        assert!(z_of(&engine, 1) > z_of(&engine, 3));
        assert!(z_of(&engine, 3) > z_of(&engine, 10));
    }

    #[test]
    fn stacking_counter_is_monotonic_and_survives_rebuilds() {
        let mut engine = desktop_engine();
        assert_eq!(engine.highest_z(), INITIAL_HIGHEST_Z);
        assert_eq!(engine.bring_to_front(PhotoId(2)), Some(13));
        assert_eq!(engine.bring_to_front(PhotoId(2)), Some(14));

        engine.set_viewport_mode(ViewportMode::Mobile).unwrap();
        assert_eq!(engine.bring_to_front(PhotoId(3)), Some(15));
    }

    #[test]
    fn bring_to_front_on_vanished_photo_is_a_noop() {
        let mut engine = builtin_engine();
        engine.set_viewport_mode(ViewportMode::Mobile).unwrap();
        let before = engine.photos().to_vec();

        assert_eq!(engine.bring_to_front(PhotoId(1)), None);
        assert_eq!(engine.highest_z(), INITIAL_HIGHEST_Z);
        assert_eq!(engine.photos(), before.as_slice());
    }

    #[test]
    fn highest_z_starts_above_large_catalogs() {
        let entries = (1..=20).map(|id| CatalogEntry::new(id, "p.webp", "p")).collect();
        let engine = GalleryEngine::new(Catalog::new(entries).unwrap(), LayoutTables::default());
        assert_eq!(engine.highest_z(), 21);
    }

    #[test]
    fn entrance_latch_fires_once() {
        let mut engine = desktop_engine();
        assert!(!engine.has_animated());
        assert!(engine.trigger_entrance_once());
        assert!(!engine.trigger_entrance_once());
        assert!(engine.has_animated());

        engine.set_viewport_mode(ViewportMode::Mobile).unwrap();
        assert_eq!(engine.entrance(), EntrancePhase::Scattered);
    }

    #[test]
    fn select_then_clear() {
        let mut engine = desktop_engine();
        engine.bring_to_front(PhotoId(3));
        let fourth = engine.photos()[3].id;

        let selected = engine.select_photo(Some(fourth)).map(|photo| photo.id);
        assert_eq!(selected, Some(PhotoId(4)));
        assert!(engine.render_items()[3].is_selected);

        assert!(engine.select_photo(None).is_none());
        assert!(engine.selected().is_none());
    }

    #[test]
    fn selecting_unknown_photo_keeps_selection() {
        let mut engine = desktop_engine();
        engine.select_photo(Some(PhotoId(2)));
        let kept = engine.select_photo(Some(PhotoId(99))).map(|photo| photo.id);
        assert_eq!(kept, Some(PhotoId(2)));
    }

    #[test]
    fn begin_drag_raises_without_moving() {
        let mut engine = desktop_engine();
        assert!(engine.begin_drag(PhotoId(8)));
        let photo = engine.photo(PhotoId(8)).unwrap();
        assert_eq!(photo.z_index, INITIAL_HIGHEST_Z + 1);
        assert_eq!(photo.moved_to, None);
    }

    #[test]
    fn end_drag_with_zero_delta_keeps_position() {
        let mut engine = desktop_engine();
        engine.begin_drag(PhotoId(2));
        let dropped = engine
            .end_drag(PhotoId(2), DragDelta::ZERO, ContainerSize::new(1200.0, 640.0))
            .unwrap();
        assert_eq!((dropped.x, dropped.y), (35, 16));
    }

    #[test]
    fn consecutive_drags_accumulate_from_displayed_position() {
        let mut engine = desktop_engine();
        let size = ContainerSize::new(1000.0, 500.0);

        engine.begin_drag(PhotoId(1));
        let first = engine.end_drag(PhotoId(1), DragDelta::new(100.0, 50.0), size).unwrap();
        assert_eq!((first.x, first.y), (19, 23));

        engine.begin_drag(PhotoId(1));
        let second = engine.end_drag(PhotoId(1), DragDelta::new(-50.0, 0.0), size).unwrap();
        assert_eq!((second.x, second.y), (14, 23));
        assert_eq!(second.rotation, -8);

        // Authored table value is untouched.
        assert_eq!(engine.photo(PhotoId(1)).unwrap().position.x, 9);
    }

    #[test]
    fn mode_change_discards_dragged_positions() {
        let mut engine = desktop_engine();
        engine.begin_drag(PhotoId(3));
        engine.end_drag(PhotoId(3), DragDelta::new(300.0, 0.0), ContainerSize::new(1000.0, 500.0));

        engine.set_viewport_mode(ViewportMode::Mobile).unwrap();
        engine.set_viewport_mode(ViewportMode::Desktop).unwrap();
        assert_eq!(engine.photo(PhotoId(3)).unwrap().displayed_position().x, 62);
    }

    #[test]
    fn drag_across_mode_change_uses_new_base() {
        let mut engine = desktop_engine();
        engine.begin_drag(PhotoId(2));
        engine.set_viewport_mode(ViewportMode::Mobile).unwrap();

        let dropped = engine
            .end_drag(PhotoId(2), DragDelta::new(40.0, 0.0), ContainerSize::new(400.0, 600.0))
            .unwrap();
        assert_eq!((dropped.x, dropped.y), (89, 104));
    }

    #[test]
    fn drag_of_removed_photo_is_ignored() {
        let mut engine = desktop_engine();
        assert!(engine.pointer_pressed(PhotoId(1)));
        assert!(engine.pointer_moved(DragDelta::new(10.0, 0.0)));
        engine.set_viewport_mode(ViewportMode::Mobile).unwrap();

        let outcome = engine.pointer_released(DragDelta::new(30.0, 0.0), ContainerSize::new(400.0, 600.0));
        assert_eq!(outcome, PointerOutcome::Ignored);
        assert_eq!(engine.pointer(), PointerSession::Idle);
    }

    #[test]
    fn press_and_release_without_travel_is_a_click() {
        let mut engine = desktop_engine();
        assert!(engine.pointer_pressed(PhotoId(10)));
        assert!(!engine.pointer_moved(DragDelta::new(1.0, 1.0)));

        let outcome = engine.pointer_released(DragDelta::new(1.0, 1.0), ContainerSize::new(1000.0, 500.0));
        assert_eq!(outcome, PointerOutcome::Click(PhotoId(10)));
        assert_eq!(engine.selected().map(|photo| photo.id), Some(PhotoId(10)));
        // A click does not raise the photo.
        assert_eq!(z_of(&engine, 10), 7);
    }

    #[test]
    fn drag_never_selects() {
        let mut engine = desktop_engine();
        engine.pointer_pressed(PhotoId(9));
        assert!(engine.pointer_moved(DragDelta::new(0.0, 5.0)));
        assert!(!engine.pointer_moved(DragDelta::new(0.0, 25.0)));
        assert!(engine.render_items()[5].is_dragging);

        let outcome = engine.pointer_released(DragDelta::new(0.0, 50.0), ContainerSize::new(1000.0, 500.0));
        assert_eq!(
            outcome,
            PointerOutcome::Dropped {
                id: PhotoId(9),
                position: Position::new(36, 96, -5, 230, 175),
            }
        );
        assert!(engine.selected().is_none());
        assert_eq!(z_of(&engine, 9), INITIAL_HIGHEST_Z + 1);
    }

    #[test]
    fn second_press_during_session_is_ignored() {
        let mut engine = desktop_engine();
        assert!(engine.pointer_pressed(PhotoId(2)));
        assert!(!engine.pointer_pressed(PhotoId(3)));
        assert_eq!(engine.pointer(), PointerSession::Pressed(PhotoId(2)));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut engine = desktop_engine();
        let outcome = engine.pointer_released(DragDelta::ZERO, ContainerSize::new(1.0, 1.0));
        assert_eq!(outcome, PointerOutcome::Ignored);
    }
}
