// Photo board: cards on a Fixed, placed and animated through child transforms
// Pointer input is handled on the board surface, so moving cards never shift
// the gesture origin.

use gtk4::prelude::*;
use gtk4::{
    glib, graphene, gsk, Box as GtkBox, EventControllerMotion, EventSequenceState, GestureDrag,
    Orientation, PickFlags, Widget,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::photo_card::PhotoCard;
use super::surface::FixedSurface;
use crate::gallery::{
    ContainerSize, DragDelta, GalleryEngine, PointerOutcome, PointerSession, RenderItem,
};
use crate::image_loader::DecodedImage;
use crate::layout::pose::{
    tape_opacity, transition_delay, CAPTION_STRIP, DRAG_SCALE, HOVER_SCALE, TAPE_DELAYS,
    TAPE_FADE,
};
use crate::layout::{Pose, Position, Transition, ViewportMode};
use crate::models::PhotoId;

pub const DESKTOP_BOARD_HEIGHT: i32 = 720;
pub const MOBILE_BOARD_HEIGHT: i32 = 920;

/// Room above a card for its pin and below the lowest card.
const PIN_ALLOWANCE: f64 = 16.0;
const BOTTOM_PADDING: f64 = 16.0;

/// Tape strip anchors, as board percentages.
const TAPE_ANCHORS: [(f64, f64); 3] = [(22.0, 3.0), (76.0, 50.0), (48.0, 97.0)];
const TAPE_SIZE: (i32, i32) = (96, 26);

pub fn board_height(mode: ViewportMode) -> i32 {
    match mode {
        ViewportMode::Desktop => DESKTOP_BOARD_HEIGHT,
        ViewportMode::Mobile => MOBILE_BOARD_HEIGHT,
    }
}

/// Height the board must request so every resting card fits.
///
/// `base` stays the percentage base for anchors; cards authored below 100%
/// extend the board past it.
pub fn board_extent(base: i32, items: &[RenderItem]) -> i32 {
    let base_f = f64::from(base);
    let lowest = items
        .iter()
        .map(|item| {
            let (sin, cos) = f64::from(item.rotation).to_radians().sin_cos();
            let width = f64::from(item.width);
            let height = f64::from(item.height + CAPTION_STRIP);
            let half_extent = (width * sin.abs() + height * cos.abs()) / 2.0;
            f64::from(item.y) / 100.0 * base_f + half_extent + PIN_ALLOWANCE
        })
        .fold(0.0_f64, f64::max);
    let needed = (lowest + BOTTOM_PADDING).ceil() as i32;
    base.max(needed)
}

fn item_position(item: &RenderItem) -> Position {
    Position::new(item.x, item.y, item.rotation, item.width, item.height)
}

/// Transform placing a `width` x `height` widget centred on `(cx, cy)`.
pub(super) fn centred_transform(
    cx: f64,
    cy: f64,
    rotation: f64,
    scale: f64,
    width: f64,
    height: f64,
) -> gsk::Transform {
    gsk::Transform::new()
        .translate(&graphene::Point::new(cx as f32, cy as f32))
        .rotate(rotation as f32)
        .scale(scale as f32, scale as f32)
        .translate(&graphene::Point::new(
            -(width as f32) / 2.0,
            -(height as f32) / 2.0,
        ))
}

struct CardSlot {
    card: PhotoCard,
    item: RenderItem,
    transition: Transition,
    started: Instant,
}

impl CardSlot {
    fn retarget(&mut self, to: Pose, delay: Duration, now: Instant) {
        let from = self
            .transition
            .sample(now.saturating_duration_since(self.started));
        self.transition = Transition::new(from, to, delay);
        self.started = now;
    }
}

type PhotoClickedCallback = Box<dyn Fn(PhotoId)>;

/// The pinned-photo board
pub struct BoardView {
    self_weak: RefCell<Weak<BoardView>>,
    surface: FixedSurface,
    engine: Rc<RefCell<GalleryEngine>>,
    /// Percentage base for card anchors; the surface may be taller.
    base_height: Cell<i32>,
    cards: RefCell<BTreeMap<PhotoId, CardSlot>>,
    tapes: Vec<GtkBox>,
    images: RefCell<HashMap<PhotoId, Option<Arc<DecodedImage>>>>,
    dev_mode: bool,
    latched_at: Cell<Option<Instant>>,
    hovered: Cell<Option<PhotoId>>,
    drag_offset: Cell<(f64, f64)>,
    tick_id: RefCell<Option<gtk4::TickCallbackId>>,
    on_photo_clicked: RefCell<Option<PhotoClickedCallback>>,
}

impl BoardView {
    pub fn new(engine: Rc<RefCell<GalleryEngine>>, dev_mode: bool) -> Rc<Self> {
        let surface = FixedSurface::new();
        surface.add_css_class("gallery-wrapper");
        surface.set_hexpand(true);
        surface.set_min_height(DESKTOP_BOARD_HEIGHT);

        let tapes = (1..=TAPE_DELAYS.len())
            .map(|n| {
                let tape = GtkBox::new(Orientation::Horizontal, 0);
                tape.add_css_class("tape");
                tape.add_css_class(&format!("tape-{n}"));
                tape.set_size_request(TAPE_SIZE.0, TAPE_SIZE.1);
                tape.set_can_target(false);
                tape.set_opacity(0.0);
                surface.fixed().put(&tape, 0.0, 0.0);
                tape
            })
            .collect();

        let board = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            surface,
            engine,
            base_height: Cell::new(DESKTOP_BOARD_HEIGHT),
            cards: RefCell::new(BTreeMap::new()),
            tapes,
            images: RefCell::new(HashMap::new()),
            dev_mode,
            latched_at: Cell::new(None),
            hovered: Cell::new(None),
            drag_offset: Cell::new((0.0, 0.0)),
            tick_id: RefCell::new(None),
            on_photo_clicked: RefCell::new(None),
        });
        *board.self_weak.borrow_mut() = Rc::downgrade(&board);

        board.setup_pointer();
        board.setup_hover();
        board
    }

    pub fn widget(&self) -> &Widget {
        self.surface.upcast_ref()
    }

    pub fn connect_photo_clicked<F>(&self, callback: F)
    where
        F: Fn(PhotoId) + 'static,
    {
        *self.on_photo_clicked.borrow_mut() = Some(Box::new(callback));
    }

    /// Bring the widgets in line with the engine after any state change
    pub fn sync(&self) {
        let now = Instant::now();
        let (items, phase, mode) = {
            let engine = self.engine.borrow();
            (engine.render_items(), engine.entrance(), engine.mode())
        };
        if let Some(mode) = mode {
            self.base_height.set(board_height(mode));
        }
        self.surface
            .set_min_height(board_extent(self.base_height.get(), &items));

        let fixed = self.surface.fixed();
        let mut cards = self.cards.borrow_mut();
        cards.retain(|id, slot| {
            let keep = items.iter().any(|item| item.id == *id);
            if !keep {
                fixed.remove(&slot.card);
            }
            keep
        });
        if self
            .hovered
            .get()
            .is_some_and(|id| !cards.contains_key(&id))
        {
            self.hovered.set(None);
        }

        for item in &items {
            let target = Pose::target(&item_position(item), phase);
            let delay = transition_delay(item.index, phase);
            let slot = cards.entry(item.id).or_insert_with(|| {
                let card = PhotoCard::new(item.id);
                fixed.put(&card, 0.0, 0.0);
                if let Some(image) = self.images.borrow().get(&item.id) {
                    card.set_image(image.as_deref());
                }
                CardSlot {
                    card,
                    item: item.clone(),
                    transition: Transition::new(Pose::INITIAL, target, delay),
                    started: now,
                }
            });
            if slot.transition.to != target {
                slot.retarget(target, delay, now);
            }
            slot.item = item.clone();
            slot.card.bind(item, self.dev_mode);
        }
        drop(cards);

        self.restack();
        self.schedule_frames();
    }

    /// Entrance latch fired: throw the pile and start the tape timers
    pub fn scatter(&self) {
        if self.latched_at.get().is_none() {
            self.latched_at.set(Some(Instant::now()));
        }
        self.sync();
    }

    /// Re-apply poses after the board was resized
    pub fn relayout(&self) {
        self.schedule_frames();
    }

    pub fn set_image(&self, id: PhotoId, image: Option<Arc<DecodedImage>>) {
        if let Some(slot) = self.cards.borrow().get(&id) {
            slot.card.set_image(image.as_deref());
        }
        self.images.borrow_mut().insert(id, image);
    }

    pub fn image(&self, id: PhotoId) -> Option<Arc<DecodedImage>> {
        self.images.borrow().get(&id).cloned().flatten()
    }

    pub fn container_size(&self) -> ContainerSize {
        ContainerSize::new(
            f64::from(self.surface.width()),
            f64::from(self.base_height.get()),
        )
    }

    /// Cards in child order, bottom first, the dragged card last
    fn restack(&self) {
        let fixed = self.surface.fixed();
        let cards = self.cards.borrow();
        let mut order: Vec<&CardSlot> = cards.values().collect();
        order.sort_by_key(|slot| (slot.item.is_dragging, slot.item.z_index));
        for slot in order {
            slot.card.insert_before(fixed, None::<&Widget>);
        }
        for tape in &self.tapes {
            tape.insert_before(fixed, None::<&Widget>);
        }
    }

    fn schedule_frames(&self) {
        if self.tick_id.borrow().is_some() {
            return;
        }
        let board_weak = self.self_weak.borrow().clone();
        let id = self.surface.add_tick_callback(move |_widget, _clock| {
            let Some(board) = board_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let animating = board.apply_poses(Instant::now());
            if animating || board.engine.borrow().pointer() != PointerSession::Idle {
                glib::ControlFlow::Continue
            } else {
                board.tick_id.borrow_mut().take();
                glib::ControlFlow::Break
            }
        });
        *self.tick_id.borrow_mut() = Some(id);
    }

    /// Push the current poses into child transforms.
    ///
    /// Returns true while anything is still moving.
    fn apply_poses(&self, now: Instant) -> bool {
        let Some((width, _)) = self.surface.size() else {
            return true;
        };
        let height = f64::from(self.base_height.get());

        let fixed = self.surface.fixed();
        let pointer = self.engine.borrow().pointer();
        let (drag_dx, drag_dy) = self.drag_offset.get();
        let hovered = self.hovered.get();
        let mut animating = false;

        for (id, slot) in self.cards.borrow().iter() {
            let elapsed = now.saturating_duration_since(slot.started);
            let mut pose = slot.transition.sample(elapsed);
            let settled = slot.transition.is_finished(elapsed);
            animating |= !settled;

            let (mut cx, mut cy) = pose.anchor(width, height);
            if pointer.is_dragging(*id) {
                pose.scale = DRAG_SCALE;
                cx += drag_dx;
                cy += drag_dy;
            } else if settled && hovered == Some(*id) {
                pose.scale = HOVER_SCALE;
            }

            let (card_w, card_h) = slot.card.card_size();
            let transform = centred_transform(
                cx,
                cy,
                pose.rotation,
                pose.scale,
                f64::from(card_w),
                f64::from(card_h),
            );
            fixed.set_child_transform(&slot.card, Some(&transform));
            slot.card.set_opacity(pose.opacity);
        }

        if let Some(latched_at) = self.latched_at.get() {
            let since = now.saturating_duration_since(latched_at);
            for (strip, tape) in self.tapes.iter().enumerate() {
                let (left, top) = TAPE_ANCHORS[strip];
                let transform = centred_transform(
                    left / 100.0 * width,
                    top / 100.0 * height,
                    0.0,
                    1.0,
                    f64::from(TAPE_SIZE.0),
                    f64::from(TAPE_SIZE.1),
                );
                fixed.set_child_transform(tape, Some(&transform));
                tape.set_opacity(tape_opacity(strip, since));
            }
            let tapes_done = TAPE_DELAYS
                .last()
                .is_some_and(|last| since >= *last + TAPE_FADE);
            animating |= !tapes_done;
        }

        animating
    }

    fn card_at(&self, x: f64, y: f64) -> Option<PhotoId> {
        let surface: &Widget = self.surface.upcast_ref();
        let mut widget = surface.pick(x, y, PickFlags::DEFAULT);
        while let Some(current) = widget {
            if let Some(card) = current.downcast_ref::<PhotoCard>() {
                return Some(card.photo_id());
            }
            if &current == surface {
                break;
            }
            widget = current.parent();
        }
        None
    }

    fn setup_pointer(self: &Rc<Self>) {
        let drag_gesture = GestureDrag::new();
        drag_gesture.set_button(1);

        let board_weak = Rc::downgrade(self);
        drag_gesture.connect_drag_begin(move |gesture, x, y| {
            let Some(board) = board_weak.upgrade() else {
                return;
            };
            let pressed = board
                .card_at(x, y)
                .is_some_and(|id| board.engine.borrow_mut().pointer_pressed(id));
            if pressed {
                board.drag_offset.set((0.0, 0.0));
            } else {
                gesture.set_state(EventSequenceState::Denied);
            }
        });

        let board_weak = Rc::downgrade(self);
        drag_gesture.connect_drag_update(move |_, offset_x, offset_y| {
            let Some(board) = board_weak.upgrade() else {
                return;
            };
            let started = board
                .engine
                .borrow_mut()
                .pointer_moved(DragDelta::new(offset_x, offset_y));
            board.drag_offset.set((offset_x, offset_y));
            if started {
                board.sync();
            } else {
                board.schedule_frames();
            }
        });

        let board_weak = Rc::downgrade(self);
        drag_gesture.connect_drag_end(move |_, offset_x, offset_y| {
            let Some(board) = board_weak.upgrade() else {
                return;
            };
            let container = board.container_size();
            let outcome = board
                .engine
                .borrow_mut()
                .pointer_released(DragDelta::new(offset_x, offset_y), container);
            board.drag_offset.set((0.0, 0.0));

            match outcome {
                PointerOutcome::Click(id) => {
                    if let Some(ref callback) = *board.on_photo_clicked.borrow() {
                        callback(id);
                    }
                }
                PointerOutcome::Dropped { id, position } => {
                    if board.dev_mode {
                        tracing::info!(
                            "Photo #{} new position: x: {}, y: {}",
                            id,
                            position.x,
                            position.y
                        );
                    } else {
                        tracing::debug!(%id, x = position.x, y = position.y, "Photo dropped");
                    }
                    board.settle(id, position);
                }
                PointerOutcome::Ignored => {}
            }
            board.sync();
        });

        self.surface.add_controller(drag_gesture);
    }

    fn setup_hover(self: &Rc<Self>) {
        let motion = EventControllerMotion::new();

        let board_weak = Rc::downgrade(self);
        motion.connect_motion(move |_, x, y| {
            if let Some(board) = board_weak.upgrade() {
                let id = board.card_at(x, y);
                board.set_hovered(id);
            }
        });

        let board_weak = Rc::downgrade(self);
        motion.connect_leave(move |_| {
            if let Some(board) = board_weak.upgrade() {
                board.set_hovered(None);
            }
        });

        self.surface.add_controller(motion);
    }

    fn set_hovered(&self, id: Option<PhotoId>) {
        let previous = self.hovered.replace(id);
        if previous == id {
            return;
        }
        let cards = self.cards.borrow();
        if let Some(slot) = previous.and_then(|id| cards.get(&id)) {
            slot.card.set_hovered(false);
        }
        if let Some(slot) = id.and_then(|id| cards.get(&id)) {
            slot.card.set_hovered(true);
        }
        drop(cards);
        self.schedule_frames();
    }

    /// Park a dropped card at its new position without animating there
    fn settle(&self, id: PhotoId, position: Position) {
        let phase = self.engine.borrow().entrance();
        if let Some(slot) = self.cards.borrow_mut().get_mut(&id) {
            slot.transition = Transition::at_rest(Pose::target(&position, phase));
            slot.started = Instant::now();
        }
    }
}
