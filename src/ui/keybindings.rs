// Keybindings for the corkboard
// Keyboard access to the board and the lightbox
//
// Keybindings:
// - Arrow keys / hjkl: Move focus between photos (board), switch photo (lightbox)
// - Enter: Raise and expand the focused photo
// - Escape: Close the lightbox
// - f: Toggle fullscreen

use gdk4::Key;
use gtk4::prelude::*;
use gtk4::{EventControllerKey, PropagationPhase, Widget};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::models::PhotoId;

/// Focus movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Board,
    Lightbox,
}

/// Keyboard focus over the photos in board order
#[derive(Debug, Default)]
pub struct FocusRing {
    order: Vec<PhotoId>,
    current: Option<usize>,
}

impl FocusRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the photo order, keeping focus on the same id when it survives
    pub fn set_order(&mut self, order: Vec<PhotoId>) {
        let focused = self.focused();
        self.current = focused.and_then(|id| order.iter().position(|&p| p == id));
        self.order = order;
    }

    pub fn focused(&self) -> Option<PhotoId> {
        self.current.and_then(|i| self.order.get(i).copied())
    }

    /// Focus `id` if it is on the board
    pub fn focus(&mut self, id: PhotoId) -> bool {
        match self.order.iter().position(|&p| p == id) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    /// Move focus, wrapping at both ends. The first move lands on an end.
    pub fn move_focus(&mut self, direction: Direction) -> Option<PhotoId> {
        let len = self.order.len();
        if len == 0 {
            return None;
        }
        let next = match (self.current, direction) {
            (None, Direction::Next) => 0,
            (None, Direction::Previous) => len - 1,
            (Some(i), Direction::Next) => (i + 1) % len,
            (Some(i), Direction::Previous) => (i + len - 1) % len,
        };
        self.current = Some(next);
        self.focused()
    }
}

/// Callback type for focus changes
pub type FocusChangedCallback = Box<dyn Fn(PhotoId)>;

/// Callback type for expanding a photo
pub type OpenPhotoCallback = Box<dyn Fn(PhotoId)>;

/// Callback type for closing the lightbox
pub type CloseLightboxCallback = Box<dyn Fn()>;

/// Callback type for fullscreen toggle
pub type ToggleFullscreenCallback = Box<dyn Fn()>;

#[derive(Default)]
struct Callbacks {
    on_focus_changed: RefCell<Option<FocusChangedCallback>>,
    on_open_photo: RefCell<Option<OpenPhotoCallback>>,
    on_close_lightbox: RefCell<Option<CloseLightboxCallback>>,
    on_toggle_fullscreen: RefCell<Option<ToggleFullscreenCallback>>,
}

/// Keybinding manager for the board window
pub struct Keybindings {
    controller: EventControllerKey,
    view_mode: Rc<Cell<ViewMode>>,
    focus: Rc<RefCell<FocusRing>>,
    callbacks: Rc<Callbacks>,
}

impl Keybindings {
    pub fn new() -> Self {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Capture);

        let view_mode = Rc::new(Cell::new(ViewMode::Board));
        let focus = Rc::new(RefCell::new(FocusRing::new()));
        let callbacks = Rc::new(Callbacks::default());

        let view_mode_clone = view_mode.clone();
        let focus_clone = focus.clone();
        let callbacks_clone = callbacks.clone();
        controller.connect_key_pressed(move |_controller, keyval, _keycode, _state| {
            if Self::handle_key_press(keyval, &view_mode_clone, &focus_clone, &callbacks_clone) {
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });

        Self {
            controller,
            view_mode,
            focus,
            callbacks,
        }
    }

    /// Attach keybindings to a widget (typically the main window)
    pub fn attach(&self, widget: &impl IsA<Widget>) {
        widget.add_controller(self.controller.clone());
    }

    /// Photos reachable by keyboard, in board order
    pub fn set_photo_order(&self, order: Vec<PhotoId>) {
        self.focus.borrow_mut().set_order(order);
    }

    /// Track a photo chosen with the pointer
    pub fn set_focus(&self, id: PhotoId) {
        self.focus.borrow_mut().focus(id);
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.view_mode.set(mode);
    }

    pub fn connect_focus_changed<F>(&self, callback: F)
    where
        F: Fn(PhotoId) + 'static,
    {
        *self.callbacks.on_focus_changed.borrow_mut() = Some(Box::new(callback));
    }

    pub fn connect_open_photo<F>(&self, callback: F)
    where
        F: Fn(PhotoId) + 'static,
    {
        *self.callbacks.on_open_photo.borrow_mut() = Some(Box::new(callback));
    }

    pub fn connect_close_lightbox<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        *self.callbacks.on_close_lightbox.borrow_mut() = Some(Box::new(callback));
    }

    pub fn connect_toggle_fullscreen<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        *self.callbacks.on_toggle_fullscreen.borrow_mut() = Some(Box::new(callback));
    }

    fn handle_key_press(
        keyval: Key,
        view_mode: &Cell<ViewMode>,
        focus: &RefCell<FocusRing>,
        callbacks: &Callbacks,
    ) -> bool {
        let mode = view_mode.get();

        if keyval == Key::Escape {
            if mode == ViewMode::Lightbox {
                view_mode.set(ViewMode::Board);
                if let Some(ref callback) = *callbacks.on_close_lightbox.borrow() {
                    callback();
                }
                return true;
            }
            return false;
        }

        if keyval == Key::Return || keyval == Key::KP_Enter {
            if mode != ViewMode::Board {
                return false;
            }
            let Some(id) = focus.borrow().focused() else {
                return false;
            };
            view_mode.set(ViewMode::Lightbox);
            if let Some(ref callback) = *callbacks.on_open_photo.borrow() {
                callback(id);
            }
            return true;
        }

        if keyval == Key::f || keyval == Key::F {
            if let Some(ref callback) = *callbacks.on_toggle_fullscreen.borrow() {
                callback();
            }
            return true;
        }

        let direction = match keyval {
            Key::Left | Key::Up | Key::h | Key::k => Direction::Previous,
            Key::Right | Key::Down | Key::l | Key::j => Direction::Next,
            _ => return false,
        };

        // Release the borrow before the callback
        let moved = focus.borrow_mut().move_focus(direction);
        let Some(id) = moved else {
            return false;
        };
        match mode {
            ViewMode::Board => {
                if let Some(ref callback) = *callbacks.on_focus_changed.borrow() {
                    callback(id);
                }
            }
            ViewMode::Lightbox => {
                if let Some(ref callback) = *callbacks.on_open_photo.borrow() {
                    callback(id);
                }
            }
        }
        true
    }
}

impl Default for Keybindings {
    fn default() -> Self {
        Self::new()
    }
}
