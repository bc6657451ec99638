// Main window for the corkboard
// Splash with preload progress, then the pinned-photo board with its lightbox

use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, CssProvider, Label, Orientation,
    Overlay, PolicyType, ProgressBar, ScrolledWindow, Stack, StackTransitionType,
    STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, error, info};

use super::board::BoardView;
use super::keybindings::{Keybindings, ViewMode};
use super::lightbox::{LightboxView, LIGHTBOX_DECODE_BOX};
use crate::config::BoardConfig;
use crate::gallery::{visible_fraction, GalleryEngine, VisibilityWatch};
use crate::layout::ViewportMode;
use crate::models::PhotoId;
use crate::preload::progress::SETTLE_DELAY;
use crate::preload::{DecodePurpose, DecodeQueue, DecodeRequest, DecodedPhoto, PreloadProgress};

/// Delay between the board scrolling into view and the cards scattering.
const ENTRANCE_DELAY: Duration = Duration::from_millis(300);

/// Splash refresh interval.
const SPLASH_TICK: Duration = Duration::from_millis(16);

/// Decode box for board cards; twice the largest card for HiDPI.
const CARD_DECODE_BOX: (u32, u32) = (520, 400);

const TITLE: &str = "ACTIVITIES";
const SUBTITLE: &str = "Drag photos around - Click to expand";

/// Counter text shown on the splash, always two digits below 100.
fn splash_counter(value: u32) -> String {
    format!("{:02}", value.min(100))
}

/// Lines of the dev status panel.
fn dev_status(mode: Option<ViewportMode>, photos: usize) -> String {
    let mode = mode.map_or("-", |m| m.as_str()).to_ascii_uppercase();
    format!("DEV MODE ON\nMode: {mode}\nPhotos: {photos}\nDrag photos to reposition")
}

const STYLE_CSS: &str = include_str!("../style.css");

/// Load and apply the corkboard stylesheet
fn load_css() {
    let provider = CssProvider::new();

    provider.load_from_string(STYLE_CSS);
    debug!("Loaded corkboard stylesheet");

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

/// Main window of the corkboard
pub struct MainWindow {
    self_weak: RefCell<Weak<MainWindow>>,
    window: ApplicationWindow,
    stack: Stack,
    scroller: ScrolledWindow,
    board: Rc<BoardView>,
    lightbox: Rc<LightboxView>,
    keybindings: Rc<Keybindings>,
    engine: Rc<RefCell<GalleryEngine>>,
    queue: DecodeQueue,
    config: BoardConfig,
    progress_bar: ProgressBar,
    counter_label: Label,
    dev_panel: Label,
    splash_started: Instant,
    progress: RefCell<PreloadProgress>,
    preloaded: RefCell<HashSet<PhotoId>>,
    splash_done: Cell<bool>,
    visibility: RefCell<VisibilityWatch>,
    entrance_scheduled: Cell<bool>,
    last_viewport: Cell<(i32, i32)>,
}

impl MainWindow {
    pub fn new(app: &Application, config: BoardConfig, engine: GalleryEngine) -> Result<Rc<Self>> {
        load_css();

        let window = ApplicationWindow::builder()
            .application(app)
            .title("Activities")
            .default_width(1200)
            .default_height(860)
            .build();

        let stack = Stack::new();
        stack.set_transition_type(StackTransitionType::Crossfade);
        stack.set_transition_duration(400);

        // Splash
        let splash = GtkBox::new(Orientation::Vertical, 16);
        splash.add_css_class("splash");
        splash.set_hexpand(true);
        splash.set_vexpand(true);
        let splash_inner = GtkBox::new(Orientation::Vertical, 12);
        splash_inner.set_halign(Align::Center);
        splash_inner.set_valign(Align::Center);
        splash_inner.set_vexpand(true);
        let counter_label = Label::new(Some(&splash_counter(0)));
        counter_label.add_css_class("splash-counter");
        let progress_bar = ProgressBar::new();
        progress_bar.set_size_request(320, -1);
        splash_inner.append(&counter_label);
        splash_inner.append(&progress_bar);
        splash.append(&splash_inner);

        // Board page
        let engine = Rc::new(RefCell::new(engine));
        let board = BoardView::new(engine.clone(), config.dev_mode);

        let content = GtkBox::new(Orientation::Vertical, 4);
        let title = Label::new(Some(TITLE));
        title.add_css_class("activity-title");
        title.set_margin_top(32);
        let subtitle = Label::new(Some(SUBTITLE));
        subtitle.add_css_class("activity-subtitle");
        content.append(&title);
        content.append(&subtitle);
        content.append(board.widget());

        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .child(&content)
            .build();
        scroller.set_vexpand(true);

        stack.add_named(&splash, Some("splash"));
        stack.add_named(&scroller, Some("board"));
        stack.set_visible_child_name("splash");

        // Lightbox and dev panel float above both pages
        let lightbox = LightboxView::new();
        let dev_panel = Label::new(None);
        dev_panel.add_css_class("dev-panel");
        dev_panel.set_halign(Align::End);
        dev_panel.set_valign(Align::Start);
        dev_panel.set_can_target(false);
        dev_panel.set_visible(config.dev_mode);

        let overlay = Overlay::new();
        overlay.set_child(Some(&stack));
        overlay.add_overlay(lightbox.widget());
        overlay.add_overlay(&dev_panel);
        window.set_child(Some(&overlay));

        let queue = DecodeQueue::new(config.decode_workers)?;
        let total = engine.borrow().catalog().len();

        let keybindings = Rc::new(Keybindings::new());

        let main_window = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            stack,
            scroller,
            board,
            lightbox,
            keybindings,
            engine,
            queue,
            config,
            progress_bar,
            counter_label,
            dev_panel,
            splash_started: Instant::now(),
            progress: RefCell::new(PreloadProgress::new(total)),
            preloaded: RefCell::new(HashSet::new()),
            splash_done: Cell::new(false),
            visibility: RefCell::new(VisibilityWatch::default()),
            entrance_scheduled: Cell::new(false),
            last_viewport: Cell::new((0, 0)),
        });
        *main_window.self_weak.borrow_mut() = Rc::downgrade(&main_window);

        main_window.setup_keybindings();
        main_window.setup_decoding();
        main_window.setup_viewport_observer();
        main_window.setup_splash();

        let window_weak = Rc::downgrade(&main_window);
        main_window.board.connect_photo_clicked(move |id| {
            if let Some(window) = window_weak.upgrade() {
                window.keybindings.set_focus(id);
                window.show_selected();
            }
        });

        let window_weak = Rc::downgrade(&main_window);
        main_window.lightbox.connect_close(move || {
            if let Some(window) = window_weak.upgrade() {
                window.close_lightbox();
            }
        });

        let window_weak = Rc::downgrade(&main_window);
        main_window
            .scroller
            .vadjustment()
            .connect_value_changed(move |_| {
                if let Some(window) = window_weak.upgrade() {
                    window.check_visibility();
                }
            });

        Ok(main_window)
    }

    fn setup_keybindings(self: &Rc<Self>) {
        self.keybindings.attach(&self.window);

        let window_weak = Rc::downgrade(self);
        self.keybindings.connect_focus_changed(move |id| {
            if let Some(window) = window_weak.upgrade() {
                window.engine.borrow_mut().bring_to_front(id);
                window.board.sync();
            }
        });

        let window_weak = Rc::downgrade(self);
        self.keybindings.connect_open_photo(move |id| {
            if let Some(window) = window_weak.upgrade() {
                window.open_photo(id);
            }
        });

        let window_weak = Rc::downgrade(self);
        self.keybindings.connect_close_lightbox(move || {
            if let Some(window) = window_weak.upgrade() {
                window.close_lightbox();
            }
        });

        let window_weak = Rc::downgrade(self);
        self.keybindings.connect_toggle_fullscreen(move || {
            if let Some(window) = window_weak.upgrade() {
                window.toggle_fullscreen();
            }
        });
    }

    /// Queue every catalog photo for the splash and route decoded results
    fn setup_decoding(self: &Rc<Self>) {
        let window_weak = Rc::downgrade(self);
        self.queue.start_batch_processing(move |decoded| {
            if let Some(window) = window_weak.upgrade() {
                window.on_decoded(decoded);
            }
        });

        let requests: Vec<DecodeRequest> = self
            .engine
            .borrow()
            .catalog()
            .entries()
            .iter()
            .map(|entry| {
                DecodeRequest::new(
                    entry.id,
                    entry.src.clone(),
                    CARD_DECODE_BOX.0,
                    CARD_DECODE_BOX.1,
                )
            })
            .collect();
        let queued = self.queue.request_batch(requests);
        debug!(queued, "Queued photo preload");
    }

    fn on_decoded(&self, decoded: DecodedPhoto) {
        match decoded.purpose {
            DecodePurpose::Card => {
                if self.preloaded.borrow_mut().insert(decoded.id) {
                    self.progress.borrow_mut().mark_loaded();
                }
                self.board.set_image(decoded.id, decoded.image);
            }
            DecodePurpose::Lightbox => {
                if let Some(image) = decoded.image.as_deref() {
                    self.lightbox.set_image(decoded.id, image);
                }
            }
        }
    }

    /// Track the scrolled viewport size: width picks the layout mode, any
    /// change may move the board in or out of view.
    fn setup_viewport_observer(self: &Rc<Self>) {
        let weak_self = Rc::downgrade(self);
        self.scroller.add_tick_callback(move |_widget, _clock| {
            let Some(window) = weak_self.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let size = (window.scroller.width(), window.scroller.height());
            if size.0 <= 0 || size == window.last_viewport.get() {
                return glib::ControlFlow::Continue;
            }
            let width_changed = size.0 != window.last_viewport.get().0;
            window.last_viewport.set(size);
            if width_changed {
                window.on_viewport_width(f64::from(size.0));
            }
            window.check_visibility();
            glib::ControlFlow::Continue
        });
    }

    fn on_viewport_width(&self, width: f64) {
        let mode = ViewportMode::from_width(width, self.config.breakpoint);
        let result = self.engine.borrow_mut().set_viewport_mode(mode);
        match result {
            Ok(true) => {
                info!(%mode, width, "Viewport mode changed");
                self.board.sync();
                let (order, photos) = {
                    let engine = self.engine.borrow();
                    let order: Vec<PhotoId> = engine.photos().iter().map(|p| p.id).collect();
                    let photos = order.len();
                    (order, photos)
                };
                self.keybindings.set_photo_order(order);
                self.dev_panel.set_text(&dev_status(Some(mode), photos));

                let shown = self.lightbox.current();
                if shown.is_some_and(|id| self.engine.borrow().photo(id).is_none()) {
                    self.close_lightbox();
                }
            }
            Ok(false) => self.board.relayout(),
            Err(err) => {
                error!(error = %err, %mode, "Layout tables do not cover the catalog");
            }
        }
    }

    /// Feed the board's on-screen fraction to the entrance latch
    fn check_visibility(&self) {
        if !self.splash_done.get() || self.engine.borrow().has_animated() {
            return;
        }
        let Some(bounds) = self.board.widget().compute_bounds(&self.scroller) else {
            return;
        };
        let fraction = visible_fraction(
            f64::from(bounds.y()),
            f64::from(bounds.height()),
            f64::from(self.scroller.height()),
        );
        let rising = self.visibility.borrow_mut().observe(fraction);
        if !rising || self.entrance_scheduled.replace(true) {
            return;
        }

        debug!(fraction, "Board in view, scheduling entrance");
        let weak_self = self.self_weak.borrow().clone();
        glib::timeout_add_local_once(ENTRANCE_DELAY, move || {
            if let Some(window) = weak_self.upgrade() {
                if window.engine.borrow_mut().trigger_entrance_once() {
                    window.board.scatter();
                }
            }
        });
    }

    fn setup_splash(self: &Rc<Self>) {
        let weak_self = Rc::downgrade(self);
        glib::timeout_add_local(SPLASH_TICK, move || {
            let Some(window) = weak_self.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let elapsed = window.splash_started.elapsed();
            let (percent, counter, complete) = {
                let progress = window.progress.borrow();
                (
                    progress.percent(elapsed),
                    progress.counter(elapsed),
                    progress.is_complete(elapsed),
                )
            };
            window.progress_bar.set_fraction((percent / 100.0).clamp(0.0, 1.0));
            window.counter_label.set_text(&splash_counter(counter));
            if !complete {
                return glib::ControlFlow::Continue;
            }

            let (loaded, total) = {
                let progress = window.progress.borrow();
                (progress.loaded(), progress.total())
            };
            info!(loaded, total, ?elapsed, "Preload finished");
            let weak_self = Rc::downgrade(&window);
            glib::timeout_add_local_once(SETTLE_DELAY, move || {
                if let Some(window) = weak_self.upgrade() {
                    window.finish_splash();
                }
            });
            glib::ControlFlow::Break
        });
    }

    fn finish_splash(&self) {
        self.splash_done.set(true);
        self.stack.set_visible_child_name("board");
        // Re-check once the board page has been allocated
        self.last_viewport.set((0, 0));
    }

    /// Open the lightbox on whatever the engine has selected
    fn show_selected(&self) {
        let selected = self.engine.borrow().selected().cloned();
        let Some(photo) = selected else {
            return;
        };
        self.keybindings.set_view_mode(ViewMode::Lightbox);
        self.lightbox.open(&photo, self.board.image(photo.id));
        self.queue.request(
            DecodeRequest::new(
                photo.id,
                photo.src.clone(),
                LIGHTBOX_DECODE_BOX.0,
                LIGHTBOX_DECODE_BOX.1,
            )
            .for_lightbox(),
        );
        self.board.sync();
    }

    fn open_photo(&self, id: PhotoId) {
        let selected = self
            .engine
            .borrow_mut()
            .select_photo(Some(id))
            .is_some_and(|photo| photo.id == id);
        if selected {
            self.show_selected();
        }
    }

    fn close_lightbox(&self) {
        self.keybindings.set_view_mode(ViewMode::Board);
        self.lightbox.close();
        self.engine.borrow_mut().select_photo(None);
        self.board.sync();
    }

    fn toggle_fullscreen(&self) {
        if self.window.is_fullscreen() {
            self.window.unfullscreen();
        } else {
            self.window.fullscreen();
        }
    }

    /// Present the window
    pub fn present(&self) {
        self.window.present();
    }
}
