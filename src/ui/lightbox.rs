// Enlarged photo view shown over the board
// Opens from the card's tilt at half size and springs upright

use gtk4::prelude::*;
use gtk4::{
    gdk, glib, Align, Box as GtkBox, Button, ContentFit, GestureClick, Label, Orientation, PickFlags,
    Picture, Widget,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::board::centred_transform;
use super::photo_card::texture_from_decoded;
use super::surface::FixedSurface;
use crate::image_loader::DecodedImage;
use crate::layout::easing::LIGHTBOX_SPRING;
use crate::layout::{Pose, Transition};
use crate::models::{PhotoId, PhotoItem};

/// Share of the window the enlarged photo may cover.
const MAX_WIDTH_SHARE: f64 = 0.8;
const MAX_HEIGHT_SHARE: f64 = 0.75;

/// Pixel box requested when decoding a photo for this view.
pub const LIGHTBOX_DECODE_BOX: (u32, u32) = (1600, 1200);

fn hidden_pose(rotation: f64) -> Pose {
    Pose {
        left_pct: 50.0,
        top_pct: 50.0,
        rotation,
        scale: 0.5,
        opacity: 0.0,
    }
}

const SHOWN_POSE: Pose = Pose {
    left_pct: 50.0,
    top_pct: 50.0,
    rotation: 0.0,
    scale: 1.0,
    opacity: 1.0,
};

/// Largest size with the aspect of `width` x `height` inside the available box.
/// Unlike thumbnails, small photos are scaled up.
pub fn frame_fit(width: u32, height: u32, avail_w: f64, avail_h: f64) -> (i32, i32) {
    if width == 0 || height == 0 || avail_w <= 0.0 || avail_h <= 0.0 {
        return (1, 1);
    }
    let scale = (avail_w / f64::from(width)).min(avail_h / f64::from(height));
    let fit = |v: u32| ((f64::from(v) * scale).round() as i32).max(1);
    (fit(width), fit(height))
}

type CloseCallback = Box<dyn Fn()>;

pub struct LightboxView {
    self_weak: RefCell<Weak<LightboxView>>,
    backdrop: GtkBox,
    surface: FixedSurface,
    frame: GtkBox,
    picture: Picture,
    caption: Label,
    current: Cell<Option<PhotoId>>,
    /// Aspect source for the frame: decoded image, or the card size until then.
    aspect: Cell<(u32, u32)>,
    rotation: Cell<f64>,
    transition: Cell<Option<(Transition, Instant)>>,
    closing: Cell<bool>,
    tick_id: RefCell<Option<gtk4::TickCallbackId>>,
    on_close: RefCell<Option<CloseCallback>>,
}

impl LightboxView {
    pub fn new() -> Rc<Self> {
        let backdrop = GtkBox::new(Orientation::Vertical, 0);
        backdrop.add_css_class("photo-overlay");
        backdrop.set_hexpand(true);
        backdrop.set_vexpand(true);
        backdrop.set_visible(false);

        let surface = FixedSurface::new();
        surface.set_hexpand(true);
        surface.set_vexpand(true);
        backdrop.append(&surface);

        let frame = GtkBox::new(Orientation::Vertical, 8);
        frame.add_css_class("expanded-photo");

        let close_button = Button::with_label("×");
        close_button.add_css_class("close-btn");
        close_button.set_halign(Align::End);
        close_button.set_tooltip_text(Some("Close (Escape)"));
        frame.append(&close_button);

        let picture = Picture::new();
        picture.set_can_shrink(true);
        picture.set_content_fit(ContentFit::Contain);
        frame.append(&picture);

        let caption = Label::new(None);
        caption.add_css_class("expanded-caption");
        caption.set_wrap(true);
        frame.append(&caption);

        surface.fixed().put(&frame, 0.0, 0.0);

        let lightbox = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            backdrop,
            surface,
            frame,
            picture,
            caption,
            current: Cell::new(None),
            aspect: Cell::new((4, 3)),
            rotation: Cell::new(0.0),
            transition: Cell::new(None),
            closing: Cell::new(false),
            tick_id: RefCell::new(None),
            on_close: RefCell::new(None),
        });
        *lightbox.self_weak.borrow_mut() = Rc::downgrade(&lightbox);

        // Clicks on the photo itself keep the view open.
        let click = GestureClick::new();
        click.set_button(1);
        let lightbox_weak = Rc::downgrade(&lightbox);
        click.connect_released(move |_, _n, x, y| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                if !lightbox.frame_contains(x, y) {
                    lightbox.emit_close();
                }
            }
        });
        lightbox.backdrop.add_controller(click);

        let lightbox_weak = Rc::downgrade(&lightbox);
        close_button.connect_clicked(move |_| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.emit_close();
            }
        });

        lightbox
    }

    pub fn widget(&self) -> &GtkBox {
        &self.backdrop
    }

    pub fn connect_close<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        *self.on_close.borrow_mut() = Some(Box::new(callback));
    }

    pub fn is_open(&self) -> bool {
        self.current.get().is_some() && !self.closing.get()
    }

    pub fn current(&self) -> Option<PhotoId> {
        self.current.get()
    }

    /// Show `photo`, with `preview` until the full-size decode arrives
    pub fn open(&self, photo: &PhotoItem, preview: Option<Arc<DecodedImage>>) {
        let rotation = f64::from(photo.displayed_position().rotation);
        self.current.set(Some(photo.id));
        self.rotation.set(rotation);
        self.closing.set(false);
        self.caption.set_text(&photo.caption);
        self.picture.set_alternative_text(Some(photo.caption.as_str()));

        let position = photo.displayed_position();
        self.aspect.set((position.width, position.height));
        match preview.as_deref() {
            Some(image) => self.show_image(image),
            None => self.picture.set_paintable(None::<&gdk::Paintable>),
        }

        self.backdrop.set_visible(true);
        self.backdrop.set_opacity(0.0);
        self.start(Transition::new(hidden_pose(rotation), SHOWN_POSE, Duration::ZERO));
    }

    /// Swap in the full-size decode if it belongs to the open photo
    pub fn set_image(&self, id: PhotoId, image: &DecodedImage) {
        if self.current.get() == Some(id) {
            self.show_image(image);
            self.schedule_frames();
        }
    }

    pub fn close(&self) {
        if !self.is_open() {
            return;
        }
        self.closing.set(true);
        let from = self.current_pose().unwrap_or(SHOWN_POSE);
        self.start(Transition::new(from, hidden_pose(self.rotation.get()), Duration::ZERO));
    }

    fn show_image(&self, image: &DecodedImage) {
        if let Some(texture) = texture_from_decoded(image) {
            self.aspect.set((image.width, image.height));
            self.picture.set_paintable(Some(&texture));
        }
    }

    fn emit_close(&self) {
        if let Some(ref callback) = *self.on_close.borrow() {
            callback();
        }
    }

    fn frame_contains(&self, x: f64, y: f64) -> bool {
        let frame: &Widget = self.frame.upcast_ref();
        let mut widget = self.backdrop.pick(x, y, PickFlags::DEFAULT);
        while let Some(current) = widget {
            if &current == frame {
                return true;
            }
            widget = current.parent();
        }
        false
    }

    fn current_pose(&self) -> Option<Pose> {
        self.transition
            .get()
            .map(|(transition, started)| transition.sample(started.elapsed()))
    }

    fn start(&self, transition: Transition) {
        self.transition
            .set(Some((transition.with_spring(LIGHTBOX_SPRING), Instant::now())));
        self.schedule_frames();
    }

    fn schedule_frames(&self) {
        if self.tick_id.borrow().is_some() {
            return;
        }
        let lightbox_weak = self.self_weak.borrow().clone();
        let id = self.surface.add_tick_callback(move |_widget, _clock| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            if lightbox.apply_pose() {
                glib::ControlFlow::Continue
            } else {
                lightbox.tick_id.borrow_mut().take();
                glib::ControlFlow::Break
            }
        });
        *self.tick_id.borrow_mut() = Some(id);
    }

    /// Returns true while the open or close animation is running.
    fn apply_pose(&self) -> bool {
        let Some((transition, started)) = self.transition.get() else {
            return false;
        };
        let Some((width, height)) = self.surface.size() else {
            return true;
        };

        let (aspect_w, aspect_h) = self.aspect.get();
        let (pic_w, pic_h) = frame_fit(
            aspect_w,
            aspect_h,
            width * MAX_WIDTH_SHARE,
            height * MAX_HEIGHT_SHARE,
        );
        self.picture.set_size_request(pic_w, pic_h);

        let elapsed = started.elapsed();
        let pose = transition.sample(elapsed);
        let (frame_w, ..) = self.frame.measure(Orientation::Horizontal, -1);
        let (frame_h, ..) = self.frame.measure(Orientation::Vertical, -1);
        let (cx, cy) = pose.anchor(width, height);
        let transform = centred_transform(
            cx,
            cy,
            pose.rotation,
            pose.scale,
            f64::from(frame_w),
            f64::from(frame_h),
        );
        self.surface
            .fixed()
            .set_child_transform(&self.frame, Some(&transform));
        self.backdrop.set_opacity(pose.opacity);

        if !transition.is_finished(elapsed) {
            return true;
        }
        if self.closing.get() {
            self.closing.set(false);
            self.current.set(None);
            self.transition.set(None);
            self.backdrop.set_visible(false);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_fit_scales_up_and_down() {
        assert_eq!(frame_fit(400, 300, 800.0, 900.0), (800, 600));
        assert_eq!(frame_fit(4000, 1000, 800.0, 600.0), (800, 200));
    }

    #[test]
    fn frame_fit_handles_degenerate_input() {
        assert_eq!(frame_fit(0, 300, 800.0, 600.0), (1, 1));
        assert_eq!(frame_fit(400, 300, 0.0, 600.0), (1, 1));
    }

    #[test]
    fn open_animation_starts_tilted_and_small() {
        let from = hidden_pose(-8.0);
        assert_eq!(from.scale, 0.5);
        assert_eq!(from.rotation, -8.0);
        assert_eq!(SHOWN_POSE.rotation, 0.0);
        assert_eq!(SHOWN_POSE.scale, 1.0);
    }
}
