// Photo card widget: pin, picture and caption strip
// Cards are positioned by the board through Fixed child transforms

use gdk4::Texture;
use glib::Object;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{gdk, glib, Align, Box as GtkBox, ContentFit, Label, Orientation, Picture};
use std::cell::Cell;
use std::sync::OnceLock;

use crate::gallery::RenderItem;
use crate::image_loader::DecodedImage;
use crate::layout::pose::CAPTION_STRIP;
use crate::models::PhotoId;

/// Border between the card edge and the photo.
const PHOTO_INSET: u32 = 20;

fn placeholder_texture() -> &'static Texture {
    static PLACEHOLDER: OnceLock<Texture> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        let width = 64;
        let height = 48;
        let mut pixels = vec![0u8; width * height * 4];

        // Warm grey (#d8d2c4)
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[0xd8, 0xd2, 0xc4, 0xff]);
        }

        let bytes = glib::Bytes::from_owned(pixels);
        gdk::MemoryTexture::new(
            width as i32,
            height as i32,
            gdk::MemoryFormat::R8g8b8a8,
            &bytes,
            width * 4,
        )
        .upcast()
    })
}

/// Whether `len` bytes hold a full `width` x `height` RGBA8 image.
fn rgba_len_ok(len: usize, width: u32, height: u32) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    let expected = (width as u64)
        .saturating_mul(height as u64)
        .saturating_mul(4);
    len as u64 >= expected
}

/// Create a GDK texture from decoded RGBA pixels
pub fn texture_from_decoded(image: &DecodedImage) -> Option<Texture> {
    if !rgba_len_ok(image.rgba.len(), image.width, image.height) {
        tracing::warn!(
            "Skipping texture: data too small ({} bytes for {}x{})",
            image.rgba.len(),
            image.width,
            image.height
        );
        return None;
    }
    let bytes = glib::Bytes::from(&image.rgba[..]);
    let texture = gdk::MemoryTexture::new(
        image.width as i32,
        image.height as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &bytes,
        image.stride(),
    );
    Some(texture.upcast())
}

/// Coordinates shown above a card in dev mode.
pub fn dev_caption(item: &RenderItem) -> String {
    format!(
        "#{} | x:{} y:{} r:{}°",
        item.id, item.x, item.y, item.rotation
    )
}

/// Photo area inside a card of the given layout size.
pub fn photo_size(width: u32, height: u32) -> (u32, u32) {
    (
        width.saturating_sub(PHOTO_INSET).max(1),
        height.saturating_sub(PHOTO_INSET).max(1),
    )
}

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct PhotoCardInner {
        pub picture: Picture,
        pub caption: Label,
        pub dev_label: Label,
        pub photo_id: Cell<u32>,
        pub card_width: Cell<u32>,
        pub card_height: Cell<u32>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for PhotoCardInner {
        const NAME: &'static str = "CorkboardPhotoCard";
        type Type = super::PhotoCard;
        type ParentType = GtkBox;
    }

    impl ObjectImpl for PhotoCardInner {
        fn constructed(&self) {
            self.parent_constructed();

            let obj = self.obj();
            obj.set_orientation(Orientation::Vertical);
            obj.set_spacing(0);
            obj.set_halign(Align::Start);
            obj.set_valign(Align::Start);
            obj.add_css_class("photo-card");
            obj.set_cursor_from_name(Some("grab"));

            self.dev_label.add_css_class("dev-label");
            self.dev_label.set_visible(false);
            obj.append(&self.dev_label);

            let pin = GtkBox::new(Orientation::Horizontal, 0);
            pin.add_css_class("pin");
            pin.set_halign(Align::Center);
            obj.append(&pin);

            self.picture.set_can_shrink(true);
            self.picture.set_content_fit(ContentFit::Cover);
            self.picture.set_halign(Align::Center);
            self.picture.set_paintable(Some(placeholder_texture()));
            obj.append(&self.picture);

            self.caption.add_css_class("photo-caption");
            self.caption.set_wrap(true);
            self.caption.set_justify(gtk4::Justification::Center);
            self.caption.set_vexpand(true);
            obj.append(&self.caption);
        }
    }

    impl WidgetImpl for PhotoCardInner {}
    impl BoxImpl for PhotoCardInner {}
}

glib::wrapper! {
    pub struct PhotoCard(ObjectSubclass<imp::PhotoCardInner>)
        @extends GtkBox, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget, gtk4::Orientable;
}

impl PhotoCard {
    pub fn new(id: PhotoId) -> Self {
        let card: Self = Object::builder().build();
        card.imp().photo_id.set(id.0);
        card
    }

    pub fn photo_id(&self) -> PhotoId {
        PhotoId(self.imp().photo_id.get())
    }

    /// Outer size including the caption strip.
    pub fn card_size(&self) -> (u32, u32) {
        let imp = self.imp();
        (imp.card_width.get(), imp.card_height.get())
    }

    /// Apply size, caption and dev text for the current board state
    pub fn bind(&self, item: &RenderItem, dev_mode: bool) {
        let imp = self.imp();
        let outer_height = item.height + CAPTION_STRIP;
        if (imp.card_width.get(), imp.card_height.get()) != (item.width, outer_height) {
            imp.card_width.set(item.width);
            imp.card_height.set(outer_height);
            self.set_size_request(item.width as i32, outer_height as i32);
            let (photo_w, photo_h) = photo_size(item.width, item.height);
            imp.picture.set_size_request(photo_w as i32, photo_h as i32);
        }

        imp.caption.set_text(&item.caption);
        imp.picture
            .set_alternative_text(Some(item.caption.as_str()));

        imp.dev_label.set_visible(dev_mode);
        if dev_mode {
            imp.dev_label.set_text(&dev_caption(item));
        }

        if item.is_dragging {
            self.add_css_class("dragging");
            self.set_cursor_from_name(Some("grabbing"));
        } else {
            self.remove_css_class("dragging");
            self.set_cursor_from_name(Some("grab"));
        }
    }

    /// Show a decoded photo, or the placeholder when decoding failed
    pub fn set_image(&self, image: Option<&DecodedImage>) {
        let texture = image.and_then(texture_from_decoded);
        match texture {
            Some(texture) => self.imp().picture.set_paintable(Some(&texture)),
            None => self.imp().picture.set_paintable(Some(placeholder_texture())),
        }
    }

    pub fn set_hovered(&self, hovered: bool) {
        if hovered {
            self.add_css_class("hovered");
        } else {
            self.remove_css_class("hovered");
        }
    }
}
