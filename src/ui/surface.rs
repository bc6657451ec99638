// Fixed host whose size ignores child transforms
// A GtkFixed measures its children through their transforms, so a card
// pushed to the right edge would otherwise raise the window's minimum width.

use glib::Object;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{glib, gsk, Fixed, Orientation, Widget};
use std::cell::Cell;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct FixedSurfaceInner {
        pub fixed: Fixed,
        pub min_height: Cell<i32>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for FixedSurfaceInner {
        const NAME: &'static str = "CorkboardFixedSurface";
        type Type = super::FixedSurface;
        type ParentType = Widget;
    }

    impl ObjectImpl for FixedSurfaceInner {
        fn constructed(&self) {
            self.parent_constructed();
            self.fixed.set_parent(&*self.obj());
        }

        fn dispose(&self) {
            self.fixed.unparent();
        }
    }

    impl WidgetImpl for FixedSurfaceInner {
        fn measure(&self, orientation: Orientation, _for_size: i32) -> (i32, i32, i32, i32) {
            match orientation {
                Orientation::Vertical => {
                    let height = self.min_height.get();
                    (height, height, -1, -1)
                }
                _ => (0, 0, -1, -1),
            }
        }

        fn size_allocate(&self, width: i32, height: i32, baseline: i32) {
            let (min_w, ..) = self.fixed.measure(Orientation::Horizontal, -1);
            let (min_h, ..) = self.fixed.measure(Orientation::Vertical, -1);
            self.fixed.allocate(
                width.max(min_w),
                height.max(min_h),
                baseline,
                None::<gsk::Transform>,
            );
        }
    }
}

glib::wrapper! {
    pub struct FixedSurface(ObjectSubclass<imp::FixedSurfaceInner>)
        @extends Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget;
}

impl FixedSurface {
    pub fn new() -> Self {
        Object::builder().build()
    }

    pub fn fixed(&self) -> &Fixed {
        &self.imp().fixed
    }

    /// Height requested from the parent, independent of the children
    pub fn set_min_height(&self, height: i32) {
        if self.imp().min_height.replace(height) != height {
            self.queue_resize();
        }
    }

    /// Allocated size as floats, or `None` before the first allocation
    pub fn size(&self) -> Option<(f64, f64)> {
        let (width, height) = (self.width(), self.height());
        (width > 0 && height > 0).then(|| (f64::from(width), f64::from(height)))
    }
}

impl Default for FixedSurface {
    fn default() -> Self {
        Self::new()
    }
}
