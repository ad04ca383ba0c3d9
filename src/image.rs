//! Drawable image resources: raster pixels and recorded forms.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backends::recording::RecordedOp;
use crate::error::{Error, Result};
use crate::geom::Size;

/// Identity of the document a surface or form belongs to. Forms can only
/// be drawn onto surfaces of the same document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DocumentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded RGBA pixels with a physical resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    horizontal_resolution: f64,
    vertical_resolution: f64,
}

impl RasterImage {
    /// `data` must hold `width * height * 4` RGBA bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::with_resolution(width, height, data, 72.0, 72.0)
    }

    pub fn with_resolution(
        width: u32,
        height: u32,
        data: Vec<u8>,
        horizontal_resolution: f64,
        vertical_resolution: f64,
    ) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            data,
            horizontal_resolution,
            vertical_resolution,
        }
    }

    pub fn width_px(&self) -> u32 {
        self.width
    }

    pub fn height_px(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.data
    }

    /// Natural width in points at the image's own resolution.
    pub fn point_width(&self) -> f64 {
        self.width as f64 * 72.0 / self.horizontal_resolution
    }

    pub fn point_height(&self) -> f64 {
        self.height as f64 * 72.0 / self.vertical_resolution
    }
}

#[derive(Debug)]
pub(crate) struct FormInner {
    pub size: Size,
    pub document: Option<DocumentId>,
    pub ops: Rc<RefCell<Vec<RecordedOp>>>,
    pub finished: bool,
    pub bound: bool,
}

/// An off-screen drawing target.
///
/// A form hands out at most one surface over its lifetime; the recorded
/// operations become its content once it is finished. Drawing a form onto
/// another surface finishes it implicitly. Ownership is back-referenced:
/// finishing the form force-closes a surface still bound to it.
#[derive(Clone, Debug)]
pub struct Form {
    pub(crate) inner: Rc<RefCell<FormInner>>,
}

impl Form {
    /// `size` is in points.
    pub fn new(size: Size) -> Self {
        Self::with_document_opt(size, None)
    }

    pub fn with_document(size: Size, document: DocumentId) -> Self {
        Self::with_document_opt(size, Some(document))
    }

    fn with_document_opt(size: Size, document: Option<DocumentId>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FormInner {
                size,
                document,
                ops: Rc::new(RefCell::new(Vec::new())),
                finished: false,
                bound: false,
            })),
        }
    }

    pub fn size(&self) -> Size {
        self.inner.borrow().size
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.inner.borrow().document
    }

    pub fn is_finished(&self) -> bool {
        self.inner.borrow().finished
    }

    /// Seals the form's content. A surface still bound to it fails fast
    /// from here on. Idempotent.
    pub fn finish(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.finished = true;
        inner.bound = false;
    }

    pub(crate) fn bind(&self) -> Result<Rc<RefCell<Vec<RecordedOp>>>> {
        let mut inner = self.inner.borrow_mut();
        if inner.finished {
            return Err(Error::FormFinished);
        }
        if inner.bound {
            return Err(Error::FormAlreadyBound);
        }
        inner.bound = true;
        Ok(inner.ops.clone())
    }

    pub(crate) fn recorded_ops(&self) -> Vec<RecordedOp> {
        self.inner.borrow().ops.borrow().clone()
    }
}

impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Anything a surface can draw as an image.
#[derive(Clone, Debug, PartialEq)]
pub enum Image {
    Raster(RasterImage),
    Form(Form),
}

impl Image {
    /// Natural size in points.
    pub fn point_size(&self) -> Size {
        match self {
            Image::Raster(img) => Size::new(img.point_width(), img.point_height()),
            Image::Form(form) => form.size(),
        }
    }
}

impl From<RasterImage> for Image {
    fn from(img: RasterImage) -> Self {
        Image::Raster(img)
    }
}

impl From<Form> for Image {
    fn from(form: Form) -> Self {
        Image::Form(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_natural_size_uses_resolution() {
        let img = RasterImage::with_resolution(144, 72, vec![0; 144 * 72 * 4], 144.0, 72.0);
        assert_eq!(img.point_width(), 72.0);
        assert_eq!(img.point_height(), 72.0);
    }

    #[test]
    fn form_binds_once() {
        let form = Form::new(Size::new(100.0, 100.0));
        let _ops = form.bind().unwrap();
        assert!(matches!(form.bind().unwrap_err(), Error::FormAlreadyBound));
    }

    #[test]
    fn finished_form_cannot_bind_again() {
        let form = Form::new(Size::new(100.0, 100.0));
        form.finish();
        assert!(matches!(form.bind().unwrap_err(), Error::FormFinished));
    }

    #[test]
    fn form_equality_is_identity() {
        let a = Form::new(Size::new(10.0, 10.0));
        let b = Form::new(Size::new(10.0, 10.0));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
