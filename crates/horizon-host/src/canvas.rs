//! CPU-side RGBA drawing surface handed to engines as their 2D context.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use image::RgbaImage;

/// Premultiplication-free 8-bit RGBA pixel.
pub type Rgba = [u8; 4];

/// Row-major RGBA pixel buffer.
///
/// `revision` increases on every mutable access so presenters can skip
/// re-uploading unchanged pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
    revision: u64,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 255]; (width as usize) * (height as usize)],
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resizes the buffer, clearing it to opaque black.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize((width as usize) * (height as usize), [0, 0, 0, 255]);
        self.revision += 1;
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Copies `image` with its top-left corner at `(dx, dy)`, clipped to the
    /// pixmap bounds.
    pub fn put_image(&mut self, image: &RgbaImage, dx: i64, dy: i64) {
        let (iw, ih) = image.dimensions();

        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (dx + iw as i64).min(self.width as i64);
        let y1 = (dy + ih as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for y in y0..y1 {
            let sy = (y - dy) as u32;
            for x in x0..x1 {
                let sx = (x - dx) as u32;
                let i = self.index(x as u32, y as u32);
                self.pixels[i] = image.get_pixel(sx, sy).0;
            }
        }
    }

    /// Raw RGBA bytes, `4 * width` per row.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }
}

/// Shared handle to a window's pixmap.
///
/// The host keeps one per surface; engines receive a clone as their drawing
/// context.
#[derive(Debug, Clone)]
pub struct Canvas(Rc<RefCell<Pixmap>>);

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self(Rc::new(RefCell::new(Pixmap::new(width, height))))
    }

    pub fn width(&self) -> u32 {
        self.0.borrow().width
    }

    pub fn height(&self) -> u32 {
        self.0.borrow().height
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.0.borrow().revision
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.0.borrow_mut().resize(width, height);
    }

    /// Read access to the pixels.
    pub fn pixels(&self) -> Ref<'_, Pixmap> {
        self.0.borrow()
    }

    /// Runs `f` with mutable access to the pixels and marks them changed.
    pub fn draw<R>(&self, f: impl FnOnce(&mut Pixmap) -> R) -> R {
        let mut pixmap = self.0.borrow_mut();
        pixmap.revision += 1;
        f(&mut *pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_image_clips_to_bounds() {
        let mut pixmap = Pixmap::new(4, 3);
        let image = RgbaImage::from_pixel(3, 3, image::Rgba([9, 8, 7, 255]));

        pixmap.put_image(&image, 2, -1);

        assert_eq!(pixmap.pixel(2, 0), Some([9, 8, 7, 255]));
        assert_eq!(pixmap.pixel(3, 1), Some([9, 8, 7, 255]));
        assert_eq!(pixmap.pixel(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(pixmap.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(pixmap.pixel(4, 0), None);
    }

    #[test]
    fn put_image_fully_outside_is_noop() {
        let mut pixmap = Pixmap::new(2, 2);
        let before = pixmap.clone();
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));

        pixmap.put_image(&image, 5, 0);
        pixmap.put_image(&image, -2, 0);

        assert_eq!(pixmap, before);
    }

    #[test]
    fn bytes_are_row_major_rgba() {
        let mut pixmap = Pixmap::new(2, 1);
        pixmap.put_image(&RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4])), 1, 0);
        assert_eq!(pixmap.as_bytes(), &[0, 0, 0, 255, 1, 2, 3, 4]);
    }

    #[test]
    fn draw_bumps_revision_and_resize_clears() {
        let canvas = Canvas::new(2, 2);
        let start = canvas.revision();

        let red = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        canvas.draw(|p| p.put_image(&red, 0, 0));
        assert_eq!(canvas.pixels().pixel(1, 1), Some([255, 0, 0, 255]));
        assert!(canvas.revision() > start);

        canvas.resize(3, 1);
        assert_eq!((canvas.width(), canvas.height()), (3, 1));
        assert_eq!(canvas.pixels().pixel(2, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn zero_sized_canvas_is_empty() {
        let canvas = Canvas::new(8, 8);
        canvas.resize(0, 8);
        assert!(canvas.is_empty());
        assert_eq!(canvas.pixels().pixel(0, 0), None);
        assert!(canvas.pixels().as_bytes().is_empty());
    }
}
