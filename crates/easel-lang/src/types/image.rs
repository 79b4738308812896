//! `PImage`: an image buffer plus the script-visible `pixels` array.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::value::{Array, Value};
use crate::types::color;
use crate::types::draw::ImageData;

#[derive(Debug)]
pub struct PImage {
    pub data: ImageData,
    /// Filled by `loadPixels`, written back by `updatePixels`.
    pub pixels: Array,
}

impl PImage {
    pub fn new(data: ImageData) -> Self {
        Self { data, pixels: Rc::new(RefCell::new(Vec::new())) }
    }

    /// `createImage(w, h)`: transparent black.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(ImageData::new(width, height, 0))
    }

    /// Decodes PNG, JPEG, GIF or BMP bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = rgba.pixels()
            .map(|p| color::pack(p[3], p[0], p[1], p[2]))
            .collect();
        Ok(Self::new(ImageData { width, height, pixels }))
    }

    pub fn width(&self) -> u32 {
        self.data.width
    }

    pub fn height(&self) -> u32 {
        self.data.height
    }

    pub fn load_pixels(&self) {
        let mut px = self.pixels.borrow_mut();
        px.clear();
        px.extend(self.data.pixels.iter().map(|&c| Value::Number(color::to_number(c))));
    }

    pub fn update_pixels(&mut self) {
        let px = self.pixels.borrow();
        for (slot, v) in self.data.pixels.iter_mut().zip(px.iter()) {
            *slot = color::from_number(v.to_number());
        }
    }

    /// Nearest-neighbour copy of a source rectangle into a destination
    /// rectangle of `self`.
    pub fn blit(&mut self, src: &ImageData, from: [i64; 4], to: [i64; 4]) {
        let [sx, sy, sw, sh] = from;
        let [dx, dy, dw, dh] = to;
        if sw <= 0 || sh <= 0 || dw <= 0 || dh <= 0 {
            return;
        }
        for y in 0..dh {
            for x in 0..dw {
                let px = sx + x * sw / dw;
                let py = sy + y * sh / dh;
                self.data.set(dx + x, dy + y, src.get(px, py));
            }
        }
    }
}

impl Clone for PImage {
    fn clone(&self) -> Self {
        Self::new(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_round_trip_through_array() {
        let mut img = PImage::blank(2, 1);
        img.load_pixels();
        img.pixels.borrow_mut()[1] = Value::Number(0xff00ff00u32 as f64);
        img.update_pixels();
        assert_eq!(img.data.get(1, 0), 0xff00ff00);
        assert_eq!(img.data.get(0, 0), 0);
    }

    #[test]
    fn blit_scales_up() {
        let src = ImageData::new(1, 1, 0xffffffff);
        let mut img = PImage::blank(4, 4);
        img.blit(&src, [0, 0, 1, 1], [1, 1, 2, 2]);
        assert_eq!(img.data.get(2, 2), 0xffffffff);
        assert_eq!(img.data.get(3, 3), 0);
    }
}
