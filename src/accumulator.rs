use std::path::Path;

use assert2::assert;
use image::RgbaImage;

use crate::{
    renderer::RenderError,
    util::{BLACK, Color},
};

/// Linear float color image, stored row by row from the top.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl FloatImage {
    /// Creates a black image.
    pub fn new(width: u32, height: u32) -> FloatImage {
        FloatImage {
            width,
            height,
            pixels: vec![BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width);
        assert!(y < self.height);
        y as usize * self.width as usize + x as usize
    }

    pub fn row(&self, y: u32) -> &[Color] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Mutable rows, top to bottom. Each row can be handed to a different thread.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [Color]> {
        self.pixels.chunks_exact_mut((self.width as usize).max(1))
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Adds another image of the same size, pixel by pixel.
    pub fn add(&mut self, other: &FloatImage) {
        assert!((self.width, self.height) == (other.width, other.height));
        for (a, b) in self.pixels.iter_mut().zip(&other.pixels) {
            *a += *b;
        }
    }

    pub fn scale(&mut self, factor: f32) {
        for pixel in &mut self.pixels {
            *pixel = *pixel * factor;
        }
    }

    /// Copy of this sum of `passes` images, divided by the pass count.
    pub fn averaged(&self, passes: u32) -> FloatImage {
        let mut ret = self.clone();
        if passes > 0 {
            ret.scale(1.0 / passes as f32);
        }
        ret
    }

    /// Encodes as 8 bit sRGB, clamping out of range values.
    pub fn to_rgba8(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| color_to_image(self.get(x, y)))
    }

    /// Saves the image, format is selected by the file extension.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        self.to_rgba8().save(path)?;
        Ok(())
    }
}

fn linear_to_srgb(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Maps a linear color to pixel type compatible with module image.
pub fn color_to_image(color: Color) -> image::Rgba<u8> {
    let encode = |v: f32| (linear_to_srgb(v) * 255.0).round().clamp(0.0, 255.0) as u8;
    image::Rgba([encode(color.r), encode(color.g), encode(color.b), 255])
}
