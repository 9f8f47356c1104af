use assert2::assert;
use bon::bon;
use nalgebra::Isometry3;

use crate::geometry::{FloatType, Ray, WorldPoint, WorldVector};

/// Pinhole camera looking down +z from the origin of its own frame,
/// with +x right and +y up on the film.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    /// Distance from the pinhole to the film, zero for orthographic projection
    focal_length: FloatType,

    /// Height of the film in world units. The width follows from the image aspect ratio.
    film_height: FloatType,

    placement: Isometry3<FloatType>,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        #[builder(default = 0.0)] focal_length: FloatType,
        #[builder(default = 1.0)] film_height: FloatType,
        #[builder(default = Isometry3::identity())] placement: Isometry3<FloatType>,
    ) -> Self {
        assert!(focal_length >= 0.0);
        assert!(film_height > 0.0);

        Camera {
            focal_length,
            film_height,
            placement,
        }
    }
}

impl Camera {
    /// Sub-pixel offset of the pixel center.
    pub const PIXEL_CENTER: [FloatType; 2] = [0.5, 0.5];

    pub fn is_orthographic(&self) -> bool {
        self.focal_length == 0.0
    }

    /// Random sub-pixel offset in `[0, 1)²`, for anti-aliasing.
    pub fn jitter(rng: &mut impl rand::Rng) -> [FloatType; 2] {
        [rng.random(), rng.random()]
    }

    /// Primary ray through pixel `(x, y)` of a `width` x `height` image, shifted by `jitter`
    /// within the pixel. Pixel rows go from the top of the film down.
    pub fn ray_for(&self, x: u32, y: u32, width: u32, height: u32, jitter: [FloatType; 2]) -> Ray {
        let w = width as FloatType;
        let h = height as FloatType;
        let scale = self.film_height / h;

        let u = (x as FloatType + jitter[0] - w / 2.0) * scale;
        let v = (h / 2.0 - y as FloatType - jitter[1]) * scale;

        let start = WorldPoint::new(u, v, 0.0);
        let direction = if self.is_orthographic() {
            WorldVector::z()
        } else {
            WorldVector::new(u, v, self.focal_length).normalize()
        };

        Ray::new(self.placement * start, self.placement * direction)
    }
}
