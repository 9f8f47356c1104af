mod bounding_box;
mod interval;

pub use bounding_box::BoundingBox;
pub use interval::Interval;

pub type FloatType = f64;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;

pub const EPSILON: FloatType = 1e-9;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    pub direction: WorldVector,

    /// Componentwise inverse of the ray direction
    /// Zeros in direction get turned into positive infinity regardless of the sign of the zero
    pub inv_direction: WorldVector,
}

impl Ray {
    /// Creates a ray. The direction is used as is, callers that need unit length
    /// parametrization must normalize it themselves.
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let inv_direction = direction.map(|x| if x == 0.0 { FloatType::INFINITY } else { 1.0 / x });

        Ray {
            origin,
            direction,
            inv_direction,
        }
    }

    /// Returns a copy of this ray starting at a different point.
    pub fn with_origin(&self, origin: WorldPoint) -> Ray {
        Ray { origin, ..*self }
    }

    pub fn point_at(&self, t: FloatType) -> WorldPoint {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;

    pub fn simple_float() -> BoxedStrategy<FloatType> {
        (-1_000_000i64..1_000_000).prop_map(|n| n as FloatType * 1e-3).boxed()
    }

    pub fn world_point() -> BoxedStrategy<WorldPoint> {
        (simple_float(), simple_float(), simple_float())
            .prop_map(|(x, y, z)| WorldPoint::new(x, y, z))
            .boxed()
    }

    #[test]
    fn inverse_direction_of_axis_ray() {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, -0.0, 2.0));
        assert!(ray.inv_direction.x == FloatType::INFINITY);
        assert!(ray.inv_direction.y == FloatType::INFINITY);
        assert!(ray.inv_direction.z == 0.5);
    }

    #[test]
    fn with_origin_keeps_direction() {
        let ray = Ray::new(WorldPoint::new(1.0, 2.0, 3.0), WorldVector::new(0.0, 0.0, 1.0));
        let moved = ray.with_origin(ray.point_at(2.5));
        assert!(moved.origin == WorldPoint::new(1.0, 2.0, 5.5));
        assert!(moved.direction == ray.direction);
        assert!(moved.inv_direction == ray.inv_direction);
    }
}
