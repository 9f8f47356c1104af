use super::{FloatType, Interval, Ray, WorldPoint, WorldVector};

/// Axis aligned box given by its minimum and maximum corner.
///
/// The box is empty if `min > max` in any coordinate. Inherently infinite
/// objects report [`BoundingBox::unbounded`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: WorldPoint,
    pub max: WorldPoint,
}

impl BoundingBox {
    pub fn new(min: WorldPoint, max: WorldPoint) -> BoundingBox {
        BoundingBox { min, max }
    }

    pub fn unbounded() -> BoundingBox {
        BoundingBox {
            min: WorldPoint::from(WorldVector::repeat(FloatType::NEG_INFINITY)),
            max: WorldPoint::from(WorldVector::repeat(FloatType::INFINITY)),
        }
    }

    pub fn empty() -> BoundingBox {
        BoundingBox {
            min: WorldPoint::from(WorldVector::repeat(FloatType::INFINITY)),
            max: WorldPoint::from(WorldVector::repeat(FloatType::NEG_INFINITY)),
        }
    }

    /// Smallest box containing all the points, `None` if the iterator was empty.
    pub fn from_points(points: impl IntoIterator<Item = WorldPoint>) -> Option<BoundingBox> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(BoundingBox::new(first, first), |acc, p| BoundingBox {
            min: acc.min.inf(&p),
            max: acc.max.sup(&p),
        }))
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| !(self.min[i] <= self.max[i]))
    }

    pub fn is_bounded(&self) -> bool {
        !self.is_empty()
            && self.min.iter().all(|x| x.is_finite())
            && self.max.iter().all(|x| x.is_finite())
    }

    /// Componentwise intersection (AND) of two boxes.
    pub fn intersection(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.sup(&other.min),
            max: self.max.inf(&other.max),
        }
    }

    /// Componentwise union (OR) of two boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        if self.is_empty() {
            *other
        } else if other.is_empty() {
            *self
        } else {
            BoundingBox {
                min: self.min.inf(&other.min),
                max: self.max.sup(&other.max),
            }
        }
    }

    pub fn center(&self) -> WorldPoint {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn axis_interval(&self, axis: usize) -> Interval {
        Interval {
            min: self.min[axis],
            max: self.max[axis],
        }
    }

    /// All eight corners of the box.
    pub fn corners(&self) -> [WorldPoint; 8] {
        std::array::from_fn(|i| {
            WorldPoint::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Range of ray parameters inside the box (slab method).
    /// Returns an empty interval if the ray misses.
    pub fn intersect(&self, ray: &Ray) -> Interval {
        (0..3)
            .map(|axis| {
                // The multiplication is NaN if the ray is starting inside the slab bounding plane
                // and is parallel to it. In this case we blend to +-infinity, so that the range
                // becomes infinite
                let to_min = (self.min[axis] - ray.origin[axis]) * ray.inv_direction[axis];
                let to_max = (self.max[axis] - ray.origin[axis]) * ray.inv_direction[axis];
                let to_min = if to_min.is_nan() { FloatType::NEG_INFINITY } else { to_min };
                let to_max = if to_max.is_nan() { FloatType::INFINITY } else { to_max };
                Interval::new(to_min, to_max)
            })
            .fold(Interval::UNIVERSE, |acc, slab| acc.and(&slab))
    }
}
