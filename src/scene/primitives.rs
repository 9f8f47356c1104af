use assert2::assert;

use crate::geometry::{BoundingBox, EPSILON, FloatType, Interval, Ray, WorldPoint, WorldVector};

use super::{HitRecord, Object, material::MaterialRef};

pub struct Sphere {
    pub center: WorldPoint,
    pub radius: FloatType,
    pub material: MaterialRef,
}

impl Sphere {
    pub fn new(center: WorldPoint, radius: FloatType, material: MaterialRef) -> Sphere {
        assert!(radius > 0.0);
        Sphere {
            center,
            radius,
            material,
        }
    }

    /// Entry and exit parameters of the ray, empty if the ray misses.
    /// Does not assume unit length ray direction.
    pub fn interval(&self, ray: &Ray) -> Interval {
        let oc = ray.origin - self.center;
        let a = ray.direction.norm_squared();
        let half_b = oc.dot(&ray.direction);
        let c = oc.norm_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;

        if discriminant < 0.0 || a == 0.0 {
            return Interval::EMPTY;
        }

        let sqrt_disc = discriminant.sqrt();
        Interval::new((-half_b - sqrt_disc) / a, (-half_b + sqrt_disc) / a)
    }
}

impl Object for Sphere {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let t = self.interval(ray).frontmost_positive()?;
        let normal = (ray.point_at(t) - self.center) / self.radius;

        Some(HitRecord {
            t,
            normal,
            material: &*self.material,
        })
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        (point - self.center).norm_squared() < self.radius * self.radius
    }

    fn bounds(&self) -> BoundingBox {
        let r_vec = WorldVector::repeat(self.radius);
        BoundingBox::new(self.center - r_vec, self.center + r_vec)
    }
}

/// Axis aligned box.
pub struct Cuboid {
    pub min: WorldPoint,
    pub max: WorldPoint,
    pub material: MaterialRef,
}

impl Cuboid {
    /// Creates a box from any two opposite corners.
    pub fn new(a: WorldPoint, b: WorldPoint, material: MaterialRef) -> Cuboid {
        Cuboid {
            min: a.inf(&b),
            max: a.sup(&b),
            material,
        }
    }

    fn normal_at(&self, point: &WorldPoint) -> WorldVector {
        // Pick the face the point is closest to
        let (axis, sign, _) = (0..3)
            .flat_map(|axis| {
                [
                    (axis, -1.0, (point[axis] - self.min[axis]).abs()),
                    (axis, 1.0, (point[axis] - self.max[axis]).abs()),
                ]
            })
            .fold((0, -1.0, FloatType::INFINITY), |best, candidate| {
                if candidate.2 < best.2 { candidate } else { best }
            });

        let mut normal = WorldVector::zeros();
        normal[axis] = sign;
        normal
    }
}

impl Object for Cuboid {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let t = self.bounds().intersect(ray).frontmost_positive()?;
        if !t.is_finite() {
            return None;
        }

        Some(HitRecord {
            t,
            normal: self.normal_at(&ray.point_at(t)),
            material: &*self.material,
        })
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        (0..3).all(|axis| self.min[axis] < point[axis] && point[axis] < self.max[axis])
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.min, self.max)
    }
}

/// Half-space of points `p` with `p · normal < offset`.
pub struct Plane {
    normal: WorldVector,
    offset: FloatType,
    pub material: MaterialRef,
}

impl Plane {
    /// Half-space bounded by a plane through `point`, with `normal` pointing out of the solid.
    pub fn new(point: WorldPoint, normal: WorldVector, material: MaterialRef) -> Plane {
        assert!(normal.norm() > EPSILON, "Plane normal must be non-zero");
        let normal = normal.normalize();
        Plane {
            normal,
            offset: point.coords.dot(&normal),
            material,
        }
    }
}

impl Object for Plane {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let t =
            (self.offset - ray.origin.coords.dot(&self.normal)) / ray.direction.dot(&self.normal);
        if !(t > 0.0 && t.is_finite()) {
            return None;
        }

        Some(HitRecord {
            t,
            normal: self.normal,
            material: &*self.material,
        })
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        point.coords.dot(&self.normal) < self.offset
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::unbounded()
    }
}
