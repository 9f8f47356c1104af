//! Constructive solid geometry.
//!
//! Boolean combinations are intersected by marching: the surface of one operand
//! is intersected repeatedly along the ray until a hit is found that the other operand
//! accepts (inside it for AND, outside it for OR). Each step moves the marching ray
//! just past the previous hit.

use log::trace;

use crate::geometry::{BoundingBox, FloatType, Ray, WorldPoint};

use super::{HitRecord, Object, ObjectRef};

/// Limits for marching along a ray through boolean combinations.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarchSettings {
    /// Maximum number of candidate hits tested per march. Rays grazing a surface
    /// could otherwise step along it forever.
    pub max_steps: u32,
    /// Distance stepped past each rejected hit.
    pub epsilon: FloatType,
}

impl Default for MarchSettings {
    fn default() -> Self {
        MarchSettings {
            max_steps: 100,
            epsilon: 1e-6,
        }
    }
}

/// Which hits of the marched surface are kept.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Keep {
    InsideOther,
    OutsideOther,
}

/// Finds the first hit on `surface` that `other` accepts, no further than `max_t`.
///
/// The returned `t` is relative to the original ray origin. Stepping happens on
/// a private copy of the ray.
fn march<'a>(
    surface: &'a dyn Object,
    other: &dyn Object,
    keep: Keep,
    ray: &Ray,
    max_t: FloatType,
    settings: &MarchSettings,
) -> Option<HitRecord<'a>> {
    let mut march_ray = *ray;
    let mut offset = 0.0;
    let mut hit = surface.intersect(&march_ray)?;

    for _ in 0..settings.max_steps {
        if !(hit.t > 0.0 && offset + hit.t < max_t) {
            return None;
        }

        let inside = other.inside(&march_ray.point_at(hit.t));
        if inside == (keep == Keep::InsideOther) {
            hit.t += offset;
            return Some(hit);
        }

        let step = hit.t + settings.epsilon;
        offset += step;
        march_ray = march_ray.with_origin(march_ray.point_at(step));
        hit = surface.intersect(&march_ray)?;
    }

    trace!("Marching gave up after {} steps at t = {offset}", settings.max_steps);
    None
}

/// Boolean intersection: points inside both operands.
pub struct And {
    a: ObjectRef,
    b: ObjectRef,
    settings: MarchSettings,
}

impl And {
    pub fn new(a: ObjectRef, b: ObjectRef) -> And {
        And {
            a,
            b,
            settings: MarchSettings::default(),
        }
    }

    pub fn with_march_settings(self, settings: MarchSettings) -> And {
        And { settings, ..self }
    }
}

impl Object for And {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let a = march(
            &*self.a,
            &*self.b,
            Keep::InsideOther,
            ray,
            FloatType::INFINITY,
            &self.settings,
        );
        // Anything on b beyond a's hit would be occluded
        let max_t = a.map_or(FloatType::INFINITY, |hit| hit.t);
        let b = march(&*self.b, &*self.a, Keep::InsideOther, ray, max_t, &self.settings);
        HitRecord::frontmost(a, b)
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        self.a.inside(point) && self.b.inside(point)
    }

    fn bounds(&self) -> BoundingBox {
        self.a.bounds().intersection(&self.b.bounds())
    }
}

/// Boolean union: points inside either operand.
pub struct Or {
    a: ObjectRef,
    b: ObjectRef,
    settings: MarchSettings,
}

impl Or {
    pub fn new(a: ObjectRef, b: ObjectRef) -> Or {
        Or {
            a,
            b,
            settings: MarchSettings::default(),
        }
    }

    pub fn with_march_settings(self, settings: MarchSettings) -> Or {
        Or { settings, ..self }
    }
}

impl Object for Or {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let a = march(
            &*self.a,
            &*self.b,
            Keep::OutsideOther,
            ray,
            FloatType::INFINITY,
            &self.settings,
        );
        let max_t = a.map_or(FloatType::INFINITY, |hit| hit.t);
        let b = march(&*self.b, &*self.a, Keep::OutsideOther, ray, max_t, &self.settings);
        HitRecord::frontmost(a, b)
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        self.a.inside(point) || self.b.inside(point)
    }

    fn bounds(&self) -> BoundingBox {
        self.a.bounds().union(&self.b.bounds())
    }
}

/// Complement. Same surface with flipped normals, inside everywhere the operand is not.
pub struct Not {
    inner: ObjectRef,
}

impl Not {
    pub fn new(inner: ObjectRef) -> Not {
        Not { inner }
    }
}

impl Object for Not {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        self.inner.intersect(ray).map(|hit| HitRecord {
            normal: -hit.normal,
            ..hit
        })
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        !self.inner.inside(point)
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::unbounded()
    }
}

/// Surface of `object` clipped to the inside of `bound`.
///
/// Unlike [`And`], the surface of `bound` never shows up. Cutting with
/// `Restrict(a, Not(b))` therefore leaves an open hole instead of a capped one.
pub struct Restrict {
    object: ObjectRef,
    bound: ObjectRef,
    settings: MarchSettings,
}

impl Restrict {
    pub fn new(object: ObjectRef, bound: ObjectRef) -> Restrict {
        Restrict {
            object,
            bound,
            settings: MarchSettings::default(),
        }
    }

    pub fn with_march_settings(self, settings: MarchSettings) -> Restrict {
        Restrict { settings, ..self }
    }
}

impl Object for Restrict {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        march(
            &*self.object,
            &*self.bound,
            Keep::InsideOther,
            ray,
            FloatType::INFINITY,
            &self.settings,
        )
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        self.object.inside(point) && self.bound.inside(point)
    }

    fn bounds(&self) -> BoundingBox {
        self.object.bounds().intersection(&self.bound.bounds())
    }
}

/// Keeps the surface but has no inside, so it never clips other operands.
pub struct Hollow {
    inner: ObjectRef,
}

impl Hollow {
    pub fn new(inner: ObjectRef) -> Hollow {
        Hollow { inner }
    }
}

impl Object for Hollow {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        self.inner.intersect(ray)
    }

    fn inside(&self, _point: &WorldPoint) -> bool {
        false
    }

    fn bounds(&self) -> BoundingBox {
        self.inner.bounds()
    }
}

pub fn and(a: ObjectRef, b: ObjectRef) -> ObjectRef {
    And::new(a, b).into_ref()
}

pub fn or(a: ObjectRef, b: ObjectRef) -> ObjectRef {
    Or::new(a, b).into_ref()
}

pub fn not(inner: ObjectRef) -> ObjectRef {
    Not::new(inner).into_ref()
}

pub fn restrict(object: ObjectRef, bound: ObjectRef) -> ObjectRef {
    Restrict::new(object, bound).into_ref()
}

pub fn hollow(inner: ObjectRef) -> ObjectRef {
    Hollow::new(inner).into_ref()
}

/// `a` with `b` carved out. The cut is capped by `b`'s surface.
pub fn difference(a: ObjectRef, b: ObjectRef) -> ObjectRef {
    and(a, not(b))
}

/// `a` with `b` carved out, leaving the cut open.
pub fn remove(a: ObjectRef, b: ObjectRef) -> ObjectRef {
    restrict(a, not(b))
}
