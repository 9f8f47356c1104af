pub mod composite;
pub mod csg;
pub mod light;
pub mod material;
pub mod primitives;

use std::{fmt, sync::Arc};

use ordered_float::OrderedFloat;
use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    geometry::{BoundingBox, FloatType, Ray, WorldPoint, WorldVector},
    util::{BLACK, Color},
};

use light::Light;
use material::{Flat, Material, MaterialRef};

pub type ObjectRef = Arc<dyn Object>;
pub type LightRef = Arc<dyn Light>;

/// A single ray-surface intersection.
#[derive(Copy, Clone)]
pub struct HitRecord<'a> {
    /// Ray parameter of the intersection
    pub t: FloatType,
    /// Unit surface normal, pointing out of the object
    pub normal: WorldVector,
    pub material: &'a dyn Material,
}

impl<'a> HitRecord<'a> {
    /// Picks the hit closer to the ray origin. Ties go to `a`.
    pub fn frontmost(a: Option<HitRecord<'a>>, b: Option<HitRecord<'a>>) -> Option<HitRecord<'a>> {
        match (a, b) {
            (Some(a), Some(b)) => Some(if b.t < a.t { b } else { a }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

impl fmt::Debug for HitRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitRecord")
            .field("t", &self.t)
            .field("normal", &self.normal)
            .finish_non_exhaustive()
    }
}

/// Renderable object.
///
/// Implemented by leaf shapes as well as by the boolean and grouping composites,
/// which hold their children as shared [`ObjectRef`]s.
pub trait Object: Send + Sync {
    /// Frontmost intersection strictly in front of the ray origin.
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>>;

    /// Tells whether the point lies inside the solid.
    /// Used only for constructive solid geometry.
    fn inside(&self, point: &WorldPoint) -> bool;

    fn bounds(&self) -> BoundingBox;

    fn into_ref(self) -> ObjectRef
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

/// Per-thread mutable state used while shading.
/// Never shared between workers.
pub struct ShadingContext {
    rng: SmallRng,
}

impl ShadingContext {
    pub fn new(seed: u64) -> Self {
        ShadingContext {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Restarts the random stream, dropping all previous state.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

/// Objects, lights and the ambient fallback.
/// Immutable while rendering, shared by all workers.
pub struct Scene {
    objects: Vec<ObjectRef>,
    lights: Vec<LightRef>,
    ambient: MaterialRef,
}

impl Scene {
    pub fn new() -> Scene {
        Scene {
            objects: Vec::new(),
            lights: Vec::new(),
            ambient: Arc::new(Flat::new(BLACK)),
        }
    }

    pub fn add(&mut self, object: ObjectRef) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: LightRef) {
        self.lights.push(light);
    }

    /// Material shaded for rays that escape the scene.
    pub fn set_ambient(&mut self, ambient: MaterialRef) {
        self.ambient = ambient;
    }

    pub fn objects(&self) -> &[ObjectRef] {
        &self.objects
    }

    pub fn lights(&self) -> &[LightRef] {
        &self.lights
    }

    pub fn bounds(&self) -> BoundingBox {
        self.objects
            .iter()
            .fold(BoundingBox::empty(), |acc, o| acc.union(&o.bounds()))
    }

    /// Closest hit with positive t among all objects, ties go to the earlier object.
    pub fn nearest_hit(&self, ray: &Ray) -> Option<HitRecord<'_>> {
        self.objects
            .iter()
            .filter_map(|o| o.intersect(ray))
            .filter(|hit| hit.t > 0.0)
            .min_by_key(|hit| OrderedFloat(hit.t))
    }

    /// Color seen along the ray, with at most `budget` levels of recursion.
    pub fn shade(&self, ctx: &mut ShadingContext, ray: &Ray, budget: u32) -> Color {
        if budget == 0 {
            return BLACK;
        }

        match self.nearest_hit(ray) {
            Some(hit) => hit.material.shade(self, ctx, ray, &hit, budget - 1),
            None => {
                let background = HitRecord {
                    t: FloatType::INFINITY,
                    normal: -ray.direction,
                    material: &*self.ambient,
                };
                self.ambient.shade(self, ctx, ray, &background, budget - 1)
            }
        }
    }

    /// Tells whether any object occludes the ray at positive t.
    pub fn intersect_any(&self, ray: &Ray) -> bool {
        self.intersect_any_within(ray, FloatType::INFINITY)
    }

    /// Tells whether any object occludes the ray with `0 < t < max_t`.
    pub fn intersect_any_within(&self, ray: &Ray, max_t: FloatType) -> bool {
        self.objects
            .iter()
            .any(|o| o.intersect(ray).is_some_and(|hit| hit.t > 0.0 && hit.t < max_t))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
