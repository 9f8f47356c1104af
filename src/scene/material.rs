use std::sync::Arc;

use assert2::assert;
use rand_distr::{Distribution as _, UnitSphere};

use crate::{
    geometry::{EPSILON, FloatType, Ray, WorldVector},
    util::{BLACK, Color, filter, gray},
};

use super::{HitRecord, Scene, ShadingContext};

pub type MaterialRef = Arc<dyn Material>;

/// Distance by which secondary rays are lifted off the surface they start from.
const SURFACE_OFFSET: FloatType = 1e-6;

/// Decides the color of a surface hit.
///
/// `budget` is the remaining recursion depth; materials that spawn secondary rays
/// pass it unchanged to [`Scene::shade`], which stops at zero.
pub trait Material: Send + Sync {
    fn shade(
        &self,
        scene: &Scene,
        ctx: &mut ShadingContext,
        ray: &Ray,
        hit: &HitRecord,
        budget: u32,
    ) -> Color;
}

/// Normal flipped to the side the ray arrived from.
fn facing_normal(ray: &Ray, hit: &HitRecord) -> WorldVector {
    if hit.normal.dot(&ray.direction) > 0.0 { -hit.normal } else { hit.normal }
}

/// Constant color, independent of lighting.
pub struct Flat {
    color: Color,
}

impl Flat {
    pub fn new(color: Color) -> Flat {
        Flat { color }
    }
}

impl Material for Flat {
    fn shade(
        &self,
        _scene: &Scene,
        _ctx: &mut ShadingContext,
        _ray: &Ray,
        _hit: &HitRecord,
        _budget: u32,
    ) -> Color {
        self.color
    }
}

/// Gray level given by the angle between the normal and a fixed direction.
pub struct ShadeNormal {
    direction: WorldVector,
}

impl ShadeNormal {
    pub fn new(direction: WorldVector) -> ShadeNormal {
        ShadeNormal {
            direction: direction.normalize(),
        }
    }
}

impl Material for ShadeNormal {
    fn shade(
        &self,
        _scene: &Scene,
        _ctx: &mut ShadingContext,
        _ray: &Ray,
        hit: &HitRecord,
        _budget: u32,
    ) -> Color {
        gray(hit.normal.dot(&self.direction).abs() as f32)
    }
}

/// Lambertian surface.
///
/// Direct light is gathered with one shadow ray per light, indirect light
/// with a single cosine-weighted bounce.
pub struct Diffuse {
    reflectance: Color,
    indirect: bool,
}

impl Diffuse {
    pub fn new(reflectance: Color) -> Diffuse {
        Diffuse {
            reflectance,
            indirect: true,
        }
    }

    /// Diffuse surface lit only directly by the scene lights.
    pub fn direct_only(reflectance: Color) -> Diffuse {
        Diffuse {
            reflectance,
            indirect: false,
        }
    }
}

impl Material for Diffuse {
    fn shade(
        &self,
        scene: &Scene,
        ctx: &mut ShadingContext,
        ray: &Ray,
        hit: &HitRecord,
        budget: u32,
    ) -> Color {
        let normal = facing_normal(ray, hit);
        let point = ray.point_at(hit.t) + normal * SURFACE_OFFSET;

        let mut acc = BLACK;
        for light in scene.lights() {
            let sample = light.sample(ctx, &point);
            let to_light = sample.position - point;
            let distance = to_light.norm();
            if !(distance > EPSILON) {
                continue;
            }

            let direction = to_light / distance;
            let cos = normal.dot(&direction);
            if cos <= 0.0 || scene.intersect_any_within(&Ray::new(point, direction), distance) {
                continue;
            }

            acc = acc + sample.flux * (cos / (distance * distance)) as f32;
        }

        if self.indirect && budget > 0 {
            let offset: [FloatType; 3] = UnitSphere.sample(ctx.rng());
            let direction = normal + WorldVector::from(offset);
            if direction.norm_squared() > EPSILON {
                acc = acc + scene.shade(ctx, &Ray::new(point, direction.normalize()), budget);
            }
        }

        filter(acc, self.reflectance)
    }
}

/// Mirror reflection of the ray off the hit surface, starting just above it.
fn mirror_ray(ray: &Ray, hit: &HitRecord) -> Ray {
    let normal = facing_normal(ray, hit);
    let point = ray.point_at(hit.t) + normal * SURFACE_OFFSET;
    Ray::new(point, reflect(&ray.direction, &normal))
}

fn reflect(direction: &WorldVector, normal: &WorldVector) -> WorldVector {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Mirror, tinted by `color`.
pub struct Reflective {
    color: Color,
}

impl Reflective {
    pub fn new(color: Color) -> Reflective {
        Reflective { color }
    }
}

impl Material for Reflective {
    fn shade(
        &self,
        scene: &Scene,
        ctx: &mut ShadingContext,
        ray: &Ray,
        hit: &HitRecord,
        budget: u32,
    ) -> Color {
        filter(scene.shade(ctx, &mirror_ray(ray, hit), budget), self.color)
    }
}

/// Blurry mirror. The reflected direction is perturbed by a random vector of
/// length up to `jitter` on the outer side of the surface.
pub struct GlossyReflective {
    color: Color,
    jitter: FloatType,
}

impl GlossyReflective {
    pub fn new(color: Color, jitter: FloatType) -> GlossyReflective {
        assert!(jitter >= 0.0);
        GlossyReflective { color, jitter }
    }
}

impl Material for GlossyReflective {
    fn shade(
        &self,
        scene: &Scene,
        ctx: &mut ShadingContext,
        ray: &Ray,
        hit: &HitRecord,
        budget: u32,
    ) -> Color {
        let mirrored = mirror_ray(ray, hit);
        let normal = facing_normal(ray, hit);

        let offset: [FloatType; 3] = UnitSphere.sample(ctx.rng());
        let offset = WorldVector::from(offset);
        let offset = if offset.dot(&normal) < 0.0 { -offset } else { offset };
        let direction = mirrored.direction + offset * self.jitter;
        if !(direction.norm_squared() > EPSILON) {
            return BLACK;
        }

        filter(scene.shade(ctx, &Ray::new(mirrored.origin, direction), budget), self.color)
    }
}

/// Reflectance of a dielectric interface for unpolarized light, going from
/// index `n1` to `n2` with `cos_incident` the cosine of the angle of incidence.
pub fn fresnel_reflection(n1: FloatType, n2: FloatType, cos_incident: FloatType) -> FloatType {
    let ratio = n1 / n2;
    let sin2_transmitted = ratio * ratio * (1.0 - cos_incident * cos_incident);
    if sin2_transmitted >= 1.0 {
        // Total internal reflection
        return 1.0;
    }
    let cos_transmitted = (1.0 - sin2_transmitted).sqrt();

    let (a, b) = (n1 * cos_incident, n2 * cos_transmitted);
    let parallel = (a - b) / (a + b);
    let (c, d) = (n1 * cos_transmitted, n2 * cos_incident);
    let perpendicular = (c - d) / (c + d);
    0.5 * (parallel * parallel + perpendicular * perpendicular)
}

/// Transparent coating with refractive index `n` over a `base` material,
/// like varnish or a film of water. Reflection gets stronger towards grazing angles.
pub struct ReflectFresnel {
    n: FloatType,
    base: MaterialRef,
}

impl ReflectFresnel {
    pub fn new(n: FloatType, base: MaterialRef) -> ReflectFresnel {
        assert!(n > 0.0);
        ReflectFresnel { n, base }
    }
}

impl Material for ReflectFresnel {
    fn shade(
        &self,
        scene: &Scene,
        ctx: &mut ShadingContext,
        ray: &Ray,
        hit: &HitRecord,
        budget: u32,
    ) -> Color {
        let cos = hit.normal.dot(&ray.direction.normalize()).abs();
        let reflectance = fresnel_reflection(1.0, self.n, cos) as f32;

        let transmitted = self.base.shade(scene, ctx, ray, hit, budget);
        let reflected = scene.shade(ctx, &mirror_ray(ray, hit), budget);
        reflected * reflectance + transmitted * (1.0 - reflectance)
    }
}

/// Sum of two materials, e.g. a diffuse base under a partial mirror.
pub struct Blend {
    a: MaterialRef,
    b: MaterialRef,
}

impl Blend {
    pub fn new(a: MaterialRef, b: MaterialRef) -> Blend {
        Blend { a, b }
    }
}

impl Material for Blend {
    fn shade(
        &self,
        scene: &Scene,
        ctx: &mut ShadingContext,
        ray: &Ray,
        hit: &HitRecord,
        budget: u32,
    ) -> Color {
        self.a.shade(scene, ctx, ray, hit, budget) + self.b.shade(scene, ctx, ray, hit, budget)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        geometry::WorldPoint,
        scene::{Object as _, light::PointLight, primitives::Sphere},
        util::WHITE,
    };
    use assert2::{assert, let_assert};
    use test_case::test_case;

    pub(crate) fn same_material(hit: &HitRecord, material: &MaterialRef) -> bool {
        std::ptr::addr_eq(hit.material, Arc::as_ptr(material))
    }

    fn head_on(scene: &Scene) -> Color {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, 1.0));
        scene.shade(&mut ShadingContext::new(1), &ray, 4)
    }

    fn lit_scene(material: MaterialRef) -> Scene {
        let mut scene = Scene::new();
        scene.add(Sphere::new(WorldPoint::new(0.0, 0.0, 3.0), 1.0, material).into_ref());
        scene.add_light(Arc::new(PointLight::new(WorldPoint::new(0.0, 0.0, 0.0), gray(4.0))));
        scene
    }

    #[test]
    fn shade_normal_is_absolute_cosine() {
        let mut scene = Scene::new();
        scene.add(
            Sphere::new(
                WorldPoint::new(0.0, 0.0, 3.0),
                1.0,
                Arc::new(ShadeNormal::new(WorldVector::new(0.0, 0.0, 2.0))),
            )
            .into_ref(),
        );
        assert!(head_on(&scene) == WHITE);
    }

    #[test]
    fn diffuse_inverse_square() {
        // Light at the camera, surface 2 units away facing it
        let scene = lit_scene(Arc::new(Diffuse::direct_only(Color::new(0.5, 1.0, 0.0))));
        let color = head_on(&scene);
        assert!((color.r - 0.5).abs() < 1e-5);
        assert!((color.g - 1.0).abs() < 1e-5);
        assert!(color.b == 0.0);
    }

    #[test]
    fn diffuse_in_shadow_is_dark() {
        let mut scene = lit_scene(Arc::new(Diffuse::direct_only(WHITE)));
        let blocker = Sphere::new(WorldPoint::new(0.0, 0.0, 1.0), 0.1, Arc::new(Flat::new(BLACK)));
        scene.add(blocker.into_ref());

        // Start past the blocker so that only the shadow ray meets it
        let ray = Ray::new(WorldPoint::new(0.0, 0.0, 1.5), WorldVector::new(0.0, 0.0, 1.0));
        let mut ctx = ShadingContext::new(0);
        let_assert!(Some(hit) = scene.nearest_hit(&ray));
        assert!((hit.t - 0.5).abs() < 1e-9);
        assert!(scene.shade(&mut ctx, &ray, 1) == BLACK);
    }

    #[test]
    fn mirror_sees_ambient() {
        let mut scene = lit_scene(Arc::new(Reflective::new(Color::new(1.0, 0.5, 0.25))));
        scene.set_ambient(Arc::new(Flat::new(gray(0.5))));
        assert!(head_on(&scene) == Color::new(0.5, 0.25, 0.125));
    }

    #[test]
    fn mirror_without_budget_is_black() {
        let mut scene = lit_scene(Arc::new(Reflective::new(WHITE)));
        scene.set_ambient(Arc::new(Flat::new(WHITE)));
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, 1.0));
        assert!(scene.shade(&mut ShadingContext::new(0), &ray, 1) == BLACK);
        assert!(scene.shade(&mut ShadingContext::new(0), &ray, 2) == WHITE);
    }

    #[test]
    fn fresnel_limits() {
        let normal = fresnel_reflection(1.0, 1.5, 1.0);
        assert!((normal - 0.04).abs() < 1e-12);
        assert!((fresnel_reflection(1.0, 1.5, 0.0) - 1.0).abs() < 1e-12);
        assert!(fresnel_reflection(1.0, 1.5, 0.5) > normal);
        assert!(fresnel_reflection(1.5, 1.0, 0.1) == 1.0);
    }

    #[test_case(1.33 ; "water")]
    #[test_case(1.5 ; "glass")]
    #[test_case(20.0 ; "metal")]
    fn fresnel_at_normal_incidence(n: FloatType) {
        let expected = ((n - 1.0) / (n + 1.0)).powi(2);
        assert!((fresnel_reflection(1.0, n, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn fresnel_coating_mixes_reflection_and_base() {
        let coated = ReflectFresnel::new(1.5, Arc::new(Flat::new(Color::new(0.0, 1.0, 0.0))));
        let mut scene = lit_scene(Arc::new(coated));
        scene.set_ambient(Arc::new(Flat::new(Color::new(1.0, 0.0, 0.0))));

        let color = head_on(&scene);
        assert!((color.r - 0.04).abs() < 1e-6);
        assert!((color.g - 0.96).abs() < 1e-6);
        assert!(color.b == 0.0);
    }

    /// Ambient whose brightness is the x component of the escaping ray direction
    fn sideways_ambient(material: MaterialRef) -> Scene {
        let mut scene = lit_scene(material);
        scene.set_ambient(Arc::new(ShadeNormal::new(WorldVector::x())));
        scene
    }

    fn glossy_samples(jitter: FloatType) -> Vec<f32> {
        let scene = sideways_ambient(Arc::new(GlossyReflective::new(WHITE, jitter)));
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, 1.0));
        (0..64)
            .map(|seed| scene.shade(&mut ShadingContext::new(seed), &ray, 4).r)
            .collect()
    }

    #[test]
    fn glossy_without_jitter_is_a_mirror() {
        let tint = Color::new(1.0, 0.5, 0.25);
        let glossy = sideways_ambient(Arc::new(GlossyReflective::new(tint, 0.0)));
        let mirror = sideways_ambient(Arc::new(Reflective::new(tint)));
        assert!(head_on(&glossy) == head_on(&mirror));
    }

    #[test]
    fn glossy_is_reproducible_per_seed() {
        assert!(glossy_samples(0.3) == glossy_samples(0.3));
    }

    #[test]
    fn glossy_spread_follows_jitter() {
        // Straight back from the sphere the mirror sees no x component at all
        let mean = |samples: &[f32]| samples.iter().sum::<f32>() / samples.len() as f32;
        let tight = glossy_samples(0.05);
        let wide = glossy_samples(0.5);

        assert!(tight.iter().all(|&v| (0.0..=0.05).contains(&v)));
        assert!(tight.iter().any(|&v| v > 0.0));
        assert!(mean(&tight) < mean(&wide));
    }

    #[test]
    fn blend_adds() {
        let blend = Blend::new(
            Arc::new(Flat::new(gray(0.25))),
            Arc::new(Flat::new(Color::new(0.5, 0.0, 0.0))),
        );
        let scene = lit_scene(Arc::new(blend));
        assert!(head_on(&scene) == Color::new(0.75, 0.25, 0.25));
    }
}
