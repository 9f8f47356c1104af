use rand_distr::{Distribution as _, UnitSphere};

use crate::{
    geometry::{FloatType, WorldPoint, WorldVector},
    util::Color,
};

use super::ShadingContext;

/// One point sampled on a light source.
#[derive(Copy, Clone, Debug)]
pub struct LightSample {
    pub position: WorldPoint,
    pub flux: Color,
}

pub trait Light: Send + Sync {
    /// Picks a point on the light, as seen from `target`.
    fn sample(&self, ctx: &mut ShadingContext, target: &WorldPoint) -> LightSample;
}

pub struct PointLight {
    position: WorldPoint,
    flux: Color,
}

impl PointLight {
    pub fn new(position: WorldPoint, flux: Color) -> PointLight {
        PointLight { position, flux }
    }
}

impl Light for PointLight {
    fn sample(&self, _ctx: &mut ShadingContext, _target: &WorldPoint) -> LightSample {
        LightSample {
            position: self.position,
            flux: self.flux,
        }
    }
}

/// Spherical light, sampled uniformly over its surface. Casts soft shadows.
pub struct SphereLight {
    center: WorldPoint,
    radius: FloatType,
    flux: Color,
}

impl SphereLight {
    pub fn new(center: WorldPoint, radius: FloatType, flux: Color) -> SphereLight {
        SphereLight { center, radius, flux }
    }
}

impl Light for SphereLight {
    fn sample(&self, ctx: &mut ShadingContext, _target: &WorldPoint) -> LightSample {
        let offset: [FloatType; 3] = UnitSphere.sample(ctx.rng());
        LightSample {
            position: self.center + WorldVector::from(offset) * self.radius,
            flux: self.flux,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::WHITE;
    use assert2::assert;

    #[test]
    fn sphere_light_samples_surface() {
        let light = SphereLight::new(WorldPoint::new(1.0, 2.0, 3.0), 0.5, WHITE);
        let mut ctx = ShadingContext::new(42);
        for _ in 0..100 {
            let sample = light.sample(&mut ctx, &WorldPoint::origin());
            assert!(((sample.position - light.center).norm() - 0.5).abs() < 1e-9);
            assert!(sample.flux == WHITE);
        }
    }

    #[test]
    fn sphere_light_is_reproducible() {
        let light = SphereLight::new(WorldPoint::origin(), 1.0, WHITE);
        let a = light.sample(&mut ShadingContext::new(7), &WorldPoint::origin());
        let b = light.sample(&mut ShadingContext::new(7), &WorldPoint::origin());
        assert!(a.position == b.position);
    }
}
