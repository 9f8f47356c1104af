//! Ready-made scenes for the command line tool and the benchmark.

use std::sync::Arc;

use nalgebra::Isometry3;

use crate::{
    camera::Camera,
    geometry::{FloatType, WorldPoint, WorldVector},
    scene::{
        Object as _, ObjectRef, Scene,
        composite::{Group, Transformed},
        csg::{and, difference, or, remove},
        light::{PointLight, SphereLight},
        material::{Blend, Diffuse, Flat, GlossyReflective, MaterialRef, ReflectFresnel, Reflective},
        primitives::{Cuboid, Plane, Sphere},
    },
    util::{Color, gray},
};

pub struct Demo {
    pub scene: Scene,
    pub camera: Camera,
}

fn camera_looking_at(eye: WorldPoint, target: WorldPoint) -> Camera {
    Camera::builder()
        .focal_length(1.0)
        .placement(Isometry3::face_towards(&eye, &target, &WorldVector::y()))
        .build()
}

fn floor(y: FloatType, material: MaterialRef) -> ObjectRef {
    Plane::new(WorldPoint::new(0.0, y, 0.0), WorldVector::y(), material).into_ref()
}

/// Intersection of two spheres, lit by a single point light.
pub fn lens() -> Demo {
    let glass: MaterialRef = Arc::new(Diffuse::direct_only(Color::new(0.9, 0.8, 0.3)));

    let mut scene = Scene::new();
    scene.add(and(
        Sphere::new(WorldPoint::new(-0.5, 0.0, 0.0), 1.0, glass.clone()).into_ref(),
        Sphere::new(WorldPoint::new(0.5, 0.0, 0.0), 1.0, glass).into_ref(),
    ));
    scene.add_light(Arc::new(PointLight::new(WorldPoint::new(3.0, 4.0, -5.0), gray(60.0))));
    scene.set_ambient(Arc::new(Flat::new(Color::new(0.05, 0.05, 0.1))));

    Demo {
        scene,
        camera: camera_looking_at(WorldPoint::new(0.0, 0.0, -4.0), WorldPoint::origin()),
    }
}

/// Pip positions on the six faces of a unit die, in die coordinates.
fn pips() -> Vec<WorldPoint> {
    let d = 0.5;
    let face = |count: usize| -> Vec<(FloatType, FloatType)> {
        let all = [(-d, -d), (d, d), (-d, d), (d, -d), (-d, 0.0), (d, 0.0)];
        match count {
            1 => vec![(0.0, 0.0)],
            2 => all[..2].to_vec(),
            3 => vec![(-d, -d), (0.0, 0.0), (d, d)],
            4 => all[..4].to_vec(),
            5 => all[..4].iter().copied().chain([(0.0, 0.0)]).collect(),
            _ => all.to_vec(),
        }
    };

    let mut ret = Vec::new();
    ret.extend(face(1).into_iter().map(|(a, b)| WorldPoint::new(a, b, -1.0)));
    ret.extend(face(6).into_iter().map(|(a, b)| WorldPoint::new(a, b, 1.0)));
    ret.extend(face(2).into_iter().map(|(a, b)| WorldPoint::new(-1.0, a, b)));
    ret.extend(face(5).into_iter().map(|(a, b)| WorldPoint::new(1.0, a, b)));
    ret.extend(face(3).into_iter().map(|(a, b)| WorldPoint::new(a, 1.0, b)));
    ret.extend(face(4).into_iter().map(|(a, b)| WorldPoint::new(a, -1.0, b)));
    ret
}

fn die(material: &MaterialRef, pip_material: &MaterialRef) -> ObjectRef {
    let body = and(
        Cuboid::new(
            WorldPoint::new(-1.0, -1.0, -1.0),
            WorldPoint::new(1.0, 1.0, 1.0),
            material.clone(),
        )
        .into_ref(),
        Sphere::new(WorldPoint::origin(), 1.35, material.clone()).into_ref(),
    );
    let holes = pips()
        .into_iter()
        .map(|center| Sphere::new(center, 0.18, pip_material.clone()).into_ref())
        .reduce(or)
        .unwrap_or_else(|| Group::new(Vec::new()).into_ref());
    difference(body, holes)
}

/// Two dice with drilled pips next to a mirror ball, on a diffuse floor.
pub fn dice() -> Demo {
    let ivory: MaterialRef = Arc::new(Diffuse::new(gray(0.8)));
    let red: MaterialRef = Arc::new(Diffuse::new(Color::new(0.8, 0.1, 0.1)));
    let dark: MaterialRef = Arc::new(Diffuse::new(gray(0.05)));
    let mirror: MaterialRef = Arc::new(Blend::new(
        Arc::new(Reflective::new(gray(0.7))),
        Arc::new(Diffuse::direct_only(gray(0.1))),
    ));

    let mut scene = Scene::new();
    scene.add(floor(-1.0, Arc::new(Diffuse::new(gray(0.5)))));
    scene.add(
        Transformed::translated(die(&ivory, &dark), WorldVector::new(-1.3, 0.0, 0.5)).into_ref(),
    );
    scene.add(
        Transformed::translated(
            Transformed::rotated(die(&red, &dark), WorldVector::y_axis(), 0.6).into_ref(),
            WorldVector::new(1.4, 0.0, 1.5),
        )
        .into_ref(),
    );
    scene.add(Sphere::new(WorldPoint::new(0.2, -0.4, -1.2), 0.6, mirror).into_ref());
    scene.add_light(Arc::new(PointLight::new(WorldPoint::new(-3.0, 6.0, -4.0), gray(80.0))));
    scene.set_ambient(Arc::new(Flat::new(Color::new(0.2, 0.25, 0.35))));

    Demo {
        scene,
        camera: camera_looking_at(WorldPoint::new(0.0, 3.0, -6.0), WorldPoint::new(0.0, -0.3, 0.5)),
    }
}

/// Varnished, brushed and bitten spheres under a spherical light, showing soft shadows.
pub fn soft() -> Demo {
    let white: MaterialRef = Arc::new(Diffuse::new(gray(0.8)));
    let blue: MaterialRef = Arc::new(Diffuse::new(Color::new(0.2, 0.3, 0.8)));

    let varnished: MaterialRef = Arc::new(ReflectFresnel::new(1.5, white.clone()));
    let brushed: MaterialRef = Arc::new(GlossyReflective::new(gray(0.6), 0.2));

    let mut scene = Scene::new();
    scene.add(floor(-1.0, white));
    scene.add(Sphere::new(WorldPoint::new(-1.2, 0.0, 1.0), 1.0, varnished).into_ref());
    scene.add(Sphere::new(WorldPoint::new(0.0, -0.6, -0.6), 0.4, brushed).into_ref());
    // A ball with a bite taken out, leaving the hole open
    scene.add(remove(
        Sphere::new(WorldPoint::new(1.2, 0.0, 1.0), 1.0, blue.clone()).into_ref(),
        Sphere::new(WorldPoint::new(0.6, 0.6, 0.2), 0.7, blue).into_ref(),
    ));
    scene.add_light(Arc::new(SphereLight::new(WorldPoint::new(0.0, 4.0, 0.0), 1.0, gray(30.0))));

    Demo {
        scene,
        camera: camera_looking_at(WorldPoint::new(0.0, 2.0, -5.0), WorldPoint::new(0.0, 0.0, 1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::Ray,
        scene::ShadingContext,
        util::{BLACK, is_finite},
    };
    use assert2::{assert, let_assert};

    #[test]
    fn every_die_face_has_its_pips() {
        assert!(pips().len() == 1 + 2 + 3 + 4 + 5 + 6);
        assert!(pips().iter().all(|p| p.coords.amax() == 1.0));
    }

    #[test]
    fn drilled_die() {
        let ivory: MaterialRef = Arc::new(Flat::new(gray(0.8)));
        let dark: MaterialRef = Arc::new(Flat::new(BLACK));
        let die = die(&ivory, &dark);

        // Straight into the single pip on the front face
        let ray = Ray::new(WorldPoint::new(0.0, 0.0, -5.0), WorldVector::z());
        let_assert!(Some(hit) = die.intersect(&ray));
        assert!(hit.t > 4.0);
        assert!(hit.normal.z < 0.0);
        assert!(!die.inside(&WorldPoint::new(0.0, 0.0, -0.95)));
        assert!(die.inside(&WorldPoint::origin()));
    }

    #[test]
    fn demos_shade_finite_colors() {
        for demo in [lens(), dice(), soft()] {
            let mut ctx = ShadingContext::new(3);
            for (x, y) in [(0, 0), (16, 16), (31, 31), (8, 24)] {
                let ray = demo.camera.ray_for(x, y, 32, 32, [0.5, 0.5]);
                assert!(is_finite(demo.scene.shade(&mut ctx, &ray, 4)));
            }
        }
    }

    #[test]
    fn lens_is_in_view() {
        let demo = lens();
        let ray = demo.camera.ray_for(16, 16, 32, 32, [0.0, 0.0]);
        assert!(demo.scene.nearest_hit(&ray).is_some());
    }
}
