use assert2::let_assert;
use nalgebra::{Affine3, Matrix3, Matrix4, Unit};
use ordered_float::OrderedFloat;

use crate::geometry::{BoundingBox, FloatType, Ray, WorldPoint, WorldVector};

use super::{HitRecord, Object, ObjectRef, material::MaterialRef};

/// Plain collection of objects, without any boolean semantics.
/// Rays missing the combined bounding box skip all children.
pub struct Group {
    children: Vec<ObjectRef>,
    bounds: BoundingBox,
}

impl Group {
    pub fn new(children: Vec<ObjectRef>) -> Group {
        let bounds = children
            .iter()
            .fold(BoundingBox::empty(), |acc, child| acc.union(&child.bounds()));
        Group { children, bounds }
    }
}

impl Object for Group {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        if self.bounds.is_bounded() {
            let range = self.bounds.intersect(ray);
            if range.is_empty() || range.max <= 0.0 {
                return None;
            }
        }

        self.children
            .iter()
            .filter_map(|child| child.intersect(ray))
            .min_by_key(|hit| OrderedFloat(hit.t))
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        self.children.iter().any(|child| child.inside(point))
    }

    fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}

/// Object placed in the world by an affine transformation.
pub struct Transformed {
    inner: ObjectRef,
    transform: Affine3<FloatType>,
    inverse: Affine3<FloatType>,
    /// Inverse transpose of the linear part, maps local normals to world normals
    normal_matrix: Matrix3<FloatType>,
}

impl Transformed {
    /// Panics if the transformation is not invertible.
    pub fn new(inner: ObjectRef, transform: Affine3<FloatType>) -> Transformed {
        let_assert!(Some(inverse) = transform.try_inverse());
        let normal_matrix = inverse.matrix().fixed_view::<3, 3>(0, 0).transpose();
        Transformed {
            inner,
            transform,
            inverse,
            normal_matrix,
        }
    }

    pub fn translated(inner: ObjectRef, offset: WorldVector) -> Transformed {
        Self::from_parts(
            inner,
            Matrix4::new_translation(&offset),
            Matrix4::new_translation(&-offset),
        )
    }

    pub fn rotated(inner: ObjectRef, axis: Unit<WorldVector>, angle: FloatType) -> Transformed {
        Self::from_parts(
            inner,
            Matrix4::from_axis_angle(&axis, angle),
            Matrix4::from_axis_angle(&axis, -angle),
        )
    }

    fn from_parts(
        inner: ObjectRef,
        matrix: Matrix4<FloatType>,
        inverse: Matrix4<FloatType>,
    ) -> Transformed {
        let inverse = Affine3::from_matrix_unchecked(inverse);
        let normal_matrix = inverse.matrix().fixed_view::<3, 3>(0, 0).transpose();
        Transformed {
            inner,
            transform: Affine3::from_matrix_unchecked(matrix),
            inverse,
            normal_matrix,
        }
    }
}

impl Object for Transformed {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        // The local direction is not renormalized so that t stays the same in both frames
        let local = Ray::new(
            self.inverse.transform_point(&ray.origin),
            self.inverse.transform_vector(&ray.direction),
        );
        let hit = self.inner.intersect(&local)?;
        Some(HitRecord {
            normal: (self.normal_matrix * hit.normal).normalize(),
            ..hit
        })
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        self.inner.inside(&self.inverse.transform_point(point))
    }

    fn bounds(&self) -> BoundingBox {
        let inner = self.inner.bounds();
        if inner.is_empty() {
            return inner;
        }
        if !inner.is_bounded() {
            return BoundingBox::unbounded();
        }
        BoundingBox::from_points(inner.corners().map(|p| self.transform.transform_point(&p)))
            .unwrap_or_else(BoundingBox::empty)
    }
}

/// Same shape as `inner`, but every hit reports `material`.
pub struct WithMaterial {
    inner: ObjectRef,
    material: MaterialRef,
}

impl WithMaterial {
    pub fn new(inner: ObjectRef, material: MaterialRef) -> WithMaterial {
        WithMaterial { inner, material }
    }
}

impl Object for WithMaterial {
    fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        self.inner.intersect(ray).map(|hit| HitRecord {
            t: hit.t,
            normal: hit.normal,
            material: &*self.material,
        })
    }

    fn inside(&self, point: &WorldPoint) -> bool {
        self.inner.inside(point)
    }

    fn bounds(&self) -> BoundingBox {
        self.inner.bounds()
    }
}

#[cfg(test)]
mod tests {
    use std::{f64::consts::FRAC_PI_2, sync::Arc};

    use super::*;
    use crate::{
        scene::{
            csg::difference,
            material::{Flat, MaterialRef, tests::same_material},
            primitives::{Cuboid, Sphere},
        },
        util::WHITE,
    };
    use assert2::{assert, let_assert};

    fn material() -> MaterialRef {
        Arc::new(Flat::new(WHITE))
    }

    fn forward_ray(x: FloatType) -> Ray {
        Ray::new(WorldPoint::new(x, 0.0, 0.0), WorldVector::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn group_returns_nearest_child() {
        let near = material();
        let far = material();
        let group = Group::new(vec![
            Sphere::new(WorldPoint::new(0.0, 0.0, 10.0), 1.0, far).into_ref(),
            Sphere::new(WorldPoint::new(0.0, 0.0, 5.0), 1.0, near.clone()).into_ref(),
        ]);

        let_assert!(Some(hit) = group.intersect(&forward_ray(0.0)));
        assert!((hit.t - 4.0).abs() < 1e-9);
        assert!(same_material(&hit, &near));
        assert!(group.intersect(&forward_ray(3.0)).is_none());
        assert!(group.inside(&WorldPoint::new(0.0, 0.0, 10.5)));
        let expected =
            BoundingBox::new(WorldPoint::new(-1.0, -1.0, 4.0), WorldPoint::new(1.0, 1.0, 11.0));
        assert!(group.bounds() == expected);
    }

    #[test]
    fn group_behind_ray_is_skipped() {
        let behind = Sphere::new(WorldPoint::new(0.0, 0.0, -5.0), 1.0, material());
        let group = Group::new(vec![behind.into_ref()]);
        assert!(group.intersect(&forward_ray(0.0)).is_none());
    }

    #[test]
    fn with_material_overrides_every_part() {
        let cuboid_material = material();
        let bite_material = material();
        let paint = material();
        let cuboid = Cuboid::new(
            WorldPoint::new(-1.0, -1.0, 4.0),
            WorldPoint::new(1.0, 1.0, 6.0),
            cuboid_material,
        );
        let bite = Sphere::new(WorldPoint::new(0.0, 0.0, 4.0), 0.5, bite_material.clone());
        let bitten = difference(cuboid.into_ref(), bite.into_ref());
        let_assert!(Some(cut) = bitten.intersect(&forward_ray(0.0)));
        assert!(same_material(&cut, &bite_material));

        let painted = WithMaterial::new(bitten.clone(), paint.clone());
        let_assert!(Some(hit) = painted.intersect(&forward_ray(0.0)));
        assert!(hit.t == cut.t);
        assert!(hit.normal == cut.normal);
        assert!(same_material(&hit, &paint));

        let_assert!(Some(side) = painted.intersect(&forward_ray(0.8)));
        assert!((side.t - 4.0).abs() < 1e-9);
        assert!(same_material(&side, &paint));

        assert!(painted.inside(&WorldPoint::new(0.0, 0.0, 5.0)));
        assert!(!painted.inside(&WorldPoint::new(0.0, 0.0, 4.2)));
        assert!(painted.bounds() == bitten.bounds());
    }

    #[test]
    fn empty_group() {
        let group = Group::new(Vec::new());
        assert!(group.bounds().is_empty());
        assert!(group.intersect(&forward_ray(0.0)).is_none());
    }

    #[test]
    fn translated_sphere() {
        let sphere = Sphere::new(WorldPoint::origin(), 1.0, material()).into_ref();
        let moved = Transformed::translated(sphere, WorldVector::new(2.0, 0.0, 5.0));

        let_assert!(Some(hit) = moved.intersect(&forward_ray(2.0)));
        assert!((hit.t - 4.0).abs() < 1e-9);
        assert!((hit.normal - WorldVector::new(0.0, 0.0, -1.0)).norm() < 1e-9);
        assert!(moved.inside(&WorldPoint::new(2.0, 0.0, 5.0)));
        assert!(!moved.inside(&WorldPoint::origin()));
    }

    #[test]
    fn scaled_sphere_keeps_world_t_and_unit_normals() {
        let sphere = Sphere::new(WorldPoint::origin(), 1.0, material()).into_ref();
        let stretched = Transformed::new(
            sphere,
            Affine3::from_matrix_unchecked(Matrix4::new_nonuniform_scaling(&WorldVector::new(
                1.0, 1.0, 2.0,
            ))),
        );

        let ray = Ray::new(WorldPoint::new(0.0, 0.0, -5.0), WorldVector::new(0.0, 0.0, 1.0));
        let_assert!(Some(hit) = stretched.intersect(&ray));
        assert!((hit.t - 3.0).abs() < 1e-9);
        assert!((hit.normal.norm() - 1.0).abs() < 1e-9);
        assert!(stretched.bounds().max.z == 2.0);
    }

    #[test]
    #[should_panic]
    fn singular_transform_is_rejected() {
        let sphere = Sphere::new(WorldPoint::origin(), 1.0, material()).into_ref();
        let squash = Matrix4::new_nonuniform_scaling(&WorldVector::new(1.0, 0.0, 1.0));
        let flat = Affine3::from_matrix_unchecked(squash);
        Transformed::new(sphere, flat);
    }

    #[test]
    fn rotated_box_bounds() {
        let cuboid = Cuboid::new(
            WorldPoint::new(-1.0, -2.0, -3.0),
            WorldPoint::new(1.0, 2.0, 3.0),
            material(),
        );
        let rotated = Transformed::rotated(cuboid.into_ref(), WorldVector::z_axis(), FRAC_PI_2);
        let bounds = rotated.bounds();
        assert!((bounds.min - WorldPoint::new(-2.0, -1.0, -3.0)).norm() < 1e-9);
        assert!((bounds.max - WorldPoint::new(2.0, 1.0, 3.0)).norm() < 1e-9);
    }
}
