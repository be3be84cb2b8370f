use glam::{Affine3A, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Same extents, moved so the center sits at the local origin.
    pub fn centered(&self) -> Self {
        Self::from_center_half_extents(Vec3::ZERO, self.half_extents())
    }

    /// Overlap test. Touching faces count as overlapping.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Slab test for the ray `origin + t * dir`. Same conventions as
    /// [`PickVolume::intersect`].
    pub fn intersect_ray(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let mut near = f32::NEG_INFINITY;
        let mut far = f32::INFINITY;
        for axis in 0..3 {
            let (o, d) = (origin[axis], dir[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() <= f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (t0, t1) = ((lo - o) / d, (hi - o) / d);
            near = near.max(t0.min(t1));
            far = far.min(t0.max(t1));
            if near > far {
                return None;
            }
        }
        nearest_non_negative(near, far)
    }

    /// World-space box enclosing this box after `transform`.
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = transform.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

/// Local-space shape a pick ray is tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickVolume {
    /// Radius reported with the model; exact for round bodies.
    Sphere { center: Vec3, radius: f32 },
    Box(Aabb),
}

impl PickVolume {
    /// Smallest `t >= 0` where `origin + t * dir` touches the volume. `dir`
    /// need not be unit length; `t` is measured in multiples of it. An
    /// origin inside the volume reports the exit point.
    pub fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        match *self {
            PickVolume::Sphere { center, radius } => {
                let a = dir.length_squared();
                if a <= f32::EPSILON {
                    return None;
                }
                let oc = origin - center;
                let b = oc.dot(dir);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - a * c;
                if disc < 0.0 {
                    return None;
                }
                let sq = disc.sqrt();
                nearest_non_negative((-b - sq) / a, (-b + sq) / a)
            }
            PickVolume::Box(aabb) => aabb.intersect_ray(origin, dir),
        }
    }
}

fn nearest_non_negative(t0: f32, t1: f32) -> Option<f32> {
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

/// A drawable mesh node's geometry summary.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshComponent {
    /// Name of the mesh inside its model.
    pub name: String,
    /// Local-space bounds.
    pub bounds: Aabb,
    /// Body this mesh belongs to. Only tagged meshes are pickable.
    pub body: Option<String>,
    pub material: Option<String>,
    /// Picking radius around the bounds centre, when the model reports one.
    pub pick_radius: Option<f32>,
}

impl MeshComponent {
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            bounds,
            body: None,
            material: None,
            pick_radius: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_material(mut self, material: Option<String>) -> Self {
        self.material = material;
        self
    }

    pub fn with_pick_radius(mut self, radius: Option<f32>) -> Self {
        self.pick_radius = radius.filter(|r| *r > 0.0);
        self
    }

    /// What the pointer ray is tested against: the reported sphere, or the
    /// bounds themselves.
    pub fn pick_volume(&self) -> PickVolume {
        match self.pick_radius {
            Some(radius) => PickVolume::Sphere {
                center: self.bounds.center(),
                radius,
            },
            None => PickVolume::Box(self.bounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn aabb_overlap() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_half_extents(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = Aabb::from_center_half_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::ONE);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn centered_keeps_extents() {
        let a = Aabb::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(4.0, 6.0, 8.0));
        let c = a.centered();
        assert_eq!(c.center(), Vec3::ZERO);
        assert_eq!(c.half_extents(), a.half_extents());
    }

    #[test]
    fn rotated_box_grows() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(2.0, 0.5, 0.5));
        let rot = Affine3A::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let r = a.transformed(&rot);
        assert!(r.half_extents().z > 1.0);
    }

    #[test]
    fn box_ray_hits_face() {
        let b = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let t = b.intersect_ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(t.map_or(false, |t| (t - 4.0).abs() < 1e-5));
    }

    #[test]
    fn box_ray_near_miss() {
        let b = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        assert!(b.intersect_ray(Vec3::new(-5.0, 1.5, 0.0), Vec3::X).is_none());
        // Parallel to a slab and outside it.
        assert!(b.intersect_ray(Vec3::new(-5.0, 0.0, 2.0), Vec3::X).is_none());
        // Pointing away.
        assert!(b.intersect_ray(Vec3::new(-5.0, 0.0, 0.0), -Vec3::X).is_none());
    }

    #[test]
    fn inside_box_reports_exit() {
        let b = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let t = b.intersect_ray(Vec3::ZERO, Vec3::Y);
        assert!(t.map_or(false, |t| (t - 1.0).abs() < 1e-5));
    }

    #[test]
    fn sphere_volume_is_tighter_than_box() {
        let from = Vec3::new(-5.0, 0.9, 0.9);
        let sphere = PickVolume::Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let cube = PickVolume::Box(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        assert!(sphere.intersect(from, Vec3::X).is_none());
        assert!(cube.intersect(from, Vec3::X).is_some());
    }

    #[test]
    fn sphere_scaled_direction() {
        let sphere = PickVolume::Sphere {
            center: Vec3::new(10.0, 0.0, 0.0),
            radius: 2.0,
        };
        // Half-length direction doubles the parameter.
        let t = sphere.intersect(Vec3::ZERO, Vec3::X * 0.5);
        assert!(t.map_or(false, |t| (t - 16.0).abs() < 1e-4));
    }

    #[test]
    fn reported_radius_selects_sphere() {
        let bounds = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let m = MeshComponent::new("planet", bounds);
        assert_eq!(m.pick_volume(), PickVolume::Box(bounds));
        let m = m.with_pick_radius(Some(1.0));
        assert!(matches!(m.pick_volume(), PickVolume::Sphere { radius, .. } if radius == 1.0));
        assert_eq!(MeshComponent::new("x", bounds).with_pick_radius(Some(0.0)).pick_radius, None);
    }
}
