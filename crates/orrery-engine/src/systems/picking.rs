use glam::{Affine3A, Vec2};
use crate::components::mesh::PickVolume;
use crate::renderer::camera::PerspectiveCamera;

/// A pickable mesh: its local volume and where it sits in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct PickCandidate {
    pub body: String,
    pub volume: PickVolume,
    pub world: Affine3A,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub body: String,
    /// World-space distance from the eye.
    pub distance: f32,
}

/// Cast a ray from the camera through `pointer_ndc` and return the nearest
/// candidate it hits. On equal distances the earlier candidate wins.
///
/// The ray is moved into each candidate's local space, so rotation and
/// non-uniform scale are honoured exactly. Distances stay in world units
/// because the world ray direction is unit length.
pub fn hit_test(
    pointer_ndc: Vec2,
    camera: &PerspectiveCamera,
    candidates: &[PickCandidate],
) -> Option<PickHit> {
    let ray = camera.ray_from_ndc(pointer_ndc);
    let mut best: Option<PickHit> = None;
    for c in candidates {
        // Collapsed (zero-scale) meshes can't be hit.
        if c.world.matrix3.determinant().abs() <= f32::EPSILON {
            continue;
        }
        let to_local = c.world.inverse();
        let origin = to_local.transform_point3(ray.origin);
        let dir = to_local.transform_vector3(ray.direction);
        let Some(t) = c.volume.intersect(origin, dir) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| t < b.distance) {
            best = Some(PickHit {
                body: c.body.clone(),
                distance: t,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use crate::components::mesh::Aabb;
    use crate::renderer::camera::CameraConfig;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), 1.0)
    }

    fn at(body: &str, center: Vec3, radius: f32) -> PickCandidate {
        PickCandidate {
            body: body.into(),
            volume: PickVolume::Sphere {
                center: Vec3::ZERO,
                radius,
            },
            world: Affine3A::from_translation(center),
        }
    }

    fn ndc_of(cam: &PerspectiveCamera, p: Vec3) -> Vec2 {
        let c = cam.view_projection().project_point3(p);
        Vec2::new(c.x, c.y)
    }

    /// Offset `p` sideways (perpendicular to the view) by `by` world units.
    fn beside(cam: &PerspectiveCamera, p: Vec3, by: f32) -> Vec3 {
        let view_dir = (p - cam.position).normalize();
        p + view_dir.cross(Vec3::Y).normalize() * by
    }

    #[test]
    fn nearest_wins() {
        let cam = camera();
        // Two bodies on the line of sight to the origin; `near` is closer to the eye.
        let dir = (cam.target - cam.position).normalize();
        let near = cam.position + dir * 30.0;
        let far = cam.position + dir * 60.0;
        let candidates = vec![at("far", far, 2.0), at("near", near, 2.0)];
        let hit = hit_test(Vec2::ZERO, &cam, &candidates);
        assert_eq!(hit.map(|h| h.body), Some("near".to_string()));
    }

    #[test]
    fn empty_space_misses() {
        let cam = camera();
        let candidates = vec![at("Earth", Vec3::new(20.0, 0.0, 0.0), 1.0)];
        assert!(hit_test(Vec2::new(-0.9, 0.9), &cam, &candidates).is_none());
    }

    #[test]
    fn hits_off_axis_body() {
        let cam = camera();
        let p = Vec3::new(20.0, 0.0, 0.0);
        let candidates = vec![at("Earth", p, 1.0)];
        let hit = hit_test(ndc_of(&cam, p), &cam, &candidates);
        assert_eq!(hit.map(|h| h.body), Some("Earth".to_string()));
    }

    #[test]
    fn pointer_beside_round_body_misses() {
        let cam = camera();
        let p = Vec3::new(20.0, 0.0, 0.0);
        let candidates = vec![at("Earth", p, 1.0)];
        let aim = ndc_of(&cam, beside(&cam, p, 1.5));
        assert!(hit_test(aim, &cam, &candidates).is_none());
        let aim = ndc_of(&cam, beside(&cam, p, 0.8));
        assert!(hit_test(aim, &cam, &candidates).is_some());
    }

    #[test]
    fn box_honours_scale_and_rotation() {
        let cam = camera();
        let p = Vec3::new(-10.0, 0.0, 10.0);
        // A 1x1x1 box stretched to 6 units along its local X, then turned 90
        // degrees so that length runs along world Z.
        let world = Affine3A::from_scale_rotation_translation(
            Vec3::new(3.0, 1.0, 1.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            p,
        );
        let candidates = vec![PickCandidate {
            body: "Slab".into(),
            volume: PickVolume::Box(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE)),
            world,
        }];
        let along = ndc_of(&cam, p + Vec3::new(0.0, 0.0, 2.5));
        assert!(hit_test(along, &cam, &candidates).is_some());
        let across = ndc_of(&cam, p + Vec3::new(2.5, 0.0, 0.0));
        assert!(hit_test(across, &cam, &candidates).is_none());
    }

    #[test]
    fn reports_world_distance() {
        let cam = camera();
        let p = Vec3::new(0.0, 0.0, 0.0);
        let mut c = at("Sun", p, 1.0);
        c.world = Affine3A::from_scale_rotation_translation(Vec3::splat(4.0), Quat::IDENTITY, p);
        let hit = hit_test(Vec2::ZERO, &cam, &[c]);
        let expected = cam.position.length() - 4.0;
        assert!(hit.map_or(false, |h| (h.distance - expected).abs() < 1e-2));
    }

    #[test]
    fn zero_scale_is_skipped() {
        let cam = camera();
        let mut c = at("Gone", Vec3::ZERO, 1.0);
        c.world = Affine3A::from_scale(Vec3::ZERO);
        assert!(hit_test(Vec2::ZERO, &cam, &[c]).is_none());
    }

    #[test]
    fn tie_keeps_first() {
        let cam = camera();
        let candidates = vec![at("a", Vec3::ZERO, 3.0), at("b", Vec3::ZERO, 3.0)];
        let hit = hit_test(Vec2::ZERO, &cam, &candidates);
        assert_eq!(hit.map(|h| h.body), Some("a".to_string()));
    }
}
