//! Ray casting against point clouds and click detection.

use glam::{Mat4, Vec3};
use rayon::prelude::*;

/// Cursor travel (physical pixels) between press and release that still
/// counts as a click rather than a drag.
pub const CLICK_SLOP_PX: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub dir: Vec3,
}

impl Ray {
    /// Closest point on the ray (not the line) to `p`.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let t = (p - self.origin).dot(self.dir);
        if t < 0.0 {
            self.origin
        } else {
            self.origin + self.dir * t
        }
    }

    pub fn distance_sq_to_point(&self, p: Vec3) -> f32 {
        self.closest_point(p).distance_squared(p)
    }

    /// The same ray expressed in the frame `m` maps into. The direction is
    /// renormalized so distances stay comparable after uniform scaling.
    pub fn transformed(&self, m: &Mat4) -> Ray {
        Ray {
            origin: m.transform_point3(self.origin),
            dir: m.transform_vector3(self.dir).normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let first = Vec3::from_array(*points.first()?);
        let (min, max) = points.iter().fold((first, first), |(lo, hi), p| {
            let p = Vec3::from_array(*p);
            (lo.min(p), hi.max(p))
        });
        let center = 0.5 * (min + max);
        let radius = points
            .iter()
            .map(|p| Vec3::from_array(*p).distance_squared(center))
            .fold(0.0f32, f32::max)
            .sqrt();
        Some(Self { center, radius })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index into the cloud's vertex arrays.
    pub index: usize,
    /// Closest point on the ray to the hit vertex, world space.
    pub point: Vec3,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// Nearest vertex of a point cloud within `threshold` of `ray`.
///
/// `positions` are object space, `model` maps them to world space. Only hits
/// whose distance along the ray lies in `near..=far` count.
pub fn raycast_points(
    ray: &Ray,
    positions: &[[f32; 3]],
    sphere: Option<&BoundingSphere>,
    model: &Mat4,
    threshold: f32,
    near: f32,
    far: f32,
) -> Option<Hit> {
    let (scale, _, _) = model.to_scale_rotation_translation();
    let local_threshold = threshold / ((scale.x + scale.y + scale.z) / 3.0);
    let local_threshold_sq = local_threshold * local_threshold;

    let local_ray = ray.transformed(&model.inverse());

    if let Some(s) = sphere {
        let reach = s.radius + local_threshold;
        if local_ray.distance_sq_to_point(s.center) > reach * reach {
            return None;
        }
    }

    positions
        .par_iter()
        .enumerate()
        .filter_map(|(index, p)| {
            let p = Vec3::from_array(*p);
            if local_ray.distance_sq_to_point(p) >= local_threshold_sq {
                return None;
            }
            let point = model.transform_point3(local_ray.closest_point(p));
            let distance = ray.origin.distance(point);
            (distance >= near && distance <= far).then_some(Hit {
                index,
                point,
                distance,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)))
}

/// Maps a cursor position in physical pixels to normalized device
/// coordinates (x right, y up, both -1..1).
pub fn pixel_to_ndc(px: f64, py: f64, width: u32, height: u32) -> (f32, f32) {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    ((px / w * 2.0 - 1.0) as f32, (-(py / h) * 2.0 + 1.0) as f32)
}

/// Tells a left click apart from the start of an orbit drag.
#[derive(Debug, Default)]
pub struct ClickTracker {
    cursor: Option<(f64, f64)>,
    pressed_at: Option<(f64, f64)>,
}

impl ClickTracker {
    pub fn cursor_moved(&mut self, xy: (f64, f64)) {
        self.cursor = Some(xy);
    }

    pub fn pressed(&mut self) {
        self.pressed_at = self.cursor;
    }

    /// Cursor position of a completed click, if the button came up close to
    /// where it went down.
    pub fn released(&mut self) -> Option<(f64, f64)> {
        let start = self.pressed_at.take()?;
        let end = self.cursor?;
        let moved = (end.0 - start.0).hypot(end.1 - start.1);
        (moved <= CLICK_SLOP_PX).then_some(end)
    }

    /// Forgets a pending press, e.g. when the overlay took the release.
    pub fn cancel(&mut self) {
        self.pressed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn down_z() -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            dir: Vec3::NEG_Z,
        }
    }

    fn cast(ray: &Ray, pts: &[[f32; 3]], model: Mat4, threshold: f32) -> Option<Hit> {
        let sphere = BoundingSphere::from_points(pts);
        raycast_points(ray, pts, sphere.as_ref(), &model, threshold, 0.0, f32::INFINITY)
    }

    #[test]
    fn ndc_of_canvas_corners_and_centre() {
        assert_eq!(pixel_to_ndc(0.0, 0.0, 800, 600), (-1.0, 1.0));
        assert_eq!(pixel_to_ndc(800.0, 600.0, 800, 600), (1.0, -1.0));
        assert_eq!(pixel_to_ndc(400.0, 300.0, 800, 600), (0.0, 0.0));
    }

    #[test]
    fn nearest_point_wins() {
        let pts = [[0.0, 0.0, 0.0], [0.1, 0.0, 5.0], [0.0, 0.2, -3.0]];
        let hit = cast(&down_z(), &pts, Mat4::IDENTITY, 1.0).unwrap();
        assert_eq!(hit.index, 1);
        assert_abs_diff_eq!(hit.distance, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hit.point.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn points_outside_threshold_are_missed() {
        let pts = [[2.0, 0.0, 0.0], [0.0, -1.5, 0.0]];
        assert!(cast(&down_z(), &pts, Mat4::IDENTITY, 1.0).is_none());
        assert_eq!(cast(&down_z(), &pts, Mat4::IDENTITY, 1.6).unwrap().index, 1);
    }

    #[test]
    fn points_behind_the_eye_are_rejected_by_near() {
        let pts = [[0.0, 0.0, 10.5]];
        let sphere = BoundingSphere::from_points(&pts);
        let hit = raycast_points(&down_z(), &pts, sphere.as_ref(), &Mat4::IDENTITY, 1.0, 0.1, 1000.0);
        assert!(hit.is_none());
    }

    #[test]
    fn hits_beyond_far_are_rejected() {
        let pts = [[0.0, 0.0, -100.0]];
        let sphere = BoundingSphere::from_points(&pts);
        let hit = raycast_points(&down_z(), &pts, sphere.as_ref(), &Mat4::IDENTITY, 1.0, 0.1, 50.0);
        assert!(hit.is_none());
    }

    #[test]
    fn model_transform_is_respected() {
        // Object rotated so its +Z maps onto world +Y, then lifted by 2.
        let model = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))
            * Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        let pts = [[0.0, 0.0, 3.0]];
        let ray = Ray {
            origin: Vec3::new(0.0, 20.0, 0.0),
            dir: Vec3::NEG_Y,
        };
        let hit = cast(&ray, &pts, model, 0.5).unwrap();
        assert_eq!(hit.index, 0);
        assert_abs_diff_eq!(hit.point.y, 5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(hit.distance, 15.0, epsilon = 1e-4);
    }

    #[test]
    fn bounding_sphere_rejects_far_rays() {
        let pts = [[100.0, 100.0, 0.0], [101.0, 100.0, 0.0]];
        assert!(cast(&down_z(), &pts, Mat4::IDENTITY, 1.0).is_none());
    }

    #[test]
    fn click_versus_drag() {
        let mut t = ClickTracker::default();
        t.cursor_moved((100.0, 100.0));
        t.pressed();
        t.cursor_moved((102.0, 101.0));
        assert_eq!(t.released(), Some((102.0, 101.0)));

        t.pressed();
        t.cursor_moved((150.0, 101.0));
        assert_eq!(t.released(), None);

        assert_eq!(t.released(), None, "release without press");
    }
}
