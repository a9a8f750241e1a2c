//! Scene graph: the loaded cloud, axes markers and the pick state.

use crate::{
    camera::Camera,
    picking::{raycast_points, BoundingSphere},
    selection::Selection,
    ui::PickInfo,
};
use geoproj::Transform;
use glam::{Mat4, Vec3};
use plycloud::{Aabb, Color, PointCloud, WHITE};
use std::f32::consts::FRAC_PI_2;

/// Length of the axes markers in world units.
pub const AXES_SIZE: f32 = 5.0;

/// Three colored line segments from `position` along +X (red), +Y (green)
/// and +Z (blue).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesHelper {
    pub size: f32,
    pub position: Vec3,
}

impl AxesHelper {
    pub fn new(size: f32, position: Vec3) -> Self {
        Self { size, position }
    }

    pub fn segments(&self) -> [(Vec3, Vec3, Color); 3] {
        let o = self.position;
        let s = self.size;
        [
            (o, o + Vec3::X * s, [1.0, 0.0, 0.0]),
            (o, o + Vec3::Y * s, [0.0, 1.0, 0.0]),
            (o, o + Vec3::Z * s, [0.0, 0.0, 1.0]),
        ]
    }
}

/// A loaded cloud, centred on the origin and stood up so that its height
/// axis is world Y.
#[derive(Debug, Clone)]
pub struct PointCloudObject {
    /// Object-space positions, source coordinates minus `center`.
    pub positions: Vec<[f32; 3]>,
    /// Current display colors, including the highlight.
    pub colors: Vec<Color>,
    /// Source-space bounding box centre.
    pub center: [f64; 3],
    /// Bounds of `positions`.
    pub bounds: Aabb,
    /// Lowest object-space height.
    pub ground_level: f32,
    pub rotation_x: f32,
    pub position: Vec3,
    pub sphere: Option<BoundingSphere>,
    selection: Selection,
}

impl PointCloudObject {
    /// `None` when the cloud has no finite points.
    pub fn from_cloud(cloud: PointCloud) -> Option<Self> {
        let source_bounds = cloud.bounds()?;
        let center = source_bounds.center();

        let positions: Vec<[f32; 3]> = cloud
            .positions()
            .iter()
            .map(|p| {
                [
                    (p[0] - center[0]) as f32,
                    (p[1] - center[1]) as f32,
                    (p[2] - center[2]) as f32,
                ]
            })
            .collect();

        let bounds = Aabb {
            min: std::array::from_fn(|i| source_bounds.min[i] - center[i]),
            max: std::array::from_fn(|i| source_bounds.max[i] - center[i]),
        };
        let ground_level = bounds.min[2] as f32;

        let colors = cloud.colors_or(WHITE);
        let selection = Selection::new(colors.clone());
        let sphere = BoundingSphere::from_points(&positions);

        Some(Self {
            positions,
            colors,
            center,
            bounds,
            ground_level,
            rotation_x: -FRAC_PI_2,
            position: Vec3::new(0.0, -ground_level, 0.0),
            sphere,
            selection,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_rotation_x(self.rotation_x)
    }

    /// Coordinates of vertex `index` as stored in the file.
    pub fn source_coordinates(&self, index: usize) -> Option<[f64; 3]> {
        let p = self.positions.get(index)?;
        Some(std::array::from_fn(|i| p[i] as f64 + self.center[i]))
    }

    /// Axes marker at the cloud's lowest bounding-box corner.
    pub fn ground_axes(&self) -> AxesHelper {
        let corner = Vec3::new(
            self.bounds.min[0] as f32,
            self.bounds.min[1] as f32,
            self.bounds.min[2] as f32,
        );
        AxesHelper::new(AXES_SIZE, self.model_matrix().transform_point3(corner))
    }

    #[inline]
    pub fn selected(&self) -> Option<usize> {
        self.selection.selected()
    }

    /// Highlights `index`; returns the indices whose color changed.
    pub fn select(&mut self, index: usize) -> Vec<usize> {
        self.selection.select(&mut self.colors, index)
    }
}

/// Result of a successful pick.
#[derive(Debug, Clone, PartialEq)]
pub struct PickOutcome {
    pub info: PickInfo,
    /// Vertices whose colors must be re-uploaded.
    pub dirty: Vec<usize>,
}

pub struct Scene {
    pub background: Color,
    pub axes: Vec<AxesHelper>,
    pub cloud: Option<PointCloudObject>,
    pub last_pick: Option<PickInfo>,
    transform: Transform,
    pick_threshold: f32,
    height_offset: f32,
}

impl Scene {
    /// Empty black scene with an axes marker at the origin.
    pub fn new(transform: Transform, pick_threshold: f32, height_offset: f32) -> Self {
        Self {
            background: [0.0, 0.0, 0.0],
            axes: vec![AxesHelper::new(AXES_SIZE, Vec3::ZERO)],
            cloud: None,
            last_pick: None,
            transform,
            pick_threshold,
            height_offset,
        }
    }

    /// Places a freshly loaded cloud in the scene and frames the camera on
    /// it. Returns false (and leaves the scene untouched) for clouds without
    /// any finite point.
    pub fn install_cloud(&mut self, cloud: PointCloud, camera: &mut Camera) -> bool {
        let count = cloud.len();
        let Some(object) = PointCloudObject::from_cloud(cloud) else {
            log::error!("Point cloud has no usable points ({count} vertices)");
            return false;
        };

        let max_dim = object.bounds.max_extent() as f32;
        camera.frame(Vec3::ZERO, 2.0 * max_dim);

        self.axes.truncate(1);
        self.axes.push(object.ground_axes());
        self.last_pick = None;

        log::info!(
            "Installed {} points | centre ({:.3}, {:.3}, {:.3}) | ground level {:.3} | extent {:.3}",
            object.len(),
            object.center[0],
            object.center[1],
            object.center[2],
            object.ground_level,
            max_dim
        );

        self.cloud = Some(object);
        true
    }

    /// Casts a ray through `ndc` and highlights the nearest point it hits.
    /// Clicks that miss, or arrive before a cloud is loaded, change nothing.
    pub fn pick(&mut self, camera: &Camera, ndc: (f32, f32)) -> Option<PickOutcome> {
        let cloud = self.cloud.as_mut()?;

        let ray = camera.ray_from_ndc(ndc.0, ndc.1);
        let hit = raycast_points(
            &ray,
            &cloud.positions,
            cloud.sphere.as_ref(),
            &cloud.model_matrix(),
            self.pick_threshold,
            camera.near,
            camera.far,
        )?;

        let dirty = cloud.select(hit.index);

        let lon_lat = cloud.source_coordinates(hit.index).and_then(|[x, y, _]| {
            self.transform
                .forward([x, y])
                .map_err(|e| log::warn!("Cannot georeference ({x:.3}, {y:.3}): {e}"))
                .ok()
        });

        let info = PickInfo {
            index: hit.index,
            height: hit.point.y + self.height_offset,
            lon_lat,
        };

        log::debug!("Picked {:?} at distance {:.3}", info, hit.distance);

        self.last_pick = Some(info);
        Some(PickOutcome { info, dirty })
    }
}
