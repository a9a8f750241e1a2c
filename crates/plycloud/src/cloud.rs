use crate::CloudError;

/// RGB in 0..1, as stored in the file.
pub type Color = [f32; 3];

/// Fallback color for clouds stored without color properties.
pub const WHITE: Color = [1.0, 1.0, 1.0];

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    /// Bounds of all finite points; `None` if there are none.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f64; 3]>,
    {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        let mut any = false;

        for p in points {
            if !p.iter().all(|v| v.is_finite()) {
                continue;
            }
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
            any = true;
        }

        any.then_some(Self { min, max })
    }

    #[inline]
    pub fn center(&self) -> [f64; 3] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }

    #[inline]
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Largest edge length.
    pub fn max_extent(&self) -> f64 {
        let [x, y, z] = self.size();
        x.max(y).max(z)
    }

}

/// Positions with optional per-point colors. Colors can only be attached
/// through `with_colors`, which enforces one color per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub(crate) positions: Vec<[f64; 3]>,
    pub(crate) colors: Option<Vec<Color>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: Vec<[f64; 3]>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    pub fn with_colors(mut self, colors: Vec<Color>) -> Result<Self, CloudError> {
        if colors.len() != self.positions.len() {
            return Err(CloudError::ColorCountMismatch {
                positions: self.positions.len(),
                colors: colors.len(),
            });
        }
        self.colors = Some(colors);
        Ok(self)
    }

    #[inline]
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    #[inline]
    pub fn colors(&self) -> Option<&[Color]> {
        self.colors.as_deref()
    }

    /// Colors checked against the position count.
    pub(crate) fn checked_colors(&self) -> Result<Option<&[Color]>, CloudError> {
        match &self.colors {
            Some(c) if c.len() != self.positions.len() => Err(CloudError::ColorCountMismatch {
                positions: self.positions.len(),
                colors: c.len(),
            }),
            other => Ok(other.as_deref()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Per-point colors, or `fallback` for every point when the cloud has none.
    pub fn colors_or(&self, fallback: Color) -> Vec<Color> {
        match &self.colors {
            Some(colors) => colors.clone(),
            None => vec![fallback; self.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_skip_non_finite_points() {
        let cloud = PointCloud::from_positions(vec![
            [1.0, -2.0, 3.0],
            [f64::NAN, 100.0, 100.0],
            [-1.0, 4.0, 5.0],
        ]);
        let bb = cloud.bounds().unwrap();
        assert_eq!(bb.min, [-1.0, -2.0, 3.0]);
        assert_eq!(bb.max, [1.0, 4.0, 5.0]);
        assert_eq!(bb.center(), [0.0, 1.0, 4.0]);
        assert_eq!(bb.max_extent(), 6.0);
    }

    #[test]
    fn empty_cloud_has_no_bounds() {
        assert!(PointCloud::new().bounds().is_none());
    }

    #[test]
    fn color_count_must_match() {
        let cloud = PointCloud::from_positions(vec![[0.0; 3]; 2]);
        assert!(matches!(
            cloud.clone().with_colors(vec![WHITE]),
            Err(CloudError::ColorCountMismatch { positions: 2, colors: 1 })
        ));
        assert_eq!(cloud.colors_or([0.5; 3]), vec![[0.5; 3]; 2]);
    }

    #[test]
    fn mismatched_colors_are_caught_before_use() {
        let cloud = PointCloud {
            positions: vec![[0.0; 3]; 3],
            colors: Some(vec![WHITE]),
        };
        assert!(matches!(
            cloud.checked_colors(),
            Err(CloudError::ColorCountMismatch { positions: 3, colors: 1 })
        ));
    }
}
