//! Point reduction: voxel-grid averaging and uniform random subsampling.

use crate::{CloudError, Color, PointCloud};
use hashbrown::HashMap;
use rand::Rng;

#[derive(Default, Clone, Copy)]
struct VoxelAccum {
    sum: [f64; 3],
    color: [f64; 3],
    n: u32,
}

/// Replaces all points falling into the same voxel by their mean position
/// (and mean color, when the cloud has colors).
///
/// The grid is anchored half a voxel below the cloud's minimum bound, so the
/// lowest point always sits in the middle of its cell. Non-finite points are
/// dropped. Output is ordered by voxel index.
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: f64) -> Result<PointCloud, CloudError> {
    if !voxel_size.is_finite() || voxel_size <= 0.0 {
        return Err(CloudError::InvalidVoxelSize(voxel_size));
    }

    let colors = cloud.checked_colors()?;
    let Some(bounds) = cloud.bounds() else {
        return Ok(PointCloud::new());
    };

    let origin = bounds.min.map(|v| v - 0.5 * voxel_size);

    let mut bins: HashMap<[i64; 3], VoxelAccum> = HashMap::new();

    for (i, p) in cloud.positions.iter().enumerate() {
        if !p.iter().all(|v| v.is_finite()) {
            continue;
        }

        let key = [
            ((p[0] - origin[0]) / voxel_size).floor() as i64,
            ((p[1] - origin[1]) / voxel_size).floor() as i64,
            ((p[2] - origin[2]) / voxel_size).floor() as i64,
        ];

        let acc = bins.entry(key).or_default();
        for axis in 0..3 {
            acc.sum[axis] += p[axis];
        }
        if let Some(c) = colors {
            for ch in 0..3 {
                acc.color[ch] += c[i][ch] as f64;
            }
        }
        acc.n += 1;
    }

    let mut cells: Vec<([i64; 3], VoxelAccum)> = bins.into_iter().collect();
    cells.sort_unstable_by_key(|(key, _)| *key);

    let positions = cells
        .iter()
        .map(|(_, a)| a.sum.map(|s| s / a.n as f64))
        .collect();
    let out = PointCloud::from_positions(positions);

    if colors.is_some() {
        let averaged: Vec<Color> = cells
            .iter()
            .map(|(_, a)| a.color.map(|s| (s / a.n as f64) as f32))
            .collect();
        out.with_colors(averaged)
    } else {
        Ok(out)
    }
}

/// Keeps `floor(len * fraction)` points chosen uniformly without replacement.
pub fn random_subsample<R: Rng + ?Sized>(
    cloud: &PointCloud,
    fraction: f64,
    rng: &mut R,
) -> Result<PointCloud, CloudError> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(CloudError::InvalidFraction(fraction));
    }

    let colors = cloud.checked_colors()?;
    let amount = (cloud.len() as f64 * fraction) as usize;
    let indices = rand::seq::index::sample(rng, cloud.len(), amount);

    let positions = indices.iter().map(|i| cloud.positions[i]).collect();
    let out = PointCloud::from_positions(positions);

    match colors {
        Some(colors) => out.with_colors(indices.iter().map(|i| colors[i]).collect()),
        None => Ok(out),
    }
}
