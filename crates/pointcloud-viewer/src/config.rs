use clap::Parser;
use std::path::PathBuf;

/// Smallest and largest point size offered by the size slider (world units).
pub const POINT_SIZE_RANGE: std::ops::RangeInclusive<f32> = 0.01..=1.0;

/// `pointcloud_viewer` - interactive viewer for georeferenced PLY point clouds.
///
/// Orbit with the left mouse button, pan with the right one, zoom with the
/// wheel. Clicking a point highlights it and shows its height and WGS-84
/// coordinates.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The PLY file to display.
    ///
    /// Loaded once at startup on a background thread. A missing or unreadable
    /// file is logged and leaves the viewer empty.
    #[arg(long, env = "POINTCLOUD_PATH", default_value = "voxel_downsampled.ply")]
    pub input: PathBuf,

    /// proj4 definition of the coordinate system the PLY positions are in.
    #[arg(long, env = "SOURCE_CRS", default_value = geoproj::RD_NEW)]
    pub source_crs: String,

    /// proj4 definition of the coordinate system shown in the overlay.
    #[arg(long, env = "TARGET_CRS", default_value = geoproj::WGS84)]
    pub target_crs: String,

    /// Initial rendered point size in world units.
    #[arg(long, default_value_t = 0.2, value_parser = parse_point_size)]
    pub point_size: f32,

    /// Maximum distance (world units) between the pick ray and a point for the
    /// point to count as hit.
    #[arg(long, default_value_t = 1.0, value_parser = parse_positive)]
    pub pick_threshold: f32,

    /// Added to the picked point's world height before display (meters).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub height_offset: f32,
}

fn parse_point_size(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if POINT_SIZE_RANGE.contains(&v) {
        Ok(v)
    } else {
        Err(format!(
            "point size must be within {}..={}",
            POINT_SIZE_RANGE.start(),
            POINT_SIZE_RANGE.end()
        ))
    }
}

fn parse_positive(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err("value must be a positive number".to_string())
    }
}
