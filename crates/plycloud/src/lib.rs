//! plycloud: the point cloud model shared by the viewer and the converter.
//!
//! - `PointCloud`: f64 positions (projected coordinates keep their precision)
//!   plus optional 0..1 RGB colors.
//! - PLY I/O on top of `ply-rs` (ascii and binary, any scalar position type,
//!   uchar/ushort/float colors).
//! - Voxel-grid downsampling and random subsampling.

mod cloud;
mod error;
pub mod ply;
pub mod sample;

pub use cloud::{Aabb, Color, PointCloud, WHITE};
pub use error::CloudError;
pub use ply::{read_ply, read_ply_from, write_ply, write_ply_to, PlyEncoding};
pub use sample::{random_subsample, voxel_downsample};
