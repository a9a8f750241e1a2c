use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("PLY file has no '{0}' element")]
    MissingElement(&'static str),

    #[error("vertex {index} has no scalar property '{name}'")]
    MissingProperty { index: usize, name: &'static str },

    #[error("color property '{0}' has an unsupported type")]
    UnsupportedColor(&'static str),

    #[error("{colors} colors for {positions} positions")]
    ColorCountMismatch { positions: usize, colors: usize },

    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f64),

    #[error("sample fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),
}
