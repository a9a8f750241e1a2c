use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProjError {
    #[error("invalid projection definition '{definition}': {reason}")]
    Definition { definition: String, reason: String },

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
}
