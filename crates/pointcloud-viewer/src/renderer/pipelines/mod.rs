pub mod axes;
pub mod points;
