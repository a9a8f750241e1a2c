//! geoproj: proj4-string coordinate transforms for the viewer and tools.
//!
//! A thin layer over `proj4rs` that takes and returns degrees for geographic
//! systems, longitude first, and reports failures as `ProjError`.
//!
//! The typical use is converting Dutch RD New grid coordinates to WGS-84:
//!
//! ```
//! use geoproj::{Transform, RD_NEW, WGS84};
//!
//! let t = Transform::new(RD_NEW, WGS84).unwrap();
//! let [lon, lat] = t.forward([155_000.0, 463_000.0]).unwrap();
//! assert!((lon - 5.3872).abs() < 1e-3 && (lat - 52.1552).abs() < 1e-3);
//! ```

mod error;
pub mod transform;

pub use error::ProjError;
pub use transform::Transform;

/// Amersfoort / RD New (EPSG:28992).
pub const RD_NEW: &str = "+proj=sterea +lat_0=52.15616055555555 +lon_0=5.38763888888889 \
+k=0.9999079 +x_0=155000 +y_0=463000 +ellps=bessel \
+towgs84=565.2369,50.0087,465.658,-0.406857330322398,0.350732676542563,-1.8703473836068,4.0812 \
+units=m +no_defs";

/// WGS 84 geographic (EPSG:4326), longitude first.
pub const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";
