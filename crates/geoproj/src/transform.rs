use crate::ProjError;
use proj4rs::Proj;

/// A source -> target coordinate transform built from two proj4 definitions.
///
/// Geographic systems are read and written in degrees, longitude first;
/// everything else is passed through in the definition's own units.
pub struct Transform {
    source_def: String,
    target_def: String,
    source: Proj,
    target: Proj,
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("source", &self.source_def)
            .field("target", &self.target_def)
            .finish()
    }
}

fn parse(definition: &str) -> Result<Proj, ProjError> {
    Proj::from_proj_string(definition).map_err(|e| ProjError::Definition {
        definition: definition.to_string(),
        reason: e.to_string(),
    })
}

impl Transform {
    pub fn new(source: &str, target: &str) -> Result<Self, ProjError> {
        let source_proj = parse(source)?;
        let target_proj = parse(target)?;

        log::debug!("Transform '{source}' -> '{target}'");

        Ok(Self {
            source_def: source.to_string(),
            target_def: target.to_string(),
            source: source_proj,
            target: target_proj,
        })
    }

    /// The transform in the opposite direction.
    pub fn reversed(&self) -> Result<Self, ProjError> {
        Self::new(&self.target_def, &self.source_def)
    }

    /// Transforms one planar coordinate pair.
    pub fn forward(&self, [x, y]: [f64; 2]) -> Result<[f64; 2], ProjError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjError::NonFinite { x, y });
        }

        let mut point = if self.source.is_latlong() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(&self.source, &self.target, &mut point)
            .map_err(|e| ProjError::Transform(e.to_string()))?;

        let (u, v) = if self.target.is_latlong() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !u.is_finite() || !v.is_finite() {
            return Err(ProjError::NonFinite { x: u, y: v });
        }

        Ok([u, v])
    }
}
