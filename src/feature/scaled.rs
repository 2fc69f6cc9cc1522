use crate::geom::{Point3, Tolerance, Transform};

use super::{StageError, require_finite, require_occurrences};

const FEATURE: &str = "Scaled";

/// Uniform scaling from 1 up to `factor` over `occurrences` steps, centred
/// on the reference point of the originals.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaled {
    pub factor: f64,
    pub occurrences: u32,
}

impl Scaled {
    #[must_use]
    pub fn new(factor: f64, occurrences: u32) -> Self {
        Self {
            factor,
            occurrences,
        }
    }

    /// `[identity, scale(1 + step), …, scale(factor)]` about `center`.
    pub fn transformations(&self, center: Point3) -> Result<Vec<Transform>, StageError> {
        let factor = require_finite(FEATURE, "factor", self.factor)?;
        if factor <= Tolerance::CONFUSION.eps {
            return Err(StageError::FactorTooSmall(factor));
        }
        let occurrences = require_occurrences(FEATURE, 2, self.occurrences)?;

        let step = (factor - 1.0) / f64::from(occurrences - 1);
        let mut transforms = Vec::with_capacity(occurrences as usize);
        transforms.push(Transform::identity());
        for i in 1..occurrences {
            transforms.push(Transform::scale_about(center, 1.0 + f64::from(i) * step));
        }
        Ok(transforms)
    }
}
