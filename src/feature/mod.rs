//! Transformation features ("stages") that feed the MultiTransform composer.
//!
//! Every stage produces its transformations from the original shapes alone;
//! the composer decides how consecutive stages are combined, based on the
//! stage's [`StageKind`].

use crate::compose::ComposeError;
use crate::geom::{GeomMesh, Point3, Transform};

mod mirrored;
mod pattern;
mod scaled;

pub use mirrored::Mirrored;
pub use pattern::{LinearPattern, LinearSpacing, PolarPattern};
pub use scaled::Scaled;

/// How a stage combines with the transformations collected before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Every new transformation applies to every previous one.
    General,
    /// Each scale factor applies to one contiguous slice of the previous
    /// transformations.
    UniformScale,
}

/// Errors raised while a stage generates its transformations.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("{feature}: {what} must be finite and non-zero")]
    Degenerate {
        feature: &'static str,
        what: &'static str,
    },
    #[error("{feature}: {what} must be finite (got {value})")]
    NonFinite {
        feature: &'static str,
        what: &'static str,
        value: f64,
    },
    #[error("{feature}: at least {min} occurrences required (got {value})")]
    TooFewOccurrences {
        feature: &'static str,
        min: u32,
        value: u32,
    },
    #[error("{feature}: at most {max} occurrences allowed (got {value})")]
    TooManyOccurrences {
        feature: &'static str,
        max: u32,
        value: u32,
    },
    #[error("scaling factor too small ({0})")]
    FactorTooSmall(f64),
    #[error("angle must be in (0, 360] degrees (got {0})")]
    InvalidAngle(f64),
    #[error("nested transformation failed: {0}")]
    Nested(#[from] Box<ComposeError>),
}

/// Upper bound on the occurrences a single stage may request.
pub const MAX_OCCURRENCES: u32 = 10_000;

/// Inputs shared by all stages of one composer invocation.
///
/// The reference point (centre of mass of the first original) is integrated
/// once here instead of once per stage.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    originals: &'a [GeomMesh],
    reference_point: Point3,
}

impl<'a> StageContext<'a> {
    #[must_use]
    pub fn new(originals: &'a [GeomMesh]) -> Self {
        let reference_point = match originals.first() {
            Some(first) => match first.volume_properties() {
                Some(props) => props.center_of_mass,
                None => {
                    log::warn!("first original encloses no volume, using the origin as pivot");
                    Point3::ORIGIN
                }
            },
            None => Point3::ORIGIN,
        };
        Self {
            originals,
            reference_point,
        }
    }

    #[must_use]
    pub fn originals(&self) -> &'a [GeomMesh] {
        self.originals
    }

    /// Centre of mass of the first original, or the origin.
    #[must_use]
    pub fn reference_point(&self) -> Point3 {
        self.reference_point
    }
}

/// A feature that produces an ordered list of transformations.
///
/// The first transformation is conventionally the identity (the original
/// itself).
pub trait TransformStage {
    fn kind(&self) -> StageKind;

    fn transformations(&self, ctx: &StageContext<'_>) -> Result<Vec<Transform>, StageError>;
}

/// The built-in transformation features.
#[derive(Debug, Clone, PartialEq)]
pub enum StageFeature {
    Mirrored(Mirrored),
    LinearPattern(LinearPattern),
    PolarPattern(PolarPattern),
    Scaled(Scaled),
}

impl StageFeature {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mirrored(_) => "Mirrored",
            Self::LinearPattern(_) => "LinearPattern",
            Self::PolarPattern(_) => "PolarPattern",
            Self::Scaled(_) => "Scaled",
        }
    }
}

impl TransformStage for StageFeature {
    fn kind(&self) -> StageKind {
        match self {
            Self::Scaled(_) => StageKind::UniformScale,
            Self::Mirrored(_) | Self::LinearPattern(_) | Self::PolarPattern(_) => {
                StageKind::General
            }
        }
    }

    fn transformations(&self, ctx: &StageContext<'_>) -> Result<Vec<Transform>, StageError> {
        match self {
            Self::Mirrored(feature) => feature.transformations(),
            Self::LinearPattern(feature) => feature.transformations(),
            Self::PolarPattern(feature) => feature.transformations(),
            Self::Scaled(feature) => feature.transformations(ctx.reference_point()),
        }
    }
}

fn require_occurrences(feature: &'static str, min: u32, value: u32) -> Result<u32, StageError> {
    if value < min {
        return Err(StageError::TooFewOccurrences { feature, min, value });
    }
    if value > MAX_OCCURRENCES {
        return Err(StageError::TooManyOccurrences {
            feature,
            max: MAX_OCCURRENCES,
            value,
        });
    }
    Ok(value)
}

fn require_finite(feature: &'static str, what: &'static str, value: f64) -> Result<f64, StageError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StageError::NonFinite {
            feature,
            what,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Tolerance, Vec3, box_mesh};

    #[test]
    fn context_uses_first_original_center() {
        let originals = vec![
            box_mesh(Point3::new(2.0, 0.0, 0.0), 2.0, 2.0, 2.0).unwrap(),
            box_mesh(Point3::new(-10.0, 0.0, 0.0), 1.0, 1.0, 1.0).unwrap(),
        ];
        let ctx = StageContext::new(&originals);
        assert!(Tolerance::LOOSE.approx_eq_point3(ctx.reference_point(), Point3::new(3.0, 1.0, 1.0)));
        assert_eq!(ctx.originals().len(), 2);
    }

    #[test]
    fn context_without_originals_uses_origin() {
        let ctx = StageContext::new(&[]);
        assert_eq!(ctx.reference_point(), Point3::ORIGIN);
    }

    #[test]
    fn only_scaled_is_uniform_scale() {
        let scaled = StageFeature::Scaled(Scaled::new(2.0, 2));
        let mirrored = StageFeature::Mirrored(Mirrored::new(Point3::ORIGIN, Vec3::X));
        assert_eq!(scaled.kind(), StageKind::UniformScale);
        assert_eq!(mirrored.kind(), StageKind::General);
        assert_eq!(scaled.name(), "Scaled");
    }

    #[test]
    fn scaled_stage_scales_about_reference_point() {
        let originals = vec![box_mesh(Point3::ORIGIN, 2.0, 2.0, 2.0).unwrap()];
        let ctx = StageContext::new(&originals);
        let stage = StageFeature::Scaled(Scaled::new(3.0, 2));
        let transforms = stage.transformations(&ctx).unwrap();

        assert_eq!(transforms.len(), 2);
        let center = Point3::new(1.0, 1.0, 1.0);
        assert!(Tolerance::LOOSE.approx_eq_point3(transforms[1].apply_point(center), center));
        assert!(Tolerance::LOOSE.approx_eq_f64(transforms[1].scale_factor(), 3.0));
    }
}
