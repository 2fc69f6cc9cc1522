use crate::geom::{Point3, Transform, Vec3};

use super::StageError;

const FEATURE: &str = "Mirrored";

/// Reflection of the originals through a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Mirrored {
    pub base: Point3,
    pub normal: Vec3,
}

impl Mirrored {
    #[must_use]
    pub fn new(base: Point3, normal: Vec3) -> Self {
        Self { base, normal }
    }

    /// `[identity, mirror]`.
    pub fn transformations(&self) -> Result<Vec<Transform>, StageError> {
        if !self.base.is_finite() {
            return Err(StageError::Degenerate {
                feature: FEATURE,
                what: "plane base",
            });
        }
        let mirror = Transform::mirror(self.base, self.normal).ok_or(StageError::Degenerate {
            feature: FEATURE,
            what: "plane normal",
        })?;
        Ok(vec![Transform::identity(), mirror])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn mirror_yields_identity_then_reflection() {
        let feature = Mirrored::new(Point3::new(5.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let transforms = feature.transformations().unwrap();

        assert_eq!(transforms.len(), 2);
        assert_eq!(transforms[0], Transform::identity());
        let p = transforms[1].apply_point(Point3::new(1.0, 1.0, 1.0));
        assert!(Tolerance::LOOSE.approx_eq_point3(p, Point3::new(9.0, 1.0, 1.0)));
    }

    #[test]
    fn zero_normal_is_rejected() {
        let feature = Mirrored::new(Point3::ORIGIN, Vec3::ZERO);
        assert!(matches!(
            feature.transformations(),
            Err(StageError::Degenerate { what: "plane normal", .. })
        ));
    }
}
