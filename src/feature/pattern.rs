use crate::geom::{Point3, Tolerance, Transform, Vec3};

use super::{StageError, require_finite, require_occurrences};

/// How the distance between linear pattern occurrences is specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinearSpacing {
    /// Distance between the first and the last occurrence.
    Extent(f64),
    /// Distance between two neighbouring occurrences.
    Offset(f64),
}

/// Copies of the originals translated along a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPattern {
    pub direction: Vec3,
    pub spacing: LinearSpacing,
    pub occurrences: u32,
    pub reversed: bool,
}

impl LinearPattern {
    const FEATURE: &'static str = "LinearPattern";

    #[must_use]
    pub fn new(direction: Vec3, spacing: LinearSpacing, occurrences: u32) -> Self {
        Self {
            direction,
            spacing,
            occurrences,
            reversed: false,
        }
    }

    #[must_use]
    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn transformations(&self) -> Result<Vec<Transform>, StageError> {
        let occurrences = require_occurrences(Self::FEATURE, 1, self.occurrences)?;
        let mut direction = self.direction.normalized().ok_or(StageError::Degenerate {
            feature: Self::FEATURE,
            what: "direction",
        })?;
        if self.reversed {
            direction = -direction;
        }

        let step = match self.spacing {
            LinearSpacing::Extent(length) => {
                let length = require_finite(Self::FEATURE, "length", length)?;
                if occurrences > 1 {
                    length / f64::from(occurrences - 1)
                } else {
                    0.0
                }
            }
            LinearSpacing::Offset(offset) => require_finite(Self::FEATURE, "offset", offset)?,
        };

        Ok((0..occurrences)
            .map(|i| Transform::translate(direction * (step * f64::from(i))))
            .collect())
    }
}

/// Copies of the originals rotated around an axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarPattern {
    pub axis_base: Point3,
    pub axis_direction: Vec3,
    /// Total angle in degrees.
    pub angle: f64,
    pub occurrences: u32,
    pub reversed: bool,
}

impl PolarPattern {
    const FEATURE: &'static str = "PolarPattern";

    #[must_use]
    pub fn new(axis_base: Point3, axis_direction: Vec3, angle: f64, occurrences: u32) -> Self {
        Self {
            axis_base,
            axis_direction,
            angle,
            occurrences,
            reversed: false,
        }
    }

    #[must_use]
    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// A full 360° turn spreads the occurrences over `n` gaps so the last
    /// copy does not land on the first; any other angle uses `n - 1` gaps.
    pub fn transformations(&self) -> Result<Vec<Transform>, StageError> {
        let angle = require_finite(Self::FEATURE, "angle", self.angle)?;
        if angle <= 0.0 || angle > 360.0 + Tolerance::CONFUSION.eps {
            return Err(StageError::InvalidAngle(angle));
        }
        let occurrences = require_occurrences(Self::FEATURE, 1, self.occurrences)?;
        if !self.axis_base.is_finite() {
            return Err(StageError::Degenerate {
                feature: Self::FEATURE,
                what: "axis base",
            });
        }
        let mut axis = self.axis_direction;
        if self.reversed {
            axis = -axis;
        }

        let step = if Tolerance::CONFUSION.approx_eq_f64(angle, 360.0) {
            angle / f64::from(occurrences)
        } else if occurrences > 1 {
            angle / f64::from(occurrences - 1)
        } else {
            0.0
        };

        (0..occurrences)
            .map(|i| {
                Transform::rotate_about(
                    self.axis_base,
                    axis,
                    (step * f64::from(i)).to_radians(),
                )
                .ok_or(StageError::Degenerate {
                    feature: Self::FEATURE,
                    what: "axis direction",
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Tolerance = Tolerance::LOOSE;

    #[test]
    fn linear_extent_divides_length() {
        let pattern = LinearPattern::new(Vec3::new(0.0, 2.0, 0.0), LinearSpacing::Extent(30.0), 4);
        let offsets: Vec<Vec3> = pattern
            .transformations()
            .unwrap()
            .iter()
            .map(|t| t.translation())
            .collect();

        assert_eq!(offsets.len(), 4);
        assert_eq!(offsets[0], Vec3::ZERO);
        assert!((offsets[3].y - 30.0).abs() < 1e-9);
        assert!((offsets[1].y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn linear_offset_and_reverse() {
        let pattern = LinearPattern::new(Vec3::X, LinearSpacing::Offset(5.0), 3).reversed(true);
        let last = pattern.transformations().unwrap()[2].translation();
        assert!((last.x + 10.0).abs() < 1e-9);
    }

    #[test]
    fn single_occurrence_is_identity() {
        let pattern = LinearPattern::new(Vec3::X, LinearSpacing::Extent(10.0), 1);
        assert_eq!(pattern.transformations().unwrap(), vec![Transform::identity()]);
    }

    #[test]
    fn occurrence_counts_are_bounded() {
        let linear = LinearPattern::new(Vec3::X, LinearSpacing::Offset(1.0), u32::MAX);
        assert!(matches!(
            linear.transformations(),
            Err(StageError::TooManyOccurrences { feature: "LinearPattern", .. })
        ));

        let polar = PolarPattern::new(Point3::ORIGIN, Vec3::Z, 360.0, crate::feature::MAX_OCCURRENCES + 1);
        assert!(matches!(
            polar.transformations(),
            Err(StageError::TooManyOccurrences { max: 10_000, value: 10_001, .. })
        ));
        let polar = PolarPattern::new(Point3::ORIGIN, Vec3::Z, 360.0, crate::feature::MAX_OCCURRENCES);
        assert_eq!(polar.transformations().unwrap().len(), 10_000);
    }

    #[test]
    fn linear_rejects_zero_direction() {
        let pattern = LinearPattern::new(Vec3::ZERO, LinearSpacing::Extent(10.0), 2);
        assert!(pattern.transformations().is_err());
    }

    #[test]
    fn full_circle_does_not_repeat_first_copy() {
        let pattern = PolarPattern::new(Point3::ORIGIN, Vec3::Z, 360.0, 4);
        let transforms = pattern.transformations().unwrap();
        let p = Point3::new(1.0, 0.0, 0.0);

        assert_eq!(transforms.len(), 4);
        assert!(TOL.approx_eq_point3(transforms[1].apply_point(p), Point3::new(0.0, 1.0, 0.0)));
        assert!(TOL.approx_eq_point3(transforms[3].apply_point(p), Point3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn partial_angle_ends_on_last_copy() {
        let pattern = PolarPattern::new(Point3::new(1.0, 0.0, 0.0), Vec3::Z, 180.0, 3);
        let transforms = pattern.transformations().unwrap();
        let p = Point3::new(2.0, 0.0, 0.0);

        assert!(TOL.approx_eq_point3(transforms[1].apply_point(p), Point3::new(1.0, 1.0, 0.0)));
        assert!(TOL.approx_eq_point3(transforms[2].apply_point(p), Point3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn polar_reversed_turns_clockwise() {
        let pattern = PolarPattern::new(Point3::ORIGIN, Vec3::Z, 90.0, 2).reversed(true);
        let p = pattern.transformations().unwrap()[1].apply_point(Point3::new(1.0, 0.0, 0.0));
        assert!(TOL.approx_eq_point3(p, Point3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn polar_rejects_bad_angle() {
        let pattern = PolarPattern::new(Point3::ORIGIN, Vec3::Z, 400.0, 2);
        assert!(matches!(pattern.transformations(), Err(StageError::InvalidAngle(_))));
    }
}
