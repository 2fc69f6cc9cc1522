//! Typed objects built from textual `(property, value)` pairs.

use crate::feature::{LinearPattern, LinearSpacing, Mirrored, PolarPattern, Scaled, StageFeature};
use crate::geom::{
    GeomMesh, Point3, PrimitiveError, Vec3, box_mesh, cylinder_mesh, sphere_mesh,
};

const CYLINDER_SEGMENTS: usize = 48;
const SPHERE_SEGMENTS: usize = 48;
const SPHERE_RINGS: usize = 24;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PropertyError {
    #[error("{type_name} has no property `{property}`")]
    Unknown {
        type_name: String,
        property: String,
    },
    #[error("property `{property}` expects {expected}, got `{value}`")]
    Invalid {
        property: String,
        expected: &'static str,
        value: String,
    },
}

/// Primitive solids usable as pattern originals.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Box {
        position: Point3,
        length: f64,
        width: f64,
        height: f64,
    },
    Cylinder {
        position: Point3,
        radius: f64,
        height: f64,
    },
    Sphere {
        position: Point3,
        radius: f64,
    },
}

impl Primitive {
    pub fn to_mesh(&self) -> Result<GeomMesh, PrimitiveError> {
        match *self {
            Self::Box {
                position,
                length,
                width,
                height,
            } => box_mesh(position, length, width, height),
            Self::Cylinder {
                position,
                radius,
                height,
            } => cylinder_mesh(position, radius, height, CYLINDER_SEGMENTS),
            Self::Sphere { position, radius } => {
                sphere_mesh(position, radius, SPHERE_SEGMENTS, SPHERE_RINGS)
            }
        }
    }
}

/// A MultiTransform feature: originals patterned by a chain of stages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiTransform {
    pub originals: Vec<String>,
    pub transformations: Vec<String>,
}

/// Everything a document object can be.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Primitive(Primitive),
    Mesh(GeomMesh),
    Stage(StageFeature),
    MultiTransform(MultiTransform),
    /// A type this crate does not model; kept so references to it can be
    /// reported.
    Other(String),
}

impl ObjectKind {
    /// Default object for a document type name.
    #[must_use]
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "Part::Box" => Self::Primitive(Primitive::Box {
                position: Point3::ORIGIN,
                length: 10.0,
                width: 10.0,
                height: 10.0,
            }),
            "Part::Cylinder" => Self::Primitive(Primitive::Cylinder {
                position: Point3::ORIGIN,
                radius: 2.0,
                height: 10.0,
            }),
            "Part::Sphere" => Self::Primitive(Primitive::Sphere {
                position: Point3::ORIGIN,
                radius: 5.0,
            }),
            "Mesh::Feature" => Self::Mesh(GeomMesh::default()),
            "PartDesign::Mirrored" => {
                Self::Stage(StageFeature::Mirrored(Mirrored::new(Point3::ORIGIN, Vec3::X)))
            }
            "PartDesign::LinearPattern" => Self::Stage(StageFeature::LinearPattern(
                LinearPattern::new(Vec3::X, LinearSpacing::Extent(100.0), 2),
            )),
            "PartDesign::PolarPattern" => Self::Stage(StageFeature::PolarPattern(
                PolarPattern::new(Point3::ORIGIN, Vec3::Z, 360.0, 3),
            )),
            "PartDesign::Scaled" => Self::Stage(StageFeature::Scaled(Scaled::new(2.0, 2))),
            "PartDesign::MultiTransform" => Self::MultiTransform(MultiTransform::default()),
            other => Self::Other(other.to_owned()),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Primitive(Primitive::Box { .. }) => "Part::Box",
            Self::Primitive(Primitive::Cylinder { .. }) => "Part::Cylinder",
            Self::Primitive(Primitive::Sphere { .. }) => "Part::Sphere",
            Self::Mesh(_) => "Mesh::Feature",
            Self::Stage(StageFeature::Mirrored(_)) => "PartDesign::Mirrored",
            Self::Stage(StageFeature::LinearPattern(_)) => "PartDesign::LinearPattern",
            Self::Stage(StageFeature::PolarPattern(_)) => "PartDesign::PolarPattern",
            Self::Stage(StageFeature::Scaled(_)) => "PartDesign::Scaled",
            Self::MultiTransform(_) => "PartDesign::MultiTransform",
            Self::Other(type_name) => type_name,
        }
    }

    /// Set one property from its textual value. Properties of unmodelled
    /// types are ignored.
    pub fn set_property(&mut self, property: &str, value: &str) -> Result<(), PropertyError> {
        let type_name = self.type_name().to_owned();
        let unknown = || PropertyError::Unknown {
            type_name: type_name.clone(),
            property: property.to_owned(),
        };

        match self {
            Self::Primitive(primitive) => match (primitive, property) {
                (
                    Primitive::Box { position, .. }
                    | Primitive::Cylinder { position, .. }
                    | Primitive::Sphere { position, .. },
                    "Position",
                ) => *position = Point3::from(parse_triple(property, value)?),
                (Primitive::Box { length, .. }, "Length") => *length = parse_f64(property, value)?,
                (Primitive::Box { width, .. }, "Width") => *width = parse_f64(property, value)?,
                (
                    Primitive::Box { height, .. } | Primitive::Cylinder { height, .. },
                    "Height",
                ) => *height = parse_f64(property, value)?,
                (
                    Primitive::Cylinder { radius, .. } | Primitive::Sphere { radius, .. },
                    "Radius",
                ) => *radius = parse_f64(property, value)?,
                _ => return Err(unknown()),
            },
            Self::Mesh(mesh) => match property {
                "Points" => {
                    let coords = parse_list::<f64>(property, value, "a list of numbers")?;
                    if coords.len() % 3 != 0 {
                        return Err(invalid(property, "x y z triples", value));
                    }
                    mesh.positions = coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
                }
                "Triangles" => {
                    mesh.indices = parse_list::<u32>(property, value, "a list of vertex indices")?;
                }
                _ => return Err(unknown()),
            },
            Self::Stage(stage) => set_stage_property(stage, property, value, unknown)?,
            Self::MultiTransform(feature) => match property {
                "Originals" => feature.originals = parse_names(value),
                "Transformations" => feature.transformations = parse_names(value),
                _ => return Err(unknown()),
            },
            Self::Other(_) => {}
        }
        Ok(())
    }
}

fn set_stage_property(
    stage: &mut StageFeature,
    property: &str,
    value: &str,
    unknown: impl Fn() -> PropertyError,
) -> Result<(), PropertyError> {
    match (stage, property) {
        (StageFeature::Mirrored(f), "Base") => f.base = Point3::from(parse_triple(property, value)?),
        (StageFeature::Mirrored(f), "Normal") => f.normal = Vec3::from(parse_triple(property, value)?),
        (StageFeature::LinearPattern(f), "Direction") => {
            f.direction = Vec3::from(parse_triple(property, value)?);
        }
        (StageFeature::LinearPattern(f), "Length") => {
            f.spacing = LinearSpacing::Extent(parse_f64(property, value)?);
        }
        (StageFeature::LinearPattern(f), "Offset") => {
            f.spacing = LinearSpacing::Offset(parse_f64(property, value)?);
        }
        (StageFeature::LinearPattern(f), "Occurrences") => f.occurrences = parse_u32(property, value)?,
        (StageFeature::LinearPattern(f), "Reversed") => f.reversed = parse_bool(property, value)?,
        (StageFeature::PolarPattern(f), "Base") => {
            f.axis_base = Point3::from(parse_triple(property, value)?);
        }
        (StageFeature::PolarPattern(f), "Axis") => {
            f.axis_direction = Vec3::from(parse_triple(property, value)?);
        }
        (StageFeature::PolarPattern(f), "Angle") => f.angle = parse_f64(property, value)?,
        (StageFeature::PolarPattern(f), "Occurrences") => f.occurrences = parse_u32(property, value)?,
        (StageFeature::PolarPattern(f), "Reversed") => f.reversed = parse_bool(property, value)?,
        (StageFeature::Scaled(f), "Factor") => f.factor = parse_f64(property, value)?,
        (StageFeature::Scaled(f), "Occurrences") => f.occurrences = parse_u32(property, value)?,
        _ => return Err(unknown()),
    }
    Ok(())
}

fn invalid(property: &str, expected: &'static str, value: &str) -> PropertyError {
    PropertyError::Invalid {
        property: property.to_owned(),
        expected,
        value: value.to_owned(),
    }
}

fn parse_f64(property: &str, value: &str) -> Result<f64, PropertyError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(property, "a finite number", value))
}

fn parse_u32(property: &str, value: &str) -> Result<u32, PropertyError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| invalid(property, "a non-negative integer", value))
}

fn parse_bool(property: &str, value: &str) -> Result<bool, PropertyError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(property, "true or false", value)),
    }
}

fn parse_list<T: std::str::FromStr>(
    property: &str,
    value: &str,
    expected: &'static str,
) -> Result<Vec<T>, PropertyError> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<T>().map_err(|_| invalid(property, expected, value)))
        .collect()
}

fn parse_triple(property: &str, value: &str) -> Result<[f64; 3], PropertyError> {
    let coords = parse_list::<f64>(property, value, "an `x,y,z` vector")?;
    match coords.as_slice() {
        [x, y, z] if coords.iter().all(|c| c.is_finite()) => Ok([*x, *y, *z]),
        _ => Err(invalid(property, "an `x,y,z` vector", value)),
    }
}

fn parse_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_properties_apply() {
        let mut kind = ObjectKind::from_type_name("Part::Box");
        kind.set_property("Length", "4").unwrap();
        kind.set_property("Position", "1, 2, 3").unwrap();

        assert_eq!(
            kind,
            ObjectKind::Primitive(Primitive::Box {
                position: Point3::new(1.0, 2.0, 3.0),
                length: 4.0,
                width: 10.0,
                height: 10.0,
            })
        );
    }

    #[test]
    fn unknown_property_is_reported() {
        let mut kind = ObjectKind::from_type_name("Part::Sphere");
        let err = kind.set_property("Length", "4").unwrap_err();
        assert_eq!(
            err,
            PropertyError::Unknown {
                type_name: "Part::Sphere".into(),
                property: "Length".into(),
            }
        );
    }

    #[test]
    fn malformed_vector_is_reported() {
        let mut kind = ObjectKind::from_type_name("PartDesign::Mirrored");
        assert!(matches!(
            kind.set_property("Normal", "1,0"),
            Err(PropertyError::Invalid { .. })
        ));
    }

    #[test]
    fn linear_pattern_spacing_follows_last_property() {
        let mut kind = ObjectKind::from_type_name("PartDesign::LinearPattern");
        kind.set_property("Length", "20").unwrap();
        kind.set_property("Offset", "5").unwrap();
        kind.set_property("Reversed", "true").unwrap();

        let ObjectKind::Stage(StageFeature::LinearPattern(pattern)) = kind else {
            panic!("expected a linear pattern");
        };
        assert_eq!(pattern.spacing, LinearSpacing::Offset(5.0));
        assert!(pattern.reversed);
    }

    #[test]
    fn multitransform_lists_are_split() {
        let mut kind = ObjectKind::from_type_name("PartDesign::MultiTransform");
        kind.set_property("Transformations", " Mirrored ,Scaled,, ").unwrap();

        let ObjectKind::MultiTransform(feature) = kind else {
            panic!("expected a MultiTransform");
        };
        assert_eq!(feature.transformations, vec!["Mirrored", "Scaled"]);
    }

    #[test]
    fn mesh_points_must_be_triples() {
        let mut kind = ObjectKind::from_type_name("Mesh::Feature");
        assert!(kind.set_property("Points", "0 0 0 1 0").is_err());
        kind.set_property("Points", "0 0 0, 1 0 0, 0 1 0").unwrap();
        kind.set_property("Triangles", "0 1 2").unwrap();

        let ObjectKind::Mesh(mesh) = kind else {
            panic!("expected a mesh");
        };
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn unmodelled_types_keep_their_name() {
        let mut kind = ObjectKind::from_type_name("PartDesign::Pad");
        assert!(kind.set_property("Length", "5").is_ok());
        assert_eq!(kind.type_name(), "PartDesign::Pad");
    }
}
