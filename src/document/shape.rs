//! Shape generation: one transformed copy of the originals per placement.

use crate::compose::Placement;
use crate::geom::{GeomMesh, MeshError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Merge the originals into one mesh and emit a transformed copy of it for
/// every placement. The copies are concatenated, not fused.
pub fn pattern_shape(originals: &[GeomMesh], placements: &[Placement]) -> Result<GeomMesh, MeshError> {
    let mut base = GeomMesh::default();
    for original in originals {
        base.append(original)?;
    }

    let copies = build_copies(&base, placements);
    let mut shape = GeomMesh::default();
    for copy in &copies {
        shape.append(copy)?;
    }
    log::debug!(
        "patterned {} copies into {} triangles",
        copies.len(),
        shape.triangle_count()
    );
    Ok(shape)
}

#[cfg(feature = "parallel")]
fn build_copies(base: &GeomMesh, placements: &[Placement]) -> Vec<GeomMesh> {
    placements
        .par_iter()
        .map(|placement| base.transformed(&placement.transform))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn build_copies(base: &GeomMesh, placements: &[Placement]) -> Vec<GeomMesh> {
    placements
        .iter()
        .map(|placement| base.transformed(&placement.transform))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Transform, Vec3, box_mesh};

    #[test]
    fn one_copy_per_placement() {
        let originals = vec![box_mesh(Point3::ORIGIN, 1.0, 1.0, 1.0).unwrap()];
        let placements = vec![
            Placement::new(Transform::identity(), Point3::new(0.5, 0.5, 0.5)),
            Placement::new(
                Transform::translate(Vec3::new(5.0, 0.0, 0.0)),
                Point3::new(5.5, 0.5, 0.5),
            ),
        ];
        let shape = pattern_shape(&originals, &placements).unwrap();

        assert_eq!(shape.triangle_count(), 24);
        let props = shape.volume_properties().unwrap();
        assert!((props.volume - 2.0).abs() < 1e-9);
        assert!((props.center_of_mass.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn no_placements_gives_empty_shape() {
        let originals = vec![box_mesh(Point3::ORIGIN, 1.0, 1.0, 1.0).unwrap()];
        assert!(pattern_shape(&originals, &[]).unwrap().is_empty());
    }
}
