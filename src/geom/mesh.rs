use serde::Serialize;

use super::{Point3, Tolerance, Transform, Vec3};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("merged mesh cannot be addressed with u32 indices ({vertices} vertices)")]
    IndexOverflow { vertices: usize },
}

/// Indexed triangle mesh. Closed meshes stand in for solids.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
}

/// Mass properties of a closed mesh with unit density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeProperties {
    pub volume: f64,
    pub center_of_mass: Point3,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p.iter().all(|c| c.is_finite()))
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        Ok(())
    }

    /// Volume and centre of mass, integrated over the signed tetrahedra
    /// spanned by each triangle and the origin.
    ///
    /// Both winding orders give the same centre. Returns `None` when the
    /// mesh encloses no volume.
    #[must_use]
    pub fn volume_properties(&self) -> Option<VolumeProperties> {
        let mut volume = 0.0;
        let mut moment = Vec3::ZERO;

        for tri in self.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (
                self.positions.get(tri[0] as usize),
                self.positions.get(tri[1] as usize),
                self.positions.get(tri[2] as usize),
            ) else {
                continue;
            };

            let av = Vec3::from_array(*a);
            let bv = Vec3::from_array(*b);
            let cv = Vec3::from_array(*c);
            let tet = av.dot(bv.cross(cv)) / 6.0;
            volume += tet;
            moment = moment + (av + bv + cv) * (tet / 4.0);
        }

        if !volume.is_finite() || Tolerance::DEFAULT.approx_zero_f64(volume) {
            return None;
        }

        let center = moment / volume;
        Some(VolumeProperties {
            volume: volume.abs(),
            center_of_mass: Point3::new(center.x, center.y, center.z),
        })
    }

    /// Copy of the mesh with every vertex mapped through `transform`.
    ///
    /// Orientation-reversing transforms (mirrors) flip the triangle winding
    /// so outward normals stay outward.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let positions = self
            .positions
            .iter()
            .map(|p| transform.apply_point(Point3::from_array(*p)).to_array())
            .collect();

        let mut indices = self.indices.clone();
        if transform.linear_determinant() < 0.0 {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }

        Self { positions, indices }
    }

    /// Append another mesh, offsetting its indices. Leaves `self` untouched
    /// when the merged indices would not fit in `u32`.
    pub fn append(&mut self, other: &Self) -> Result<(), MeshError> {
        let vertices = self.positions.len() + other.positions.len();
        let overflow = || MeshError::IndexOverflow { vertices };
        let offset = u32::try_from(self.positions.len()).map_err(|_| overflow())?;
        let indices = other
            .indices
            .iter()
            .map(|&i| i.checked_add(offset).ok_or_else(overflow))
            .collect::<Result<Vec<u32>, MeshError>>()?;

        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(indices);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tetrahedron() -> GeomMesh {
        GeomMesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        )
    }

    #[test]
    fn validate_rejects_out_of_bounds_indices() {
        let mut mesh = unit_tetrahedron();
        assert!(mesh.validate().is_ok());
        mesh.indices.push(7);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn tetrahedron_volume_and_centroid() {
        let props = unit_tetrahedron().volume_properties().unwrap();
        assert!((props.volume - 1.0 / 6.0).abs() < 1e-12);
        assert!(Tolerance::DEFAULT
            .approx_eq_point3(props.center_of_mass, Point3::new(0.25, 0.25, 0.25)));
    }

    #[test]
    fn inverted_winding_gives_same_centroid() {
        let mut mesh = unit_tetrahedron();
        for tri in mesh.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        let props = mesh.volume_properties().unwrap();
        assert!((props.volume - 1.0 / 6.0).abs() < 1e-12);
        assert!(Tolerance::DEFAULT
            .approx_eq_point3(props.center_of_mass, Point3::new(0.25, 0.25, 0.25)));
    }

    #[test]
    fn flat_mesh_has_no_volume() {
        let mesh = GeomMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2, 0, 2, 1],
        );
        assert!(mesh.volume_properties().is_none());
    }

    #[test]
    fn mirrored_copy_keeps_positive_volume() {
        let mirror = Transform::mirror(Point3::ORIGIN, Vec3::X).unwrap();
        let mirrored = unit_tetrahedron().transformed(&mirror);
        let original = unit_tetrahedron().volume_properties().unwrap();
        let props = mirrored.volume_properties().unwrap();

        assert!((props.volume - original.volume).abs() < 1e-12);
        assert!(Tolerance::DEFAULT
            .approx_eq_point3(props.center_of_mass, Point3::new(-0.25, 0.25, 0.25)));
        assert_eq!(mirrored.indices[0..3], [0, 1, 2]);
    }

    #[test]
    fn append_offsets_indices() {
        let mut mesh = unit_tetrahedron();
        mesh.append(&unit_tetrahedron()).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.indices[12], 4);
    }

    #[test]
    fn append_rejects_index_overflow() {
        let mut mesh = unit_tetrahedron();
        let far = GeomMesh::new(vec![[0.0, 0.0, 0.0]], vec![0, 0, u32::MAX - 1]);

        assert_eq!(
            mesh.append(&far),
            Err(MeshError::IndexOverflow { vertices: 5 })
        );
        assert_eq!(mesh, unit_tetrahedron());
    }
}
