//! Closed triangle meshes for the primitive solids used as pattern originals.

use std::f64::consts::{PI, TAU};

use super::mesh::GeomMesh;
use super::Point3;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PrimitiveError {
    #[error("{name} must be a positive finite number (got {value})")]
    InvalidDimension { name: &'static str, value: f64 },
    #[error("{name} requires at least {min} segments (got {value})")]
    TooFewSegments {
        name: &'static str,
        min: usize,
        value: usize,
    },
}

fn positive(name: &'static str, value: f64) -> Result<f64, PrimitiveError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PrimitiveError::InvalidDimension { name, value })
    }
}

/// Axis aligned box with its minimum corner at `corner`.
pub fn box_mesh(
    corner: Point3,
    length: f64,
    width: f64,
    height: f64,
) -> Result<GeomMesh, PrimitiveError> {
    let lx = positive("length", length)?;
    let ly = positive("width", width)?;
    let lz = positive("height", height)?;

    let positions = (0..8)
        .map(|i| {
            let dx = if i & 1 == 0 { 0.0 } else { lx };
            let dy = if i & 2 == 0 { 0.0 } else { ly };
            let dz = if i & 4 == 0 { 0.0 } else { lz };
            [corner.x + dx, corner.y + dy, corner.z + dz]
        })
        .collect();

    // Outward winding; vertex bit 0 = +x, bit 1 = +y, bit 2 = +z.
    let indices = vec![
        0, 2, 3, 0, 3, 1, // -z
        4, 5, 7, 4, 7, 6, // +z
        0, 1, 5, 0, 5, 4, // -y
        2, 6, 7, 2, 7, 3, // +y
        0, 4, 6, 0, 6, 2, // -x
        1, 3, 7, 1, 7, 5, // +x
    ];

    Ok(GeomMesh::new(positions, indices))
}

/// Cylinder along +Z whose bottom cap is centred on `base`.
pub fn cylinder_mesh(
    base: Point3,
    radius: f64,
    height: f64,
    segments: usize,
) -> Result<GeomMesh, PrimitiveError> {
    let radius = positive("radius", radius)?;
    let height = positive("height", height)?;
    if segments < 3 {
        return Err(PrimitiveError::TooFewSegments {
            name: "cylinder",
            min: 3,
            value: segments,
        });
    }

    let mut positions = Vec::with_capacity(2 * segments + 2);
    for ring in 0..2 {
        let z = base.z + height * f64::from(ring);
        for i in 0..segments {
            let angle = TAU * i as f64 / segments as f64;
            positions.push([
                base.x + radius * angle.cos(),
                base.y + radius * angle.sin(),
                z,
            ]);
        }
    }
    let bottom_center = positions.len() as u32;
    positions.push([base.x, base.y, base.z]);
    let top_center = positions.len() as u32;
    positions.push([base.x, base.y, base.z + height]);

    let n = segments as u32;
    let mut indices = Vec::with_capacity(12 * segments);
    for i in 0..n {
        let next = (i + 1) % n;
        let (b0, b1, t0, t1) = (i, next, i + n, next + n);
        indices.extend_from_slice(&[b0, b1, t1, b0, t1, t0]);
        indices.extend_from_slice(&[bottom_center, b1, b0]);
        indices.extend_from_slice(&[top_center, t0, t1]);
    }

    Ok(GeomMesh::new(positions, indices))
}

/// UV sphere centred on `center`.
pub fn sphere_mesh(
    center: Point3,
    radius: f64,
    segments: usize,
    rings: usize,
) -> Result<GeomMesh, PrimitiveError> {
    let radius = positive("radius", radius)?;
    if segments < 3 {
        return Err(PrimitiveError::TooFewSegments {
            name: "sphere segments",
            min: 3,
            value: segments,
        });
    }
    if rings < 2 {
        return Err(PrimitiveError::TooFewSegments {
            name: "sphere rings",
            min: 2,
            value: rings,
        });
    }

    let mut positions = Vec::with_capacity(segments * (rings - 1) + 2);
    positions.push([center.x, center.y, center.z - radius]);
    for ring in 1..rings {
        let phi = -PI / 2.0 + PI * ring as f64 / rings as f64;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for i in 0..segments {
            let theta = TAU * i as f64 / segments as f64;
            positions.push([
                center.x + radius * cos_phi * theta.cos(),
                center.y + radius * cos_phi * theta.sin(),
                center.z + radius * sin_phi,
            ]);
        }
    }
    let north = positions.len() as u32;
    positions.push([center.x, center.y, center.z + radius]);

    let n = segments as u32;
    let ring_start = |ring: usize| 1 + (ring as u32 - 1) * n;
    let mut indices = Vec::new();

    for i in 0..n {
        let next = (i + 1) % n;
        indices.extend_from_slice(&[0, ring_start(1) + next, ring_start(1) + i]);
    }
    for ring in 1..rings - 1 {
        let lower = ring_start(ring);
        let upper = ring_start(ring + 1);
        for i in 0..n {
            let next = (i + 1) % n;
            indices.extend_from_slice(&[lower + i, lower + next, upper + next]);
            indices.extend_from_slice(&[lower + i, upper + next, upper + i]);
        }
    }
    let last = ring_start(rings - 1);
    for i in 0..n {
        let next = (i + 1) % n;
        indices.extend_from_slice(&[north, last + i, last + next]);
    }

    Ok(GeomMesh::new(positions, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn box_volume_and_center() {
        let mesh = box_mesh(Point3::new(1.0, 0.0, 0.0), 2.0, 4.0, 6.0).unwrap();
        assert!(mesh.validate().is_ok());
        let props = mesh.volume_properties().unwrap();
        assert!((props.volume - 48.0).abs() < 1e-9);
        assert!(Tolerance::DEFAULT
            .approx_eq_point3(props.center_of_mass, Point3::new(2.0, 2.0, 3.0)));
    }

    #[test]
    fn box_rejects_zero_dimension() {
        let err = box_mesh(Point3::ORIGIN, 1.0, 0.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            PrimitiveError::InvalidDimension {
                name: "width",
                value: 0.0
            }
        );
    }

    #[test]
    fn cylinder_center_is_mid_height() {
        let mesh = cylinder_mesh(Point3::new(0.0, 0.0, 1.0), 2.0, 4.0, 32).unwrap();
        assert!(mesh.validate().is_ok());
        let props = mesh.volume_properties().unwrap();
        assert!(Tolerance::LOOSE
            .approx_eq_point3(props.center_of_mass, Point3::new(0.0, 0.0, 3.0)));
        // Inscribed polygon area: n/2 * r^2 * sin(2pi/n).
        let expected = 16.0 * 4.0 * (TAU / 32.0).sin() * 4.0;
        assert!((props.volume - expected).abs() < 1e-9);
    }

    #[test]
    fn sphere_center_matches_input() {
        let center = Point3::new(3.0, -2.0, 5.0);
        let mesh = sphere_mesh(center, 1.5, 24, 12).unwrap();
        assert!(mesh.validate().is_ok());
        let props = mesh.volume_properties().unwrap();
        assert!(Tolerance::LOOSE.approx_eq_point3(props.center_of_mass, center));
        assert!(props.volume < 4.0 / 3.0 * PI * 1.5_f64.powi(3));
    }

    #[test]
    fn sphere_requires_rings() {
        assert!(sphere_mesh(Point3::ORIGIN, 1.0, 8, 1).is_err());
    }
}
