mod core;
mod mesh;
mod primitive;

pub use self::core::{Point3, Tolerance, Transform, Vec3};
pub use mesh::{GeomMesh, MeshError, VolumeProperties};
pub use primitive::{PrimitiveError, box_mesh, cylinder_mesh, sphere_mesh};
