//! Surface queries: ray casts, nearest points and plane cross-sections.

pub mod traits;
pub mod trimesh;

pub use traits::{GeometryProvider, SurfaceHit, SurfaceProvider};
pub use trimesh::TriMeshSurface;
