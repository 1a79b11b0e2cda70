//! Surface **contours** for retopology: the geometric core that turns mesh
//! cross-sections and freehand strokes into evenly spaced point loops whose
//! points correspond one to one, ready to be bridged into quads.
//!
//! - [`path`]: Ramer–Douglas–Peucker feature knots, arc-length resampling,
//!   knot-segmented relaxation, path intersection and splitting
//! - [`contour`]: raw/resampled loops with winding, discrete shift and phase
//!   shift correspondence, connectivity quality and relationship analysis
//! - [`stroke`]: the freehand stroke pipeline from samples to poly nodes
//! - [`surface`]: the surface queries everything is snapped against, with a
//!   parry `TriMesh` implementation
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon for multithreading

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod config;
pub mod contour;
pub mod errors;
pub mod float_types;
pub mod path;
pub mod plane;
pub mod polyline;
pub mod stroke;
pub mod surface;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use config::{ContourConfig, VertNodeMode};
pub use contour::{AlignmentReport, Contour, RelationshipReport};
pub use errors::ContourError;
pub use path::KnotSet;
pub use plane::Plane;
pub use polyline::{Edge, Polyline};
pub use stroke::SketchLine;
pub use surface::{GeometryProvider, SurfaceHit, SurfaceProvider, TriMeshSurface};
