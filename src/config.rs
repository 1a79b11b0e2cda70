//! Tunable parameters for stroke processing and contour splitting.

use crate::float_types::Real;

/// How a stroke decides how many poly nodes to place along its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertNodeMode {
    /// Derive the segment count from the path length and the quad size.
    QuadSize,
    /// Use a fixed segment count and derive the quad size from it.
    Segments,
}

/// All processing parameters in one struct, passed explicitly into each
/// operation that needs them.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourConfig {
    // -- Stroke capture --
    /// Keep the first sample and every `cull_factor`-th sample of a raw stroke.
    pub cull_factor: usize,

    // -- Feature detection --
    /// RDP tolerance is the bounding diagonal divided by this value.
    /// Larger = more knots.
    pub feature_factor: Real,

    // -- Smoothing --
    /// Number of relaxation passes per knot segment.
    pub smooth_iterations: usize,
    /// Fraction of the way each interior point moves toward its neighbor average per pass.
    pub relax_factor: Real,

    // -- Poly nodes --
    /// Quad length is the surface bounding diagonal divided by this value.
    pub density_factor: Real,
    /// Segment count used by [`VertNodeMode::Segments`] and by plane cuts.
    pub segments: usize,
    pub vert_node_mode: VertNodeMode,

    // -- Intersections --
    /// Distance under which two path edges are considered crossing.
    pub intersection_threshold: Real,
    /// How many levels of mutual splitting are performed. Clamped to 1.
    pub max_split_depth: usize,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            cull_factor: 3,
            feature_factor: 5.0,
            smooth_iterations: 4,
            relax_factor: 0.5,
            density_factor: 40.0,
            segments: 10,
            vert_node_mode: VertNodeMode::QuadSize,
            intersection_threshold: 0.1,
            max_split_depth: 1,
        }
    }
}

impl ContourConfig {
    /// RDP tolerance for a path whose bounding box has the given diagonal.
    pub fn feature_tolerance(&self, bounding_diagonal: Real) -> Real {
        bounding_diagonal / self.feature_factor.max(Real::EPSILON)
    }

    /// Target quad edge length for a surface whose bounding box has the given diagonal.
    pub fn quad_length(&self, bounding_diagonal: Real) -> Real {
        bounding_diagonal / self.density_factor.max(Real::EPSILON)
    }

    /// Mutual split depth actually honoured by the splitter.
    ///
    /// A second level would only test fragments against fragments that already
    /// end on the crossing points, and those are filtered as endpoint touches.
    pub fn effective_split_depth(&self) -> usize {
        self.max_split_depth.min(1)
    }
}
