//! Ordering an unordered edge selection into a single chain.

use crate::errors::ContourError;
use crate::float_types::Real;
use crate::polyline::{Edge, Polyline};
use hashbrown::HashMap;
use nalgebra::Point3;

/// Walk `edges` (in any order and orientation) into one ordered chain of
/// `points`, closed when every vertex has two neighbors.
///
/// Open chains start at the first end vertex found in `edges`; loops start
/// at the first vertex of `edges[0]` and head toward its second vertex.
///
/// ## Errors
/// - `InvalidEdge` for an edge referring past `points` or joining a vertex to itself
/// - `DegenerateGeometry` when the edges branch or form more than one chain
/// - `TooFewPoints` when the chain is too short to be a polyline
pub fn order_edge_loop(points: &[Point3<Real>], edges: &[Edge]) -> Result<Polyline, ContourError> {
    let Some(&(first_a, first_b)) = edges.first() else {
        return Err(ContourError::TooFewPoints {
            required: 2,
            found: 0,
        });
    };

    let mut neighbors: HashMap<usize, Vec<usize>> = HashMap::new();
    for &(a, b) in edges {
        if a >= points.len() || b >= points.len() || a == b {
            return Err(ContourError::InvalidEdge(a, b));
        }
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }
    if let Some((vertex, _)) = neighbors.iter().find(|(_, adjacent)| adjacent.len() > 2) {
        return Err(ContourError::DegenerateGeometry(format!(
            "vertex {vertex} joins more than two selected edges"
        )));
    }

    let end_vertex = edges
        .iter()
        .flat_map(|&(a, b)| [a, b])
        .find(|v| neighbors[v].len() == 1);
    let cyclic = end_vertex.is_none();

    let (start, mut current) = match end_vertex {
        Some(v) => (v, neighbors[&v][0]),
        None => (first_a, first_b),
    };
    let mut order = vec![start];
    let mut previous = start;
    while current != start {
        order.push(current);
        let Some(&next) = neighbors[&current].iter().find(|&&n| n != previous) else {
            break;
        };
        previous = current;
        current = next;
    }

    let walked = if cyclic { order.len() } else { order.len() - 1 };
    if walked != edges.len() {
        return Err(ContourError::DegenerateGeometry(format!(
            "selected edges form more than one chain ({walked} of {} edges reached)",
            edges.len()
        )));
    }

    log::debug!("ordered {} edges, closed: {cyclic}", edges.len());
    Polyline::new(order.into_iter().map(|i| points[i]).collect(), cyclic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Point3<Real>> {
        (0..6).map(|i| Point3::new(i as Real, (i * i) as Real, 0.0)).collect()
    }

    #[test]
    fn shuffled_loop_is_ordered() {
        let points = grid();
        let edges = [(2, 3), (0, 1), (3, 0), (1, 2)];
        let ordered = order_edge_loop(&points, &edges).unwrap();
        assert!(ordered.is_cyclic());
        assert_eq!(ordered.points(), &[points[2], points[3], points[0], points[1]]);
    }

    #[test]
    fn open_chain_starts_at_an_end() {
        let points = grid();
        let edges = [(3, 4), (1, 2), (2, 3)];
        let ordered = order_edge_loop(&points, &edges).unwrap();
        assert!(!ordered.is_cyclic());
        assert_eq!(ordered.points(), &[points[4], points[3], points[2], points[1]]);
    }

    #[test]
    fn branches_and_gaps_are_rejected() {
        let points = grid();
        assert!(matches!(
            order_edge_loop(&points, &[(0, 1), (1, 2), (1, 3)]),
            Err(ContourError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            order_edge_loop(&points, &[(0, 1), (3, 4)]),
            Err(ContourError::DegenerateGeometry(_))
        ));
        assert_eq!(
            order_edge_loop(&points, &[(0, 9)]),
            Err(ContourError::InvalidEdge(0, 9))
        );
        assert!(order_edge_loop(&points, &[]).is_err());
    }
}
