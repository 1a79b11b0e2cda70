//! Crossings between paths and splitting a path at them.

use crate::errors::ContourError;
use crate::float_types::{Real, tolerance};
use crate::path::resample::resample;
use crate::polyline::Polyline;
use hashbrown::HashMap;
use nalgebra::Point3;

/// Points a fragment shorter than three points is re-densified to.
pub const SHORT_FRAGMENT_POINTS: usize = 4;

/// A near-crossing of edge `edge_a` of one path with edge `edge_b` of another.
///
/// Edge `k` runs from point `k` to point `k + 1` (wrapping for loops).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathIntersection {
    pub point: Point3<Real>,
    pub edge_a: usize,
    pub edge_b: usize,
    /// Position of the crossing along `edge_a`, in `[0, 1)`.
    pub param_a: Real,
}

/// Closest points between segments `p1..q1` and `p2..q2`.
///
/// Returns the segment parameters `(s, t)`, both clamped to `[0, 1]`.
fn closest_segment_params(
    p1: &Point3<Real>,
    q1: &Point3<Real>,
    p2: &Point3<Real>,
    q2: &Point3<Real>,
) -> (Real, Real) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);
    let eps = tolerance() * tolerance();

    if a <= eps && e <= eps {
        return (0.0, 0.0);
    }
    if a <= eps {
        return (0.0, (f / e).clamp(0.0, 1.0));
    }
    let c = d1.dot(&r);
    if e <= eps {
        return ((-c / a).clamp(0.0, 1.0), 0.0);
    }

    let b = d1.dot(&d2);
    let denom = a * e - b * b;
    // parallel segments: any s works, start from p1
    let mut s = if denom > eps {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }
    (s, t)
}

/// Every place where an edge of `a` passes within `threshold` of an edge of
/// `b`, ordered along `a`.
///
/// Edges are finite segments. A crossing exactly at a shared vertex is
/// reported once, on the edge that starts there. Hits closer than
/// `threshold` to the previous hit along `a` are merged into it.
pub fn intersect(a: &Polyline, b: &Polyline, threshold: Real) -> Vec<PathIntersection> {
    let mut hits = Vec::new();
    for (edge_a, (p1, q1)) in a.segments().enumerate() {
        for (edge_b, (p2, q2)) in b.segments().enumerate() {
            let (s, t) = closest_segment_params(&p1, &q1, &p2, &q2);
            if s >= 1.0 || t >= 1.0 {
                continue;
            }
            let on_a = p1 + (q1 - p1) * s;
            let on_b = p2 + (q2 - p2) * t;
            if (on_a - on_b).norm() < threshold {
                hits.push(PathIntersection {
                    point: nalgebra::center(&on_a, &on_b),
                    edge_a,
                    edge_b,
                    param_a: s,
                });
            }
        }
    }

    hits.sort_by(|x, y| {
        x.edge_a
            .cmp(&y.edge_a)
            .then(x.param_a.total_cmp(&y.param_a))
    });
    hits.dedup_by(|next, kept| (next.point - kept.point).norm() < threshold);
    hits
}

/// Drop hits lying within `threshold` of an end point of either open path.
///
/// Two strokes drawn to meet end to end touch there without crossing.
/// Loops have no end points, so only the open paths' ends are considered.
pub fn filter_endpoint_touches(
    hits: Vec<PathIntersection>,
    a: &Polyline,
    b: &Polyline,
    threshold: Real,
) -> Vec<PathIntersection> {
    let ends: Vec<Point3<Real>> = [a, b]
        .into_iter()
        .filter(|path| !path.is_cyclic())
        .flat_map(|path| [path.first(), path.last()])
        .collect();
    let before = hits.len();
    let kept: Vec<_> = hits
        .into_iter()
        .filter(|hit| ends.iter().all(|end| (hit.point - end).norm() >= threshold))
        .collect();
    if kept.len() < before {
        log::debug!("ignored {} end point touches", before - kept.len());
    }
    kept
}

/// A place to cut a path: `point`, lying at parameter `param` along edge `edge`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathCut {
    pub edge: usize,
    pub param: Real,
    pub point: Point3<Real>,
}

impl From<&PathIntersection> for PathCut {
    fn from(hit: &PathIntersection) -> Self {
        Self {
            edge: hit.edge_a,
            param: hit.param_a,
            point: hit.point,
        }
    }
}

/// Cut `path` at each edge in `edges`, inserting `inserted[edge]` as the shared
/// end point of the two fragments meeting there (the edge midpoint when no
/// point is given). Repeated edges are cut once.
///
/// See [`split_at_cuts`] for the fragment layout.
///
/// ## Errors
/// `InvalidEdge` when an index is not an edge of `path`.
pub fn split_at(
    path: &Polyline,
    edges: &[usize],
    inserted: &HashMap<usize, Point3<Real>>,
) -> Result<Vec<Polyline>, ContourError> {
    let points = path.points();
    let n = points.len();
    let edge_count = path.edges().len();

    let mut indices = edges.to_vec();
    indices.sort_unstable();
    indices.dedup();
    let mut cuts = Vec::with_capacity(indices.len());
    for k in indices {
        if k >= edge_count {
            return Err(ContourError::InvalidEdge(k, k + 1));
        }
        let (a, b) = (points[k], points[(k + 1) % n]);
        let point = inserted.get(&k).copied().unwrap_or_else(|| nalgebra::center(&a, &b));
        let ab = b - a;
        let len_sq = ab.norm_squared();
        let param = if len_sq > 0.0 {
            ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        cuts.push(PathCut { edge: k, param, point });
    }
    split_at_cuts(path, &cuts)
}

/// Cut `path` at every cut in `cuts`; several cuts may share an edge and are
/// applied in order of their parameter along it. Cuts at the same point are
/// applied once.
///
/// An open path cut `m` times gives `m + 1` fragments; a loop cut `m` times
/// gives `m` open fragments, the last one running through the old start.
/// Neighboring fragments share the cut point. Fragments of fewer than three
/// points are resampled to [`SHORT_FRAGMENT_POINTS`]; zero-length fragments
/// are dropped.
///
/// ## Errors
/// `InvalidEdge` when a cut names an edge `path` does not have.
pub fn split_at_cuts(path: &Polyline, cuts: &[PathCut]) -> Result<Vec<Polyline>, ContourError> {
    let points = path.points();
    let n = points.len();
    let edge_count = path.edges().len();

    if let Some(bad) = cuts.iter().find(|cut| cut.edge >= edge_count) {
        return Err(ContourError::InvalidEdge(bad.edge, bad.edge + 1));
    }
    let mut cuts = cuts.to_vec();
    cuts.sort_by(|x, y| x.edge.cmp(&y.edge).then(x.param.total_cmp(&y.param)));
    cuts.dedup_by(|next, kept| next.edge == kept.edge && (next.point - kept.point).norm() < tolerance());
    if cuts.is_empty() {
        return Ok(vec![path.clone()]);
    }

    let mut raw: Vec<Vec<Point3<Real>>> = Vec::with_capacity(cuts.len() + 1);
    if path.is_cyclic() {
        for (i, cut) in cuts.iter().enumerate() {
            // wrap to the first cut one lap later
            let (next, end) = match cuts.get(i + 1) {
                Some(next) => (next, next.edge),
                None => (&cuts[0], cuts[0].edge + n),
            };
            let mut fragment = vec![cut.point];
            fragment.extend((cut.edge + 1..=end).map(|j| points[j % n]));
            fragment.push(next.point);
            raw.push(fragment);
        }
    } else {
        let mut fragment: Vec<Point3<Real>> = Vec::new();
        let mut start = 0;
        for cut in &cuts {
            if start <= cut.edge {
                fragment.extend_from_slice(&points[start..=cut.edge]);
            }
            fragment.push(cut.point);
            raw.push(std::mem::replace(&mut fragment, vec![cut.point]));
            start = cut.edge + 1;
        }
        fragment.extend_from_slice(&points[start..]);
        raw.push(fragment);
    }

    let mut out = Vec::with_capacity(raw.len());
    for fragment in raw {
        let fragment = Polyline::open(fragment)?;
        if fragment.length() < tolerance() {
            log::debug!("dropped a zero length fragment");
            continue;
        }
        if fragment.len() < 3 {
            log::debug!("re-densifying a {} point fragment", fragment.len());
            out.push(resample(&fragment, SHORT_FRAGMENT_POINTS, 0.0)?.0);
        } else {
            out.push(fragment);
        }
    }
    Ok(out)
}

/// Result of splitting one path against others.
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    /// Fragments of the path itself, in order. A single entry when nothing crossed it.
    pub fragments: Vec<Polyline>,
    /// For each other path that was split in turn: its index and its fragments.
    pub others: Vec<(usize, Vec<Polyline>)>,
}

/// Split `path` everywhere it crosses one of `others`, ignoring end point
/// touches. Every crossing becomes a cut, also when several fall on one edge.
///
/// With `depth > 0` every other path that `path` crosses is split against
/// `path` in turn, one level shallower; at `depth == 0` only `path` is cut.
///
/// ## Errors
/// Propagates [`split_at_cuts`] failures.
pub fn split_against(
    path: &Polyline,
    others: &[Polyline],
    threshold: Real,
    depth: usize,
) -> Result<SplitOutcome, ContourError> {
    let mut cuts: Vec<PathCut> = Vec::new();
    let mut outcome = SplitOutcome::default();

    for (index, other) in others.iter().enumerate() {
        let hits = filter_endpoint_touches(intersect(path, other, threshold), path, other, threshold);
        if hits.is_empty() {
            continue;
        }
        cuts.extend(hits.iter().map(PathCut::from));
        if depth > 0 {
            let split_other = split_against(other, std::slice::from_ref(path), threshold, depth - 1)?;
            if split_other.fragments.len() > 1 {
                outcome.others.push((index, split_other.fragments));
            }
        }
    }

    outcome.fragments = split_at_cuts(path, &cuts)?;
    if outcome.fragments.len() > 1 {
        log::info!("split path into {} fragments", outcome.fragments.len());
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(from: (Real, Real), to: (Real, Real), count: usize) -> Polyline {
        let a = Point3::new(from.0, from.1, 0.0);
        let b = Point3::new(to.0, to.1, 0.0);
        Polyline::open(
            (0..count)
                .map(|i| a + (b - a) * (i as Real / (count - 1) as Real))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn crossing_lines_meet_once() {
        let a = line((0.0, 0.0), (4.0, 0.0), 5);
        let b = line((2.5, -2.0), (2.5, 2.0), 5);
        let hits = intersect(&a, &b, 0.1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].edge_a, 2);
        assert_eq!(hits[0].edge_b, 2);
        assert_relative_eq!(hits[0].point, Point3::new(2.5, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn crossing_at_vertex_reported_once() {
        let a = line((0.0, 0.0), (4.0, 0.0), 5);
        let b = line((2.0, -1.0), (2.0, 1.0), 3);
        let hits = intersect(&a, &b, 0.1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].edge_a, 2);
    }

    #[test]
    fn skew_segments_within_threshold() {
        let a = line((0.0, 0.0), (2.0, 0.0), 2);
        let b = Polyline::open(vec![Point3::new(1.0, -1.0, 0.05), Point3::new(1.0, 1.0, 0.05)]).unwrap();
        assert_eq!(intersect(&a, &b, 0.1).len(), 1);
        assert!(intersect(&a, &b, 0.01).is_empty());
    }

    #[test]
    fn end_touch_is_filtered() {
        let a = line((0.0, 0.0), (2.0, 0.0), 3);
        let b = line((1.95, 0.0), (1.95, 2.0), 3);
        let hits = intersect(&a, &b, 0.1);
        assert!(!hits.is_empty());
        assert!(filter_endpoint_touches(hits, &a, &b, 0.1).is_empty());
    }

    #[test]
    fn open_split_shares_crossing_point() {
        let a = line((0.0, 0.0), (4.0, 0.0), 5);
        let x = Point3::new(2.5, 0.0, 0.0);
        let inserted: HashMap<usize, Point3<Real>> = [(2, x)].into_iter().collect();
        let fragments = split_at(&a, &[2], &inserted).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].len(), 4);
        assert_eq!(fragments[0].last(), x);
        assert_eq!(fragments[1].first(), x);
        assert_eq!(fragments[1].last(), a.last());
        assert_relative_eq!(
            fragments[0].length() + fragments[1].length(),
            a.length(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn short_fragment_is_densified() {
        let a = line((0.0, 0.0), (4.0, 0.0), 5);
        let x = Point3::new(0.5, 0.0, 0.0);
        let inserted: HashMap<usize, Point3<Real>> = [(0, x)].into_iter().collect();
        let fragments = split_at(&a, &[0], &inserted).unwrap();
        assert_eq!(fragments[0].len(), SHORT_FRAGMENT_POINTS);
        assert_eq!(fragments[0].first(), a.first());
        assert_relative_eq!(fragments[0].last(), x, epsilon = 1e-9);
    }

    #[test]
    fn loop_split_opens_it() {
        let square = Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        let fragments = split_at(&square, &[0, 2], &HashMap::new()).unwrap();
        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|f| !f.is_cyclic()));
        assert_relative_eq!(fragments[0].first(), Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(fragments[0].last(), Point3::new(0.5, 1.0, 0.0));
        assert_relative_eq!(fragments[1].last(), Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(fragments[0].length() + fragments[1].length(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn out_of_range_edge_is_rejected() {
        let a = line((0.0, 0.0), (1.0, 0.0), 3);
        assert_eq!(
            split_at(&a, &[2], &HashMap::new()),
            Err(ContourError::InvalidEdge(2, 3))
        );
    }

    #[test]
    fn crossings_sharing_an_edge_all_cut() {
        let a = line((0.0, 0.0), (4.0, 0.0), 2);
        let others = [line((1.0, -1.0), (1.0, 1.0), 2), line((3.0, -1.0), (3.0, 1.0), 2)];
        let outcome = split_against(&a, &others, 0.1, 1).unwrap();

        assert_eq!(outcome.fragments.len(), 3);
        let (left, right) = (Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(outcome.fragments[0].last(), left, epsilon = 1e-9);
        assert_relative_eq!(outcome.fragments[1].first(), left, epsilon = 1e-9);
        assert_relative_eq!(outcome.fragments[1].last(), right, epsilon = 1e-9);
        assert_relative_eq!(outcome.fragments[2].first(), right, epsilon = 1e-9);

        assert_eq!(outcome.others.len(), 2);
        for ((index, fragments), crossing) in outcome.others.iter().zip([left, right]) {
            assert_eq!(fragments.len(), 2, "other {index}");
            assert_relative_eq!(fragments[0].last(), crossing, epsilon = 1e-9);
        }
    }

    #[test]
    fn u_turn_crossing_one_edge_twice() {
        let a = line((0.0, 0.0), (4.0, 0.0), 2);
        let u = Polyline::open(vec![
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(3.0, -1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ])
        .unwrap();
        let outcome = split_against(&a, std::slice::from_ref(&u), 0.1, 1).unwrap();
        assert_eq!(outcome.fragments.len(), 3);
        assert_eq!(outcome.others.len(), 1);
        let u_fragments = &outcome.others[0].1;
        assert_eq!(u_fragments.len(), 3);

        // both sides cut at the same two coordinates
        for i in 0..2 {
            assert_relative_eq!(outcome.fragments[i].last(), u_fragments[i].last(), epsilon = 1e-9);
        }
        let covered: Real = outcome.fragments.iter().map(Polyline::length).sum();
        assert_relative_eq!(covered, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn loop_cut_twice_on_one_edge() {
        let square = Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ])
        .unwrap();
        let cut = |param: Real| PathCut {
            edge: 0,
            param,
            point: Point3::new(4.0 * param, 0.0, 0.0),
        };
        let fragments = split_at_cuts(&square, &[cut(0.75), cut(0.25)]).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_relative_eq!(fragments[0].first(), Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(fragments[0].last(), Point3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(fragments[1].first(), Point3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(fragments[1].last(), Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(fragments[0].length() + fragments[1].length(), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn mutual_split_cuts_both() {
        let a = line((0.0, 0.0), (4.0, 0.0), 9);
        let b = line((2.25, -2.0), (2.25, 2.0), 9);
        let outcome = split_against(&a, std::slice::from_ref(&b), 0.1, 1).unwrap();
        assert_eq!(outcome.fragments.len(), 2);
        assert_eq!(outcome.others.len(), 1);
        assert_eq!(outcome.others[0].0, 0);
        assert_eq!(outcome.others[0].1.len(), 2);

        let shallow = split_against(&a, std::slice::from_ref(&b), 0.1, 0).unwrap();
        assert_eq!(shallow.fragments.len(), 2);
        assert!(shallow.others.is_empty());
    }
}
