// main.rs
//
// Walk through the contour pipeline on a cylinder: two plane cuts matched
// against each other, then a freehand stroke projected onto the side.
// Run with RUST_LOG=debug to see what each step decides.

use nalgebra::{Point3, Vector3};
use retopo_contours::float_types::{Real, TAU};
use retopo_contours::{Contour, ContourConfig, ContourError, Plane, SketchLine, TriMeshSurface};

/// Closed cylinder around the z axis: `sides` side quads, fan caps.
fn cylinder(radius: Real, height: Real, sides: u32) -> Result<TriMeshSurface, ContourError> {
    let n = sides;
    let mut vertices = Vec::with_capacity(2 * n as usize + 2);
    for z in [0.0, height] {
        for i in 0..n {
            let a = TAU * i as Real / n as Real;
            vertices.push(Point3::new(radius * a.cos(), radius * a.sin(), z));
        }
    }
    vertices.push(Point3::new(0.0, 0.0, 0.0));
    vertices.push(Point3::new(0.0, 0.0, height));

    let mut indices = Vec::with_capacity(4 * n as usize);
    for i in 0..n {
        let j = (i + 1) % n;
        indices.push([i, j, n + j]);
        indices.push([i, n + j, n + i]);
    }
    for i in 0..n {
        let j = (i + 1) % n;
        indices.push([2 * n, j, i]);
        indices.push([2 * n + 1, n + i, n + j]);
    }
    TriMeshSurface::new(vertices, indices)
}

fn main() -> Result<(), ContourError> {
    env_logger::init();

    let config = ContourConfig::default();
    let surface = cylinder(1.0, 4.0, 24)?;
    let diagonal = surface.bounding_diagonal();

    // 1) two cuts, the upper one slightly tilted
    let lower_plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Vector3::z())?;
    let upper_plane = Plane::new(Point3::new(0.0, 0.0, 3.0), Vector3::new(0.1, 0.0, 1.0))?;
    let (Some(lower), Some(mut upper)) = (
        Contour::from_cross_section(&surface, lower_plane, 0, config.segments)?,
        Contour::from_cross_section(&surface, upper_plane, 0, config.segments)?,
    ) else {
        println!("a cut missed the cylinder");
        return Ok(());
    };

    // 2) correspondence
    upper.set_discrete_shift(3)?;
    let report = upper.align(&lower, true, false)?;
    println!(
        "aligned: reversed {}, shift {}, phase {:.4}, quality {:.4} -> {:.4}",
        report.reversed, report.discrete_shift, report.phase_shift, report.quality_before, report.quality_after
    );

    let relationship = upper.analyze_relationship(&lower)?;
    println!(
        "relationship: parallelism {:.4}, divergent {}, divergence {:.4}",
        relationship.parallelism, relationship.divergent, relationship.divergence
    );

    // 3) a wavy stroke drawn from the +y side
    let samples: Vec<Point3<Real>> = (0..60)
        .map(|i| {
            let t = i as Real / 59.0;
            Point3::new(-0.6 + 1.2 * t, 5.0, 0.5 + 3.0 * t + 0.05 * (t * 40.0).sin())
        })
        .collect();
    let mut stroke = SketchLine::new(&samples, config.cull_factor);
    let hits = stroke.project(&surface, &-Vector3::y());
    stroke.find_knots(&config);
    stroke.smooth_path(&config, &surface)?;
    let nodes = stroke.create_vert_nodes(&config, diagonal)?;
    let (upper_rail, _) = stroke.generate_rails(&surface, stroke.quad_length())?;
    println!(
        "stroke: {hits} surface hits, {} knots, {nodes} poly nodes, rail of {}",
        stroke.knots().len(),
        upper_rail.len()
    );

    Ok(())
}
