//! Pivot relocation walkthrough.
//!
//! Builds two instances of a small table definition, previews the
//! bottom-corner pivot of the first, applies it and undoes it again.
//!
//! ```text
//! cargo run --example relocate
//! RUST_LOG=repivot=debug cargo run --example relocate
//! ```

use std::f64::consts::FRAC_PI_2;

use repivot::geometry::{PolyMesh, TriangleMesh};
use repivot::history::History;
use repivot::math::{Aabb, Point3, Rotation, Vector3};
use repivot::operations::definition::InstantiateDefinition;
use repivot::operations::pivot::RebaseOptions;
use repivot::operations::query::GridLevel;
use repivot::scene::{DefinitionData, Prototype, SceneGraph};
use repivot::session::PivotSession;
use tracing::info;

/// The table top as an editable slab, rendered through its triangulation.
fn slab(aabb: &Aabb) -> repivot::Result<TriangleMesh> {
    let faces = vec![
        vec![0, 2, 3, 1],
        vec![4, 5, 7, 6],
        vec![0, 4, 6, 2],
        vec![1, 3, 7, 5],
        vec![0, 1, 5, 4],
        vec![2, 6, 7, 3],
    ];
    Ok(PolyMesh::new(aabb.corners().to_vec(), faces)?.to_triangle_mesh())
}

fn table() -> repivot::Result<Prototype> {
    let leg = |x: f64, z: f64| {
        Prototype::new("leg")
            .with_position(Vector3::new(x, 0.0, z))
            .with_geometry(TriangleMesh::cuboid(&Aabb::new(
                Point3::new(-0.05, 0.0, -0.05),
                Point3::new(0.05, 0.7, 0.05),
            )))
    };
    let top = slab(&Aabb::new(
        Point3::new(-0.6, 0.0, -0.4),
        Point3::new(0.6, 0.05, 0.4),
    ))?;
    Ok(Prototype::new("table")
        .with_child(
            Prototype::new("top")
                .with_position(Vector3::new(0.0, 0.7, 0.0))
                .with_geometry(top),
        )
        .with_child(leg(-0.55, -0.35))
        .with_child(leg(0.55, -0.35))
        .with_child(leg(-0.55, 0.35))
        .with_child(leg(0.55, 0.35)))
}

fn main() -> repivot::Result<()> {
    // Default: WARN for everything, INFO for this demo and the library.
    // Override with RUST_LOG env var (e.g. RUST_LOG=repivot=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("relocate=info".parse().unwrap_or_default())
        .add_directive("repivot=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut scene = SceneGraph::new();
    let definition = scene.add_definition(DefinitionData::new("table").with_prototype(table()?));
    let first = InstantiateDefinition::new(definition).execute(&mut scene)?;
    let second = InstantiateDefinition::new(definition)
        .with_placement(
            Vector3::new(3.0, 0.0, 0.0),
            Rotation::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
        )
        .execute(&mut scene)?;

    let mut session =
        PivotSession::new().with_options(RebaseOptions::default().with_rotation(true));
    let mut history = History::new();
    session.select(Some(first));
    session.set_cell(GridLevel::Bot, 0)?;

    if let Some(preview) = session.preview(&scene)? {
        info!(bounds = ?preview.bounds, pivot = ?preview.pivot, "preview");
    }

    if let Some(change) = session.apply(&mut scene, &mut history)? {
        info!(
            shift = ?change.shift,
            rebased = change.rebase.rebased.len(),
            propagated = change.propagated.len(),
            "applied"
        );
    }
    info!(
        first = ?scene.world_position(first)?,
        second = ?scene.world_position(second)?,
        "instance origins after apply"
    );

    history.undo(&mut scene)?;
    info!(
        first = ?scene.world_position(first)?,
        second = ?scene.world_position(second)?,
        "instance origins after undo"
    );
    Ok(())
}
