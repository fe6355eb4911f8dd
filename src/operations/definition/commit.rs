use tracing::{debug, warn};

use crate::error::{Result, SceneError};
use crate::math::{Rotation, Vector3};
use crate::scene::{DefinitionId, NodeId, Prototype, SceneGraph};

/// Outcome of a [`CommitDefinition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// The definition that received the edit.
    pub definition: DefinitionId,
    /// Revision of the definition after the commit.
    pub revision: u64,
    /// Other instances refreshed from the new template.
    pub synced: Vec<NodeId>,
    /// Other instances whose structure no longer matches the template.
    pub diverged: Vec<NodeId>,
}

/// Writes an instance's subtree back to its definition and refreshes every
/// other live instance from the result.
pub struct CommitDefinition {
    node: NodeId,
}

impl CommitDefinition {
    /// Creates a new `CommitDefinition` operation.
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    /// Executes the commit.
    ///
    /// The template root is stored at the origin with identity rotation;
    /// each instance keeps its own placement. Other instances get the
    /// template's descendant transforms and all geometry positions.
    ///
    /// Returns `None` if the node is not an instance of any definition.
    ///
    /// # Errors
    ///
    /// Returns an error if a node in the edited subtree is missing.
    pub fn execute(&self, scene: &mut SceneGraph) -> Result<Option<CommitReport>> {
        let Some(definition) = scene.definition_of(self.node) else {
            debug!(node = %scene.describe(self.node), "no definition, nothing to commit");
            return Ok(None);
        };

        let mut prototype = capture(scene, self.node)?;
        prototype.local_position = Vector3::zeros();
        prototype.local_rotation = Rotation::identity();

        let others: Vec<NodeId> = scene
            .instances_of(definition)
            .iter()
            .copied()
            .filter(|&instance| instance != self.node)
            .collect();

        let mut synced = Vec::new();
        let mut diverged = Vec::new();
        for instance in others {
            if matches_structure(scene, instance, &prototype)? {
                apply(scene, instance, &prototype, true)?;
                synced.push(instance);
            } else {
                warn!(
                    instance = %scene.describe(instance),
                    "instance structure diverged from its definition, not synced"
                );
                diverged.push(instance);
            }
        }

        let data = scene.definition_mut(definition)?;
        data.prototype = Some(prototype);
        data.bump_revision();
        let revision = data.revision();

        debug!(
            node = %scene.describe(self.node),
            revision,
            synced = synced.len(),
            diverged = diverged.len(),
            "committed definition"
        );
        Ok(Some(CommitReport {
            definition,
            revision,
            synced,
            diverged,
        }))
    }
}

/// Copies a node subtree into a detached prototype tree.
pub(crate) fn capture(scene: &SceneGraph, node: NodeId) -> std::result::Result<Prototype, SceneError> {
    let data = scene.node(node)?;
    let children = data
        .children
        .iter()
        .map(|&child| capture(scene, child))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Prototype {
        name: data.name.clone(),
        local_position: data.local_position,
        local_rotation: data.local_rotation,
        local_scale: data.local_scale,
        geometries: data.geometries.clone(),
        children,
    })
}

fn matches_structure(
    scene: &SceneGraph,
    node: NodeId,
    prototype: &Prototype,
) -> std::result::Result<bool, SceneError> {
    let data = scene.node(node)?;
    if data.children.len() != prototype.children.len()
        || data.geometries.len() != prototype.geometries.len()
    {
        return Ok(false);
    }
    let same_counts = data
        .geometries
        .iter()
        .zip(&prototype.geometries)
        .all(|(a, b)| a.points().vertex_count() == b.points().vertex_count());
    if !same_counts {
        return Ok(false);
    }
    for (&child, proto) in data.children.iter().zip(&prototype.children) {
        if !matches_structure(scene, child, proto)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn apply(
    scene: &mut SceneGraph,
    node: NodeId,
    prototype: &Prototype,
    is_root: bool,
) -> std::result::Result<(), SceneError> {
    let data = scene.node_mut(node)?;
    if !is_root {
        data.local_position = prototype.local_position;
        data.local_rotation = prototype.local_rotation;
        data.local_scale = prototype.local_scale;
    }
    data.geometries.clone_from(&prototype.geometries);
    let children = data.children.clone();
    for (child, proto) in children.into_iter().zip(&prototype.children) {
        apply(scene, child, proto, false)?;
    }
    Ok(())
}
