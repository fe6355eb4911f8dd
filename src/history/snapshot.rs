use crate::error::SceneError;
use crate::geometry::Geometry;
use crate::math::{Rotation, Vector3};
use crate::scene::{DefinitionData, DefinitionId, NodeId, SceneGraph};

#[derive(Debug, Clone)]
struct NodeState {
    local_position: Vector3,
    local_rotation: Rotation,
    local_scale: Vector3,
    geometries: Vec<Geometry>,
}

/// Pre- or post-image of exactly the entities an edit touches.
///
/// Only transforms, geometry and definition data are recorded; the
/// hierarchy itself is assumed unchanged between capture and restore.
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    nodes: Vec<(NodeId, NodeState)>,
    definitions: Vec<(DefinitionId, DefinitionData)>,
}

impl SceneSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node and all of its descendants.
    ///
    /// # Errors
    ///
    /// Returns an error if a node in the subtree is missing.
    pub fn capture_subtree(&mut self, scene: &SceneGraph, root: NodeId) -> Result<(), SceneError> {
        for id in scene.descendants(root)? {
            if self.nodes.iter().any(|(captured, _)| *captured == id) {
                continue;
            }
            let data = scene.node(id)?;
            self.nodes.push((
                id,
                NodeState {
                    local_position: data.local_position,
                    local_rotation: data.local_rotation,
                    local_scale: data.local_scale,
                    geometries: data.geometries.clone(),
                },
            ));
        }
        Ok(())
    }

    /// Records a definition, including its committed template.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is missing.
    pub fn capture_definition(
        &mut self,
        scene: &SceneGraph,
        definition: DefinitionId,
    ) -> Result<(), SceneError> {
        let data = scene.definition(definition)?.clone();
        self.definitions.retain(|(id, _)| *id != definition);
        self.definitions.push((definition, data));
        Ok(())
    }

    /// Writes every recorded entity back into the scene.
    ///
    /// Either every entity is restored or none is.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the scene untouched, if a recorded entity
    /// no longer exists.
    pub fn restore(&self, scene: &mut SceneGraph) -> Result<(), SceneError> {
        for (id, _) in &self.nodes {
            scene.node(*id)?;
        }
        for (id, _) in &self.definitions {
            scene.definition(*id)?;
        }

        for (id, state) in &self.nodes {
            let data = scene.node_mut(*id)?;
            data.local_position = state.local_position;
            data.local_rotation = state.local_rotation;
            data.local_scale = state.local_scale;
            data.geometries.clone_from(&state.geometries);
        }
        for (id, data) in &self.definitions {
            scene.definition_mut(*id)?.clone_from(data);
        }
        Ok(())
    }

    /// Number of recorded nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
