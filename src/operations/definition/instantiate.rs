use tracing::debug;

use crate::error::{OperationError, Result, SceneError};
use crate::math::{Rotation, Vector3};
use crate::scene::{DefinitionId, NodeData, NodeId, Prototype, SceneGraph};

/// Places a new live instance of a definition in the scene.
pub struct InstantiateDefinition {
    definition: DefinitionId,
    parent: Option<NodeId>,
    position: Vector3,
    rotation: Rotation,
}

impl InstantiateDefinition {
    /// Creates a new `InstantiateDefinition` operation placing a root
    /// instance at the origin.
    #[must_use]
    pub fn new(definition: DefinitionId) -> Self {
        Self {
            definition,
            parent: None,
            position: Vector3::zeros(),
            rotation: Rotation::identity(),
        }
    }

    /// Nests the instance under `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Local placement of the instance root.
    #[must_use]
    pub fn with_placement(mut self, position: Vector3, rotation: Rotation) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    /// Executes the operation, returning the instance root.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is missing or has never been
    /// committed, or if the parent is not in the scene.
    pub fn execute(&self, scene: &mut SceneGraph) -> Result<NodeId> {
        let definition = scene.definition(self.definition)?;
        let prototype = definition.prototype.clone().ok_or_else(|| {
            OperationError::InvalidInput(format!(
                "definition '{}' has no committed template",
                definition.name
            ))
        })?;

        let root = build(scene, &prototype, self.parent)?;
        let data = scene.node_mut(root)?;
        data.local_position = self.position;
        data.local_rotation = self.rotation;
        scene.register_instance(self.definition, root)?;

        debug!(
            instance = %scene.describe(root),
            nodes = prototype.node_count(),
            "instantiated definition"
        );
        Ok(root)
    }
}

fn build(
    scene: &mut SceneGraph,
    prototype: &Prototype,
    parent: Option<NodeId>,
) -> std::result::Result<NodeId, SceneError> {
    let mut data = NodeData::new(prototype.name.clone())
        .with_position(prototype.local_position)
        .with_rotation(prototype.local_rotation)
        .with_scale(prototype.local_scale);
    data.geometries.clone_from(&prototype.geometries);
    let id = scene.add_node(data, parent)?;
    for child in &prototype.children {
        build(scene, child, Some(id))?;
    }
    Ok(id)
}
