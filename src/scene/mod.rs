pub mod definition;
pub mod node;

pub use definition::{DefinitionData, DefinitionId, Prototype};
pub use node::{NodeData, NodeId};

use crate::error::SceneError;
use crate::math::{Frame, Point3, Rotation};
use slotmap::{SecondaryMap, SlotMap};

/// Central arena that owns all scene nodes and shared definitions.
///
/// Nodes reference each other via typed IDs (generational indices). The
/// definition/instance relation is an explicit lookup table in both
/// directions; neither side owns the other.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, NodeData>,
    definitions: SlotMap<DefinitionId, DefinitionData>,
    instances: SecondaryMap<DefinitionId, Vec<NodeId>>,
    instance_of: SecondaryMap<NodeId, DefinitionId>,
}

impl SceneGraph {
    /// Creates a new, empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node operations ---

    /// Inserts a node as the last child of `parent` (or as a root) and
    /// returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is not in the scene.
    pub fn add_node(
        &mut self,
        mut data: NodeData,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        data.parent = parent;
        data.children.clear();
        let id = self.nodes.insert(data);
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(id);
        }
        Ok(id)
    }

    /// Removes a node and its whole subtree, detaching it from its parent
    /// and from any definition it was an instance of.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the scene.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        let subtree = self.descendants(id)?;
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|&child| child != id);
        }
        for node in subtree {
            if let Some(definition) = self.instance_of.remove(node) {
                if let Some(list) = self.instances.get_mut(definition) {
                    list.retain(|&instance| instance != node);
                }
            }
            self.nodes.remove(node);
        }
        Ok(())
    }

    /// Returns a reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the scene.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, SceneError> {
        self.nodes
            .get(id)
            .ok_or_else(|| SceneError::EntityNotFound("node".into()))
    }

    /// Returns a mutable reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the scene.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, SceneError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| SceneError::EntityNotFound("node".into()))
    }

    /// Returns `true` if the node is still in the scene.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Direct children of a node, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not found.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(&self.node(id)?.children)
    }

    /// The node and all of its descendants in pre-order.
    ///
    /// # Errors
    ///
    /// Returns an error if any node in the subtree is missing.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        Ok(out)
    }

    // --- Transforms ---

    /// World frame of the node's parent, identity for roots.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or an ancestor is missing.
    pub fn parent_frame(&self, id: NodeId) -> Result<Frame, SceneError> {
        match self.node(id)?.parent {
            Some(parent) => self.world_frame(parent),
            None => Ok(Frame::identity()),
        }
    }

    /// World frame of a node: `parent world ∘ local`, recomputed every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or an ancestor is missing.
    pub fn world_frame(&self, id: NodeId) -> Result<Frame, SceneError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            chain.push(node.local_frame());
            current = node.parent;
        }
        Ok(chain
            .iter()
            .rev()
            .fold(Frame::identity(), |world, local| world.compose(local)))
    }

    /// Inverse of the node's world frame.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::SingularTransform`] if a scale component along
    /// the chain is zero.
    pub fn inverse_world_frame(&self, id: NodeId) -> Result<Frame, SceneError> {
        self.world_frame(id)?
            .inverse()
            .ok_or_else(|| SceneError::SingularTransform(self.describe(id)))
    }

    /// World position of a node's origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or an ancestor is missing.
    pub fn world_position(&self, id: NodeId) -> Result<Point3, SceneError> {
        Ok(self.world_frame(id)?.position())
    }

    /// World rotation of a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or an ancestor is missing.
    pub fn world_rotation(&self, id: NodeId) -> Result<Rotation, SceneError> {
        Ok(self.world_frame(id)?.rotation())
    }

    /// Moves a node so its origin lands on `position` in world space.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or its parent frame is singular.
    pub fn set_world_position(&mut self, id: NodeId, position: &Point3) -> Result<(), SceneError> {
        let local = match self.node(id)?.parent {
            Some(parent) => self.inverse_world_frame(parent)?.transform_point(position),
            None => *position,
        };
        self.node_mut(id)?.local_position = local.coords;
        Ok(())
    }

    /// Rotates a node so its world rotation equals `rotation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or an ancestor is missing.
    pub fn set_world_rotation(&mut self, id: NodeId, rotation: &Rotation) -> Result<(), SceneError> {
        let parent_rotation = self.parent_frame(id)?.rotation();
        self.node_mut(id)?.local_rotation = parent_rotation.inverse() * rotation;
        Ok(())
    }

    // --- Definition operations ---

    /// Inserts a definition and returns its ID.
    pub fn add_definition(&mut self, data: DefinitionData) -> DefinitionId {
        let id = self.definitions.insert(data);
        self.instances.insert(id, Vec::new());
        id
    }

    /// Returns a reference to the definition data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the scene.
    pub fn definition(&self, id: DefinitionId) -> Result<&DefinitionData, SceneError> {
        self.definitions
            .get(id)
            .ok_or_else(|| SceneError::EntityNotFound("definition".into()))
    }

    /// Returns a mutable reference to the definition data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the scene.
    pub fn definition_mut(&mut self, id: DefinitionId) -> Result<&mut DefinitionData, SceneError> {
        self.definitions
            .get_mut(id)
            .ok_or_else(|| SceneError::EntityNotFound("definition".into()))
    }

    /// Records `node` as a live instance of `definition`, replacing any
    /// previous link of that node.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is missing.
    pub fn register_instance(
        &mut self,
        definition: DefinitionId,
        node: NodeId,
    ) -> Result<(), SceneError> {
        self.definition(definition)?;
        self.node(node)?;
        if let Some(previous) = self.instance_of.insert(node, definition) {
            if let Some(list) = self.instances.get_mut(previous) {
                list.retain(|&instance| instance != node);
            }
        }
        if let Some(list) = self.instances.get_mut(definition) {
            list.push(node);
        }
        Ok(())
    }

    /// The definition backing `node`, if it is an instance root.
    #[must_use]
    pub fn definition_of(&self, node: NodeId) -> Option<DefinitionId> {
        self.instance_of.get(node).copied()
    }

    /// All live instance roots of a definition, in registration order.
    #[must_use]
    pub fn instances_of(&self, definition: DefinitionId) -> &[NodeId] {
        self.instances
            .get(definition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A short human-readable label for diagnostics.
    #[must_use]
    pub fn describe(&self, id: NodeId) -> String {
        self.nodes
            .get(id)
            .map_or_else(|| format!("{id:?}"), |node| format!("node '{}'", node.name))
    }
}
