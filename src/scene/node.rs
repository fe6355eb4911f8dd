use crate::geometry::Geometry;
use crate::math::{Frame, Rotation, Vector3};

slotmap::new_key_type! {
    /// Unique identifier for a node in the scene graph.
    pub struct NodeId;
}

/// Data associated with a scene node.
///
/// Transforms are local to the parent node. World transforms are never
/// stored; they are recomputed from the parent chain on demand.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Display name, used in diagnostics.
    pub name: String,
    /// Position relative to the parent.
    pub local_position: Vector3,
    /// Rotation relative to the parent.
    pub local_rotation: Rotation,
    /// Scale relative to the parent.
    pub local_scale: Vector3,
    /// Geometries owned by this node, in this node's local frame.
    pub geometries: Vec<Geometry>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl NodeData {
    /// Creates a node with an identity transform and no geometry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_position: Vector3::zeros(),
            local_rotation: Rotation::identity(),
            local_scale: Vector3::repeat(1.0),
            geometries: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets the local position.
    #[must_use]
    pub fn with_position(mut self, position: Vector3) -> Self {
        self.local_position = position;
        self
    }

    /// Sets the local rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.local_rotation = rotation;
        self
    }

    /// Sets the local scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.local_scale = scale;
        self
    }

    /// Attaches a geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: impl Into<Geometry>) -> Self {
        self.geometries.push(geometry.into());
        self
    }

    /// The parent node, if any.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children in order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The local transform as a frame.
    #[must_use]
    pub fn local_frame(&self) -> Frame {
        Frame::from_trs(&self.local_position, &self.local_rotation, &self.local_scale)
    }
}
