use crate::geometry::Geometry;
use crate::math::{Rotation, Vector3};

slotmap::new_key_type! {
    /// Unique identifier for a shared definition.
    pub struct DefinitionId;
}

/// A shared structural template that scene nodes can be instances of.
#[derive(Debug, Clone)]
pub struct DefinitionData {
    /// Display name.
    pub name: String,
    /// The last committed template, `None` until the first commit.
    pub prototype: Option<Prototype>,
    revision: u64,
}

impl DefinitionData {
    /// Creates an empty definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prototype: None,
            revision: 0,
        }
    }

    /// Creates a definition with an initial template.
    #[must_use]
    pub fn with_prototype(mut self, prototype: Prototype) -> Self {
        self.prototype = Some(prototype);
        self
    }

    /// Number of commits applied to this definition.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }
}

/// A detached node tree stored inside a definition.
#[derive(Debug, Clone)]
pub struct Prototype {
    /// Node name.
    pub name: String,
    /// Position relative to the parent prototype node.
    pub local_position: Vector3,
    /// Rotation relative to the parent prototype node.
    pub local_rotation: Rotation,
    /// Scale relative to the parent prototype node.
    pub local_scale: Vector3,
    /// Owned geometries.
    pub geometries: Vec<Geometry>,
    /// Child prototypes, in order.
    pub children: Vec<Prototype>,
}

impl Prototype {
    /// A leaf prototype with identity transform.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_position: Vector3::zeros(),
            local_rotation: Rotation::identity(),
            local_scale: Vector3::repeat(1.0),
            geometries: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets the local position.
    #[must_use]
    pub fn with_position(mut self, position: Vector3) -> Self {
        self.local_position = position;
        self
    }

    /// Attaches a geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: impl Into<Geometry>) -> Self {
        self.geometries.push(geometry.into());
        self
    }

    /// Appends a child prototype.
    #[must_use]
    pub fn with_child(mut self, child: Prototype) -> Self {
        self.children.push(child);
        self
    }

    /// Total number of nodes in this tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Prototype::node_count).sum::<usize>()
    }
}
