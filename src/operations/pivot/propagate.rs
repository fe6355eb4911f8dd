use tracing::debug;

use crate::error::Result;
use crate::math::Vector3;
use crate::scene::{NodeId, SceneGraph};

/// Compensates the other instances of an edited node's definition for the
/// origin change baked into that definition.
pub struct PropagateShift {
    edited: NodeId,
    shift: Vector3,
}

impl PropagateShift {
    /// Creates a new `PropagateShift` operation.
    ///
    /// `shift` is the value returned by
    /// [`RelocatePivot`](super::RelocatePivot) for `edited`.
    #[must_use]
    pub fn new(edited: NodeId, shift: Vector3) -> Self {
        Self { edited, shift }
    }

    /// Executes the propagation, moving every other instance by
    /// `instance rotation * shift` in world space.
    ///
    /// Returns the instances that were moved. If `edited` is not an
    /// instance of any definition nothing happens and the list is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if an instance node is missing or has a singular
    /// parent frame.
    pub fn execute(&self, scene: &mut SceneGraph) -> Result<Vec<NodeId>> {
        let Some(definition) = scene.definition_of(self.edited) else {
            debug!(node = %scene.describe(self.edited), "no definition, nothing to propagate");
            return Ok(Vec::new());
        };

        let instances: Vec<NodeId> = scene
            .instances_of(definition)
            .iter()
            .copied()
            .filter(|&instance| instance != self.edited)
            .collect();

        for &instance in &instances {
            let frame = scene.world_frame(instance)?;
            let target = frame.position() + frame.rotation() * self.shift;
            scene.set_world_position(instance, &target)?;
        }

        debug!(
            node = %scene.describe(self.edited),
            shift = ?self.shift,
            instances = instances.len(),
            "propagated shift to instances"
        );
        Ok(instances)
    }
}
