mod snapshot;

pub use snapshot::SceneSnapshot;

use tracing::debug;

use crate::error::Result;
use crate::scene::SceneGraph;

/// One undoable edit: the pre- and post-images of everything it touched.
///
/// Undo and redo always restore the whole image, so the parts of an edit
/// can never be rolled back separately.
#[derive(Debug, Clone)]
pub struct EditCommand {
    label: String,
    before: SceneSnapshot,
    after: SceneSnapshot,
}

impl EditCommand {
    /// Creates a command from captured images.
    #[must_use]
    pub fn new(label: impl Into<String>, before: SceneSnapshot, after: SceneSnapshot) -> Self {
        Self {
            label: label.into(),
            before,
            after,
        }
    }

    /// Human-readable name of the edit.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Restores the pre-image.
    ///
    /// # Errors
    ///
    /// Returns an error if a recorded entity no longer exists.
    pub fn undo(&self, scene: &mut SceneGraph) -> Result<()> {
        self.before.restore(scene)?;
        Ok(())
    }

    /// Restores the post-image.
    ///
    /// # Errors
    ///
    /// Returns an error if a recorded entity no longer exists.
    pub fn redo(&self, scene: &mut SceneGraph) -> Result<()> {
        self.after.restore(scene)?;
        Ok(())
    }
}

/// Linear undo/redo stack of [`EditCommand`]s.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<EditCommand>,
    redo: Vec<EditCommand>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an already-applied edit and clears the redo stack.
    pub fn record(&mut self, command: EditCommand) {
        debug!(
            label = command.label(),
            nodes = command.before.node_count(),
            "recorded edit"
        );
        self.undo.push(command);
        self.redo.clear();
    }

    /// Returns `true` if there is an edit to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Returns `true` if there is an edit to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undoes the most recent edit. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit cannot be restored; the scene is then
    /// unchanged and the edit stays on the undo stack.
    pub fn undo(&mut self, scene: &mut SceneGraph) -> Result<bool> {
        let Some(command) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.undo(scene) {
            self.undo.push(command);
            return Err(err);
        }
        debug!(label = command.label(), "undid edit");
        self.redo.push(command);
        Ok(true)
    }

    /// Reapplies the most recently undone edit. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit cannot be restored; the scene is then
    /// unchanged and the edit stays on the redo stack.
    pub fn redo(&mut self, scene: &mut SceneGraph) -> Result<bool> {
        let Some(command) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.redo(scene) {
            self.redo.push(command);
            return Err(err);
        }
        debug!(label = command.label(), "redid edit");
        self.undo.push(command);
        Ok(true)
    }
}
