use serde::{Deserialize, Serialize};

use dbdraft_core::{Diagram, Result};

use crate::action::Action;

/// What happens to the redo stack when a new action is recorded after an undo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchPolicy {
    /// A new action clears the redo stack.
    #[default]
    Discard,
    /// Redo entries survive new actions and stay redoable.
    Preserve,
}

/// Undo and redo stacks of one editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    undo: Vec<Action>,
    redo: Vec<Action>,
    policy: BranchPolicy,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: BranchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Keep at most `limit` undo entries, dropping the oldest.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self.enforce_limit();
        self
    }

    pub fn policy(&self) -> BranchPolicy {
        self.policy
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undo entries, oldest first.
    pub fn undo_stack(&self) -> &[Action] {
        &self.undo
    }

    /// Redo entries, oldest first.
    pub fn redo_stack(&self) -> &[Action] {
        &self.redo
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Record an action that has already been applied to the diagram.
    pub fn record(&mut self, action: Action) {
        tracing::debug!(
            event = "action_recorded",
            action = action.kind(),
            element = action.element()
        );
        if self.policy == BranchPolicy::Discard && !self.redo.is_empty() {
            tracing::debug!(event = "redo_discarded", entries = self.redo.len());
            self.redo.clear();
        }
        self.push_undo(action);
    }

    /// Invert the most recent action. Returns `Ok(false)` when there is
    /// nothing to undo. On failure the record stays on the undo stack.
    pub fn undo(&mut self, diagram: &mut Diagram) -> Result<bool> {
        let Some(action) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(error) = action.revert(diagram) {
            tracing::warn!(
                event = "undo_failed",
                action = action.kind(),
                element = action.element(),
                error = %error
            );
            self.undo.push(action);
            return Err(error);
        }
        tracing::info!(event = "undo", action = action.kind(), element = action.element());
        self.redo.push(action);
        Ok(true)
    }

    /// Re-apply the most recently undone action. Returns `Ok(false)` when
    /// there is nothing to redo. On failure the record stays on the redo stack.
    pub fn redo(&mut self, diagram: &mut Diagram) -> Result<bool> {
        let Some(mut action) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(error) = action.apply(diagram) {
            tracing::warn!(
                event = "redo_failed",
                action = action.kind(),
                element = action.element(),
                error = %error
            );
            self.redo.push(action);
            return Err(error);
        }
        tracing::info!(event = "redo", action = action.kind(), element = action.element());
        self.push_undo(action);
        Ok(true)
    }

    fn push_undo(&mut self, action: Action) {
        self.undo.push(action);
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            if self.undo.len() > limit {
                let excess = self.undo.len() - limit;
                self.undo.drain(..excess);
                tracing::debug!(event = "undo_trimmed", dropped = excess, limit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dbdraft_core::Position;

    use super::*;

    fn pan(x: f64) -> Action {
        Action::Pan {
            from: Position::new(x - 1.0, 0.0),
            to: Position::new(x, 0.0),
        }
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut history = History::new();
        let mut diagram = Diagram::default();
        assert!(!history.undo(&mut diagram).expect("undo"));
        assert!(!history.redo(&mut diagram).expect("redo"));
        assert_eq!(diagram, Diagram::default());
    }

    #[test]
    fn limit_drops_the_oldest_entries() {
        let mut history = History::new().with_limit(2);
        for x in 1..=3 {
            history.record(pan(f64::from(x)));
        }
        assert_eq!(history.undo_stack(), &[pan(2.0), pan(3.0)]);
    }

    #[test]
    fn discard_policy_clears_redo_on_record() {
        let mut diagram = Diagram::default();
        let mut history = History::new();
        diagram.pan_to(Position::new(1.0, 0.0));
        history.record(pan(1.0));
        history.undo(&mut diagram).expect("undo");
        assert!(history.can_redo());

        history.record(pan(5.0));
        assert!(!history.can_redo());
    }

    #[test]
    fn preserve_policy_keeps_redo_on_record() {
        let mut diagram = Diagram::default();
        let mut history = History::new().with_policy(BranchPolicy::Preserve);
        diagram.pan_to(Position::new(1.0, 0.0));
        history.record(pan(1.0));
        history.undo(&mut diagram).expect("undo");

        history.record(pan(5.0));
        assert_eq!(history.redo_stack(), &[pan(1.0)]);
    }
}
