//! The graphics state stack.
//!
//! Frames live in an arena `Vec` with stable, identity-comparable tokens.
//! Restoring by token searches from the top and truncates through the
//! matching frame, discarding any intervening frames that were never
//! explicitly restored. Restoring without a token pops the top frame only.

use crate::matrix::Matrix;
use crate::path::Path;
use crate::style::SmoothingMode;

/// Opaque handle to a saved graphics state frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateToken(u64);

/// Everything a frame captures at save time.
///
/// Container frames are ordinary frames here; the surface folds the
/// dst/src remap into the transform before the snapshot is taken.
#[derive(Clone, Debug)]
pub(crate) struct StateSnapshot {
    pub transform: Matrix,
    pub clip: Vec<Path>,
    pub smoothing: SmoothingMode,
}

#[derive(Clone, Debug)]
struct Frame {
    token: StateToken,
    snapshot: StateSnapshot,
}

#[derive(Debug, Default)]
pub(crate) struct StateStack {
    frames: Vec<Frame>,
    next_token: u64,
}

impl StateStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: StateSnapshot) -> StateToken {
        let token = StateToken(self.next_token);
        self.next_token += 1;
        self.frames.push(Frame { token, snapshot });
        token
    }

    /// Pops through the frame matching `token`, returning its snapshot,
    /// or `None` if the token is not on the stack.
    pub fn restore(&mut self, token: StateToken) -> Option<StateSnapshot> {
        let index = self.frames.iter().rposition(|f| f.token == token)?;
        let discarded = self.frames.len() - index - 1;
        if discarded > 0 {
            log::debug!(
                "restore discarded {} intervening state frame(s)",
                discarded
            );
        }
        self.frames.truncate(index + 1);
        self.frames.pop().map(|f| f.snapshot)
    }

    /// Pops the top frame, returning its token and snapshot.
    pub fn restore_top(&mut self) -> Option<(StateToken, StateSnapshot)> {
        self.frames.pop().map(|f| (f.token, f.snapshot))
    }

    pub fn level(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(dx: f64) -> StateSnapshot {
        StateSnapshot {
            transform: Matrix::translation(dx, 0.0),
            clip: Vec::new(),
            smoothing: SmoothingMode::Default,
        }
    }

    #[test]
    fn tokens_are_unique() {
        let mut stack = StateStack::new();
        let t1 = stack.push(snapshot(1.0));
        let t2 = stack.push(snapshot(2.0));
        assert_ne!(t1, t2);
        assert_eq!(stack.level(), 2);
    }

    #[test]
    fn restore_returns_the_matching_snapshot() {
        let mut stack = StateStack::new();
        let t = stack.push(snapshot(3.0));
        let snap = stack.restore(t).unwrap();
        assert_eq!(snap.transform, Matrix::translation(3.0, 0.0));
        assert_eq!(stack.level(), 0);
    }

    #[test]
    fn restore_discards_intervening_frames() {
        let mut stack = StateStack::new();
        let t1 = stack.push(snapshot(1.0));
        let t2 = stack.push(snapshot(2.0));
        let snap = stack.restore(t1).unwrap();
        assert_eq!(snap.transform, Matrix::translation(1.0, 0.0));
        assert_eq!(stack.level(), 0);
        // t2's frame went with it.
        assert!(stack.restore(t2).is_none());
    }

    #[test]
    fn restore_top_pops_one_frame() {
        let mut stack = StateStack::new();
        let _t1 = stack.push(snapshot(1.0));
        let t2 = stack.push(snapshot(2.0));
        let (token, snap) = stack.restore_top().unwrap();
        assert_eq!(token, t2);
        assert_eq!(snap.transform, Matrix::translation(2.0, 0.0));
        assert_eq!(stack.level(), 1);
    }

    #[test]
    fn empty_stack_has_nothing_to_restore() {
        let mut stack = StateStack::new();
        assert!(stack.restore_top().is_none());
    }
}
