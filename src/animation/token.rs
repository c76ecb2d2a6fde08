use std::cell::Cell;
use std::rc::Rc;

/// Cancellation handle for one animated move.
///
/// `ease_to`/`fly_to` hand one back; the controller keeps a clone and checks
/// it once per frame. Aborting ends the move where it stands, with its end
/// events, on the next frame.
#[derive(Debug, Clone, Default)]
pub struct AnimationToken {
    aborted: Rc<Cell<bool>>,
}

impl AnimationToken {
    /// Fresh, live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the animation at its current pose.
    pub fn abort(&self) {
        self.aborted.set(true);
    }

    /// Whether [`abort`](Self::abort) was called on any clone.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.get()
    }

    /// Whether both handles control the same animation.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.aborted, &other.aborted)
    }
}
