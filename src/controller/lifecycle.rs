//! The movement lifecycle: one aggregate `moving` state plus one state per
//! axis, each with start/during/end events.

use web_time::Instant;

use crate::camera::Pose;
use crate::events::{Axes, CameraEvent, EventKind, Evented};
use crate::input::InputEvent;

/// Which axes are moving and when a gesture burst counts as over.
#[derive(Debug, Clone, Default)]
pub(crate) struct Lifecycle {
    moving: bool,
    active: Axes,
    quiet_at: Option<Instant>,
}

impl Lifecycle {
    pub(crate) fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn active(&self) -> Axes {
        self.active
    }

    /// Enter `axes`: `movestart` on the first motion, `<axis>start` for
    /// each axis not already moving.
    pub(crate) fn start(
        &mut self,
        axes: Axes,
        original: Option<&InputEvent>,
        events: &Evented,
        state: Pose,
    ) {
        if !self.moving {
            self.moving = true;
            log::trace!("movestart");
            fire(events, EventKind::MoveStart, state, original);
        }
        let entering = axes.difference(self.active);
        self.active = self.active.union(axes);
        for axis in entering.iter() {
            fire(events, axis.start_event(), state, original);
        }
    }

    /// One frame of motion: `<axis>` for each axis, then `move`.
    pub(crate) fn frame(
        &self,
        axes: Axes,
        original: Option<&InputEvent>,
        events: &Evented,
        state: Pose,
    ) {
        for axis in axes.iter() {
            fire(events, axis.during_event(), state, original);
        }
        fire(events, EventKind::Move, state, original);
    }

    /// Push the gesture end out to `at`.
    pub(crate) fn defer_end(&mut self, at: Instant) {
        self.quiet_at = Some(at);
    }

    /// Whether a gesture burst has been quiet long enough to end.
    pub(crate) fn quiet_since(&self, now: Instant) -> bool {
        self.quiet_at.is_some_and(|at| now >= at)
    }

    /// End every moving axis, then `moveend`. Returns the axes that were
    /// moving; empty when nothing was.
    pub(crate) fn end(
        &mut self,
        original: Option<&InputEvent>,
        events: &Evented,
        state: Pose,
    ) -> Axes {
        self.quiet_at = None;
        if !self.moving {
            return Axes::NONE;
        }
        let ended = std::mem::take(&mut self.active);
        self.moving = false;
        for axis in ended.iter() {
            fire(events, axis.end_event(), state, original);
        }
        log::trace!("moveend");
        fire(events, EventKind::MoveEnd, state, original);
        ended
    }
}

pub(crate) fn fire(
    events: &Evented,
    kind: EventKind,
    state: Pose,
    original: Option<&InputEvent>,
) {
    events.fire(&CameraEvent::new(kind, state).with_original(original.cloned()));
}
