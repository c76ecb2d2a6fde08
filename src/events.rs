//! Camera events and the publish/subscribe registry that delivers them.
//!
//! Listeners are plain closures keyed by [`EventKind`]. Dispatch walks a
//! snapshot of the listener list, so a listener may add or remove
//! listeners (itself included) while an event is being delivered. A
//! listener removed mid-dispatch is not called afterwards; one added
//! mid-dispatch first hears the next event.
//!
//! A panicking listener is caught, logged, and reported through
//! [`EventKind::Error`]; the remaining listeners still run.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::camera::Pose;
use crate::input::InputEvent;

// ── Axes ───────────────────────────────────────────────────────────────

/// Which motion axes an input or animation touches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(default)]
pub struct Axes {
    /// Center moved (drag).
    pub pan: bool,
    /// Zoom changed.
    pub zoom: bool,
    /// Bearing changed.
    pub rotate: bool,
    /// Pitch changed.
    pub pitch: bool,
    /// Roll changed.
    pub roll: bool,
}

impl Axes {
    /// No axes.
    pub const NONE: Self = Self {
        pan: false,
        zoom: false,
        rotate: false,
        pitch: false,
        roll: false,
    };
    /// Pan only.
    pub const PAN: Self = Self {
        pan: true,
        ..Self::NONE
    };
    /// Zoom only.
    pub const ZOOM: Self = Self {
        zoom: true,
        ..Self::NONE
    };
    /// Rotate only.
    pub const ROTATE: Self = Self {
        rotate: true,
        ..Self::NONE
    };
    /// Pitch only.
    pub const PITCH: Self = Self {
        pitch: true,
        ..Self::NONE
    };
    /// Roll only.
    pub const ROLL: Self = Self {
        roll: true,
        ..Self::NONE
    };

    /// Whether no axis is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }

    /// Axes set in either.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            pan: self.pan || other.pan,
            zoom: self.zoom || other.zoom,
            rotate: self.rotate || other.rotate,
            pitch: self.pitch || other.pitch,
            roll: self.roll || other.roll,
        }
    }

    /// Axes set in `self` but not in `other`.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self {
            pan: self.pan && !other.pan,
            zoom: self.zoom && !other.zoom,
            rotate: self.rotate && !other.rotate,
            pitch: self.pitch && !other.pitch,
            roll: self.roll && !other.roll,
        }
    }

    /// The set axes, in lifecycle order (zoom, rotate, pitch, roll, drag).
    pub fn iter(self) -> impl Iterator<Item = Axis> {
        [
            (self.zoom, Axis::Zoom),
            (self.rotate, Axis::Rotate),
            (self.pitch, Axis::Pitch),
            (self.roll, Axis::Roll),
            (self.pan, Axis::Drag),
        ]
        .into_iter()
        .filter_map(|(set, axis)| set.then_some(axis))
    }
}

/// One independently tracked motion axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Zoom.
    Zoom,
    /// Bearing.
    Rotate,
    /// Pitch.
    Pitch,
    /// Roll.
    Roll,
    /// Pan.
    Drag,
}

impl Axis {
    /// `<axis>start` event.
    #[must_use]
    pub fn start_event(self) -> EventKind {
        match self {
            Self::Zoom => EventKind::ZoomStart,
            Self::Rotate => EventKind::RotateStart,
            Self::Pitch => EventKind::PitchStart,
            Self::Roll => EventKind::RollStart,
            Self::Drag => EventKind::DragStart,
        }
    }

    /// `<axis>` while-moving event.
    #[must_use]
    pub fn during_event(self) -> EventKind {
        match self {
            Self::Zoom => EventKind::Zoom,
            Self::Rotate => EventKind::Rotate,
            Self::Pitch => EventKind::Pitch,
            Self::Roll => EventKind::Roll,
            Self::Drag => EventKind::Drag,
        }
    }

    /// `<axis>end` event.
    #[must_use]
    pub fn end_event(self) -> EventKind {
        match self {
            Self::Zoom => EventKind::ZoomEnd,
            Self::Rotate => EventKind::RotateEnd,
            Self::Pitch => EventKind::PitchEnd,
            Self::Roll => EventKind::RollEnd,
            Self::Drag => EventKind::DragEnd,
        }
    }
}

// ── Events ─────────────────────────────────────────────────────────────

/// Every event the controller fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// First axis became active.
    MoveStart,
    /// Any axis moved this frame.
    Move,
    /// Last axis went idle.
    MoveEnd,
    /// Zoom started.
    ZoomStart,
    /// Zoom changed this frame.
    Zoom,
    /// Zoom finished.
    ZoomEnd,
    /// Rotation started.
    RotateStart,
    /// Bearing changed this frame.
    Rotate,
    /// Rotation finished.
    RotateEnd,
    /// Pitch started.
    PitchStart,
    /// Pitch changed this frame.
    Pitch,
    /// Pitch finished.
    PitchEnd,
    /// Roll started.
    RollStart,
    /// Roll changed this frame.
    Roll,
    /// Roll finished.
    RollEnd,
    /// Pan started.
    DragStart,
    /// Center moved this frame.
    Drag,
    /// Pan finished.
    DragEnd,
    /// The pose changed and the scene should be redrawn.
    RenderFrame,
    /// A listener failed.
    Error,
    /// A gesture was ignored because cooperative mode wants a modifier.
    CooperativeGestureHint,
}

impl EventKind {
    /// Event name as used by map libraries (`"zoomstart"`, `"renderFrame"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoveStart => "movestart",
            Self::Move => "move",
            Self::MoveEnd => "moveend",
            Self::ZoomStart => "zoomstart",
            Self::Zoom => "zoom",
            Self::ZoomEnd => "zoomend",
            Self::RotateStart => "rotatestart",
            Self::Rotate => "rotate",
            Self::RotateEnd => "rotateend",
            Self::PitchStart => "pitchstart",
            Self::Pitch => "pitch",
            Self::PitchEnd => "pitchend",
            Self::RollStart => "rollstart",
            Self::Roll => "roll",
            Self::RollEnd => "rollend",
            Self::DragStart => "dragstart",
            Self::Drag => "drag",
            Self::DragEnd => "dragend",
            Self::RenderFrame => "renderFrame",
            Self::Error => "error",
            Self::CooperativeGestureHint => "cooperativegesturehint",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload handed to listeners.
#[derive(Debug, Clone)]
pub struct CameraEvent {
    /// What happened.
    pub kind: EventKind,
    /// Pose when the event fired.
    pub state: Pose,
    /// Input event that caused it, for gesture-driven motion.
    pub original_event: Option<InputEvent>,
    /// Failure description, for [`EventKind::Error`].
    pub message: Option<String>,
}

impl CameraEvent {
    /// Event without an originating input or message.
    #[must_use]
    pub fn new(kind: EventKind, state: Pose) -> Self {
        Self {
            kind,
            state,
            original_event: None,
            message: None,
        }
    }

    /// Attach the input event that caused this one.
    #[must_use]
    pub fn with_original(mut self, original: Option<InputEvent>) -> Self {
        self.original_event = original;
        self
    }
}

// ── Registry ───────────────────────────────────────────────────────────

/// Handle for removing a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Rc<RefCell<dyn FnMut(&CameraEvent)>>;

struct Listener {
    id: ListenerId,
    once: bool,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: FxHashMap<EventKind, Vec<Listener>>,
}

impl Registry {
    fn contains(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners
            .get(&kind)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    fn remove(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            let _ = self.listeners.remove(&kind);
        }
        removed
    }
}

/// Shared listener registry. Clones refer to the same listeners.
#[derive(Clone, Default)]
pub struct Evented {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for Evented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let count: usize = registry.listeners.values().map(Vec::len).sum();
        f.debug_struct("Evented").field("listeners", &count).finish()
    }
}

impl Evented {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn add(
        &self,
        kind: EventKind,
        once: bool,
        callback: impl FnMut(&CameraEvent) + 'static,
    ) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry.listeners.entry(kind).or_default().push(Listener {
            id,
            once,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Call `callback` for every `kind` event until removed.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl FnMut(&CameraEvent) + 'static,
    ) -> ListenerId {
        self.add(kind, false, callback)
    }

    /// Call `callback` for the next `kind` event only.
    pub fn once(
        &self,
        kind: EventKind,
        callback: impl FnMut(&CameraEvent) + 'static,
    ) -> ListenerId {
        self.add(kind, true, callback)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.registry.borrow_mut().remove(kind, id)
    }

    /// Whether anything listens for `kind`.
    #[must_use]
    pub fn listens(&self, kind: EventKind) -> bool {
        self.registry.borrow().listeners.contains_key(&kind)
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.registry.borrow_mut().listeners.clear();
    }

    /// Deliver `event` to its listeners in registration order.
    pub fn fire(&self, event: &CameraEvent) {
        let snapshot: Vec<(ListenerId, bool, Callback)> = {
            let registry = self.registry.borrow();
            let Some(list) = registry.listeners.get(&event.kind) else {
                return;
            };
            list.iter()
                .map(|l| (l.id, l.once, Rc::clone(&l.callback)))
                .collect()
        };

        for (id, once, callback) in snapshot {
            {
                let mut registry = self.registry.borrow_mut();
                if !registry.contains(event.kind, id) {
                    continue;
                }
                if once {
                    let _ = registry.remove(event.kind, id);
                }
            }

            let Ok(mut f) = callback.try_borrow_mut() else {
                log::debug!("skipping re-entrant {} listener", event.kind);
                continue;
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (*f)(event)));
            drop(f);

            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                log::error!("{} listener panicked: {message}", event.kind);
                if event.kind != EventKind::Error {
                    self.fire(&CameraEvent {
                        kind: EventKind::Error,
                        state: event.state,
                        original_event: None,
                        message: Some(format!(
                            "{} listener panicked: {message}",
                            event.kind
                        )),
                    });
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
