//! The top-level camera controller.
//!
//! [`CameraController`] owns the [`Transform`], the gesture
//! [`HandlerManager`], the running animation and the movement lifecycle,
//! and exposes the navigation API. It is frame driven: hosts call
//! [`update`](CameraController::update) once per frame (when
//! [`needs_update`](CameraController::needs_update) says so) and forward
//! input through [`handle_input`](CameraController::handle_input).
//!
//! # Example
//!
//! ```ignore
//! let mut controller =
//!     CameraController::new(ControllerOptions::default(), None, Rc::new(SystemClock));
//! let _ = controller.on(EventKind::RenderFrame, |e| redraw(&e.state));
//! let _ = controller.fly_to(FlyOptions::to(CameraTarget::default().zoom(12.0)));
//! while controller.needs_update() {
//!     controller.update(None);
//! }
//! ```

mod frame;
mod lifecycle;
mod navigation;
mod snapshot;

use std::rc::Rc;

use glam::DVec2;
use web_time::Instant;

pub use snapshot::StateSnapshot;

use self::lifecycle::{fire, Lifecycle};
use crate::animation::CameraAnimation;
use crate::camera::{
    Camera, CameraHelper, Constraints, PlanarHelper, Pose, Transform, Viewport,
};
use crate::events::{CameraEvent, EventKind, Evented, ListenerId};
use crate::input::handlers::HandlerSignal;
use crate::input::HandlerManager;
use crate::options::{ControllerOptions, ProjectionKind};
use crate::surface::Surface;
use crate::util::clock::Clock;

/// Near/far planes handed to a fresh camera; the transform rescales them
/// from the zoom on every placement.
const INITIAL_NEAR: f64 = 0.1;
const INITIAL_FAR: f64 = 1000.0;

/// What the running animation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnimationKind {
    /// `ease_to`/`fly_to` and the wrappers built on them.
    Navigation,
    /// The nudge back inside the pan bounds.
    SoftBounds,
}

/// Map-style camera controller.
pub struct CameraController {
    transform: Transform,
    helper: Box<dyn CameraHelper>,
    handlers: HandlerManager,
    events: Evented,
    surface: Option<Rc<dyn Surface>>,
    clock: Rc<dyn Clock>,
    options: ControllerOptions,
    lifecycle: Lifecycle,
    animation: Option<(CameraAnimation, AnimationKind)>,
    last_frame: Option<Instant>,
    soft_bounds_guard: Option<Instant>,
    signals: Vec<HandlerSignal>,
    disposed: bool,
}

impl CameraController {
    /// Controller over `surface` (or headless when `None`) with the planar
    /// ground helper.
    #[must_use]
    pub fn new(
        options: ControllerOptions,
        surface: Option<Rc<dyn Surface>>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self::with_helper(options, surface, clock, Box::new(PlanarHelper))
    }

    /// Controller with a custom pose-delta strategy.
    #[must_use]
    pub fn with_helper(
        options: ControllerOptions,
        surface: Option<Rc<dyn Surface>>,
        clock: Rc<dyn Clock>,
        helper: Box<dyn CameraHelper>,
    ) -> Self {
        let options = options.sanitized();
        let viewport = surface
            .as_ref()
            .map(|s| surface_viewport(s.as_ref()))
            .filter(|v| !v.is_degenerate())
            .unwrap_or(options.camera.viewport);

        let camera = match options.camera.projection {
            ProjectionKind::Perspective => Camera::perspective(
                options.camera.fovy,
                viewport.aspect(),
                INITIAL_NEAR,
                INITIAL_FAR,
            ),
            ProjectionKind::Orthographic => {
                Camera::orthographic(viewport.aspect(), INITIAL_NEAR, INITIAL_FAR)
            }
        };
        let up_axis = options.camera.up_axis;
        let mut transform =
            Transform::new(camera, viewport, up_axis, options.constraints);

        let view = options.initial_view;
        transform.set_pose(&Pose {
            center: up_axis.from_ground(view.center, 0.0),
            zoom: view.zoom,
            bearing: view.bearing,
            pitch: view.pitch,
            roll: view.roll,
            padding: view.padding,
        });

        let handlers = HandlerManager::new(&options.handlers, surface.clone());
        log::debug!(
            "camera controller: {:?} {}x{} ({})",
            options.camera.projection,
            viewport.width,
            viewport.height,
            if surface.is_some() { "bound" } else { "headless" }
        );

        Self {
            transform,
            helper,
            handlers,
            events: Evented::new(),
            surface,
            clock,
            options,
            lifecycle: Lifecycle::default(),
            animation: None,
            last_frame: None,
            soft_bounds_guard: None,
            signals: Vec::new(),
            disposed: false,
        }
    }

    // ── Events ─────────────────────────────────────────────────────────

    /// Call `callback` for every `kind` event until removed.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl FnMut(&CameraEvent) + 'static,
    ) -> ListenerId {
        self.events.on(kind, callback)
    }

    /// Call `callback` for the next `kind` event only.
    pub fn once(
        &self,
        kind: EventKind,
        callback: impl FnMut(&CameraEvent) + 'static,
    ) -> ListenerId {
        self.events.once(kind, callback)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    /// The listener registry; clones share listeners.
    #[must_use]
    pub fn events(&self) -> &Evented {
        &self.events
    }

    fn fire(&self, kind: EventKind) {
        fire(&self.events, kind, self.transform.pose(), None);
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// Pose owner and coordinate conversions.
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Current pose.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.transform.pose()
    }

    /// Options the controller was built with (after repair).
    #[must_use]
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// The gesture handlers.
    #[must_use]
    pub fn handlers(&self) -> &HandlerManager {
        &self.handlers
    }

    /// The gesture handlers, e.g. to toggle cooperative scroll zoom.
    pub fn handlers_mut(&mut self) -> &mut HandlerManager {
        &mut self.handlers
    }

    /// Box being drawn by the box-zoom handler, for the host's overlay.
    #[must_use]
    pub fn box_zoom_rect(&self) -> Option<(DVec2, DVec2)> {
        self.handlers.box_zoom_rect()
    }

    /// Whether any axis is moving.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.lifecycle.is_moving()
    }

    /// Whether zoom is changing.
    #[must_use]
    pub fn is_zooming(&self) -> bool {
        self.lifecycle.active().zoom
    }

    /// Whether bearing is changing.
    #[must_use]
    pub fn is_rotating(&self) -> bool {
        self.lifecycle.active().rotate
    }

    /// Whether pitch is changing.
    #[must_use]
    pub fn is_pitching(&self) -> bool {
        self.lifecycle.active().pitch
    }

    /// Whether roll is changing.
    #[must_use]
    pub fn is_rolling(&self) -> bool {
        self.lifecycle.active().roll
    }

    /// Whether a gesture is panning the map.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.lifecycle.active().pan
    }

    /// Whether reduced motion is in effect: the option when set,
    /// otherwise the surface's preference.
    #[must_use]
    pub fn prefers_reduced_motion(&self) -> bool {
        self.options.animation.reduced_motion.unwrap_or_else(|| {
            self.surface
                .as_ref()
                .is_some_and(|s| s.prefers_reduced_motion())
        })
    }

    // ── Viewport & constraints ─────────────────────────────────────────

    /// Resize the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.disposed {
            return;
        }
        self.transform.set_viewport(viewport);
        self.fire(EventKind::RenderFrame);
    }

    /// Replace the constraints; the pose is re-clamped against them.
    pub fn set_constraints(&mut self, constraints: Constraints) {
        if self.disposed {
            return;
        }
        self.transform.set_constraints(constraints);
        self.options.constraints = *self.transform.constraints();
        self.fire(EventKind::RenderFrame);
    }

    // ── Teardown ───────────────────────────────────────────────────────

    /// Stop animations and inertia, unbind every handler and drop all
    /// listeners. Safe to call more than once, with or without a surface.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop();
        self.handlers.dispose();
        self.events.clear();
        self.surface = None;
        self.disposed = true;
        log::debug!("camera controller disposed");
    }

    /// Whether [`dispose`](Self::dispose) ran.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn request_frame(&self) {
        if let Some(surface) = &self.surface {
            surface.request_frame();
        }
    }
}

impl std::fmt::Debug for CameraController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController")
            .field("pose", &self.transform.pose())
            .field("moving", &self.lifecycle.is_moving())
            .field("animating", &self.animation.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

fn surface_viewport(surface: &dyn Surface) -> Viewport {
    let size = surface.client_size();
    Viewport {
        width: size.x,
        height: size.y,
        device_pixel_ratio: surface.device_pixel_ratio(),
    }
    .sanitized()
}
