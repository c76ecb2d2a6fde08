//! Composition root for the gesture handlers.
//!
//! The `HandlerManager` builds exactly the handlers the options enable,
//! binds them to the surface, and fans every input event and frame out
//! to them. What the handlers report is collected in the
//! [`HandlerContext`] the controller passes in.

use std::rc::Rc;

use glam::DVec2;

use super::event::InputEvent;
use super::handlers::{
    BoxZoomHandler, DoubleClickHandler, GestureHandler, HandlerContext,
    KeyboardHandler, MousePanHandler, MouseRotateHandler, ScrollZoomHandler,
    TouchHandler, TouchMode, TrackpadGestureHandler,
};
use crate::options::HandlersOptions;
use crate::surface::Surface;

/// Owns the enabled gesture handlers.
pub struct HandlerManager {
    surface: Option<Rc<dyn Surface>>,
    box_zoom: Option<BoxZoomHandler>,
    double_click: Option<DoubleClickHandler>,
    mouse_rotate: Option<MouseRotateHandler>,
    mouse_pan: Option<MousePanHandler>,
    touch: Option<TouchHandler>,
    scroll_zoom: Option<ScrollZoomHandler>,
    gesture: Option<TrackpadGestureHandler>,
    keyboard: Option<KeyboardHandler>,
    suppress_context_menu: bool,
    context_menu_suppressed: bool,
    disposed: bool,
}

impl HandlerManager {
    /// Build and enable the handlers `options` asks for. Without a surface
    /// the handlers exist but stay disabled.
    #[must_use]
    pub fn new(options: &HandlersOptions, surface: Option<Rc<dyn Surface>>) -> Self {
        let mut manager = Self {
            surface,
            box_zoom: options.box_zoom.resolve().map(BoxZoomHandler::new),
            double_click: options.double_click.resolve().map(DoubleClickHandler::new),
            mouse_rotate: options.mouse_rotate.resolve().map(MouseRotateHandler::new),
            mouse_pan: options.mouse_pan.resolve().map(MousePanHandler::new),
            touch: options.touch.resolve().map(TouchHandler::new),
            scroll_zoom: options.scroll_zoom.resolve().map(ScrollZoomHandler::new),
            gesture: options.gesture.resolve().map(TrackpadGestureHandler::new),
            keyboard: options.keyboard.resolve().map(KeyboardHandler::new),
            suppress_context_menu: options.suppress_context_menu,
            context_menu_suppressed: false,
            disposed: false,
        };

        let surface = manager.surface.clone();
        for handler in manager.handlers_mut() {
            handler.enable(surface.as_ref());
        }

        manager.sync_context_menu();

        log::debug!(
            "handlers: [{}]{}",
            manager.handlers().map(|h| h.name()).collect::<Vec<_>>().join(", "),
            if manager.surface.is_none() { " (headless)" } else { "" }
        );
        manager
    }

    /// Every constructed handler, in dispatch order.
    pub fn handlers(&self) -> impl Iterator<Item = &dyn GestureHandler> {
        let list: [Option<&dyn GestureHandler>; 8] = [
            self.box_zoom.as_ref().map(|h| h as &dyn GestureHandler),
            self.double_click.as_ref().map(|h| h as &dyn GestureHandler),
            self.mouse_rotate.as_ref().map(|h| h as &dyn GestureHandler),
            self.mouse_pan.as_ref().map(|h| h as &dyn GestureHandler),
            self.touch.as_ref().map(|h| h as &dyn GestureHandler),
            self.scroll_zoom.as_ref().map(|h| h as &dyn GestureHandler),
            self.gesture.as_ref().map(|h| h as &dyn GestureHandler),
            self.keyboard.as_ref().map(|h| h as &dyn GestureHandler),
        ];
        list.into_iter().flatten()
    }

    fn handlers_mut(&mut self) -> impl Iterator<Item = &mut dyn GestureHandler> {
        let list: [Option<&mut dyn GestureHandler>; 8] = [
            self.box_zoom.as_mut().map(|h| h as &mut dyn GestureHandler),
            self.double_click.as_mut().map(|h| h as &mut dyn GestureHandler),
            self.mouse_rotate.as_mut().map(|h| h as &mut dyn GestureHandler),
            self.mouse_pan.as_mut().map(|h| h as &mut dyn GestureHandler),
            self.touch.as_mut().map(|h| h as &mut dyn GestureHandler),
            self.scroll_zoom.as_mut().map(|h| h as &mut dyn GestureHandler),
            self.gesture.as_mut().map(|h| h as &mut dyn GestureHandler),
            self.keyboard.as_mut().map(|h| h as &mut dyn GestureHandler),
        ];
        list.into_iter().flatten()
    }

    /// Whether a handler with this [`name`](GestureHandler::name) exists
    /// and is listening.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.handlers().any(|h| h.name() == name && h.is_enabled())
    }

    /// Bind the handler called `name` to the surface. Returns whether it is
    /// listening afterwards.
    pub fn enable(&mut self, name: &str) -> bool {
        if self.disposed {
            return false;
        }
        let surface = self.surface.clone();
        let enabled = self.handler_mut(name).is_some_and(|h| {
            h.enable(surface.as_ref());
            h.is_enabled()
        });
        self.sync_context_menu();
        enabled
    }

    /// Unbind the handler called `name`. Returns whether it was listening.
    pub fn disable(&mut self, name: &str) -> bool {
        let was_enabled = self.handler_mut(name).is_some_and(|h| {
            let was = h.is_enabled();
            h.disable();
            was
        });
        self.sync_context_menu();
        was_enabled
    }

    fn handler_mut(&mut self, name: &str) -> Option<&mut dyn GestureHandler> {
        self.handlers_mut().find(|h| h.name() == name)
    }

    /// Suppress the native context menu exactly while an enabled handler
    /// drags with the secondary button.
    fn sync_context_menu(&mut self) {
        let wants = self.suppress_context_menu
            && !self.disposed
            && self.handlers().any(|h| h.is_enabled() && h.uses_secondary_button());
        if wants == self.context_menu_suppressed {
            return;
        }
        if let Some(surface) = &self.surface {
            surface.set_context_menu_suppressed(wants);
            self.context_menu_suppressed = wants;
            log::debug!("context menu suppressed: {wants}");
        }
    }

    /// Offer `event` to every handler. Returns whether any used it.
    pub fn handle_event(&mut self, event: &InputEvent, ctx: &mut HandlerContext<'_>) -> bool {
        if self.disposed {
            return false;
        }
        let mut used = false;
        for handler in self.handlers_mut() {
            if handler.handle_event(event, ctx) {
                used = true;
            }
        }
        used
    }

    /// Advance every handler's inertia by `ctx.dt`.
    pub fn tick(&mut self, ctx: &mut HandlerContext<'_>) {
        if self.disposed {
            return;
        }
        for handler in self.handlers_mut() {
            if handler.is_animating() {
                handler.tick(ctx);
            }
        }
    }

    /// Whether a button or finger is down on any handler.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handlers().any(GestureHandler::is_active)
    }

    /// Whether any handler is still gliding.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.handlers().any(GestureHandler::is_animating)
    }

    /// Drop all inertia and in-flight gestures.
    pub fn stop(&mut self) {
        for handler in self.handlers_mut() {
            handler.stop();
        }
    }

    /// Box being drawn by the box-zoom handler, as `(min, max)` corners.
    #[must_use]
    pub fn box_zoom_rect(&self) -> Option<(DVec2, DVec2)> {
        self.box_zoom.as_ref().and_then(BoxZoomHandler::rect)
    }

    /// Current touch gesture mode, if touch is handled.
    #[must_use]
    pub fn touch_mode(&self) -> Option<TouchMode> {
        self.touch.as_ref().map(TouchHandler::mode)
    }

    /// Scroll-zoom handler, e.g. to toggle cooperative mode.
    pub fn scroll_zoom_mut(&mut self) -> Option<&mut ScrollZoomHandler> {
        self.scroll_zoom.as_mut()
    }

    /// Tear every handler down. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for handler in self.handlers_mut() {
            handler.destroy();
        }
        self.sync_context_menu();
        self.surface = None;
        log::debug!("handlers disposed");
    }

    /// Whether [`dispose`](Self::dispose) ran.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for HandlerManager {
    fn drop(&mut self) {
        self.dispose();
    }
}
