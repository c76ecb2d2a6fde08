use std::rc::Rc;

use glam::DVec2;

use super::{Binding, GestureHandler, HandlerContext};
use crate::camera::{BoundsOptions, GroundBounds, Padding};
use crate::events::Axes;
use crate::input::event::{InputEvent, Modifiers, MouseButton};
use crate::options::BoxZoomOptions;
use crate::surface::Surface;
use crate::util::math::scale_zoom;

/// Drag distance before a shift-press becomes a box.
const BOX_START_PX: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
struct Drag {
    id: u64,
    start: DVec2,
    current: DVec2,
    boxing: bool,
}

/// Shift+drag draws a screen rectangle; releasing zooms to fit it.
///
/// The in-progress rectangle is exposed through [`rect`](Self::rect) so
/// the host can draw the overlay. Escape cancels.
pub struct BoxZoomHandler {
    options: BoxZoomOptions,
    binding: Binding,
    drag: Option<Drag>,
}

impl BoxZoomHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: BoxZoomOptions) -> Self {
        Self {
            options,
            binding: Binding::default(),
            drag: None,
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &BoxZoomOptions {
        &self.options
    }

    /// Box being drawn as `(min, max)` screen corners.
    #[must_use]
    pub fn rect(&self) -> Option<(DVec2, DVec2)> {
        self.drag
            .filter(|d| d.boxing)
            .map(|d| (d.start.min(d.current), d.start.max(d.current)))
    }

    fn claims(button: MouseButton, modifiers: Modifiers) -> bool {
        button == MouseButton::Left && modifiers.shift && !modifiers.alt
    }

    /// Zoom to the screen rectangle `min..max`.
    fn finish(&self, min: DVec2, max: DVec2, event: &InputEvent, ctx: &mut HandlerContext<'_>) -> bool {
        let size = max - min;
        if size.x * size.y < self.options.min_area_px {
            log::trace!("box {size:?} below minimum area");
            return false;
        }
        let before = ctx.transform.pose();
        let corners = [min, DVec2::new(max.x, min.y), max, DVec2::new(min.x, max.y)];
        let ground: Option<Vec<_>> = corners
            .iter()
            .map(|&c| ctx.transform.ground_from_screen(c))
            .collect();

        let solved = ground.and_then(GroundBounds::from_points).and_then(|bounds| {
            let options = BoundsOptions {
                padding: Padding::uniform(self.options.padding_px),
                ..BoundsOptions::default()
            };
            ctx.helper
                .camera_for_box_and_bearing(ctx.transform, &bounds, &options)
        });

        match solved {
            Some(camera) => ctx.transform.defer_apply(|t| {
                t.set_center(camera.center);
                t.set_zoom(camera.zoom);
            }),
            None => {
                // corners above the horizon: estimate from the screen ratio
                let viewport = ctx.transform.viewport();
                let ratio = (viewport.width / size.x).min(viewport.height / size.y);
                let focus = (min + max) * 0.5;
                let shift = focus - ctx.transform.center_point();
                let helper = ctx.helper;
                ctx.transform.defer_apply(|t| {
                    helper.pan(t, shift);
                    t.set_zoom(t.zoom() + scale_zoom(ratio));
                });
            }
        }

        let after = ctx.transform.pose();
        let axes = Axes {
            zoom: after.zoom != before.zoom,
            pan: after.center != before.center,
            ..Axes::NONE
        };
        log::debug!("box zoom to {:.2}", after.zoom);
        ctx.emit(axes, Some(event));
        true
    }
}

impl GestureHandler for BoxZoomHandler {
    fn name(&self) -> &'static str {
        "box_zoom"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if self.binding.bind(surface) {
            log::debug!("box zoom enabled");
        }
    }

    fn disable(&mut self) {
        self.stop();
        self.binding.unbind();
    }

    fn is_enabled(&self) -> bool {
        self.binding.is_bound()
    }

    fn is_active(&self) -> bool {
        self.rect().is_some()
    }

    fn handle_event(
        &mut self,
        event: &InputEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match event {
            InputEvent::PointerDown {
                id,
                kind,
                button,
                position,
                modifiers,
            } if kind.is_mouse_like() && Self::claims(*button, *modifiers) => {
                self.drag = Some(Drag {
                    id: *id,
                    start: *position,
                    current: *position,
                    boxing: false,
                });
                true
            }
            InputEvent::PointerMove { id, position, .. } => {
                let Some(drag) = self.drag.as_mut().filter(|d| d.id == *id) else {
                    return false;
                };
                drag.current = *position;
                if !drag.boxing && position.distance(drag.start) >= BOX_START_PX {
                    drag.boxing = true;
                }
                drag.boxing
            }
            InputEvent::PointerUp { id, position, .. } => {
                let Some(drag) = self.drag.filter(|d| d.id == *id) else {
                    return false;
                };
                self.drag = None;
                if !drag.boxing {
                    return false;
                }
                let (min, max) = (drag.start.min(*position), drag.start.max(*position));
                self.finish(min, max, event, ctx)
            }
            InputEvent::PointerCancel { id, .. } if self.drag.is_some_and(|d| d.id == *id) => {
                self.stop();
                true
            }
            InputEvent::Key {
                code, pressed: true, ..
            } if code == "Escape" && self.drag.is_some() => {
                log::debug!("box zoom cancelled");
                self.stop();
                true
            }
            InputEvent::FocusLost => {
                self.stop();
                false
            }
            _ => false,
        }
    }

    fn stop(&mut self) {
        self.drag = None;
    }
}
