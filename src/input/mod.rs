//! Input handling: platform-agnostic events, the gesture handlers that
//! turn them into camera moves, and the manager that owns the handlers.

/// Platform-agnostic input events.
pub mod event;
/// One handler per input modality.
pub mod handlers;
mod manager;
#[cfg(feature = "winit")]
mod winit_adapter;

pub use event::{InputEvent, Modifiers, MouseButton, PointerKind, WheelDeltaMode};
pub use manager::HandlerManager;
#[cfg(feature = "winit")]
pub use winit_adapter::WinitInputAdapter;
