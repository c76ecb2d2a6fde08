// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]
#![warn(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![warn(unused_results)]
#![warn(unused_qualifications)]
// Cast hygiene
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]

//! Map-style camera control for 3D scenes over a flat ground plane.
//!
//! mapcam drives a perspective or orthographic camera with map semantics
//! (center, zoom, bearing, pitch, roll) instead of raw positions and
//! quaternions. Pointer, wheel, touch, keyboard and trackpad input becomes
//! smooth, anchor-preserving camera motion, and a navigation API covers
//! jumps, eases, zoom-out flights and fit-to-bounds.
//!
//! # Key entry points
//!
//! - [`CameraController`] - the controller: navigation API, input, events
//! - [`camera::Transform`] - the pose and every screen/world/ground
//!   conversion
//! - [`options::ControllerOptions`] - construction options (TOML presets)
//! - [`input::InputEvent`] - platform-agnostic input fed to the handlers
//!
//! # Architecture
//!
//! The controller owns a [`camera::Transform`] and a
//! [`input::HandlerManager`] holding one gesture handler per input
//! modality. Handlers move the transform through a
//! [`camera::CameraHelper`] and report which axes moved; the controller
//! turns those reports, and its own animations, into the
//! `movestart`/`<axis>start`/`<axis>`/`<axis>end`/`moveend` lifecycle
//! plus a `renderFrame` event for every pose change. Everything is
//! single threaded and frame driven through
//! [`CameraController::update`].

pub mod animation;
pub mod camera;
pub mod controller;
pub mod error;
pub mod events;
pub mod input;
pub mod options;
pub mod surface;
pub mod util;

pub use animation::{AnimationToken, CameraTarget, EaseOptions, FlyOptions};
pub use camera::{
    BoundsOptions, Constraints, GroundBounds, GroundPoint, Padding, Pose,
    Transform, UpAxis, Viewport,
};
pub use controller::{CameraController, StateSnapshot};
pub use error::CameraError;
pub use events::{Axes, CameraEvent, EventKind, ListenerId};
pub use input::InputEvent;
pub use options::ControllerOptions;
pub use surface::Surface;
pub use util::clock::{Clock, ManualClock, SystemClock};
