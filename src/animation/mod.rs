//! Animated camera moves: timed eases, zoom-out flights and their
//! cancellation tokens.

pub mod flight_path;
mod target;
mod token;
mod transition;

pub use flight_path::FlightPath;
pub use target::{CameraTarget, EaseOptions, FlyOptions};
pub use token::AnimationToken;
pub(crate) use transition::{Anchor, CameraAnimation, FlightParams};
