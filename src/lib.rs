//! Lomo is a toy-camera photo filter engine.
//!
//! The public API is session-oriented:
//!
//! - Wire up a [`Darkroom`] with a shared [`Bus`]
//! - Load a photo as a [`Surface`] and apply a [`Look`]
//! - Observe lifecycle transitions on the bus, or drive the
//!   [`StateStore`] and effect stacks directly
#![forbid(unsafe_code)]

pub mod effects;
pub mod error;
pub mod machine;
pub mod pubsub;
pub mod raster;
pub mod session;
pub mod store;
pub mod surface;

pub use effects::{
    BlurSpread, ColorCurve, Effect, GrayscaleWeights, Look, VignetteShape, apply_blur,
    apply_color, apply_effects, apply_grayscale, apply_vignette,
};
pub use error::{LomoError, LomoResult};
pub use machine::{Action, Machine, State};
pub use pubsub::{PubSub, Subscriber};
pub use raster::{GradientStop, Painter, RadialGradient};
pub use session::Darkroom;
pub use store::{Bus, Notice, STATE_CHANGED, STORE_RESET, StateChange, StateStore};
pub use surface::Surface;
