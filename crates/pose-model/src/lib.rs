//! RepCount Pose Model
//!
//! Defines the data contracts shared by every RepCount crate:
//! - **Landmarks:** Normalized body points with a visibility confidence
//! - **Frames:** The fixed 33-slot landmark set produced per camera frame
//! - **Exercises:** Supported exercise kinds and their two-stage cycles
//! - **Challenges:** Preset exercise goals
//!
//! All coordinates are normalized to `[0.0, 1.0]` relative to the frame
//! dimensions. The landmark index scheme is defined by the external pose
//! estimator and is only named here, never renumbered.

pub mod challenge;
pub mod error;
pub mod exercise;
pub mod landmark;
pub mod stream;

pub use challenge::*;
pub use error::*;
pub use exercise::*;
pub use landmark::*;
pub use stream::*;
