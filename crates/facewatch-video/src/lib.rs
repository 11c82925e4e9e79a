//! facewatch-video — Frame acquisition and presentation.
//!
//! Provides BGR frame handling (colorspace conversion, downsampling),
//! video sources (V4L2 devices and MJPEG-over-HTTP camera streams),
//! pixel-level drawing primitives, and a display window.

pub mod display;
pub mod draw;
pub mod frame;
pub mod source;

pub use display::{Display, DisplayError};
pub use frame::{Frame, FrameError};
pub use source::{SourceError, VideoSource};
