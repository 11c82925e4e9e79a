//! facewatch-core — Face detection and recognition engine.
//!
//! Uses SCRFD for face detection and ArcFace for embedding extraction,
//! both running via ONNX Runtime for CPU inference. The monitoring
//! pipeline consumes the engine through the [`FaceAnalyzer`] trait so
//! that everything above it can be exercised without model files.

pub mod alignment;
pub mod analyzer;
pub mod detector;
pub mod recognizer;
pub mod types;

pub use analyzer::{AnalyzerError, FaceAnalyzer, OnnxFaceAnalyzer};
pub use types::{BoundingBox, Embedding, FaceRect, ReferenceSet};
