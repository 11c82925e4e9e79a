//! Scripted stand-in engine for tests that need no model files.

use facewatch_core::{AnalyzerError, BoundingBox, Embedding, FaceAnalyzer};
use std::collections::VecDeque;

/// Plays back a script: one detection batch per `detect_faces` call and one
/// embedding per `encode_face` call, in order. Past the end of the script,
/// detection returns no faces and encoding returns a zero vector.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    pub detections: VecDeque<Vec<BoundingBox>>,
    pub embeddings: VecDeque<Embedding>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, faces: Vec<BoundingBox>) {
        self.detections.push_back(faces);
    }

    pub fn push_embedding(&mut self, values: Vec<f32>) {
        self.embeddings.push_back(embedding(values));
    }
}

impl FaceAnalyzer for ScriptedAnalyzer {
    fn detect_faces(
        &mut self,
        _rgb: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<BoundingBox>, AnalyzerError> {
        Ok(self.detections.pop_front().unwrap_or_default())
    }

    fn encode_face(
        &mut self,
        _rgb: &[u8],
        _width: u32,
        _height: u32,
        _face: &BoundingBox,
    ) -> Result<Embedding, AnalyzerError> {
        Ok(self
            .embeddings
            .pop_front()
            .unwrap_or_else(|| embedding(vec![0.0; 4])))
    }
}

pub fn bbox(x: f32, y: f32, width: f32, height: f32) -> BoundingBox {
    BoundingBox {
        x,
        y,
        width,
        height,
        confidence: 0.9,
        landmarks: Some([(0.0, 0.0); 5]),
    }
}

pub fn embedding(values: Vec<f32>) -> Embedding {
    Embedding {
        values,
        model_version: None,
    }
}
