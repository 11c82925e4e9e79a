use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, with optional facial landmarks.
///
/// Coordinates are in the pixel space of the frame that was handed to the
/// detector — callers that detect on a downsampled frame map back to the
/// original resolution via [`FaceRect::upscale`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// Whole-pixel face rectangle as (top, right, bottom, left) edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRect {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceRect {
    /// Round a detector box to whole-pixel edges.
    pub fn from_bounding_box(b: &BoundingBox) -> Self {
        Self {
            top: b.y.round() as i32,
            right: (b.x + b.width).round() as i32,
            bottom: (b.y + b.height).round() as i32,
            left: b.x.round() as i32,
        }
    }

    /// Map a rectangle found on a frame downsampled by `factor` back to
    /// original-frame coordinates. A factor of 1.0 is the identity.
    pub fn upscale(self, factor: f32) -> Self {
        if factor == 1.0 {
            return self;
        }
        Self {
            top: (self.top as f32 / factor).round() as i32,
            right: (self.right as f32 / factor).round() as i32,
            bottom: (self.bottom as f32 / factor).round() as i32,
            left: (self.left as f32 / factor).round() as i32,
        }
    }
}

/// Face embedding vector (512-dimensional for ArcFace, L2-normalized).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    /// Compute Euclidean distance between two embeddings. Lower is closer.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Named reference embeddings, `names[i]` pairing with `embeddings[i]`.
///
/// Built once at startup and read-only afterwards. Names are not required
/// to be unique — a person may be enrolled from several images.
#[derive(Debug, Default, Clone)]
pub struct ReferenceSet {
    names: Vec<String>,
    embeddings: Vec<Embedding>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, embedding: Embedding) {
        self.names.push(name.into());
        self.embeddings.push(embedding);
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.names.len(), self.embeddings.len());
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index and distance of the reference closest to `probe` under
    /// Euclidean distance.
    pub fn nearest(&self, probe: &Embedding) -> Option<(usize, f32)> {
        self.nearest_by(probe, Embedding::euclidean_distance)
    }

    /// Index and distance of the reference closest to `probe` under a
    /// caller-supplied distance.
    ///
    /// Every entry is compared; ties keep the first occurrence. Returns
    /// `None` when the set is empty.
    pub fn nearest_by<F>(&self, probe: &Embedding, distance: F) -> Option<(usize, f32)>
    where
        F: Fn(&Embedding, &Embedding) -> f32,
    {
        let mut best: Option<(usize, f32)> = None;
        for (i, reference) in self.embeddings.iter().enumerate() {
            let d = distance(probe, reference);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: Vec<f32>) -> Embedding {
        Embedding {
            values,
            model_version: None,
        }
    }

    #[test]
    fn test_euclidean_distance_identical() {
        let a = emb(vec![1.0, 0.0, 0.0]);
        assert!(a.euclidean_distance(&a).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_distance_unit_axes() {
        let a = emb(vec![1.0, 0.0]);
        let b = emb(vec![0.0, 1.0]);
        assert!((a.euclidean_distance(&b) - 2.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_picks_global_minimum() {
        let mut refs = ReferenceSet::new();
        refs.push("far", emb(vec![0.0, 1.0]));
        refs.push("near", emb(vec![0.9, 0.0]));
        refs.push("farther", emb(vec![-1.0, 0.0]));

        let (idx, dist) = refs.nearest(&emb(vec![1.0, 0.0])).unwrap();
        assert_eq!(refs.name(idx), "near");
        assert!((dist - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_tie_keeps_first_occurrence() {
        let mut refs = ReferenceSet::new();
        refs.push("first", emb(vec![1.0, 0.0]));
        refs.push("second", emb(vec![1.0, 0.0]));

        let (idx, _) = refs.nearest(&emb(vec![1.0, 0.0])).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_nearest_empty_set() {
        let refs = ReferenceSet::new();
        assert!(refs.nearest(&emb(vec![1.0])).is_none());
    }

    #[test]
    fn test_parallel_arrays_stay_in_step() {
        let mut refs = ReferenceSet::new();
        refs.push("a", emb(vec![1.0]));
        refs.push("b", emb(vec![2.0]));
        assert_eq!(refs.len(), 2);
        assert_eq!(refs.names().len(), 2);
    }

    #[test]
    fn test_face_rect_from_bounding_box() {
        let b = BoundingBox {
            x: 10.4,
            y: 20.6,
            width: 30.0,
            height: 40.0,
            confidence: 0.9,
            landmarks: None,
        };
        let r = FaceRect::from_bounding_box(&b);
        assert_eq!(r.left, 10);
        assert_eq!(r.top, 21);
        assert_eq!(r.right, 40);
        assert_eq!(r.bottom, 61);
    }

    #[test]
    fn test_face_rect_upscale_half() {
        let r = FaceRect {
            top: 10,
            right: 20,
            bottom: 30,
            left: 0,
        };
        let up = r.upscale(0.5);
        assert_eq!(
            up,
            FaceRect {
                top: 20,
                right: 40,
                bottom: 60,
                left: 0,
            }
        );
    }

    #[test]
    fn test_face_rect_upscale_identity() {
        let r = FaceRect {
            top: 1,
            right: 2,
            bottom: 3,
            left: 4,
        };
        assert_eq!(r.upscale(1.0), r);
    }
}
