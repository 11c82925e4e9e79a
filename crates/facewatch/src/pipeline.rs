//! Per-frame recognition and annotation.
//!
//! Detection and encoding run on a downsampled copy of the frame; drawing
//! happens on the full-resolution original, with boxes mapped back up.

use facewatch_core::{AnalyzerError, FaceAnalyzer, FaceRect, ReferenceSet};
use facewatch_video::{draw, Frame};
use std::collections::BTreeSet;

/// Label used for faces that match no reference.
pub const UNKNOWN_LABEL: &str = "Unknown";

const BOX_THICKNESS: i32 = 2;
const LABEL_BAR_HEIGHT: i32 = 35;

/// Detect and identify every face in `frame`, returning the annotated
/// frame and the set of names observed (deduplicated; unmatched faces
/// contribute [`UNKNOWN_LABEL`]).
pub fn process_frame(
    frame: &Frame,
    references: &ReferenceSet,
    analyzer: &mut dyn FaceAnalyzer,
    scale_factor: f32,
    tolerance: f32,
) -> Result<(Frame, BTreeSet<String>), AnalyzerError> {
    let mut annotated = frame.clone();
    let mut observed = BTreeSet::new();

    let small = frame.downsample(scale_factor);
    let rgb = small.to_rgb();
    let faces = analyzer.detect_faces(&rgb, small.width, small.height)?;

    for face in &faces {
        let embedding = analyzer.encode_face(&rgb, small.width, small.height, face)?;

        let matched = references
            .nearest_by(&embedding, |a, b| analyzer.distance(a, b))
            .filter(|&(_, dist)| dist <= tolerance);

        let name = match matched {
            Some((idx, dist)) => {
                tracing::debug!(name = references.name(idx), distance = dist, "face matched");
                references.name(idx).to_string()
            }
            None => UNKNOWN_LABEL.to_string(),
        };

        let rect = FaceRect::from_bounding_box(face).upscale(scale_factor);
        let color = if name == UNKNOWN_LABEL {
            draw::RED
        } else {
            draw::GREEN
        };
        draw::rect_outline(
            &mut annotated,
            rect.left,
            rect.top,
            rect.right,
            rect.bottom,
            color,
            BOX_THICKNESS,
        );
        draw::fill_rect(
            &mut annotated,
            rect.left,
            rect.bottom - LABEL_BAR_HEIGHT,
            rect.right,
            rect.bottom,
            color,
        );
        draw::draw_text(
            &mut annotated,
            &name,
            rect.left + 6,
            rect.bottom - LABEL_BAR_HEIGHT + (LABEL_BAR_HEIGHT - draw::TEXT_HEIGHT) / 2,
            draw::WHITE,
        );

        observed.insert(name);
    }

    Ok((annotated, observed))
}
