//! Enrollment — build the reference set from configured images.

use crate::pipeline::UNKNOWN_LABEL;
use facewatch_core::{FaceAnalyzer, ReferenceSet};
use std::path::PathBuf;

/// Load reference images and encode one face per entry.
///
/// A failed entry (unreadable image, no face found, encoding error) is
/// logged and skipped; startup proceeds with whatever loaded. When an image
/// contains several faces the highest-confidence one is enrolled.
pub fn load_references(
    entries: &[(String, PathBuf)],
    analyzer: &mut dyn FaceAnalyzer,
) -> ReferenceSet {
    let mut references = ReferenceSet::new();

    for (name, path) in entries {
        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                tracing::error!(name = %name, path = %path.display(), error = %e, "cannot read reference image");
                continue;
            }
        };
        let (width, height) = image.dimensions();

        let faces = match analyzer.detect_faces(image.as_raw(), width, height) {
            Ok(faces) => faces,
            Err(e) => {
                tracing::error!(name = %name, path = %path.display(), error = %e, "face detection failed on reference image");
                continue;
            }
        };

        let face = match faces.first() {
            Some(face) => face,
            None => {
                tracing::error!(name = %name, path = %path.display(), "no face found in reference image");
                continue;
            }
        };
        if faces.len() > 1 {
            tracing::warn!(
                name = %name,
                path = %path.display(),
                count = faces.len(),
                "multiple faces in reference image, enrolling the most confident"
            );
        }

        match analyzer.encode_face(image.as_raw(), width, height, face) {
            Ok(embedding) => {
                tracing::info!(name = %name, path = %path.display(), "reference enrolled");
                references.push(name.clone(), embedding);
            }
            Err(e) => {
                tracing::error!(name = %name, path = %path.display(), error = %e, "cannot encode reference face");
            }
        }
    }

    if references.is_empty() {
        tracing::warn!(
            "no references enrolled, every face will be labeled {}",
            UNKNOWN_LABEL
        );
    } else {
        tracing::info!(count = references.len(), "reference set ready");
    }

    references
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{bbox, ScriptedAnalyzer};

    fn write_test_image(dir: &std::path::Path, file: &str) -> PathBuf {
        let path = dir.join(file);
        image::RgbImage::from_pixel(32, 32, image::Rgb([128, 128, 128]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_unreadable_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_test_image(dir.path(), "good.png");
        let entries = vec![
            ("Ghost".to_string(), dir.path().join("missing.png")),
            ("Alice".to_string(), good),
        ];

        let mut analyzer = ScriptedAnalyzer::new();
        analyzer.push_frame(vec![bbox(2.0, 2.0, 10.0, 10.0)]);
        analyzer.push_embedding(vec![1.0, 0.0]);

        let references = load_references(&entries, &mut analyzer);
        assert_eq!(references.len(), 1);
        assert_eq!(references.name(0), "Alice");
    }

    #[test]
    fn test_faceless_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "wall.png");
        let entries = vec![("Nobody".to_string(), path)];

        let mut analyzer = ScriptedAnalyzer::new();
        analyzer.push_frame(vec![]);

        let references = load_references(&entries, &mut analyzer);
        assert!(references.is_empty());
    }

    #[test]
    fn test_multi_face_image_enrolls_one_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "crowd.png");
        let entries = vec![("Alice".to_string(), path)];

        let mut analyzer = ScriptedAnalyzer::new();
        analyzer.push_frame(vec![
            bbox(2.0, 2.0, 10.0, 10.0),
            bbox(18.0, 2.0, 10.0, 10.0),
        ]);
        analyzer.push_embedding(vec![1.0, 0.0]);

        let references = load_references(&entries, &mut analyzer);
        assert_eq!(references.len(), 1);
    }
}
