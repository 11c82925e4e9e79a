//! Snapshot files for newly appeared faces.

use crate::pipeline::UNKNOWN_LABEL;
use chrono::Local;
use facewatch_video::Frame;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const KNOWN_PREFIX: &str = "person_known";
const UNKNOWN_PREFIX: &str = "person_unknown";

/// Microsecond resolution keeps names written in the same batch distinct.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Write one full-frame PNG per newly appeared name, returning the paths
/// written. Failures are logged per file; the remaining names still get
/// their snapshots. The output directory is created on first use.
pub fn save_new_faces(
    new_names: &BTreeSet<String>,
    frame: &Frame,
    output_dir: &Path,
) -> Vec<PathBuf> {
    let mut written = Vec::new();
    if new_names.is_empty() {
        return written;
    }

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        tracing::error!(dir = %output_dir.display(), error = %e, "cannot create snapshot directory");
        return written;
    }

    let rgb = frame.to_rgb();
    for name in new_names {
        let (prefix, file_name) = if name == UNKNOWN_LABEL {
            (UNKNOWN_PREFIX, "unknown".to_string())
        } else {
            (KNOWN_PREFIX, name.replace(' ', "_"))
        };
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let path = output_dir.join(format!("{prefix}-{file_name}-{timestamp}.png"));

        match image::save_buffer(
            &path,
            &rgb,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgb8,
        ) {
            Ok(()) => {
                tracing::info!(name = %name, path = %path.display(), "snapshot saved");
                written.push(path);
            }
            Err(e) => {
                tracing::error!(name = %name, path = %path.display(), error = %e, "cannot save snapshot");
            }
        }
    }

    written
}
