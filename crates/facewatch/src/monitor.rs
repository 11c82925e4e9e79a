//! The capture loop: read, recognize, track, snapshot, display.

use crate::config::Config;
use crate::{pipeline, snapshot, tracker};
use anyhow::Context;
use facewatch_core::{AnalyzerError, FaceAnalyzer, ReferenceSet};
use facewatch_video::{Display, Frame, VideoSource};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

const WINDOW_TITLE: &str = "facewatch";

/// Result of processing one captured frame.
pub struct StepOutcome {
    pub annotated: Frame,
    pub observed: BTreeSet<String>,
    pub saved: Vec<PathBuf>,
}

/// Process one frame: recognize, diff against the previous frame's names,
/// snapshot the newcomers, and advance `previous`.
pub fn step(
    frame: &Frame,
    references: &ReferenceSet,
    analyzer: &mut dyn FaceAnalyzer,
    config: &Config,
    previous: &mut BTreeSet<String>,
) -> Result<StepOutcome, AnalyzerError> {
    let (annotated, observed) = pipeline::process_frame(
        frame,
        references,
        analyzer,
        config.scale_factor,
        config.tolerance,
    )?;

    let new_names = tracker::newly_appeared(&observed, previous);
    let saved = snapshot::save_new_faces(&new_names, frame, &config.output_dir);
    *previous = observed.clone();

    Ok(StepOutcome {
        annotated,
        observed,
        saved,
    })
}

/// Run the monitor until the stream fails or the user quits.
///
/// A failed frame read waits out `reconnect_delay_secs` and then shuts the
/// loop down; no reopen is attempted. In headless mode no window is opened
/// and the loop can only end through a stream failure.
pub fn run(
    config: &Config,
    analyzer: &mut dyn FaceAnalyzer,
    references: &ReferenceSet,
    headless: bool,
) -> anyhow::Result<()> {
    let mut source = VideoSource::open(&config.source)
        .with_context(|| format!("cannot open video source {}", config.source))?;
    tracing::info!(source = %config.source, "video source connected");

    let mut display: Option<Display> = None;
    let mut previous = BTreeSet::new();

    loop {
        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    delay_secs = config.reconnect_delay_secs,
                    "frame read failed, shutting down after delay"
                );
                std::thread::sleep(Duration::from_secs(config.reconnect_delay_secs));
                break;
            }
        };

        let outcome = step(&frame, references, analyzer, config, &mut previous)?;

        if !headless {
            let window = match display.as_mut() {
                Some(window) => window,
                None => display.insert(
                    Display::open(WINDOW_TITLE, frame.width, frame.height)
                        .context("cannot open preview window")?,
                ),
            };
            window.show(&outcome.annotated)?;
            if window.quit_requested() {
                tracing::info!("quit requested");
                break;
            }
        }
    }

    tracing::info!("monitor stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{bbox, embedding, ScriptedAnalyzer};

    fn test_config(output_dir: PathBuf) -> Config {
        Config {
            source: "/dev/video0".to_string(),
            references: Vec::new(),
            scale_factor: 1.0,
            tolerance: 0.6,
            output_dir,
            model_dir: PathBuf::from("models"),
            reconnect_delay_secs: 0,
        }
    }

    fn blank(w: u32, h: u32) -> Frame {
        Frame::from_bgr(vec![0u8; (w * h * 3) as usize], w, h).unwrap()
    }

    #[test]
    fn test_person_entering_is_snapshotted_exactly_once() {
        // Three frames: empty, Alice appears, Alice stays.
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("out"));

        let mut references = ReferenceSet::new();
        references.push("Alice", embedding(vec![1.0, 0.0]));

        let mut analyzer = ScriptedAnalyzer::new();
        analyzer.push_frame(vec![]);
        analyzer.push_frame(vec![bbox(5.0, 5.0, 20.0, 20.0)]);
        analyzer.push_embedding(vec![1.0, 0.0]);
        analyzer.push_frame(vec![bbox(6.0, 5.0, 20.0, 20.0)]);
        analyzer.push_embedding(vec![0.95, 0.0]);

        let frame = blank(64, 64);
        let mut previous = BTreeSet::new();
        let mut saved_total = 0;

        for _ in 0..3 {
            let outcome =
                step(&frame, &references, &mut analyzer, &config, &mut previous).unwrap();
            saved_total += outcome.saved.len();
        }

        assert_eq!(saved_total, 1);
        let file = std::fs::read_dir(&config.output_dir)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert!(file
            .file_name()
            .to_string_lossy()
            .starts_with("person_known-Alice-"));
    }

    #[test]
    fn test_unknown_face_is_snapshotted() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("out"));

        let mut analyzer = ScriptedAnalyzer::new();
        analyzer.push_frame(vec![bbox(5.0, 5.0, 20.0, 20.0)]);
        analyzer.push_embedding(vec![1.0, 0.0]);

        let mut previous = BTreeSet::new();
        let outcome = step(
            &blank(64, 64),
            &ReferenceSet::new(),
            &mut analyzer,
            &config,
            &mut previous,
        )
        .unwrap();

        assert_eq!(outcome.saved.len(), 1);
        assert_eq!(
            outcome.observed,
            [pipeline::UNKNOWN_LABEL.to_string()].into_iter().collect()
        );
    }

    #[test]
    fn test_previous_set_advances_each_step() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("out"));

        let mut analyzer = ScriptedAnalyzer::new();
        analyzer.push_frame(vec![bbox(5.0, 5.0, 20.0, 20.0)]);
        analyzer.push_embedding(vec![1.0, 0.0]);
        analyzer.push_frame(vec![]);

        let mut references = ReferenceSet::new();
        references.push("Alice", embedding(vec![1.0, 0.0]));

        let mut previous = BTreeSet::new();
        step(&blank(64, 64), &references, &mut analyzer, &config, &mut previous).unwrap();
        assert_eq!(previous, ["Alice".to_string()].into_iter().collect());

        step(&blank(64, 64), &references, &mut analyzer, &config, &mut previous).unwrap();
        assert!(previous.is_empty());
    }
}
