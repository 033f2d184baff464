//! The shared front-end workflow, driven through a recording presenter.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use skinlight_export::to_png;
use skinlight_io::{AnalysisResult, AnalyzeError, Presenter, Session};
use skinlight_pipeline::RgbImage;

#[derive(Debug, Default)]
struct Recorder {
    sources: Vec<PathBuf>,
    results: usize,
    statuses: Vec<String>,
    clears: usize,
}

impl Presenter for Recorder {
    fn show_source(&mut self, path: &Path, _image: &RgbImage) {
        self.sources.push(path.to_path_buf());
    }

    fn show_result(&mut self, result: &AnalysisResult) {
        assert!(result.visualization.is_some());
        self.results += 1;
    }

    fn status(&mut self, message: &str) {
        self.statuses.push(message.to_owned());
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

fn setup() -> (tempfile::TempDir, PathBuf, Session<Recorder>) {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("face.png");
    let image = RgbImage::from_pixel(120, 100, [200, 150, 120].into());
    std::fs::write(&photo, to_png(&image).unwrap()).unwrap();
    let mut session = Session::new(Recorder::default());
    session.set_save_path(dir.path().join("outputs/result.png"));
    (dir, photo, session)
}

#[test]
fn actions_before_open_are_rejected() {
    let (dir, _photo, mut session) = setup();
    assert!(matches!(session.run_analysis(), Err(AnalyzeError::NoImage)));
    assert!(matches!(
        session.save_image(&dir.path().join("x.png")),
        Err(AnalyzeError::NoResult)
    ));
    assert!(matches!(
        session.export_json(&dir.path().join("x.json")),
        Err(AnalyzeError::NoResult)
    ));
}

#[test]
fn save_before_run_is_rejected() {
    let (dir, photo, mut session) = setup();
    session.open_image(&photo).unwrap();
    assert!(matches!(
        session.save_image(&dir.path().join("x.png")),
        Err(AnalyzeError::NoResult)
    ));
}

#[test]
fn full_workflow() {
    let (dir, photo, mut session) = setup();
    session.set_light_comp(true);

    session.open_image(&photo).unwrap();
    assert_eq!(session.presenter().sources, [photo.clone()]);
    assert_eq!(session.presenter().statuses.last().unwrap(), "Loaded face.png");

    let scores = session.run_analysis().unwrap().scores;
    assert_eq!(session.presenter().results, 1);
    assert!(
        session
            .presenter()
            .statuses
            .last()
            .unwrap()
            .starts_with("Analysis complete: Redness=")
    );
    assert!(dir.path().join("outputs/result.png").exists());

    let copy = dir.path().join("saved/copy.png");
    session.save_image(&copy).unwrap();
    assert_eq!(
        std::fs::read(&copy).unwrap(),
        std::fs::read(dir.path().join("outputs/result.png")).unwrap()
    );

    let json = dir.path().join("metrics.json");
    session.export_json(&json).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["redness"], scores.rounded().redness);
    assert_eq!(value["light_comp"], true);
    assert_eq!(value["auto_face"], true);

    session.reset();
    assert_eq!(session.presenter().clears, 1);
    assert!(session.last_result().is_none());
    assert!(matches!(session.run_analysis(), Err(AnalyzeError::NoImage)));
}

#[test]
fn failed_open_keeps_previous_photo() {
    let (dir, photo, mut session) = setup();
    session.open_image(&photo).unwrap();
    let err = session.open_image(&dir.path().join("missing.png")).unwrap_err();
    assert!(matches!(err, AnalyzeError::Load { .. }));
    assert!(session.run_analysis().is_ok());
}

#[test]
fn repeated_exports_are_identical() {
    let (dir, photo, mut session) = setup();
    session.open_image(&photo).unwrap();
    session.run_analysis().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    session.export_json(&a).unwrap();
    session.export_json(&b).unwrap();
    let a = std::fs::read_to_string(a).unwrap();
    let b = std::fs::read_to_string(b).unwrap();
    assert_eq!(a, b);
}
