//! Integration test: a skin-toned square on a blue backdrop, with a
//! stub detector reporting it, walked through every pipeline stage.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use skinlight_pipeline::{
    AnalysisConfig, FaceCandidate, FaceDetector, GrayImage, Pipeline, RegionSource, RgbImage,
    analyze_image, visualize::PANEL_HEIGHT,
};

const FACE: (u32, u32, u32) = (70, 50, 100);

struct StubDetector;

impl FaceDetector for StubDetector {
    fn detect(&self, gray: &GrayImage, _min_size: u32) -> Vec<FaceCandidate> {
        assert_eq!(gray.dimensions(), (240, 200));
        vec![
            FaceCandidate {
                x: 0,
                y: 0,
                width: 30,
                height: 30,
            },
            FaceCandidate {
                x: i64::from(FACE.0),
                y: i64::from(FACE.1),
                width: i64::from(FACE.2),
                height: i64::from(FACE.2),
            },
        ]
    }
}

fn portrait() -> RgbImage {
    let (fx, fy, size) = FACE;
    RgbImage::from_fn(240, 200, |x, y| {
        let inside = (fx..fx + size).contains(&x) && (fy..fy + size).contains(&y);
        if inside {
            image::Rgb([200, 150, 120])
        } else {
            image::Rgb([40, 60, 160])
        }
    })
}

#[test]
fn staged_run_crops_to_the_detected_face() {
    let config = AnalysisConfig::default();
    let located = Pipeline::from_image(portrait(), config)
        .locate(Some(&StubDetector))
        .expect("region is non-empty");

    assert_eq!(located.region_source(), RegionSource::Detected);
    let bbox = located.bbox();
    assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (70, 50, 100, 100));
    assert_eq!(located.region().dimensions(), (100, 100));

    let segmented = located.normalize().segment();
    let skin = segmented.mask().pixels().filter(|p| p.0[0] == 255).count();
    assert!(skin > 9_000, "skin pixels: {skin}");

    let visualized = segmented.score().visualize();
    assert_eq!(
        visualized.visualization().dimensions(),
        (100, 100 + PANEL_HEIGHT)
    );

    let analysis = visualized.into_result();
    let s = analysis.scores.rounded();
    assert!((s.tone_uniformity - 1.0).abs() < 1e-9, "{s:?}");
    assert!(s.blemish.abs() < 1e-9, "{s:?}");
}

#[test]
fn whole_image_run_sees_the_backdrop() {
    let config = AnalysisConfig {
        auto_face: false,
        light_comp: false,
    };
    let analysis = analyze_image(&portrait(), &config, Some(&StubDetector)).unwrap();
    assert_eq!(analysis.region_source, RegionSource::WholeImage);
    assert_eq!(analysis.visualization.width(), 240);
    assert!(analysis.skin_pixels < 240 * 200);
    assert!(analysis.skin_pixels > 8_000);
}
