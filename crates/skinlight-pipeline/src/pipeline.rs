//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use skinlight_pipeline::{AnalysisConfig, Pipeline, PipelineError};
//! # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
//! let analysis = Pipeline::new(png, AnalysisConfig::default())
//!     .decode()?
//!     .locate(None)?
//!     .normalize()
//!     .segment()
//!     .score()
//!     .visualize()
//!     .into_result();
//! println!("redness = {:.3}", analysis.scores.redness);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying the intermediates later
//! stages need. Only the analysed region is kept after [`Located`]; the
//! full decoded image is dropped there.

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::diagnostics::StageMetrics;
use crate::face::FaceDetector;
use crate::indices::IndexOutput;
use crate::types::{
    Analysis, AnalysisConfig, BoundingBox, Dimensions, PipelineError, RegionSource,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`decode`](Self::decode) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .decode() to continue"]
pub struct Pending {
    config: AnalysisConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source image bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Decode the source image and advance to the [`Decoded`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if the source bytes are
    /// empty. Returns [`PipelineError::ImageDecode`] if the image
    /// format is unrecognized or the data is corrupt.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        let source_len = self.source.len();
        let original = crate::decode::decode(&self.source)?;
        Ok(Decoded {
            config: self.config,
            original,
            source_len,
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding the source image.
///
/// Call [`locate`](Self::locate) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .locate() to continue"]
pub struct Decoded {
    config: AnalysisConfig,
    original: RgbImage,
    source_len: usize,
}

impl Decoded {
    /// The decoded RGB image.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// Choose the region to analyse and advance to the [`Located`] stage.
    ///
    /// With `auto_face` disabled the whole image is the region and
    /// `detector` is ignored. Otherwise the largest detected face is
    /// used, or the centred fallback box when nothing is found.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyRegion`] if the chosen region has
    /// no pixels (a zero-sized image, or one too small for the fallback
    /// box to cover a whole pixel).
    pub fn locate(self, detector: Option<&dyn FaceDetector>) -> Result<Located, PipelineError> {
        let dimensions = Dimensions::of(&self.original);
        let (bbox, region_source) = if self.config.auto_face {
            crate::face::locate_face(&self.original, detector)
        } else {
            (BoundingBox::full(dimensions), RegionSource::WholeImage)
        };

        if bbox.area() == 0 {
            return Err(PipelineError::EmptyRegion {
                width: bbox.width,
                height: bbox.height,
            });
        }

        debug!(?bbox, ?region_source, "analysis region chosen");
        let region = crate::face::crop(&self.original, bbox);
        Ok(Located {
            config: self.config,
            image_dimensions: dimensions,
            bbox,
            region_source,
            region,
        })
    }
}

// ───────────────────────── Stage 2: Located ──────────────────────────

/// Pipeline state after choosing and cropping the analysis region.
///
/// Call [`normalize`](Self::normalize) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .normalize() to continue"]
pub struct Located {
    config: AnalysisConfig,
    image_dimensions: Dimensions,
    bbox: BoundingBox,
    region_source: RegionSource,
    region: RgbImage,
}

impl Located {
    /// The region's position in the source image.
    #[must_use]
    pub const fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// How the region was chosen.
    #[must_use]
    pub const fn region_source(&self) -> RegionSource {
        self.region_source
    }

    /// The cropped region.
    #[must_use]
    pub const fn region(&self) -> &RgbImage {
        &self.region
    }

    /// Equalize the region's brightness when `light_comp` is enabled and
    /// advance to the [`Normalized`] stage. A pass-through otherwise.
    pub fn normalize(self) -> Normalized {
        let applied = self.config.light_comp;
        let region = if applied {
            crate::light::normalize_light(&self.region)
        } else {
            self.region
        };
        Normalized {
            image_dimensions: self.image_dimensions,
            bbox: self.bbox,
            region_source: self.region_source,
            region,
            applied,
        }
    }
}

// ───────────────────────── Stage 3: Normalized ───────────────────────

/// Pipeline state after the optional brightness equalization.
///
/// Call [`segment`](Self::segment) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .segment() to continue"]
pub struct Normalized {
    image_dimensions: Dimensions,
    bbox: BoundingBox,
    region_source: RegionSource,
    region: RgbImage,
    applied: bool,
}

impl Normalized {
    /// The region as it enters segmentation.
    #[must_use]
    pub const fn region(&self) -> &RgbImage {
        &self.region
    }

    /// Whether equalization was actually applied.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Classify skin pixels and advance to the [`Segmented`] stage.
    pub fn segment(self) -> Segmented {
        let mask = crate::segment::segment_skin(&self.region);
        Segmented {
            image_dimensions: self.image_dimensions,
            bbox: self.bbox,
            region_source: self.region_source,
            region: self.region,
            mask,
        }
    }
}

// ───────────────────────── Stage 4: Segmented ────────────────────────

/// Pipeline state after skin segmentation.
///
/// Call [`score`](Self::score) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .score() to continue"]
pub struct Segmented {
    image_dimensions: Dimensions,
    bbox: BoundingBox,
    region_source: RegionSource,
    region: RgbImage,
    mask: GrayImage,
}

impl Segmented {
    /// The cleaned skin mask (255 = skin).
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Compute the three indices and advance to the [`Scored`] stage.
    pub fn score(self) -> Scored {
        let indices = crate::indices::compute_indices(&self.region, &self.mask);
        Scored {
            image_dimensions: self.image_dimensions,
            bbox: self.bbox,
            region_source: self.region_source,
            region: self.region,
            mask: self.mask,
            indices,
        }
    }
}

// ───────────────────────── Stage 5: Scored ───────────────────────────

/// Pipeline state after index computation.
///
/// Call [`visualize`](Self::visualize) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing — call .visualize() to continue"]
pub struct Scored {
    image_dimensions: Dimensions,
    bbox: BoundingBox,
    region_source: RegionSource,
    region: RgbImage,
    mask: GrayImage,
    indices: IndexOutput,
}

impl Scored {
    /// Scores and sample statistics.
    #[must_use]
    pub const fn indices(&self) -> &IndexOutput {
        &self.indices
    }

    /// Render the heatmap overlay and gauge panel and advance to the
    /// [`Visualized`] stage.
    pub fn visualize(self) -> Visualized {
        let visualization = crate::visualize::render(
            &self.region,
            &self.mask,
            &self.indices.redness_map,
            &self.indices.scores,
        );
        Visualized {
            image_dimensions: self.image_dimensions,
            bbox: self.bbox,
            region_source: self.region_source,
            indices: self.indices,
            visualization,
        }
    }
}

// ───────────────────────── Stage 6: Visualized ───────────────────────

/// Final pipeline state.
///
/// Call [`into_result`](Self::into_result) to collect the [`Analysis`].
#[must_use = "call .into_result() to collect the analysis"]
pub struct Visualized {
    image_dimensions: Dimensions,
    bbox: BoundingBox,
    region_source: RegionSource,
    indices: IndexOutput,
    visualization: RgbImage,
}

impl Visualized {
    /// The rendered visualization.
    #[must_use]
    pub const fn visualization(&self) -> &RgbImage {
        &self.visualization
    }

    /// Dimensions of the source image.
    #[must_use]
    pub const fn image_dimensions(&self) -> Dimensions {
        self.image_dimensions
    }

    /// Consume the pipeline and return the analysis.
    #[must_use]
    pub fn into_result(self) -> Analysis {
        Analysis {
            scores: self.indices.scores,
            visualization: self.visualization,
            region: self.bbox,
            region_source: self.region_source,
            skin_pixels: self.indices.skin_pixels,
            sample_fallback: self.indices.sample_fallback,
        }
    }
}

// ───────────────────────── Stage metadata ────────────────────────────

/// Implemented by every stage after [`Pending`], giving diagnostics a
/// uniform view of the work done to reach that state.
pub trait PipelineStage {
    /// Human-readable stage name (e.g. `"segment"`).
    const NAME: &str;

    /// Zero-based stage index (`1` for Decoded through `6` for
    /// Visualized).
    const INDEX: usize;

    /// Metrics describing the work done to reach this stage.
    fn metrics(&self) -> StageMetrics;
}

impl PipelineStage for Decoded {
    const NAME: &str = "decode";
    const INDEX: usize = 1;

    fn metrics(&self) -> StageMetrics {
        let dimensions = Dimensions::of(&self.original);
        StageMetrics::Decode {
            input_bytes: self.source_len,
            width: dimensions.width,
            height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
        }
    }
}

impl PipelineStage for Located {
    const NAME: &str = "locate";
    const INDEX: usize = 2;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Locate {
            source: self.region_source,
            region: self.bbox,
            coverage: ratio(self.bbox.area(), self.image_dimensions.pixel_count()),
        }
    }
}

impl PipelineStage for Normalized {
    const NAME: &str = "normalize";
    const INDEX: usize = 3;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Normalize {
            tile_grid: crate::light::TILE_GRID,
            clip_limit: crate::light::CLIP_LIMIT,
        }
    }
}

impl PipelineStage for Segmented {
    const NAME: &str = "segment";
    const INDEX: usize = 4;

    fn metrics(&self) -> StageMetrics {
        let total = Dimensions::of(&self.mask).pixel_count();
        let skin = crate::segment::count_skin(&self.mask);
        StageMetrics::Segment {
            skin_pixel_count: skin,
            total_pixel_count: total,
        }
    }
}

impl PipelineStage for Scored {
    const NAME: &str = "score";
    const INDEX: usize = 5;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Score {
            scores: self.indices.scores,
            sample_fallback: self.indices.sample_fallback,
        }
    }
}

impl PipelineStage for Visualized {
    const NAME: &str = "visualize";
    const INDEX: usize = 6;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Visualize {
            width: self.visualization.width(),
            height: self.visualization.height(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

// ───────────────────────── Entry point ───────────────────────────────

/// Entry point for the staged pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline from encoded image bytes.
    ///
    /// No processing is performed; the bytes and config are simply
    /// stored until [`Pending::decode`] is called.
    pub const fn new(image_bytes: Vec<u8>, config: AnalysisConfig) -> Pending {
        Pending {
            config,
            source: image_bytes,
        }
    }

    /// Start a pipeline from an already decoded image, skipping the
    /// decode stage.
    pub const fn from_image(image: RgbImage, config: AnalysisConfig) -> Decoded {
        Decoded {
            config,
            original: image,
            source_len: 0,
        }
    }
}
