//! Advisory image quality checks
//!
//! The result is attached to the submission for display and never blocks
//! finalizing it.

use crate::types::{ImagePayload, QualityAssessment};
use async_trait::async_trait;
use image::GrayImage;
use tracing::debug;

/// Message shown for a usable photo
pub const ACCEPTABLE_MESSAGE: &str = "Image is clear and valid";
/// Message shown when the photo should probably be retaken
pub const RETAKE_MESSAGE: &str = "Image may be blurry or missing cable, consider retaking";

/// Checks a captured photo
#[async_trait]
pub trait QualityChecker: Send + Sync {
    /// Assess the photo; never fails, an unusable photo is just not acceptable
    async fn check(&self, image: &ImagePayload) -> QualityAssessment;
}

/// Local checker based on resolution and edge energy
///
/// A photo is flagged when it is smaller than the minimum dimensions or
/// when the mean gradient between neighbouring pixels is below the
/// sharpness threshold (blank, blurred, or covered lens).
#[derive(Debug, Clone)]
pub struct HeuristicQualityChecker {
    /// Minimum width in pixels
    pub min_width: u32,
    /// Minimum height in pixels
    pub min_height: u32,
    /// Minimum mean absolute gradient on the 0-255 luma scale
    pub min_sharpness: f64,
}

impl Default for HeuristicQualityChecker {
    fn default() -> Self {
        Self {
            min_width: 320,
            min_height: 240,
            min_sharpness: 2.0,
        }
    }
}

/// Longest edge the image is scaled to before measuring sharpness
const ANALYSIS_EDGE: u32 = 512;

impl HeuristicQualityChecker {
    fn assess(&self, bytes: &[u8]) -> QualityAssessment {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                debug!("quality check could not decode photo: {e}");
                return QualityAssessment {
                    acceptable: false,
                    message: "Image could not be read, consider retaking".to_string(),
                };
            }
        };

        if image.width() < self.min_width || image.height() < self.min_height {
            return QualityAssessment {
                acceptable: false,
                message: format!(
                    "Image is too small ({}x{}), consider retaking",
                    image.width(),
                    image.height()
                ),
            };
        }

        let luma = image.thumbnail(ANALYSIS_EDGE, ANALYSIS_EDGE).to_luma8();
        let sharpness = mean_gradient(&luma);
        debug!(sharpness, "quality check measured sharpness");

        if sharpness < self.min_sharpness {
            QualityAssessment {
                acceptable: false,
                message: RETAKE_MESSAGE.to_string(),
            }
        } else {
            QualityAssessment {
                acceptable: true,
                message: ACCEPTABLE_MESSAGE.to_string(),
            }
        }
    }
}

#[async_trait]
impl QualityChecker for HeuristicQualityChecker {
    async fn check(&self, image: &ImagePayload) -> QualityAssessment {
        let checker = self.clone();
        let bytes = image.bytes().to_vec();
        match tokio::task::spawn_blocking(move || checker.assess(&bytes)).await {
            Ok(assessment) => assessment,
            Err(e) => QualityAssessment {
                acceptable: false,
                message: format!("Quality check did not complete: {e}"),
            },
        }
    }
}

fn mean_gradient(luma: &GrayImage) -> f64 {
    let (width, height) = luma.dimensions();
    let mut total: u64 = 0;
    let mut samples: u64 = 0;

    for y in 0..height {
        for x in 0..width {
            let here = i32::from(luma.get_pixel(x, y)[0]);
            if x + 1 < width {
                total += u64::from((here - i32::from(luma.get_pixel(x + 1, y)[0])).unsigned_abs());
                samples += 1;
            }
            if y + 1 < height {
                total += u64::from((here - i32::from(luma.get_pixel(x, y + 1)[0])).unsigned_abs());
                samples += 1;
            }
        }
    }

    if samples == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = total as f64 / samples as f64;
    mean
}
