use crate::artifacts::ArtifactStore;
use crate::calibrate::{self, MAX_HAND_LENGTH_CM, MIN_HAND_LENGTH_CM};
use crate::config::EstimatorConfig;
use crate::depth::DepthModel;
use crate::error::VolumeError;
use crate::hand::HandDetector;
use crate::types::{EstimateRequest, HandLandmarks, Mask, VolumeEstimate};
use crate::{masks, overlay, perspective, segment, thickness, volume};
use image::{ImageBuffer, Rgb};

/// One-shot, per-image volume estimation.
///
/// Owns the two capability providers (hand landmarks, monocular depth) and
/// the tuning configuration. Everything else is created fresh per request;
/// the only cross-request state is the once-loaded model weights inside the
/// providers.
pub struct VolumePipeline {
    hand_detector: Box<dyn HandDetector>,
    depth_model: Box<dyn DepthModel>,
    config: EstimatorConfig,
    artifacts: Option<ArtifactStore>,
}

impl VolumePipeline {
    pub fn new(
        hand_detector: Box<dyn HandDetector>,
        depth_model: Box<dyn DepthModel>,
        config: EstimatorConfig,
    ) -> Self {
        let artifacts = if config.artifacts.save {
            match ArtifactStore::new(&config.artifacts.dir) {
                Ok(store) => Some(store),
                Err(e) => {
                    tracing::warn!("artifact store unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            hand_detector,
            depth_model,
            config,
            artifacts,
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate from encoded image bytes (JPEG/PNG/...).
    pub fn estimate(
        &mut self,
        image_bytes: &[u8],
        request: &EstimateRequest,
    ) -> Result<VolumeEstimate, VolumeError> {
        let frame = image::load_from_memory(image_bytes)?.to_rgb8();
        self.estimate_frame(&frame, request)
    }

    /// Estimate from an already-decoded RGB frame.
    pub fn estimate_frame(
        &mut self,
        frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
        request: &EstimateRequest,
    ) -> Result<VolumeEstimate, VolumeError> {
        validate(request)?;
        let (width, height) = frame.dimensions();

        // 1. Hand landmarks. Without a hand there is no ruler, so nothing
        // downstream runs at all.
        let hands = self
            .hand_detector
            .detect(frame)
            .map_err(VolumeError::ModelFailure)?;
        let hand = hands.first().ok_or(VolumeError::NoHandDetected)?;

        // 2. Scale calibration from the palm length
        let calibration = calibrate::calibrate(hand, width, height, request.hand_length_cm)?;
        tracing::debug!(
            palm_px = calibration.palm_pixel_length,
            scale = calibration.scale_cm_per_px,
            "calibrated"
        );

        // 3. Hand and food masks, computed independently
        let hand_mask = masks::hand_mask(hand, width, height, self.config.hull_mode);
        let food_mask = segment::segment_food(frame, &self.config.heuristics);
        let food_only = food_mask.and_not(&hand_mask);
        tracing::debug!(
            hand_px = hand_mask.count(),
            food_px = food_only.count(),
            "masks"
        );

        // A detected hand can still rasterize to nothing (all keypoints
        // collinear or off-frame). No reference region means no depth ratio.
        if hand_mask.count() == 0 {
            return Err(VolumeError::EmptyHandMask);
        }

        // 4. Relative depth, resampled to frame resolution
        let depth = self
            .depth_model
            .estimate(frame)
            .map_err(VolumeError::ModelFailure)?;

        // 5. Perspective-corrected physical area
        let correction = perspective::correct_area(
            &depth,
            &hand_mask,
            &food_only,
            calibration.scale_cm_per_px,
            &self.config.heuristics,
        )?;

        // 6. Thickness from the depth distribution inside the food region
        let thickness_cm = thickness::estimate_thickness(&depth, &food_only, &self.config.heuristics);

        // 7. Volume
        let volume_cm3 = volume::compose_volume(
            correction.area_cm2,
            thickness_cm,
            &request.dish_type,
            request.bowl_factor,
            &self.config.heuristics,
        );

        self.persist_diagnostics(frame, &food_only, &hand_mask, request);

        Ok(VolumeEstimate {
            area_cm2: correction.area_cm2,
            thickness_cm,
            volume_cm3,
            depth_ratio: correction.depth_ratio,
            perspective_factor: correction.perspective_factor,
            scale_cm_per_px: calibration.scale_cm_per_px,
            hand_pixel_length: calibration.palm_pixel_length,
            dish_type: request.dish_type.clone(),
        })
    }

    /// The frame with the hand blacked out, for an external recognizer that
    /// should not see the ruler.
    pub fn occlude_hand(
        &mut self,
        frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
    ) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>, VolumeError> {
        let hands = self
            .hand_detector
            .detect(frame)
            .map_err(VolumeError::ModelFailure)?;
        let hand = hands.first().ok_or(VolumeError::NoHandDetected)?;
        let mask = masks::hand_mask(hand, frame.width(), frame.height(), self.config.hull_mode);
        Ok(masks::occlude(frame, &mask))
    }

    /// Write the calibration annotation for a frame, returning the landmarks
    /// it was drawn from.
    pub fn annotate(
        &mut self,
        frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
        key: &str,
    ) -> Result<HandLandmarks, VolumeError> {
        let hands = self
            .hand_detector
            .detect(frame)
            .map_err(VolumeError::ModelFailure)?;
        let hand = hands.first().cloned().ok_or(VolumeError::NoHandDetected)?;
        if let Some(store) = &self.artifacts {
            let annotated = overlay::annotate_hand(frame, &hand);
            if let Err(e) = store.write_annotation(key, &annotated) {
                tracing::warn!("annotation write failed: {}", e);
            }
        }
        Ok(hand)
    }

    // Best effort: a failed write never fails the estimate
    fn persist_diagnostics(
        &self,
        frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
        food_only: &Mask,
        hand_mask: &Mask,
        request: &EstimateRequest,
    ) {
        let Some(store) = &self.artifacts else {
            return;
        };
        let key = request
            .artifact_key
            .clone()
            .unwrap_or_else(ArtifactStore::timestamp_key);

        if let Err(e) = store.write_mask(&key, food_only) {
            tracing::warn!("mask artifact write failed: {}", e);
        }
        let blended = overlay::blend_overlay(frame, food_only, hand_mask);
        if let Err(e) = store.write_overlay(&key, &blended) {
            tracing::warn!("overlay artifact write failed: {}", e);
        }
    }
}

fn validate(request: &EstimateRequest) -> Result<(), VolumeError> {
    if !request.hand_length_cm.is_finite()
        || request.hand_length_cm < MIN_HAND_LENGTH_CM
        || request.hand_length_cm > MAX_HAND_LENGTH_CM
    {
        return Err(VolumeError::InvalidRequest(format!(
            "hand_length_cm {} outside plausible range [{}, {}]",
            request.hand_length_cm, MIN_HAND_LENGTH_CM, MAX_HAND_LENGTH_CM
        )));
    }
    Ok(())
}
