use crate::config::Heuristics;
use crate::error::VolumeError;
use crate::types::{DepthMap, Mask};

/// Result of the perspective-corrected area computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaCorrection {
    pub depth_ratio: f32,
    pub perspective_factor: f32,
    pub corrected_pixel_area: f32,
    pub area_cm2: f32,
}

/// Correct the food's raw pixel area for distance-to-camera differences and
/// convert it to physical area.
///
/// The hand region anchors the depth comparison: objects nearer the camera
/// than the hand subtend a larger pixel area for the same physical size, so
/// their raw area is shrunk super-linearly before the cm conversion. The
/// exponent is an empirical dampening constant (see `Heuristics`), not a law
/// of camera geometry.
///
/// Fails with `EmptyHandMask` when the hand mask covers zero pixels; without
/// a reference region the depth ratio is undefined. An empty food mask is
/// not an error: area is zero and the ratio degrades to 1.0.
pub fn correct_area(
    depth: &DepthMap,
    hand_mask: &Mask,
    food_only: &Mask,
    scale_cm_per_px: f32,
    heuristics: &Heuristics,
) -> Result<AreaCorrection, VolumeError> {
    if hand_mask.count() == 0 {
        return Err(VolumeError::EmptyHandMask);
    }

    let food_px = food_only.count();
    if food_px == 0 {
        return Ok(AreaCorrection {
            depth_ratio: 1.0,
            perspective_factor: 1.0,
            corrected_pixel_area: 0.0,
            area_cm2: 0.0,
        });
    }

    let depth_norm = depth.normalized(heuristics.depth_scale);
    let hand_depth = depth_norm.mean_over(hand_mask).unwrap_or(0.0);
    let food_depth = depth_norm.mean_over(food_only).unwrap_or(0.0);

    let mut perspective_factor = 1.0;
    let mut depth_ratio = if hand_depth > 0.0 {
        let mut ratio = food_depth / hand_depth;
        if food_depth < hand_depth {
            // Food is nearer than the hand reference: shrink harder
            perspective_factor = (food_depth / hand_depth).powf(heuristics.perspective_exponent);
            ratio *= perspective_factor;
        }
        ratio
    } else {
        // Flat or degenerate depth signal: no correction possible
        1.0
    };

    if !depth_ratio.is_finite() {
        depth_ratio = 1.0;
    }

    let corrected_pixel_area = food_px as f32 * depth_ratio;
    let area_cm2 = corrected_pixel_area * scale_cm_per_px * scale_cm_per_px;

    tracing::debug!(
        hand_depth,
        food_depth,
        depth_ratio,
        perspective_factor,
        area_cm2,
        "perspective correction"
    );

    Ok(AreaCorrection {
        depth_ratio,
        perspective_factor,
        corrected_pixel_area,
        area_cm2,
    })
}
