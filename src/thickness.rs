use crate::config::Heuristics;
use crate::types::{DepthMap, Mask};

/// Approximate physical thickness of the food from the depth distribution
/// inside the food mask.
///
/// Depth is re-normalized locally from the raw map. The median over the food
/// region is discounted by a fixed oblique-view cosine and by a distance
/// factor that shrinks the estimate when the food sits nearer the camera
/// than the scene average. The result is floored so a flat depth profile
/// never yields a zero or negative thickness.
///
/// An empty food mask short-circuits to the configured fallback thickness
/// without touching any depth statistics.
pub fn estimate_thickness(depth: &DepthMap, food_mask: &Mask, heuristics: &Heuristics) -> f32 {
    if food_mask.count() == 0 {
        return heuristics.empty_mask_thickness_cm;
    }

    let depth_norm = depth.normalized(heuristics.depth_scale);

    let food_depth_mean = depth_norm.mean_over(food_mask).unwrap_or(0.0);
    let scene_depth_mean = depth_norm.mean();

    let distance_factor = if scene_depth_mean > 0.0 {
        (food_depth_mean / scene_depth_mean).min(1.0)
    } else {
        1.0
    };

    let median = depth_norm.median_over(food_mask).unwrap_or(0.0);
    let thickness = median * heuristics.oblique_cos * distance_factor;

    tracing::debug!(
        food_depth_mean,
        scene_depth_mean,
        distance_factor,
        median,
        thickness,
        "thickness estimate"
    );

    thickness.max(heuristics.thickness_floor_cm)
}
