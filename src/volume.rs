use crate::config::Heuristics;

/// Caller-tunable fill fraction bounds for the container.
pub const MIN_BOWL_FACTOR: f32 = 0.3;
pub const MAX_BOWL_FACTOR: f32 = 1.0;

/// Combine corrected area, thickness, and the container shape into a volume.
///
/// Only `"bowl"` changes the formula: a hemispherical bowl profile fills
/// about 2/3 of the bounding prism, plates use the prism directly. The bowl
/// factor is the caller's estimate of how full the container is, clamped to
/// its plausible range.
pub fn compose_volume(
    area_cm2: f32,
    thickness_cm: f32,
    dish_type: &str,
    bowl_factor: f32,
    heuristics: &Heuristics,
) -> f32 {
    let bowl_factor = bowl_factor.clamp(MIN_BOWL_FACTOR, MAX_BOWL_FACTOR);
    if dish_type == "bowl" {
        area_cm2 * thickness_cm * heuristics.bowl_profile * bowl_factor
    } else {
        area_cm2 * thickness_cm * bowl_factor
    }
}
