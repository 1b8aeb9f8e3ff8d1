use crate::error::VolumeError;
use crate::types::HandLandmarks;

/// Plausibility bounds for the caller-supplied hand length.
pub const MIN_HAND_LENGTH_CM: f32 = 15.0;
pub const MAX_HAND_LENGTH_CM: f32 = 25.0;

// Below this the palm is numerically a point and the scale would blow up.
const MIN_PALM_PX: f32 = 1e-3;

/// The per-image physical ruler: palm length on the pixel grid and the
/// derived cm-per-pixel scale.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub palm_pixel_length: f32,
    pub scale_cm_per_px: f32,
}

/// Derive the scale factor from the wrist and middle-fingertip keypoints.
///
/// Fails with `NoHandDetected` when the landmark set is unusable (missing
/// keypoints or a degenerate palm length); the caller must reject the
/// request rather than divide by zero.
pub fn calibrate(
    landmarks: &HandLandmarks,
    width: u32,
    height: u32,
    hand_length_cm: f32,
) -> Result<Calibration, VolumeError> {
    let pts = landmarks.to_pixels(width, height);
    let wrist = pts.get(HandLandmarks::WRIST).ok_or(VolumeError::NoHandDetected)?;
    let tip = pts
        .get(HandLandmarks::MIDDLE_FINGER_TIP)
        .ok_or(VolumeError::NoHandDetected)?;

    let palm_pixel_length = ((tip.0 - wrist.0).powi(2) + (tip.1 - wrist.1).powi(2)).sqrt();
    if palm_pixel_length < MIN_PALM_PX {
        return Err(VolumeError::NoHandDetected);
    }

    Ok(Calibration {
        palm_pixel_length,
        scale_cm_per_px: hand_length_cm / palm_pixel_length,
    })
}
