use crate::types::{HandLandmarks, Mask};
use image::{ImageBuffer, Rgb};
use imageproc::drawing::draw_line_segment_mut;

// Blend weight of the highlight layer in the diagnostic overlay
const HIGHLIGHT_ALPHA: f32 = 0.4;

const FOOD_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const HAND_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Alpha-blended diagnostic overlay: food pixels highlighted green, hand
/// pixels red, blended over the source frame.
pub fn blend_overlay(
    frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
    food_only: &Mask,
    hand_mask: &Mask,
) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    let mut out = frame.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let highlight = if food_only.get(x, y) {
            Some(FOOD_COLOR)
        } else if hand_mask.get(x, y) {
            Some(HAND_COLOR)
        } else {
            None
        };
        if let Some(color) = highlight {
            for c in 0..3 {
                pixel[c] = (pixel[c] as f32 * (1.0 - HIGHLIGHT_ALPHA)
                    + color[c] as f32 * HIGHLIGHT_ALPHA) as u8;
            }
        }
    }
    out
}

/// Hand-calibration annotation: the wrist to middle-fingertip segment used
/// as the ruler (green) and the hand's horizontal pixel extent (red).
pub fn annotate_hand(
    frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
    landmarks: &HandLandmarks,
) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    let mut out = frame.clone();
    let pts = landmarks.to_pixels(frame.width(), frame.height());
    if pts.len() <= HandLandmarks::MIDDLE_FINGER_TIP {
        return out;
    }

    let wrist = pts[HandLandmarks::WRIST];
    let tip = pts[HandLandmarks::MIDDLE_FINGER_TIP];
    draw_line_segment_mut(&mut out, wrist, tip, FOOD_COLOR);

    // Width at the wrist's height, between the extreme keypoint columns
    let min_x = pts.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
    let max_x = pts.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
    draw_line_segment_mut(&mut out, (min_x, wrist.1), (max_x, wrist.1), HAND_COLOR);

    out
}
