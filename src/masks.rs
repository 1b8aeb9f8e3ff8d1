use crate::config::HullMode;
use crate::types::{HandLandmarks, Mask};
use image::{GrayImage, ImageBuffer, Luma, Rgb};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Rasterize the filled convex hull of the hand keypoints into an
/// image-sized binary mask.
///
/// Empty landmark sets (or degenerate hulls with fewer than three distinct
/// points) produce an all-zero mask. That is only an error for the depth
/// reference use, not for segmentation, so this never fails.
pub fn hand_mask(landmarks: &HandLandmarks, width: u32, height: u32, mode: HullMode) -> Mask {
    let pts = landmarks.to_pixels(width, height);
    let selected: Vec<(f32, f32)> = match mode {
        HullMode::All => pts,
        HullMode::Knuckles => HandLandmarks::KNUCKLES
            .iter()
            .filter_map(|&i| pts.get(i).copied())
            .collect(),
    };

    let mut hull_input: Vec<Point<i32>> = selected
        .iter()
        .map(|&(x, y)| {
            Point::new(
                (x.round() as i32).clamp(0, width as i32 - 1),
                (y.round() as i32).clamp(0, height as i32 - 1),
            )
        })
        .collect();
    hull_input.sort_by_key(|p| (p.x, p.y));
    hull_input.dedup();

    if hull_input.len() < 3 {
        return Mask::empty(width, height);
    }

    let hull = imageproc::geometry::convex_hull(hull_input);
    if hull.len() < 3 || polygon_area2(&hull) == 0 {
        // All points collinear
        return Mask::empty(width, height);
    }

    let mut canvas: GrayImage = GrayImage::new(width, height);
    draw_polygon_mut(&mut canvas, &hull, Luma([1u8]));

    Mask::from_raw(width, height, canvas.into_raw())
}

// Twice the signed shoelace area; zero for degenerate polygons
fn polygon_area2(poly: &[Point<i32>]) -> i64 {
    let mut acc: i64 = 0;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        acc += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    acc.abs()
}

/// Black out hand pixels, hiding the physical ruler from a downstream
/// recognizer that should only see the food.
pub fn occlude(
    frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
    mask: &Mask,
) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    let mut out = frame.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if mask.get(x, y) {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    out
}
