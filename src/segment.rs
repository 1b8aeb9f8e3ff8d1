use crate::config::Heuristics;
use crate::types::Mask;
use image::{ImageBuffer, Rgb};

/// Seed-free foreground segmentation: a rectangle inset from each border
/// seeds the foreground model, the border band seeds the background model,
/// and pixel assignments are refined for a fixed number of rounds.
///
/// The border band stays background throughout (the food is assumed roughly
/// centered with table/background at the edges). Foreground = 1. An empty
/// result is legal; downstream treats it as zero area, not an error.
pub fn segment_food(frame: &ImageBuffer<Rgb<u8>, Vec<u8>>, heuristics: &Heuristics) -> Mask {
    let (width, height) = frame.dimensions();
    let margin_x = ((width as f32 * heuristics.seed_inset) as u32).min(width / 2);
    let margin_y = ((height as f32 * heuristics.seed_inset) as u32).min(height / 2);

    let inside_seed = |x: u32, y: u32| {
        x >= margin_x && x < width - margin_x && y >= margin_y && y < height - margin_y
    };

    // Cap model-fitting work on large frames; assignment still visits every pixel
    let total = (width * height) as usize;
    let stride = (total / 20_000).max(1);

    let k = heuristics.color_clusters.max(1);

    // Initial assignment: the seed rectangle is (probable) foreground
    let mut labels = vec![0u8; total];
    for y in 0..height {
        for x in 0..width {
            if inside_seed(x, y) {
                labels[(y * width + x) as usize] = 1;
            }
        }
    }

    for round in 0..heuristics.refine_iterations {
        let mut fg_samples = Vec::new();
        let mut bg_samples = Vec::new();
        for (i, pixel) in frame.pixels().enumerate() {
            if i % stride != 0 {
                continue;
            }
            let color = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];
            if labels[i] != 0 {
                fg_samples.push(color);
            } else {
                bg_samples.push(color);
            }
        }
        if fg_samples.is_empty() || bg_samples.is_empty() {
            tracing::debug!(round, "segmentation converged to a single class");
            break;
        }

        let fg_centers = kmeans(&fg_samples, k);
        let bg_centers = kmeans(&bg_samples, k);

        // Reassign interior pixels by nearest color model; the band is pinned.
        // Ties go to background: a pixel both models explain equally well is
        // table showing through the seed rectangle, not food.
        for y in 0..height {
            for x in 0..width {
                if !inside_seed(x, y) {
                    continue;
                }
                let p = frame.get_pixel(x, y);
                let color = [p[0] as f32, p[1] as f32, p[2] as f32];
                let fg_d = nearest_dist2(&color, &fg_centers);
                let bg_d = nearest_dist2(&color, &bg_centers);
                labels[(y * width + x) as usize] = (fg_d < bg_d) as u8;
            }
        }
    }

    Mask::from_raw(width, height, labels)
}

/// Lloyd's algorithm with deterministic quantile initialization (no RNG, so
/// identical frames segment identically).
fn kmeans(samples: &[[f32; 3]], k: usize) -> Vec<[f32; 3]> {
    let k = k.min(samples.len());

    // Seed centers at luminance quantiles
    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.sort_by(|&a, &b| luminance(&samples[a]).total_cmp(&luminance(&samples[b])));
    let mut centers: Vec<[f32; 3]> = (0..k)
        .map(|i| samples[order[i * samples.len() / k + samples.len() / (2 * k)]])
        .collect();

    let mut assignment = vec![0usize; samples.len()];
    for _ in 0..10 {
        let mut changed = false;
        for (i, s) in samples.iter().enumerate() {
            let mut best = 0;
            let mut best_d = f32::INFINITY;
            for (j, c) in centers.iter().enumerate() {
                let d = dist2(s, c);
                if d < best_d {
                    best_d = d;
                    best = j;
                }
            }
            if assignment[i] != best {
                assignment[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![[0.0f32; 3]; k];
        let mut counts = vec![0usize; k];
        for (i, s) in samples.iter().enumerate() {
            let j = assignment[i];
            for c in 0..3 {
                sums[j][c] += s[c];
            }
            counts[j] += 1;
        }
        for j in 0..k {
            if counts[j] > 0 {
                for c in 0..3 {
                    centers[j][c] = sums[j][c] / counts[j] as f32;
                }
            }
        }
    }

    centers
}

fn luminance(c: &[f32; 3]) -> f32 {
    0.299 * c[0] + 0.587 * c[1] + 0.114 * c[2]
}

fn dist2(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

fn nearest_dist2(color: &[f32; 3], centers: &[[f32; 3]]) -> f32 {
    centers
        .iter()
        .map(|c| dist2(color, c))
        .fold(f32::INFINITY, f32::min)
}
