use serde::{Deserialize, Serialize};

/// A single 2D point in normalized image coordinates ([0,1] x [0,1]).
#[derive(Debug, Clone, Copy, Default)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

/// One detected hand: 21 ordered keypoints in normalized image coordinates.
/// Index semantics follow the landmark model (0 = wrist, 12 = middle fingertip).
#[derive(Debug, Clone, Default)]
pub struct HandLandmarks {
    pub points: Vec<Point2D>,
}

impl HandLandmarks {
    pub const WRIST: usize = 0;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    /// Wrist plus the four finger-base knuckles (MCP joints).
    pub const KNUCKLES: [usize; 5] = [0, 5, 9, 13, 17];

    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Project all keypoints onto a width x height pixel grid.
    pub fn to_pixels(&self, width: u32, height: u32) -> Vec<(f32, f32)> {
        self.points
            .iter()
            .map(|p| (p.x * width as f32, p.y * height as f32))
            .collect()
    }
}

/// Binary occupancy grid over the image's pixel grid. 1 = occupied.
#[derive(Debug, Clone)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self { width, height, data }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        self.data[(y * self.width + x) as usize] = on as u8;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of occupied pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Set difference: pixels in `self` that are not in `other`.
    /// This is how food-only pixels are derived; the food mask itself is
    /// never computed from the hand mask.
    pub fn and_not(&self, other: &Mask) -> Mask {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| (a != 0 && b == 0) as u8)
            .collect();
        Mask {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Dense per-pixel relative depth, same resolution as the source image.
/// Smaller values are closer to the camera. Absolute values carry no unit;
/// only differences and ratios within the same map are meaningful.
#[derive(Debug, Clone)]
pub struct DepthMap {
    pub width: u32,
    pub height: u32,
    data: Vec<f32>,
}

impl DepthMap {
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self { width, height, data }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Min-max rescale to [0, scale]. A degenerate range (flat map) rescales
    /// to all zeros instead of dividing by zero; downstream consumers treat
    /// zero means as "no usable depth signal".
    pub fn normalized(&self, scale: f32) -> DepthMap {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in &self.data {
            min = min.min(v);
            max = max.max(v);
        }
        let range = max - min;
        let data = if range <= f32::EPSILON {
            vec![0.0; self.data.len()]
        } else {
            self.data.iter().map(|&v| (v - min) / range * scale).collect()
        };
        DepthMap {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Mean over the whole map.
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }

    /// Mean over occupied mask pixels. None when the mask is empty.
    pub fn mean_over(&self, mask: &Mask) -> Option<f32> {
        let mut sum = 0.0;
        let mut n = 0usize;
        for (v, m) in self.data.iter().zip(mask.data()) {
            if *m != 0 {
                sum += v;
                n += 1;
            }
        }
        if n == 0 {
            None
        } else {
            Some(sum / n as f32)
        }
    }

    /// Median over occupied mask pixels. None when the mask is empty.
    pub fn median_over(&self, mask: &Mask) -> Option<f32> {
        let mut vals: Vec<f32> = self
            .data
            .iter()
            .zip(mask.data())
            .filter(|(_, m)| **m != 0)
            .map(|(v, _)| *v)
            .collect();
        if vals.is_empty() {
            return None;
        }
        vals.sort_by(|a, b| a.total_cmp(b));
        Some(vals[vals.len() / 2])
    }
}

/// One volume-estimation request. The transport envelope lives outside this
/// crate; this is the validated core input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub hand_length_cm: f32,
    #[serde(default = "default_bowl_factor")]
    pub bowl_factor: f32,
    #[serde(default = "default_dish_type")]
    pub dish_type: String,
    /// Overrides the timestamp-derived artifact key when set.
    #[serde(default)]
    pub artifact_key: Option<String>,
}

fn default_bowl_factor() -> f32 {
    0.55
}

fn default_dish_type() -> String {
    "bowl".to_string()
}

impl EstimateRequest {
    pub fn new(hand_length_cm: f32) -> Self {
        Self {
            hand_length_cm,
            bowl_factor: default_bowl_factor(),
            dish_type: default_dish_type(),
            artifact_key: None,
        }
    }
}

/// Terminal output record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeEstimate {
    pub area_cm2: f32,
    pub thickness_cm: f32,
    pub volume_cm3: f32,
    pub depth_ratio: f32,
    pub perspective_factor: f32,
    pub scale_cm_per_px: f32,
    pub hand_pixel_length: f32,
    pub dish_type: String,
}
