use crate::types::{HandLandmarks, Point2D};
use anyhow::Result;
use image::{imageops::FilterType, ImageBuffer, Rgb};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

/// Capability seam for hand-landmark detection. Returns zero or more hands;
/// the pipeline only consumes the first one.
pub trait HandDetector {
    fn detect(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Vec<HandLandmarks>>;
}

/// A 21-keypoint hand landmark model (MediaPipe-style) behind an ONNX session.
///
/// Input contract: [1, 224, 224, 3] float RGB in [0, 1]. Outputs: index 0 is
/// the 63-float landmark tensor (x, y, z triplets in input-pixel units),
/// index 1 is the hand presence score.
pub struct OnnxHandDetector {
    session: Session,
    score_threshold: f32,
}

const INPUT_SIZE: u32 = 224;
const NUM_LANDMARKS: usize = 21;

impl OnnxHandDetector {
    pub fn new(model_path: &str) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])?
            .commit_from_file(model_path)?;

        Ok(Self {
            session,
            score_threshold: 0.5,
        })
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Vec<HandLandmarks>> {
        // 1. Preprocess: resize to 224x224, NHWC, pixels scaled to [0, 1]
        let resized = image::imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        let mut input_data = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * 3) as usize);
        for y in 0..INPUT_SIZE {
            for x in 0..INPUT_SIZE {
                let p = resized.get_pixel(x, y);
                input_data.push(p[0] as f32 / 255.0);
                input_data.push(p[1] as f32 / 255.0);
                input_data.push(p[2] as f32 / 255.0);
            }
        }

        let shape = vec![1, INPUT_SIZE as i64, INPUT_SIZE as i64, 3];
        let input = Tensor::from_array((shape, input_data))?;
        let outputs = self.session.run(ort::inputs![input])?;

        // 2. Presence gate
        let (_score_shape, score_data) = outputs[1].try_extract_tensor::<f32>()?;
        let score = score_data.first().copied().unwrap_or(0.0);
        if score < self.score_threshold {
            return Ok(Vec::new());
        }

        // 3. Landmarks: 21 (x, y, z) triplets in 224-pixel units
        let (_lm_shape, lm_data) = outputs[0].try_extract_tensor::<f32>()?;
        if lm_data.len() < NUM_LANDMARKS * 3 {
            anyhow::bail!(
                "landmark tensor too small: {} values, expected {}",
                lm_data.len(),
                NUM_LANDMARKS * 3
            );
        }

        let mut points = Vec::with_capacity(NUM_LANDMARKS);
        for i in 0..NUM_LANDMARKS {
            points.push(Point2D {
                x: lm_data[i * 3] / INPUT_SIZE as f32,
                y: lm_data[i * 3 + 1] / INPUT_SIZE as f32,
            });
        }

        tracing::debug!(score, "hand detected");
        Ok(vec![HandLandmarks::new(points)])
    }
}
