use crate::types::DepthMap;
use anyhow::{Context, Result};
use image::{imageops::FilterType, ImageBuffer, Luma, Rgb};
use ort::session::{builder::GraphOptimizationLevel, RunOptions, Session};
use ort::value::Tensor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Capability seam for monocular relative depth. The returned map must match
/// the input frame's resolution exactly, with smaller values closer to the
/// camera. Deterministic for a fixed frame and fixed weights.
pub trait DepthModel {
    fn estimate(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<DepthMap>;
}

/// MiDaS-style relative depth model behind an ONNX session.
///
/// The session is built once (cold-start cost) and reused across requests.
/// Output is bicubic-resampled to the frame's height and width, per the
/// resolution-matching guarantee of the depth contract. The loaded weights
/// must follow the smaller-is-closer convention; a model emitting inverse
/// depth would need flipping at this seam.
pub struct OnnxDepthModel {
    session: Session,
    timeout: Duration,
}

const INPUT_SIZE: u32 = 256;

// ImageNet normalization, what MiDaS was trained with
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

impl OnnxDepthModel {
    pub fn new(model_path: &str, timeout: Duration) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])?
            .commit_from_file(model_path)?;

        Ok(Self { session, timeout })
    }
}

impl DepthModel for OnnxDepthModel {
    fn estimate(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<DepthMap> {
        // 1. Preprocess: 256x256, NCHW, ImageNet mean/std
        let resized = image::imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let mut input_data = Vec::with_capacity((3 * INPUT_SIZE * INPUT_SIZE) as usize);
        for c in 0..3usize {
            for y in 0..INPUT_SIZE {
                for x in 0..INPUT_SIZE {
                    let p = resized.get_pixel(x, y)[c] as f32 / 255.0;
                    input_data.push((p - MEAN[c]) / STD[c]);
                }
            }
        }

        let shape = vec![1, 3, INPUT_SIZE as i64, INPUT_SIZE as i64];
        let input = Tensor::from_array((shape, input_data))?;

        // 2. Run under the inference budget. A watchdog thread terminates the
        // session run if the budget is exceeded; the channel wakes it early
        // on normal completion so it never outlives the call by long.
        let run_options = Arc::new(RunOptions::new()?);
        let timed_out = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let watchdog = {
            let opts = run_options.clone();
            let flag = timed_out.clone();
            let budget = self.timeout;
            std::thread::spawn(move || {
                if done_rx.recv_timeout(budget).is_err() {
                    flag.store(true, Ordering::SeqCst);
                    let _ = opts.terminate();
                }
            })
        };

        let result = self.session.run_with_options(ort::inputs![input], &run_options);
        let _ = done_tx.send(());
        let _ = watchdog.join();

        let outputs = match result {
            Ok(o) => o,
            Err(e) => {
                if timed_out.load(Ordering::SeqCst) {
                    anyhow::bail!(
                        "depth inference exceeded its {} ms budget",
                        self.timeout.as_millis()
                    );
                }
                return Err(e).context("depth session run failed");
            }
        };

        // 3. Extract the single-channel map and resample to frame size
        let (_out_shape, out_data) = outputs[0].try_extract_tensor::<f32>()?;
        let expected = (INPUT_SIZE * INPUT_SIZE) as usize;
        if out_data.len() != expected {
            anyhow::bail!(
                "unexpected depth output size: {} values, expected {}",
                out_data.len(),
                expected
            );
        }

        Ok(resample_to(out_data, INPUT_SIZE, frame.width(), frame.height()))
    }
}

/// Bicubic upsample of a square model output grid to the target resolution.
fn resample_to(data: &[f32], side: u32, width: u32, height: u32) -> DepthMap {
    let grid: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(side, side, data.to_vec()).expect("grid dims match data");
    let resized = image::imageops::resize(&grid, width, height, FilterType::CatmullRom);
    DepthMap::from_raw(width, height, resized.into_raw())
}
