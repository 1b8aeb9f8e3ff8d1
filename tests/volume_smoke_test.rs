use anyhow::Result;
use foodvol::config::EstimatorConfig;
use foodvol::depth::DepthModel;
use foodvol::hand::HandDetector;
use foodvol::types::{DepthMap, EstimateRequest, HandLandmarks, Point2D};
use foodvol::{VolumeError, VolumePipeline};
use image::{ImageBuffer, Rgb};

// End-to-end smoke run against synthetic capability providers: a scripted
// hand in the frame corner and a fixed depth ramp. Checks that the whole
// pipeline hangs together and the output fields are mutually consistent,
// not that any particular volume is "right".

struct OneHand;

impl HandDetector for OneHand {
    fn detect(&mut self, _frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Vec<HandLandmarks>> {
        let mut points = Vec::with_capacity(21);
        for i in 0..21 {
            let t = i as f32 / 20.0 * std::f32::consts::TAU;
            points.push(Point2D {
                x: 0.82 + 0.07 * t.cos(),
                y: 0.80 + 0.07 * t.sin(),
            });
        }
        points[HandLandmarks::WRIST] = Point2D { x: 0.85, y: 0.95 };
        points[HandLandmarks::MIDDLE_FINGER_TIP] = Point2D { x: 0.85, y: 0.60 };
        Ok(vec![HandLandmarks::new(points)])
    }
}

struct RampDepth;

impl DepthModel for RampDepth {
    fn estimate(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<DepthMap> {
        let (w, h) = frame.dimensions();
        let data = (0..w * h).map(|i| 1.0 + (i % w) as f32 * 0.05).collect();
        Ok(DepthMap::from_raw(w, h, data))
    }
}

fn plate_photo(size: u32) -> Vec<u8> {
    let frame: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(size, size, |x, y| {
        let c = size as f32 / 2.0;
        let r = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
        if r < size as f32 / 6.0 {
            Rgb([80, 50, 35])
        } else {
            Rgb([240, 235, 228])
        }
    });
    let mut bytes = std::io::Cursor::new(Vec::new());
    frame
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("png encode");
    bytes.into_inner()
}

fn smoke_pipeline(dir: &std::path::Path) -> VolumePipeline {
    let mut config = EstimatorConfig::default();
    config.artifacts.dir = dir.to_str().unwrap().to_string();
    VolumePipeline::new(Box::new(OneHand), Box::new(RampDepth), config)
}

#[test]
fn full_run_produces_a_consistent_estimate() {
    let dir = std::env::temp_dir().join("foodvol_smoke_run");
    let _ = std::fs::remove_dir_all(&dir);
    let mut pipeline = smoke_pipeline(&dir);

    let mut request = EstimateRequest::new(18.0);
    request.artifact_key = Some("smoke".to_string());

    let out = pipeline.estimate(&plate_photo(180), &request).unwrap();

    // Palm spans 0.35 of 180 px = 63 px
    assert!((out.hand_pixel_length - 63.0).abs() < 1e-2);
    assert!((out.scale_cm_per_px - 18.0 / 63.0).abs() < 1e-4);
    assert!(out.area_cm2 > 0.0, "the plate disc should segment as food");
    assert!(out.thickness_cm >= 0.1);
    assert!(out.volume_cm3 > 0.0);
    assert!(out.depth_ratio > 0.0);
    assert!(out.perspective_factor > 0.0 && out.perspective_factor <= 1.0);
    assert_eq!(out.dish_type, "bowl");

    // Diagnostics landed under the supplied key
    assert!(dir.join("smoke_food_mask.png").exists());
    assert!(dir.join("smoke_overlay.jpg").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn estimate_round_trips_through_json() {
    let dir = std::env::temp_dir().join("foodvol_smoke_json");
    let _ = std::fs::remove_dir_all(&dir);
    let mut pipeline = smoke_pipeline(&dir);

    let mut request = EstimateRequest::new(20.0);
    request.dish_type = "plate".to_string();
    request.artifact_key = Some("json".to_string());

    let out = pipeline.estimate(&plate_photo(180), &request).unwrap();
    let encoded = serde_json::to_string(&out).unwrap();
    let decoded: foodvol::VolumeEstimate = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.dish_type, "plate");
    assert_eq!(decoded.volume_cm3, out.volume_cm3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn garbage_bytes_fail_cleanly() {
    let dir = std::env::temp_dir().join("foodvol_smoke_garbage");
    let mut pipeline = smoke_pipeline(&dir);
    let err = pipeline
        .estimate(&[0xde, 0xad, 0xbe, 0xef], &EstimateRequest::new(18.0))
        .unwrap_err();
    assert!(matches!(err, VolumeError::DecodeFailure(_)));
    let _ = std::fs::remove_dir_all(&dir);
}
